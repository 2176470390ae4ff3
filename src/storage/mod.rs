pub mod repository;

use rusqlite_migration::{Migrations, M};

use crate::error::{Error, Result};

/// Database wraps two `tokio_rusqlite::Connection` instances (writer + reader)
/// using WAL mode for concurrent access. The writer serializes writes via
/// `tokio_rusqlite`'s internal channel; the reader can proceed without
/// blocking.
#[derive(Clone)]
pub struct Database {
    writer: tokio_rusqlite::Connection,
    reader: tokio_rusqlite::Connection,
}

impl Database {
    /// Open the database at the default path (`~/.chronos/chronos.db`).
    pub async fn open() -> Result<Self> {
        let dir = dirs::home_dir()
            .ok_or_else(|| Error::Config("cannot determine home directory".into()))?
            .join(".chronos");
        std::fs::create_dir_all(&dir).map_err(|e| Error::Config(e.to_string()))?;
        Self::open_at(dir.join("chronos.db")).await
    }

    /// Open the database at the given path.
    pub async fn open_at(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let writer = tokio_rusqlite::Connection::open(&path).await?;
        Self::init_writer(&writer).await?;

        let reader = tokio_rusqlite::Connection::open(&path).await?;
        Self::init_reader(&reader).await?;

        Ok(Self { writer, reader })
    }

    /// Open an in-memory database (for testing).
    pub async fn open_memory() -> Result<Self> {
        let writer = tokio_rusqlite::Connection::open_in_memory().await?;
        Self::init_writer(&writer).await?;

        // For in-memory, we share the same connection for reader/writer
        // since in-memory DBs are per-connection.
        Ok(Self {
            reader: writer.clone(),
            writer,
        })
    }

    async fn init_writer(conn: &tokio_rusqlite::Connection) -> Result<()> {
        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode=WAL;\
                 PRAGMA foreign_keys=ON;\
                 PRAGMA busy_timeout=5000;",
            )
            .map_err(|e| e.to_string())?;
            let migrations = Migrations::new(vec![M::up(include_str!(
                "migrations/001_initial.sql"
            ))]);
            migrations.to_latest(conn).map_err(|e| e.to_string())?;
            Ok::<(), String>(())
        })
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn init_reader(conn: &tokio_rusqlite::Connection) -> Result<()> {
        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode=WAL;\
                 PRAGMA foreign_keys=ON;\
                 PRAGMA busy_timeout=5000;",
            )?;
            Ok::<(), rusqlite::Error>(())
        })
        .await?;
        Ok(())
    }

    /// Get a reference to the writer connection.
    pub fn writer(&self) -> &tokio_rusqlite::Connection {
        &self.writer
    }

    /// Get a reference to the reader connection.
    pub fn reader(&self) -> &tokio_rusqlite::Connection {
        &self.reader
    }

    /// Convenience wrapper for reading one config value.
    pub async fn get_config(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.reader
            .call(move |conn| repository::get_config(conn, &key))
            .await
            .map_err(Into::into)
    }

    /// Convenience wrapper for writing one config value.
    pub async fn set_config(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.writer
            .call(move |conn| repository::set_config(conn, &key, &value))
            .await
            .map_err(Into::into)
    }

    /// Remove a config value; returns whether it existed.
    pub async fn delete_config(&self, key: &str) -> Result<bool> {
        let key = key.to_string();
        self.writer
            .call(move |conn| repository::delete_config(conn, &key))
            .await
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_memory() {
        let db = Database::open_memory().await.unwrap();

        let tables: Vec<String> = db
            .reader()
            .call(|conn| {
                let mut stmt = conn
                    .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                Ok::<Vec<String>, rusqlite::Error>(rows.filter_map(|r| r.ok()).collect())
            })
            .await
            .unwrap();

        assert!(tables.contains(&"app_config".to_string()));
    }

    #[tokio::test]
    async fn test_config_round_trip() {
        let db = Database::open_memory().await.unwrap();

        assert_eq!(db.get_config("auth_token").await.unwrap(), None);
        db.set_config("auth_token", "abc123").await.unwrap();
        assert_eq!(
            db.get_config("auth_token").await.unwrap().as_deref(),
            Some("abc123")
        );

        db.set_config("auth_token", "def456").await.unwrap();
        assert_eq!(
            db.get_config("auth_token").await.unwrap().as_deref(),
            Some("def456")
        );

        assert!(db.delete_config("auth_token").await.unwrap());
        assert!(!db.delete_config("auth_token").await.unwrap());
        assert_eq!(db.get_config("auth_token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_open_at_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chronos.db");

        {
            let db = Database::open_at(&path).await.unwrap();
            db.set_config("api_url", "http://localhost:9000")
                .await
                .unwrap();
        }

        let db = Database::open_at(&path).await.unwrap();
        assert_eq!(
            db.get_config("api_url").await.unwrap().as_deref(),
            Some("http://localhost:9000")
        );
    }
}
