pub mod types;

pub use types::*;

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::dashboard::EntryDay;
use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const RETRY_ATTEMPTS: u32 = 3;

/// HTTP client for the Chronos backend. Thin wrapper over `reqwest` that
/// attaches the bearer token, retries timed-out requests with linear backoff,
/// and unwraps the backend's status envelope.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl Client {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid API base URL '{base_url}': {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url,
            token: None,
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&(impl Serialize + ?Sized)>,
    ) -> Result<T> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| Error::Config(format!("invalid API path '{path}': {e}")))?;

        let mut attempt = 1;
        let response = loop {
            let mut request = self.http.request(method.clone(), url.clone()).query(query);
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            match request.send().await {
                Ok(resp) => break resp,
                Err(e) if (e.is_timeout() || e.is_connect()) && attempt < RETRY_ATTEMPTS => {
                    log::warn!("request to {path} failed (attempt {attempt}): {e}");
                    tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        };

        let status = response.status();
        let value: serde_json::Value = response.json().await?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Auth(
                describe(&value).unwrap_or_else(|| "session expired or invalid".into()),
            ));
        }
        if !status.is_success() {
            return Err(Error::Api(
                describe(&value).unwrap_or_else(|| format!("HTTP {status}")),
            ));
        }
        // The backend reports application errors inside a 200 envelope.
        if value.get("status").and_then(|v| v.as_bool()) == Some(false) {
            return Err(Error::Api(
                describe(&value).unwrap_or_else(|| "API returned an error".into()),
            ));
        }

        Ok(serde_json::from_value(value)?)
    }

    // ── Auth endpoints ─────────────────────────────────────────────

    pub async fn login(&self, req: &LoginRequest) -> Result<AuthResponse> {
        self.execute(Method::POST, "/api/auth/login", &[], Some(req))
            .await
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<serde_json::Value> {
        self.execute(Method::POST, "/api/auth/register", &[], Some(req))
            .await
    }

    pub async fn complete_onboarding(&self, req: &OnboardingRequest) -> Result<serde_json::Value> {
        self.execute(Method::POST, "/api/auth/onboarding", &[], Some(req))
            .await
    }

    pub async fn update_user(&self, req: &UpdateUserRequest) -> Result<serde_json::Value> {
        self.execute(Method::PATCH, "/api/auth/user", &[], Some(req))
            .await
    }

    // ── Entries endpoints ──────────────────────────────────────────

    pub async fn entries(&self, query: &EntriesQuery) -> Result<(Vec<Entry>, Option<i64>)> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(v) = &query.dat_start {
            params.push(("dat_start", v.clone()));
        }
        if let Some(v) = &query.dat_end {
            params.push(("dat_end", v.clone()));
        }
        if let Some(v) = &query.search {
            params.push(("search", v.clone()));
        }
        if let Some(v) = query.limit {
            params.push(("limit", v.to_string()));
        }
        if let Some(v) = query.offset {
            params.push(("offset", v.to_string()));
        }
        if query.require_total_count {
            params.push(("require_total_count", "true".into()));
        }
        let resp: EntriesResponse = self
            .execute(Method::GET, "/api/entries/", &params, None::<&()>)
            .await?;
        Ok((resp.entries_list, resp.total_count))
    }

    pub async fn create_entry(&self, req: &CreateEntryRequest) -> Result<()> {
        self.execute::<serde_json::Value>(Method::POST, "/api/entries/", &[], Some(req))
            .await?;
        Ok(())
    }

    pub async fn update_entry(&self, entry_id: i64, req: &CreateEntryRequest) -> Result<()> {
        self.execute::<serde_json::Value>(
            Method::PUT,
            "/api/entries/",
            &[("entry_id", entry_id.to_string())],
            Some(req),
        )
        .await?;
        Ok(())
    }

    pub async fn delete_entry(&self, entry_id: i64) -> Result<()> {
        self.execute::<serde_json::Value>(
            Method::DELETE,
            "/api/entries/",
            &[("entry_id", entry_id.to_string())],
            None::<&()>,
        )
        .await?;
        Ok(())
    }

    // ── Dashboard endpoints ────────────────────────────────────────

    pub async fn entries_days(&self, dat_start: &str, dat_end: &str) -> Result<Vec<EntryDay>> {
        let params = [
            ("dat_start", dat_start.to_string()),
            ("dat_end", dat_end.to_string()),
        ];
        let resp: EntriesDaysResponse = self
            .execute(Method::GET, "/api/entries/days", &params, None::<&()>)
            .await?;
        Ok(resp.entries_days)
    }

    pub async fn cards(&self, dat_start: &str, dat_end: &str) -> Result<CardsData> {
        let params = [
            ("dat_start", dat_start.to_string()),
            ("dat_end", dat_end.to_string()),
        ];
        let resp: CardsResponse = self
            .execute(Method::GET, "/api/entries/cards", &params, None::<&()>)
            .await?;
        Ok(resp.cards_dict)
    }

    pub async fn streak(&self) -> Result<i64> {
        let resp: StreakResponse = self
            .execute(Method::GET, "/api/entries/streak", &[], None::<&()>)
            .await?;
        Ok(resp.entries_streak)
    }

    // ── Projects endpoints ─────────────────────────────────────────

    pub async fn projects(&self) -> Result<Vec<Project>> {
        let resp: ProjectsResponse = self
            .execute(Method::GET, "/api/entries/projects", &[], None::<&()>)
            .await?;
        Ok(resp.projects_list)
    }

    pub async fn create_project(&self, name: &str) -> Result<()> {
        let body = serde_json::json!({ "name": name });
        self.execute::<serde_json::Value>(Method::POST, "/api/entries/projects", &[], Some(&body))
            .await?;
        Ok(())
    }
}

/// Pull a human-readable message out of an error envelope.
fn describe(value: &serde_json::Value) -> Option<String> {
    for key in ["description", "desc_error", "detail", "message"] {
        if let Some(s) = value.get(key).and_then(|v| v.as_str()) {
            if !s.is_empty() {
                return Some(s.to_string());
            }
        }
    }
    None
}
