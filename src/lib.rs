pub mod api;
pub mod auth;
pub mod dashboard;
pub mod date_util;
pub mod error;
pub mod period;
pub mod storage;

pub use auth::UserProfile;
pub use dashboard::{compute_stats, DashboardData, DashboardStats, EntryDay, WeekDay};
pub use error::{Error, Result};
pub use period::{DateRange, Direction, Period, PeriodAnchor, PeriodKind};
pub use storage::Database;

use chrono::{NaiveDate, Utc};

use api::{
    CreateEntryRequest, EntriesQuery, Entry, LoginRequest, OnboardingRequest, Project,
    RegisterRequest, UpdateUserRequest,
};

/// Main entry point for the Chronos client: the backend API plus the local
/// session store, composed the way the CLI consumes them.
pub struct Chronos {
    db: Database,
    api: api::Client,
}

impl Chronos {
    /// Build a client against `base_url`, resuming any stored session.
    pub async fn connect(db: Database, base_url: &str) -> Result<Self> {
        let token = auth::load_token(&db, Utc::now()).await?;
        let api = api::Client::new(base_url)?.with_token(token);
        Ok(Self { db, api })
    }

    /// Access the session store (for direct queries in the CLI).
    pub fn db(&self) -> &Database {
        &self.db
    }

    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(auth::load_token(&self.db, Utc::now()).await?.is_some())
    }

    pub async fn profile(&self) -> Result<Option<UserProfile>> {
        auth::load_profile(&self.db).await
    }

    pub async fn is_first_access(&self) -> Result<bool> {
        auth::is_first_access(&self.db).await
    }

    // ── Auth ───────────────────────────────────────────────────────

    pub async fn login(&mut self, username: &str, password: &str) -> Result<UserProfile> {
        let resp = self
            .api
            .login(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .await?;
        let profile = auth::save_session(&self.db, &resp.access_token, Utc::now()).await?;
        self.api.set_token(Some(resp.access_token));
        log::info!("logged in as {}", profile.email);
        Ok(profile)
    }

    /// Register a new account, then log in with the same credentials; the
    /// backend does not return a token on registration.
    pub async fn register(&mut self, req: &RegisterRequest) -> Result<UserProfile> {
        self.api.register(req).await?;
        self.login(&req.email, &req.password).await
    }

    pub async fn logout(&mut self) -> Result<()> {
        auth::clear_session(&self.db).await?;
        self.api.set_token(None);
        Ok(())
    }

    /// Submit the one-time onboarding goals and record completion locally.
    pub async fn complete_onboarding(
        &self,
        monthly_goal: f64,
        daily_goal: f64,
        work_days: &[WeekDay],
    ) -> Result<()> {
        let req = OnboardingRequest {
            monthly_goal,
            daily_goal,
            week_days_list: work_days.iter().map(|d| d.as_str().to_string()).collect(),
        };
        auth::validate_onboarding(&req)?;
        self.api.complete_onboarding(&req).await?;
        auth::mark_onboarded(&self.db).await?;

        if let Some(mut profile) = auth::load_profile(&self.db).await? {
            profile.monthly_goal = Some(monthly_goal);
            profile.daily_goal = Some(daily_goal);
            profile.week_days_list = Some(req.week_days_list);
            auth::save_profile(&self.db, &profile).await?;
        }
        Ok(())
    }

    /// Partial profile update; the local cache tracks whatever the backend
    /// accepted.
    pub async fn update_user(&self, req: &UpdateUserRequest) -> Result<()> {
        self.api.update_user(req).await?;

        if let Some(mut profile) = auth::load_profile(&self.db).await? {
            if let Some(v) = &req.first_name {
                profile.first_name = v.clone();
            }
            if let Some(v) = &req.last_name {
                profile.last_name = v.clone();
            }
            if let Some(v) = req.monthly_goal {
                profile.monthly_goal = Some(v);
            }
            if let Some(v) = req.daily_goal {
                profile.daily_goal = Some(v);
            }
            if let Some(v) = &req.week_days_list {
                profile.week_days_list = Some(v.clone());
            }
            if let Some(v) = &req.theme {
                profile.theme = Some(v.clone());
            }
            auth::save_profile(&self.db, &profile).await?;
        }
        Ok(())
    }

    // ── Entries & projects ─────────────────────────────────────────

    pub async fn entries(&self, query: &EntriesQuery) -> Result<(Vec<Entry>, Option<i64>)> {
        self.api.entries(query).await
    }

    pub async fn create_entry(&self, req: &CreateEntryRequest) -> Result<()> {
        self.api.create_entry(req).await
    }

    pub async fn update_entry(&self, entry_id: i64, req: &CreateEntryRequest) -> Result<()> {
        self.api.update_entry(entry_id, req).await
    }

    pub async fn delete_entry(&self, entry_id: i64) -> Result<()> {
        self.api.delete_entry(entry_id).await
    }

    pub async fn projects(&self) -> Result<Vec<Project>> {
        self.api.projects().await
    }

    pub async fn create_project(&self, name: &str) -> Result<()> {
        self.api.create_project(name).await
    }

    // ── Dashboard ──────────────────────────────────────────────────

    /// Fetch everything the dashboard shows for one range and derive the
    /// statistics. `today` is passed in by the caller so a whole interaction
    /// sees one consistent "now".
    pub async fn dashboard(&self, range: &DateRange, today: NaiveDate) -> Result<DashboardData> {
        let profile = auth::load_profile(&self.db)
            .await?
            .ok_or_else(|| Error::Auth("not logged in; run 'chronos login' first".into()))?;
        let work_days = profile.work_days()?;

        let dat_start = range.start.date().format("%Y-%m-%d").to_string();
        let dat_end = range.end.date().format("%Y-%m-%d").to_string();
        log::debug!("loading dashboard for {dat_start}..{dat_end}");

        let (entries_days, cards, streak) = tokio::try_join!(
            self.api.entries_days(&dat_start, &dat_end),
            self.api.cards(&dat_start, &dat_end),
            self.api.streak(),
        )?;

        let stats = dashboard::compute_stats(&entries_days, &work_days, today)?;

        Ok(DashboardData {
            entries_days,
            stats,
            cards,
            streak,
        })
    }
}
