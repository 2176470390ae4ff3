pub mod jwt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::api::OnboardingRequest;
use crate::dashboard::WeekDay;
use crate::error::{Error, Result};
use crate::storage::Database;

use jwt::Claims;

const KEY_TOKEN: &str = "auth_token";
const KEY_EXPIRES_AT: &str = "auth_expires_at";
const KEY_FIRST_ACCESS: &str = "is_first_access";
const KEY_PROFILE: &str = "user_profile";

/// Sessions without an `exp` claim fall back to a 24h lifetime.
const DEFAULT_SESSION_HOURS: i64 = 24;

/// Locally cached view of the authenticated user, extracted from the token
/// claims at login and refreshed on profile updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub monthly_goal: Option<f64>,
    pub daily_goal: Option<f64>,
    pub week_days_list: Option<Vec<String>>,
    pub theme: Option<String>,
}

impl UserProfile {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            id: claims.user_id.unwrap_or(0),
            email: claims.email.clone().unwrap_or_default(),
            first_name: claims.first_name.clone().unwrap_or_default(),
            last_name: claims.last_name.clone().unwrap_or_default(),
            monthly_goal: claims.monthly_goal,
            daily_goal: claims.daily_goal,
            week_days_list: claims.week_days_list.clone(),
            theme: claims.theme.clone(),
        }
    }

    /// Parse the configured working days. An unset list means onboarding has
    /// not run yet and yields an empty set, not an error.
    pub fn work_days(&self) -> Result<Vec<WeekDay>> {
        match &self.week_days_list {
            Some(names) => names.iter().map(|n| n.parse()).collect(),
            None => Ok(Vec::new()),
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Persist a freshly issued token plus everything derivable from it.
/// Returns the cached profile.
pub async fn save_session(db: &Database, token: &str, now: DateTime<Utc>) -> Result<UserProfile> {
    let claims = jwt::decode_claims(token)?;
    let expires_at = claims
        .exp
        .unwrap_or_else(|| (now + Duration::hours(DEFAULT_SESSION_HOURS)).timestamp());
    let profile = UserProfile::from_claims(&claims);

    db.set_config(KEY_TOKEN, token).await?;
    db.set_config(KEY_EXPIRES_AT, &expires_at.to_string())
        .await?;
    db.set_config(KEY_FIRST_ACCESS, &claims.first_access().to_string())
        .await?;
    save_profile(db, &profile).await?;

    Ok(profile)
}

/// Load the stored token if the session is still valid. An expired session
/// is cleared as a side effect, matching the check-then-logout behavior the
/// UI relies on.
pub async fn load_token(db: &Database, now: DateTime<Utc>) -> Result<Option<String>> {
    let Some(token) = db.get_config(KEY_TOKEN).await? else {
        return Ok(None);
    };
    let expires_at: i64 = match db.get_config(KEY_EXPIRES_AT).await? {
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::Database(format!("corrupt {KEY_EXPIRES_AT} value: {raw}")))?,
        None => return Ok(None),
    };

    if now.timestamp() >= expires_at {
        log::info!("stored session expired, clearing");
        clear_session(db).await?;
        return Ok(None);
    }
    Ok(Some(token))
}

pub async fn clear_session(db: &Database) -> Result<()> {
    for key in [KEY_TOKEN, KEY_EXPIRES_AT, KEY_FIRST_ACCESS, KEY_PROFILE] {
        db.delete_config(key).await?;
    }
    Ok(())
}

pub async fn save_profile(db: &Database, profile: &UserProfile) -> Result<()> {
    db.set_config(KEY_PROFILE, &serde_json::to_string(profile)?)
        .await
}

pub async fn load_profile(db: &Database) -> Result<Option<UserProfile>> {
    match db.get_config(KEY_PROFILE).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub async fn is_first_access(db: &Database) -> Result<bool> {
    Ok(db.get_config(KEY_FIRST_ACCESS).await?.as_deref() == Some("true"))
}

pub async fn mark_onboarded(db: &Database) -> Result<()> {
    db.set_config(KEY_FIRST_ACCESS, "false").await
}

/// Client-side sanity checks before the onboarding request leaves the
/// machine; the backend validates again.
pub fn validate_onboarding(req: &OnboardingRequest) -> Result<()> {
    if req.monthly_goal <= 0.0 {
        return Err(Error::Validation(
            "monthly goal must be a positive number".into(),
        ));
    }
    if req.monthly_goal > 1000.0 {
        return Err(Error::Validation(
            "monthly goal cannot exceed 1000 hours".into(),
        ));
    }
    if req.daily_goal <= 0.0 {
        return Err(Error::Validation(
            "daily goal must be a positive number".into(),
        ));
    }
    if req.daily_goal > 24.0 {
        return Err(Error::Validation("daily goal cannot exceed 24 hours".into()));
    }
    if req.week_days_list.is_empty() {
        return Err(Error::Validation("select at least one work day".into()));
    }
    Ok(())
}
