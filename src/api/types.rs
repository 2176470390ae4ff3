use serde::{Deserialize, Serialize};

use crate::dashboard::EntryDay;

// ── Auth ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    /// "YYYY-MM-DD".
    pub birth_date: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OnboardingRequest {
    /// Hours per month.
    pub monthly_goal: f64,
    /// Hours per day.
    pub daily_goal: f64,
    /// Lowercase week-day names, e.g. ["monday", "tuesday"].
    pub week_days_list: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_goal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_goal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week_days_list: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

// ── Entries ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Entry {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Net logged seconds (break interval already subtracted server-side).
    pub duration: i64,
    pub datm_start: String,
    pub datm_end: String,
    #[serde(default)]
    pub datm_interval_start: Option<String>,
    #[serde(default)]
    pub datm_interval_end: Option<String>,
    pub project_name: String,
    #[serde(rename = "entrie_date")]
    pub entry_date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateEntryRequest {
    /// Calendar date the entry belongs to, "YYYY-MM-DD".
    pub date: String,
    pub datm_start: String,
    pub datm_end: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datm_interval_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datm_interval_end: Option<String>,
    pub title: String,
    pub description: String,
    pub project_id: i64,
}

/// Query parameters for the paginated entries listing.
#[derive(Debug, Clone, Default)]
pub struct EntriesQuery {
    pub dat_start: Option<String>,
    pub dat_end: Option<String>,
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub require_total_count: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
}

/// Goal cards for the selected range, straight from the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardsData {
    /// Total logged seconds in the range; absent when nothing is logged.
    #[serde(default)]
    pub total_logged: Option<i64>,
    #[serde(default)]
    pub monthly_goal: f64,
    #[serde(default)]
    pub daily_goal: f64,
}

// ── Response payloads ──────────────────────────────────────────────
//
// Every endpoint wraps its payload in a status envelope; the fields below are
// what remains once `Client::execute` has checked `status`.

#[derive(Debug, Deserialize)]
pub(crate) struct EntriesResponse {
    pub entries_list: Vec<Entry>,
    #[serde(default)]
    pub total_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EntriesDaysResponse {
    pub entries_days: Vec<EntryDay>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CardsResponse {
    pub cards_dict: CardsData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreakResponse {
    pub entries_streak: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectsResponse {
    pub projects_list: Vec<Project>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_deserializes_backend_row() {
        let json = r#"{
            "id": 12,
            "title": "Sprint review",
            "description": "notes",
            "duration": 5400,
            "datm_start": "2025-06-02 09:00:00",
            "datm_end": "2025-06-02 10:30:00",
            "datm_interval_start": null,
            "datm_interval_end": null,
            "project_name": "Internal",
            "entrie_date": "2025-06-02"
        }"#;
        let entry: Entry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.id, 12);
        assert_eq!(entry.duration, 5400);
        assert_eq!(entry.entry_date, "2025-06-02");
        assert!(entry.datm_interval_start.is_none());
    }

    #[test]
    fn test_update_request_skips_unset_fields() {
        let req = UpdateUserRequest {
            theme: Some("dark".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"theme": "dark"}));
    }

    #[test]
    fn test_cards_with_null_total() {
        let json = r#"{"total_logged": null, "monthly_goal": 160, "daily_goal": 8}"#;
        let cards: CardsData = serde_json::from_str(json).unwrap();
        assert_eq!(cards.total_logged, None);
        assert_eq!(cards.monthly_goal, 160.0);
    }

    #[test]
    fn test_entries_days_payload() {
        let json = r#"{"entries_days": [
            {"day": "2025-06-01", "daily_duration": 3600, "have_entries": true},
            {"day": "2025-06-02", "daily_duration": null, "have_entries": false}
        ]}"#;
        let resp: EntriesDaysResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.entries_days.len(), 2);
        assert!(!resp.entries_days[1].have_entries);
    }
}
