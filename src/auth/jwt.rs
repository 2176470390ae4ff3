use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Payload of the backend-issued access token. Decoded client-side for
/// display and session bookkeeping only; the token is never verified here,
/// the backend is the authority on every request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub monthly_goal: Option<f64>,
    #[serde(default)]
    pub daily_goal: Option<f64>,
    #[serde(default)]
    pub week_days_list: Option<Vec<String>>,
    #[serde(default)]
    pub theme: Option<String>,
    /// The backend emits this as either a bool or the string "true".
    #[serde(default)]
    pub is_first_access: Option<serde_json::Value>,
    /// Expiry as a Unix timestamp (seconds).
    #[serde(default)]
    pub exp: Option<i64>,
}

impl Claims {
    pub fn first_access(&self) -> bool {
        match &self.is_first_access {
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::String(s)) => s == "true",
            _ => false,
        }
    }
}

/// Decode the claims from a JWT without verifying the signature.
pub fn decode_claims(token: &str) -> Result<Claims> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| Error::Auth("malformed access token".into()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| Error::Auth(format!("undecodable access token payload: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::Auth(format!("invalid access token payload: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_token(payload: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
        format!("{header}.{body}.signature")
    }

    #[test]
    fn test_decode_full_claims() {
        let token = make_token(serde_json::json!({
            "user_id": 7,
            "email": "ada@example.com",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "monthly_goal": 160,
            "daily_goal": 8,
            "week_days_list": ["monday", "tuesday"],
            "theme": "dark",
            "is_first_access": false,
            "exp": 1767225600
        }));
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.user_id, Some(7));
        assert_eq!(claims.email.as_deref(), Some("ada@example.com"));
        assert_eq!(claims.monthly_goal, Some(160.0));
        assert_eq!(claims.exp, Some(1767225600));
        assert!(!claims.first_access());
    }

    #[test]
    fn test_first_access_tolerates_string_bool() {
        let claims = decode_claims(&make_token(serde_json::json!({
            "is_first_access": "true"
        })))
        .unwrap();
        assert!(claims.first_access());

        let claims = decode_claims(&make_token(serde_json::json!({
            "is_first_access": true
        })))
        .unwrap();
        assert!(claims.first_access());

        let claims = decode_claims(&make_token(serde_json::json!({}))).unwrap();
        assert!(!claims.first_access());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_claims("no-dots-here").is_err());
        assert!(decode_claims("a.!!!.c").is_err());
    }
}
