//! Token storage and management

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Stored bearer token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: String,
    pub expires_at: Option<u64>,
}

impl StoredToken {
    pub fn new(token: String, expires_in_secs: Option<u64>) -> Self {
        let expires_at = expires_in_secs.map(|secs| now_secs() + secs);
        Self { token, expires_at }
    }

    /// Tokens without a known expiry never expire locally; the backend decides.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(exp) => now_secs() >= exp,
            None => false,
        }
    }
}

/// Durable storage for the session: the bearer token plus the user object
/// serialized as a JSON string.
pub trait SessionStore {
    fn get_auth_token(&self) -> Option<StoredToken>;
    fn get_user_data(&self) -> Option<String>;
    fn set_session(&mut self, token: StoredToken, user_data: String);
    fn clear_session(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_without_expiry_is_valid() {
        assert!(!StoredToken::new("t".to_string(), None).is_expired());
    }

    #[test]
    fn test_token_expiry() {
        assert!(!StoredToken::new("t".to_string(), Some(3600)).is_expired());
        let stale = StoredToken {
            token: "t".to_string(),
            expires_at: Some(1),
        };
        assert!(stale.is_expired());
    }
}
