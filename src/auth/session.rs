//! Session context: the authenticated identity shared by every screen.
//!
//! Readers take cheap `Arc` snapshots. Only the auth flow (login, register,
//! logout, restore) replaces the session.

use std::sync::Arc;

use super::tokens::{SessionStore, StoredToken};
use crate::models::User;

/// Authenticated identity and bearer token
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: StoredToken,
    pub user: User,
}

#[derive(Debug, Default, Clone)]
pub struct SessionContext {
    current: Option<Arc<Session>>,
}

impl SessionContext {
    /// Logged-out context.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Immutable view of the current session, if any.
    pub fn snapshot(&self) -> Option<Arc<Session>> {
        self.current.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    pub fn user(&self) -> Option<&User> {
        self.current.as_deref().map(|s| &s.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.current.as_deref().map(|s| s.token.token.as_str())
    }

    pub(crate) fn establish(&mut self, session: Session) {
        self.current = Some(Arc::new(session));
    }

    pub(crate) fn clear(&mut self) {
        self.current = None;
    }

    /// Rebuild the context from durable storage.
    ///
    /// Anything short of a complete, parseable, unexpired session clears the
    /// store and yields a logged-out context.
    pub fn restore(store: &mut impl SessionStore) -> Self {
        let token = store.get_auth_token();
        let user_data = store.get_user_data();

        match (token, user_data) {
            (None, None) => Self::anonymous(),
            (Some(token), Some(data)) => match serde_json::from_str::<User>(&data) {
                Ok(_) if token.is_expired() => {
                    tracing::info!("Stored session expired, logging out");
                    store.clear_session();
                    Self::anonymous()
                }
                Ok(user) => {
                    tracing::debug!("Restored session for {} ({})", user.email, user.role);
                    Self {
                        current: Some(Arc::new(Session { token, user })),
                    }
                }
                Err(e) => {
                    tracing::warn!("Stored user data is malformed, logging out: {}", e);
                    store.clear_session();
                    Self::anonymous()
                }
            },
            _ => {
                tracing::warn!("Incomplete stored session, logging out");
                store.clear_session();
                Self::anonymous()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{Role, UserStatus};

    /// In-memory store for tests.
    #[derive(Default)]
    pub struct MemoryStore {
        pub token: Option<StoredToken>,
        pub user_data: Option<String>,
        pub clears: usize,
    }

    impl SessionStore for MemoryStore {
        fn get_auth_token(&self) -> Option<StoredToken> {
            self.token.clone()
        }

        fn get_user_data(&self) -> Option<String> {
            self.user_data.clone()
        }

        fn set_session(&mut self, token: StoredToken, user_data: String) {
            self.token = Some(token);
            self.user_data = Some(user_data);
        }

        fn clear_session(&mut self) {
            self.token = None;
            self.user_data = None;
            self.clears += 1;
        }
    }

    pub fn user(role: Role, status: UserStatus) -> User {
        User {
            id: format!("{}-1", role),
            name: "Test".to_string(),
            email: format!("{}@example.com", role),
            phone: Some("512345678".to_string()),
            role,
            status,
            created_at: None,
        }
    }

    #[test]
    fn test_restore_valid_session() {
        let u = user(Role::Client, UserStatus::Active);
        let mut store = MemoryStore {
            token: Some(StoredToken::new("tok".to_string(), None)),
            user_data: Some(serde_json::to_string(&u).unwrap()),
            ..Default::default()
        };
        let ctx = SessionContext::restore(&mut store);
        assert!(ctx.is_authenticated());
        assert_eq!(ctx.user(), Some(&u));
        assert_eq!(ctx.token(), Some("tok"));
        assert_eq!(store.clears, 0);
    }

    #[test]
    fn test_restore_corrupted_user_logs_out_and_clears() {
        let mut store = MemoryStore {
            token: Some(StoredToken::new("tok".to_string(), None)),
            user_data: Some("{not json".to_string()),
            ..Default::default()
        };
        let ctx = SessionContext::restore(&mut store);
        assert!(!ctx.is_authenticated());
        assert!(store.token.is_none());
        assert!(store.user_data.is_none());
        assert_eq!(store.clears, 1);
    }

    #[test]
    fn test_restore_wrong_shape_user_logs_out() {
        let mut store = MemoryStore {
            token: Some(StoredToken::new("tok".to_string(), None)),
            user_data: Some(r#"{"id": 5}"#.to_string()),
            ..Default::default()
        };
        assert!(!SessionContext::restore(&mut store).is_authenticated());
        assert!(store.user_data.is_none());
    }

    #[test]
    fn test_restore_half_session_clears() {
        let mut store = MemoryStore {
            token: Some(StoredToken::new("tok".to_string(), None)),
            ..Default::default()
        };
        assert!(!SessionContext::restore(&mut store).is_authenticated());
        assert_eq!(store.clears, 1);
    }

    #[test]
    fn test_restore_expired_token_clears() {
        let u = user(Role::Lawyer, UserStatus::Active);
        let mut store = MemoryStore {
            token: Some(StoredToken {
                token: "old".to_string(),
                expires_at: Some(1),
            }),
            user_data: Some(serde_json::to_string(&u).unwrap()),
            ..Default::default()
        };
        assert!(!SessionContext::restore(&mut store).is_authenticated());
        assert_eq!(store.clears, 1);
    }

    #[test]
    fn test_restore_empty_store_is_anonymous() {
        let mut store = MemoryStore::default();
        assert!(!SessionContext::restore(&mut store).is_authenticated());
        assert_eq!(store.clears, 0);
    }

    #[test]
    fn test_snapshot_is_stable_across_clear() {
        let mut ctx = SessionContext::anonymous();
        ctx.establish(Session {
            token: StoredToken::new("tok".to_string(), None),
            user: user(Role::Admin, UserStatus::Active),
        });
        let snap = ctx.snapshot().unwrap();
        ctx.clear();
        assert!(!ctx.is_authenticated());
        assert_eq!(snap.user.role, Role::Admin);
    }
}
