//! User-related models

use serde::{Deserialize, Serialize};

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Lawyer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Lawyer => "lawyer",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "client" => Ok(Role::Client),
            "lawyer" => Ok(Role::Lawyer),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}' (expected client, lawyer or admin)", other)),
        }
    }
}

/// Account status. Lawyers start `Pending` until an admin verifies them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
    Pending,
    Suspended,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
            UserStatus::Pending => "pending",
            UserStatus::Suspended => "suspended",
        }
    }
}

/// User profile as returned by the auth and admin endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    /// A lawyer whose account has not been verified yet.
    pub fn is_pending_lawyer(&self) -> bool {
        self.role == Role::Lawyer && self.status == UserStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_parses_backend_shape() {
        let json = r#"{
            "id": "u-1",
            "name": "Sara",
            "email": "sara@example.com",
            "phone": "512345678",
            "role": "lawyer",
            "status": "pending",
            "created_at": "2025-01-02T10:00:00",
            "email_verified": false
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.role, Role::Lawyer);
        assert_eq!(user.status, UserStatus::Pending);
        assert!(user.is_pending_lawyer());
    }

    #[test]
    fn test_status_defaults_to_active() {
        let json = r#"{"id":"u-2","name":"Omar","email":"o@example.com","role":"client"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.status, UserStatus::Active);
        assert!(!user.is_pending_lawyer());
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("Lawyer".parse::<Role>().unwrap(), Role::Lawyer);
        assert!("judge".parse::<Role>().is_err());
    }
}
