//! Consultation session models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConsultationType, Role};

/// Which side of the consultation sent a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Client,
    Lawyer,
}

impl Sender {
    pub fn opposite(&self) -> Sender {
        match self {
            Sender::Client => Sender::Lawyer,
            Sender::Lawyer => Sender::Client,
        }
    }

    /// Side a user takes in a consultation. Admins observe as the client side.
    pub fn for_role(role: Role) -> Sender {
        match role {
            Role::Lawyer => Sender::Lawyer,
            Role::Client | Role::Admin => Sender::Client,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::Client => "client",
            Sender::Lawyer => "lawyer",
        }
    }
}

/// A single consultation message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender: Sender,
    #[serde(alias = "content")]
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsultationStatus {
    #[default]
    Active,
    Completed,
}

impl ConsultationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationStatus::Active => "active",
            ConsultationStatus::Completed => "completed",
        }
    }
}

/// Consultation as created by `POST /api/consultations`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    pub id: String,
    pub lawyer_id: String,
    #[serde(default)]
    pub lawyer_name: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    pub consultation_type: ConsultationType,
    #[serde(default)]
    pub status: ConsultationStatus,
}
