//! Appointment models and the status lifecycle

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How the consultation is held
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsultationType {
    #[default]
    Video,
    Audio,
    Chat,
}

impl ConsultationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationType::Video => "video",
            ConsultationType::Audio => "audio",
            ConsultationType::Chat => "chat",
        }
    }
}

impl std::str::FromStr for ConsultationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "video" => Ok(ConsultationType::Video),
            "audio" => Ok(ConsultationType::Audio),
            "chat" => Ok(ConsultationType::Chat),
            other => Err(format!(
                "unknown consultation type '{}' (expected video, audio or chat)",
                other
            )),
        }
    }
}

/// Appointment status.
///
/// ```text
/// pending ──> confirmed ──> completed
///    │            │
///    └────────────┴──> cancelled
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

/// Rejected status change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot move appointment from {from} to {to}")]
pub struct TransitionError {
    pub from: AppointmentStatus,
    pub to: AppointmentStatus,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled
        )
    }

    /// Statuses reachable in one step. The UI offers exactly these.
    pub fn next_statuses(&self) -> &'static [AppointmentStatus] {
        use AppointmentStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[Completed, Cancelled],
            Completed | Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        self.next_statuses().contains(&next)
    }

    /// Validate a status change.
    ///
    /// Returns `Ok(None)` when `next` equals the current status (no-op),
    /// `Ok(Some(next))` for an allowed edge.
    pub fn transition(
        &self,
        next: AppointmentStatus,
    ) -> Result<Option<AppointmentStatus>, TransitionError> {
        if *self == next {
            return Ok(None);
        }
        if self.can_transition_to(next) {
            Ok(Some(next))
        } else {
            Err(TransitionError {
                from: *self,
                to: next,
            })
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" | "confirm" => Ok(AppointmentStatus::Confirmed),
            "completed" | "complete" => Ok(AppointmentStatus::Completed),
            "cancelled" | "canceled" | "cancel" => Ok(AppointmentStatus::Cancelled),
            other => Err(format!("unknown appointment status '{}'", other)),
        }
    }
}

/// Appointment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub lawyer_id: String,
    #[serde(default)]
    pub lawyer_name: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    pub date: String,
    pub time: String,
    pub consultation_type: ConsultationType,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body of `POST /api/appointments`
#[derive(Debug, Clone, Serialize)]
pub struct BookingRequest {
    pub lawyer_id: String,
    pub date: String,
    pub time: String,
    pub consultation_type: ConsultationType,
    pub notes: String,
}

/// Appointments seen by this client, newest last.
///
/// Booking appends; a successful status update rewrites the matching entry.
#[derive(Debug, Default)]
pub struct AppointmentLedger {
    entries: Vec<Appointment>,
}

impl AppointmentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, appointment: Appointment) {
        match self.entries.iter_mut().find(|a| a.id == appointment.id) {
            Some(existing) => *existing = appointment,
            None => self.entries.push(appointment),
        }
    }

    /// Replace the ledger with a server-provided list (e.g. dashboard refresh).
    pub fn replace_all(&mut self, appointments: Vec<Appointment>) {
        self.entries = appointments;
    }

    pub fn get(&self, id: &str) -> Option<&Appointment> {
        self.entries.iter().find(|a| a.id == id)
    }

    /// Set the status of a known appointment after the backend accepted it.
    pub fn set_status(&mut self, id: &str, status: AppointmentStatus) -> bool {
        match self.entries.iter_mut().find(|a| a.id == id) {
            Some(a) => {
                a.status = status;
                true
            }
            None => false,
        }
    }

    /// Most recent `n` appointments, newest first.
    pub fn recent(&self, n: usize) -> Vec<&Appointment> {
        self.entries.iter().rev().take(n).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
