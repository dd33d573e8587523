//! Dashboard summaries. Aggregates come from the backend and are shown as-is.

use serde::Deserialize;

use super::{Appointment, User};

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ClientStats {
    pub total_appointments: u64,
    pub completed_appointments: u64,
    pub pending_appointments: u64,
    pub total_spent: f64,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LawyerStats {
    pub total_appointments: u64,
    pub completed_appointments: u64,
    pub pending_appointments: u64,
    pub total_earnings: f64,
    pub average_rating: f64,
    pub total_reviews: u64,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AdminStats {
    pub total_users: u64,
    pub total_clients: u64,
    pub total_lawyers: u64,
    pub active_users: u64,
}

/// Response of `/api/client/dashboard` and `/api/lawyer/dashboard`
#[derive(Debug, Clone, Deserialize)]
pub struct Dashboard<S> {
    #[serde(default)]
    pub stats: S,
    #[serde(default)]
    pub recent_appointments: Vec<Appointment>,
}

pub type ClientDashboard = Dashboard<ClientStats>;
pub type LawyerDashboard = Dashboard<LawyerStats>;

/// Admin view: platform stats plus the user list it was built from
#[derive(Debug, Default, Clone)]
pub struct AdminOverview {
    pub stats: AdminStats,
    pub users: Vec<User>,
}

impl AdminOverview {
    /// Lawyers awaiting verification.
    pub fn pending_lawyers(&self) -> Vec<&User> {
        self.users.iter().filter(|u| u.is_pending_lawyer()).collect()
    }
}
