//! Appointment booking and status updates

use anyhow::{Context, Result};
use thiserror::Error;

use super::client::{ApiClient, ApiError};
use super::Connection;
use crate::models::{
    Appointment, AppointmentLedger, AppointmentStatus, BookingRequest, Role, TransitionError, User,
};

/// Why a status update was refused or failed.
#[derive(Debug, Error)]
pub enum StatusUpdateError {
    #[error("Only lawyers can change appointment status")]
    NotLawyer,
    #[error("Appointment {0} belongs to another lawyer")]
    NotOwner(String),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Result of a status update request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// The appointment already had the requested status; nothing was sent.
    Unchanged(AppointmentStatus),
    /// The backend accepted the new status.
    Changed(AppointmentStatus),
}

impl StatusChange {
    pub fn status(&self) -> AppointmentStatus {
        match self {
            StatusChange::Unchanged(s) | StatusChange::Changed(s) => *s,
        }
    }
}

/// Book an appointment. The created appointment (status pending) is added to
/// the ledger of recent appointments.
pub async fn book_data(
    client: &ApiClient,
    ledger: &mut AppointmentLedger,
    request: &BookingRequest,
) -> Result<Appointment, ApiError> {
    client.require_token()?;
    let appointment: Appointment = client.post("/api/appointments", request).await?;
    tracing::info!(
        "Booked appointment {} with {} on {} {}",
        appointment.id,
        appointment.lawyer_id,
        appointment.date,
        appointment.time
    );
    ledger.record(appointment.clone());
    Ok(appointment)
}

/// Change an appointment's status on behalf of its lawyer.
///
/// When the ledger knows the appointment, ownership and the transition are
/// checked locally and a same-state request returns `Unchanged` without a
/// round-trip. The ledger only changes after the backend accepts.
pub async fn update_status_data(
    client: &ApiClient,
    user: &User,
    ledger: &mut AppointmentLedger,
    appointment_id: &str,
    next: AppointmentStatus,
) -> Result<StatusChange, StatusUpdateError> {
    if user.role != Role::Lawyer {
        return Err(StatusUpdateError::NotLawyer);
    }

    if let Some(existing) = ledger.get(appointment_id) {
        if existing.lawyer_id != user.id {
            return Err(StatusUpdateError::NotOwner(appointment_id.to_string()));
        }
        if existing.status.transition(next)?.is_none() {
            tracing::debug!(
                "Appointment {} already {}, nothing to do",
                appointment_id,
                next
            );
            return Ok(StatusChange::Unchanged(existing.status));
        }
    }

    let path = format!("/api/appointments/{}/status", appointment_id);
    client
        .put_checked(&path, &serde_json::json!({ "status": next }))
        .await
        .map_err(|e| {
            tracing::warn!("Status update for {} failed: {}", appointment_id, e);
            e
        })?;

    ledger.set_status(appointment_id, next);
    tracing::info!("Appointment {} is now {}", appointment_id, next);
    Ok(StatusChange::Changed(next))
}

/// Book an appointment (prints to stdout).
pub async fn book(conn: &Connection, request: &BookingRequest) -> Result<Appointment> {
    let mut ledger = AppointmentLedger::new();
    let appointment = book_data(&conn.client, &mut ledger, request)
        .await
        .context("Booking failed")?;

    println!("Appointment booked.");
    println!("  ID:     {}", appointment.id);
    println!(
        "  Lawyer: {}",
        appointment
            .lawyer_name
            .as_deref()
            .unwrap_or(&appointment.lawyer_id)
    );
    println!("  When:   {} {}", appointment.date, appointment.time);
    println!("  Type:   {}", appointment.consultation_type.as_str());
    println!("  Status: {}", appointment.status);
    Ok(appointment)
}

/// Change an appointment's status (prints to stdout).
///
/// Seeds the ledger from the lawyer dashboard so the transition can be
/// validated before anything is sent.
pub async fn set_status(
    conn: &Connection,
    appointment_id: &str,
    next: AppointmentStatus,
) -> Result<()> {
    let user = conn
        .session
        .user()
        .context("Not logged in. Run 'debra-cli login' first.")?;

    let mut ledger = AppointmentLedger::new();
    if user.role == Role::Lawyer {
        match super::dashboard::lawyer_dashboard_data(&conn.client).await {
            Ok(dash) => ledger.replace_all(dash.recent_appointments),
            Err(e) => tracing::debug!("Could not prefetch appointments: {}", e),
        }
    }

    match update_status_data(&conn.client, user, &mut ledger, appointment_id, next).await? {
        StatusChange::Unchanged(s) => println!("Appointment {} is already {}.", appointment_id, s),
        StatusChange::Changed(s) => println!("Appointment {} is now {}.", appointment_id, s),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::test_server;
    use crate::auth::session::tests::user;
    use crate::models::{ConsultationType, UserStatus};

    fn booking() -> BookingRequest {
        BookingRequest {
            lawyer_id: "lawyer-1".to_string(),
            date: "2025-03-01".to_string(),
            time: "10:00".to_string(),
            consultation_type: ConsultationType::Video,
            notes: "Contract review".to_string(),
        }
    }

    fn created(id: &str, status: &str) -> String {
        format!(
            r#"{{"id":"{}","lawyer_id":"lawyer-1","lawyer_name":"Ahmed","client_id":"client-1",
                "date":"2025-03-01","time":"10:00","consultation_type":"video",
                "status":"{}","notes":"Contract review"}}"#,
            id, status
        )
    }

    #[tokio::test]
    async fn test_booking_appears_in_recent_list_as_pending() {
        let (base, server) = test_server::serve(vec![(200, created("a-1", "pending"))]).await;
        let client = ApiClient::new(base, Some("tok".to_string()));
        let mut ledger = AppointmentLedger::new();

        let appt = book_data(&client, &mut ledger, &booking()).await.unwrap();
        assert_eq!(appt.status, AppointmentStatus::Pending);

        let recent = ledger.recent(5);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, "a-1");
        assert_eq!(recent[0].lawyer_id, "lawyer-1");
        assert_eq!(recent[0].date, "2025-03-01");
        assert_eq!(recent[0].time, "10:00");
        assert_eq!(recent[0].status, AppointmentStatus::Pending);

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("POST /api/appointments "));
        assert!(requests[0].contains(r#""lawyer_id":"lawyer-1""#));
        assert!(requests[0].contains(r#""consultation_type":"video""#));
    }

    #[tokio::test]
    async fn test_booking_requires_session() {
        let client = ApiClient::new("http://unused.test", None);
        let mut ledger = AppointmentLedger::new();
        let err = book_data(&client, &mut ledger, &booking()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotAuthenticated));
        assert!(ledger.is_empty());
    }

    fn lawyer() -> User {
        let mut u = user(Role::Lawyer, UserStatus::Active);
        u.id = "lawyer-1".to_string();
        u
    }

    fn ledger_with(status: AppointmentStatus) -> AppointmentLedger {
        let mut ledger = AppointmentLedger::new();
        let mut a: Appointment = serde_json::from_str(&created("a-1", "pending")).unwrap();
        a.status = status;
        ledger.record(a);
        ledger
    }

    #[tokio::test]
    async fn test_confirm_then_confirm_again_is_noop() {
        let (base, server) =
            test_server::serve(vec![(200, r#"{"message":"ok"}"#.to_string())]).await;
        let client = ApiClient::new(base, Some("tok".to_string()));
        let mut ledger = ledger_with(AppointmentStatus::Pending);

        let first = update_status_data(
            &client,
            &lawyer(),
            &mut ledger,
            "a-1",
            AppointmentStatus::Confirmed,
        )
        .await
        .unwrap();
        assert_eq!(first, StatusChange::Changed(AppointmentStatus::Confirmed));
        assert_eq!(ledger.get("a-1").unwrap().status, AppointmentStatus::Confirmed);

        // The server only answers once; a second round-trip would fail.
        let second = update_status_data(
            &client,
            &lawyer(),
            &mut ledger,
            "a-1",
            AppointmentStatus::Confirmed,
        )
        .await
        .unwrap();
        assert_eq!(second, StatusChange::Unchanged(AppointmentStatus::Confirmed));

        let requests = server.await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("PUT /api/appointments/a-1/status "));
        assert!(requests[0].contains(r#"{"status":"confirmed"}"#));
    }

    #[tokio::test]
    async fn test_invalid_transition_rejected_before_request() {
        let client = ApiClient::new(test_server::dead_url().await, Some("tok".to_string()));
        let mut ledger = ledger_with(AppointmentStatus::Cancelled);

        let err = update_status_data(
            &client,
            &lawyer(),
            &mut ledger,
            "a-1",
            AppointmentStatus::Confirmed,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StatusUpdateError::Transition(_)));
        assert_eq!(ledger.get("a-1").unwrap().status, AppointmentStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_status() {
        let (base, _server) =
            test_server::serve(vec![(500, r#"{"detail":"update failed"}"#.to_string())]).await;
        let client = ApiClient::new(base, Some("tok".to_string()));
        let mut ledger = ledger_with(AppointmentStatus::Pending);

        let err = update_status_data(
            &client,
            &lawyer(),
            &mut ledger,
            "a-1",
            AppointmentStatus::Cancelled,
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "update failed");
        assert_eq!(ledger.get("a-1").unwrap().status, AppointmentStatus::Pending);
    }

    #[tokio::test]
    async fn test_only_owning_lawyer_may_update() {
        let client = ApiClient::new("http://unused.test", Some("tok".to_string()));
        let mut ledger = ledger_with(AppointmentStatus::Pending);

        let client_user = user(Role::Client, UserStatus::Active);
        let err = update_status_data(
            &client,
            &client_user,
            &mut ledger,
            "a-1",
            AppointmentStatus::Confirmed,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StatusUpdateError::NotLawyer));

        let mut other = lawyer();
        other.id = "lawyer-2".to_string();
        let err =
            update_status_data(&client, &other, &mut ledger, "a-1", AppointmentStatus::Confirmed)
                .await
                .unwrap_err();
        assert!(matches!(err, StatusUpdateError::NotOwner(_)));
    }
}
