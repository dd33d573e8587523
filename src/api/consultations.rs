//! Consultation session endpoints

use serde::Serialize;

use super::client::{ApiClient, ApiError};
use crate::models::{Consultation, ConsultationStatus, ConsultationType, Message};

#[derive(Debug, Serialize)]
struct StartRequest<'a> {
    lawyer_id: &'a str,
    consultation_type: ConsultationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct MessageBody<'a> {
    sender: &'static str,
    content: &'a str,
    message_type: &'static str,
}

/// Open a consultation with a lawyer.
pub async fn start_data(
    client: &ApiClient,
    lawyer_id: &str,
    consultation_type: ConsultationType,
    client_id: Option<&str>,
) -> Result<Consultation, ApiError> {
    let body = StartRequest {
        lawyer_id,
        consultation_type,
        client_id,
    };
    let consultation: Consultation = client.post("/api/consultations", &body).await?;
    tracing::info!(
        "Consultation {} started with {}",
        consultation.id,
        consultation.lawyer_id
    );
    Ok(consultation)
}

pub async fn set_status_data(
    client: &ApiClient,
    consultation_id: &str,
    status: ConsultationStatus,
) -> Result<(), ApiError> {
    client
        .put_checked(
            &format!("/api/consultations/{}/status", consultation_id),
            &serde_json::json!({ "status": status }),
        )
        .await
}

/// Append a message to the consultation record on the backend.
pub async fn post_message_data(
    client: &ApiClient,
    consultation_id: &str,
    message: &Message,
) -> Result<(), ApiError> {
    let body = MessageBody {
        sender: message.sender.as_str(),
        content: &message.text,
        message_type: "text",
    };
    let _: serde_json::Value = client
        .post(
            &format!("/api/consultations/{}/messages", consultation_id),
            &body,
        )
        .await?;
    Ok(())
}
