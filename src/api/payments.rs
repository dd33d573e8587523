//! Payment initiation. The gateway itself is reached through the returned URL.

use anyhow::{bail, Result};
use thiserror::Error;

use super::client::{ApiClient, ApiError};
use super::Connection;
use crate::models::{PaymentRequest, PaymentResponse, PaymentSettings, ValidationError};

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Payment could not be created: {0}")]
    Rejected(String),
}

/// Fetch payment limits, falling back to the platform defaults.
pub async fn settings_data(client: &ApiClient) -> PaymentSettings {
    match client.get("/api/payments/settings").await {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("Could not load payment settings, using defaults: {}", e);
            PaymentSettings::default()
        }
    }
}

/// Validate and create a payment session, returning the redirect URL.
pub async fn create_payment_data(
    client: &ApiClient,
    settings: &PaymentSettings,
    request: &PaymentRequest,
) -> Result<String, PaymentError> {
    request.validate(settings)?;
    client.require_token()?;

    let resp: PaymentResponse = client.post("/api/payments/create", request).await?;
    match resp {
        PaymentResponse {
            success: true,
            payment_url: Some(url),
            invoice_id,
            ..
        } => {
            tracing::info!(
                "Payment session created for appointment {} (invoice {})",
                request.appointment_id,
                invoice_id.as_deref().unwrap_or("?")
            );
            Ok(url)
        }
        PaymentResponse { error, .. } => Err(PaymentError::Rejected(
            error.unwrap_or_else(|| "no payment URL returned".to_string()),
        )),
    }
}

/// Create a payment session and print the URL to open.
pub async fn pay(conn: &Connection, request: &PaymentRequest) -> Result<()> {
    let settings = settings_data(&conn.client).await;
    match create_payment_data(&conn.client, &settings, request).await {
        Ok(url) => {
            println!("Open this URL to complete the payment:");
            println!("  {}", url);
            Ok(())
        }
        Err(e) => bail!("{}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::test_server;
    use crate::models::ConsultationType;

    fn request() -> PaymentRequest {
        PaymentRequest {
            appointment_id: "a-1".to_string(),
            amount: 300.0,
            customer_name: "Omar".to_string(),
            customer_email: "omar@example.com".to_string(),
            customer_mobile: "512345678".to_string(),
            consultation_type: ConsultationType::Chat,
            lawyer_name: "Ahmed".to_string(),
        }
    }

    #[tokio::test]
    async fn test_success_returns_redirect_url() {
        let body = r#"{"success":true,"payment_url":"https://pay.example/inv/1","invoice_id":"1","currency":"SAR"}"#;
        let (base, server) = test_server::serve(vec![(200, body.to_string())]).await;
        let client = ApiClient::new(base, Some("tok".to_string()));

        let url = create_payment_data(&client, &PaymentSettings::default(), &request())
            .await
            .unwrap();
        assert_eq!(url, "https://pay.example/inv/1");

        let requests = server.await.unwrap();
        assert!(requests[0].contains(r#""customer_mobile":"512345678""#));
    }

    #[tokio::test]
    async fn test_gateway_rejection_surfaces_error() {
        let body = r#"{"success":false,"error":"Gateway unavailable"}"#;
        let (base, _server) = test_server::serve(vec![(200, body.to_string())]).await;
        let client = ApiClient::new(base, Some("tok".to_string()));

        let err = create_payment_data(&client, &PaymentSettings::default(), &request())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Payment could not be created: Gateway unavailable");
    }

    #[tokio::test]
    async fn test_invalid_mobile_never_reaches_backend() {
        let client = ApiClient::new(test_server::dead_url().await, Some("tok".to_string()));
        let mut r = request();
        r.customer_mobile = "12345".to_string();
        let err = create_payment_data(&client, &PaymentSettings::default(), &r)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Invalid(ValidationError::InvalidMobile)));
    }

    #[tokio::test]
    async fn test_settings_fall_back_to_defaults() {
        let client = ApiClient::new(test_server::dead_url().await, None);
        assert_eq!(settings_data(&client).await, PaymentSettings::default());
    }
}
