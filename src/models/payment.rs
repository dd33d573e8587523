//! Payment models

use serde::{Deserialize, Serialize};

use super::{is_valid_mobile, ConsultationType, ValidationError};

/// Limits published by `/api/payments/settings`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSettings {
    pub min_amount: f64,
    pub max_amount: f64,
    pub currency: String,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            min_amount: 50.0,
            max_amount: 50000.0,
            currency: "SAR".to_string(),
        }
    }
}

/// Body of `POST /api/payments/create`
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    pub appointment_id: String,
    pub amount: f64,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_mobile: String,
    pub consultation_type: ConsultationType,
    pub lawyer_name: String,
}

/// Response of `POST /api/payments/create`
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentResponse {
    pub success: bool,
    pub payment_url: Option<String>,
    pub invoice_id: Option<String>,
    pub error: Option<String>,
}

impl PaymentRequest {
    pub fn validate(&self, settings: &PaymentSettings) -> Result<(), ValidationError> {
        if self.customer_name.trim().is_empty() {
            return Err(ValidationError::Missing("customer name"));
        }
        if self.customer_email.trim().is_empty() {
            return Err(ValidationError::Missing("customer email"));
        }
        if self.customer_mobile.trim().is_empty() {
            return Err(ValidationError::Missing("customer mobile"));
        }
        if !is_valid_mobile(&self.customer_mobile) {
            return Err(ValidationError::InvalidMobile);
        }
        if self.amount < settings.min_amount || self.amount > settings.max_amount {
            return Err(ValidationError::AmountOutOfRange {
                amount: self.amount,
                min: settings.min_amount,
                max: settings.max_amount,
            });
        }
        Ok(())
    }
}
