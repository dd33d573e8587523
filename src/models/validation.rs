//! Field validation shared by registration and payment forms

use thiserror::Error;

/// Local validation failures, checked before any request is sent.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("mobile number must be a Saudi number like 512345678")]
    InvalidMobile,
    #[error("amount {amount} is outside the allowed range {min}..={max}")]
    AmountOutOfRange { amount: f64, min: f64, max: f64 },
    #[error("{field} must be between {min} and {max} characters")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
    },
    #[error("admin accounts cannot be self-registered")]
    AdminRegistration,
}

/// Matches `^5[0-9]{8}$`.
pub fn is_valid_mobile(mobile: &str) -> bool {
    mobile.len() == 9
        && mobile.starts_with('5')
        && mobile.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mobile_pattern() {
        assert!(is_valid_mobile("512345678"));
        assert!(!is_valid_mobile("412345678"));
        assert!(!is_valid_mobile("51234567"));
        assert!(!is_valid_mobile("5123456789"));
        assert!(!is_valid_mobile("51234567a"));
    }
}
