//! Lawyer directory models

use serde::{Deserialize, Serialize};

/// Lawyer listing entry from `/api/lawyers`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lawyer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub specialization: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rating: f64,
    /// Consultation price in the platform currency
    #[serde(default)]
    pub price: f64,
    pub image: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub experience_years: u32,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub certificates: Vec<String>,
}

fn default_available() -> bool {
    true
}

/// A booked date/time pair reported by the availability endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookedSlot {
    pub date: String,
    pub time: String,
}

/// Availability for a single lawyer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Availability {
    pub lawyer_id: String,
    #[serde(default)]
    pub available_times: Vec<String>,
    #[serde(default)]
    pub booked_appointments: Vec<BookedSlot>,
}

impl Availability {
    /// Whether `time` on `date` is offered and not already booked.
    pub fn is_free(&self, date: &str, time: &str) -> bool {
        self.available_times.iter().any(|t| t == time)
            && !self
                .booked_appointments
                .iter()
                .any(|b| b.date == date && b.time == time)
    }
}

/// Filters accepted by `/api/search/lawyers`
#[derive(Debug, Default, Clone, Serialize)]
pub struct LawyerSearch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl LawyerSearch {
    pub fn is_empty(&self) -> bool {
        self.specialization.is_none()
            && self.min_rating.is_none()
            && self.max_price.is_none()
            && self.language.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_excludes_booked_slots() {
        let json = r#"{
            "lawyer_id": "l-1",
            "available_times": ["09:00", "10:00", "11:00"],
            "booked_appointments": [{"date": "2025-03-01", "time": "10:00"}]
        }"#;
        let avail: Availability = serde_json::from_str(json).unwrap();
        assert!(avail.is_free("2025-03-01", "09:00"));
        assert!(!avail.is_free("2025-03-01", "10:00"));
        assert!(avail.is_free("2025-03-02", "10:00"));
        assert!(!avail.is_free("2025-03-01", "18:00"));
    }

    #[test]
    fn test_lawyer_defaults() {
        let json = r#"{"id":"l-2","name":"Fatima","image":null}"#;
        let lawyer: Lawyer = serde_json::from_str(json).unwrap();
        assert!(lawyer.available);
        assert!(lawyer.languages.is_empty());
    }
}
