use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;

pub struct TestConfig {
    pub platform_api_url: String,
    pub platform_api_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            platform_api_url: "http://localhost:8090".to_string(),
            platform_api_key: "test-api-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            platform_api_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            platform_api_url: self.platform_api_url.clone(),
            platform_api_key: self.platform_api_key.clone(),
        }
    }

}

pub struct MockPlatformResponses;

impl MockPlatformResponses {
    pub fn token_status_response(doctor_id: &str, date: NaiveDate, booked: &[u32]) -> serde_json::Value {
        json!({
            "doctor_id": doctor_id,
            "date": date.format("%Y-%m-%d").to_string(),
            "booked_tokens": booked,
        })
    }

    pub fn appointment_record(
        doctor_id: &str,
        date: NaiveDate,
        token_number: u32,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "doctor_id": doctor_id,
            "appointment_date": format!("{}T09:00:00Z", date.format("%Y-%m-%d")),
            "token_number": token_number,
            "status": status,
            "patient_name": "Test Patient",
        })
    }

    pub fn untokened_appointment_record(doctor_id: &str, date: NaiveDate, status: &str) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "doctor_id": doctor_id,
            "appointment_date": format!("{}T09:00:00Z", date.format("%Y-%m-%d")),
            "token_number": null,
            "status": status,
            "patient_name": null,
        })
    }

    pub fn booking_confirmation_response(token_number: u32, timestamp: &str) -> serde_json::Value {
        json!({
            "appointment_id": Uuid::new_v4(),
            "status": "pending",
            "appointment_timestamp": timestamp,
            "token_number": token_number,
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "error": {
                "message": message,
                "code": code
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.platform_api_url, "http://localhost:8090");
        assert_eq!(app_config.platform_api_key, "test-api-key");
        assert!(app_config.is_configured());
    }

    #[test]
    fn test_config_with_base_url_override() {
        let config = TestConfig::with_base_url("http://127.0.0.1:9999");
        assert_eq!(config.to_app_config().platform_api_url, "http://127.0.0.1:9999");
    }

    #[test]
    fn test_appointment_record_shape() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let record = MockPlatformResponses::appointment_record("doc-1", date, 3, "confirmed");

        assert_eq!(record["token_number"], 3);
        assert_eq!(record["appointment_date"], "2025-03-14T09:00:00Z");
        assert_eq!(record["status"], "confirmed");
    }
}
