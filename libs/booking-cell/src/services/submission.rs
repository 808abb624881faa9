use std::sync::Arc;

use reqwest::Method;
use tracing::{info, warn};

use shared_models::PlatformError;
use shared_platform::PlatformClient;

use crate::error::BookingError;
use crate::models::{BookingConfirmation, BookingRequest};

/// Hands one booking request to the platform.
///
/// Exactly one POST per call and no retry logic of any kind: a failed
/// submission may still have landed server-side, so retrying is the
/// caller's explicit decision, never this service's.
pub struct BookingSubmissionService {
    platform: Arc<PlatformClient>,
}

impl BookingSubmissionService {
    pub fn new(platform: Arc<PlatformClient>) -> Self {
        Self { platform }
    }

    /// Submit the booking and map the platform's answer into the workflow's
    /// vocabulary: 409 means the token race was lost, 400/422 means the
    /// payload was refused, anything else is a transport-level failure.
    pub async fn submit(
        &self,
        request: &BookingRequest,
    ) -> Result<BookingConfirmation, BookingError> {
        info!(
            "Submitting booking for doctor {} token {} at {}",
            request.doctor_id, request.token_number, request.appointment_timestamp
        );

        let body = serde_json::to_value(request)
            .map_err(|e| BookingError::Validation(e.to_string()))?;

        let confirmation: BookingConfirmation = self
            .platform
            .request(Method::POST, "/api/v1/appointments", Some(body))
            .await
            .map_err(|e| match e {
                PlatformError::Conflict(message) => {
                    warn!("Token {} lost the booking race: {}", request.token_number, message);
                    BookingError::Conflict
                }
                PlatformError::Validation(message) => BookingError::Validation(message),
                other => BookingError::Network(other.to_string()),
            })?;

        info!(
            "Booking confirmed: appointment {} ({})",
            confirmation.appointment_id, confirmation.status
        );
        Ok(confirmation)
    }
}
