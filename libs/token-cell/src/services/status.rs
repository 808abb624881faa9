use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::Method;
use tracing::debug;
use uuid::Uuid;

use shared_models::PlatformError;
use shared_platform::PlatformClient;

use crate::models::TokenStatusResponse;

/// Client of the dedicated token-status endpoint, the authoritative source
/// for booked token numbers.
pub struct TokenStatusService {
    platform: Arc<PlatformClient>,
}

impl TokenStatusService {
    pub fn new(platform: Arc<PlatformClient>) -> Self {
        Self { platform }
    }

    /// Booked token numbers for a doctor-day.
    pub async fn booked_tokens(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<BTreeSet<u32>, PlatformError> {
        debug!("Fetching token status for doctor {} on {}", doctor_id, date);

        let path = format!(
            "/api/v1/doctors/{}/token-status?date={}",
            doctor_id,
            date.format("%Y-%m-%d")
        );

        let response: TokenStatusResponse = self.platform
            .request(Method::GET, &path, None)
            .await?;

        Ok(response.booked_tokens.into_iter().collect())
    }
}
