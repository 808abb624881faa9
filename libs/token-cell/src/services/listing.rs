use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Method;
use tracing::debug;
use uuid::Uuid;

use shared_models::PlatformError;
use shared_platform::PlatformClient;

use crate::models::AppointmentRecord;

/// Client of the general appointment listing, used as the fallback source
/// when the token-status endpoint is unavailable.
pub struct AppointmentListingService {
    platform: Arc<PlatformClient>,
}

impl AppointmentListingService {
    pub fn new(platform: Arc<PlatformClient>) -> Self {
        Self { platform }
    }

    /// Raw appointment rows between two instants. The endpoint is not
    /// filtered by doctor; callers filter client-side.
    pub async fn appointments_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<AppointmentRecord>, PlatformError> {
        let path = format!(
            "/api/v1/appointments?from={}&to={}",
            urlencoding::encode(&from.to_rfc3339()),
            urlencoding::encode(&to.to_rfc3339())
        );

        self.platform.request(Method::GET, &path, None).await
    }

    /// Booked tokens for a doctor-day derived from the listing, keyed by
    /// token number with the holder's name where the row carries one.
    ///
    /// Rows for other doctors, cancelled rows (either spelling) and rows
    /// without a token number are skipped.
    pub async fn booked_tokens_for(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<BTreeMap<u32, Option<String>>, PlatformError> {
        debug!(
            "Deriving booked tokens from the appointment listing for doctor {} on {}",
            doctor_id, date
        );

        let start_of_day = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let end_of_day = date.and_hms_opt(23, 59, 59).unwrap().and_utc();

        let records = self.appointments_in_range(start_of_day, end_of_day).await?;

        let mut booked = BTreeMap::new();
        for record in records {
            if record.doctor_id != doctor_id || record.is_cancelled() {
                continue;
            }
            if record.appointment_date.date_naive() != date {
                continue;
            }
            if let Some(token_number) = record.token_number {
                booked.entry(token_number).or_insert(record.patient_name);
            }
        }

        Ok(booked)
    }
}
