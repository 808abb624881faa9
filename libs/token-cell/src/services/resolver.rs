use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_platform::PlatformClient;
use shared_utils::slot_time;

use crate::models::{AvailabilitySource, DegradedReason, SlotGrid, TokenAvailability, TokenSlot};
use crate::services::listing::AppointmentListingService;
use crate::services::status::TokenStatusService;

/// Resolves the token board for a doctor-hospital-day.
///
/// Sources are tried in order of trust: the token-status endpoint, then the
/// appointment listing, then nothing at all. The board always comes back;
/// a weaker source only changes the tag, never the shape.
pub struct TokenAvailabilityService {
    status: TokenStatusService,
    listing: AppointmentListingService,
    grid: SlotGrid,
}

impl TokenAvailabilityService {
    pub fn new(platform: Arc<PlatformClient>) -> Self {
        Self::with_grid(platform, SlotGrid::default())
    }

    pub fn with_grid(platform: Arc<PlatformClient>, grid: SlotGrid) -> Self {
        Self {
            status: TokenStatusService::new(platform.clone()),
            listing: AppointmentListingService::new(platform),
            grid,
        }
    }

    /// Resolve all `total_tokens` slots, numbered from 1, with booked state
    /// merged in from the best reachable source.
    ///
    /// Never fails. When the last fallback is reached every token is shown
    /// as available and the board is tagged `no-data-source`; the platform's
    /// conflict check remains the final arbiter at submission time.
    pub async fn resolve(
        &self,
        doctor_id: Uuid,
        hospital_id: Uuid,
        date: NaiveDate,
        total_tokens: u32,
    ) -> TokenAvailability {
        debug!(
            "Resolving {} tokens for doctor {} at hospital {} on {}",
            total_tokens, doctor_id, hospital_id, date
        );

        let (booked, source) = match self.status.booked_tokens(doctor_id, date).await {
            Ok(numbers) => {
                let booked: BTreeMap<u32, Option<String>> =
                    numbers.into_iter().map(|n| (n, None)).collect();
                (booked, AvailabilitySource::Authoritative)
            }
            Err(status_error) => {
                warn!(
                    "Token status endpoint unavailable for doctor {} on {}: {}; falling back to the appointment listing",
                    doctor_id, date, status_error
                );

                match self.listing.booked_tokens_for(doctor_id, date).await {
                    Ok(booked) => (
                        booked,
                        AvailabilitySource::Degraded {
                            reason: DegradedReason::EndpointUnavailable,
                        },
                    ),
                    Err(listing_error) => {
                        warn!(
                            "Appointment listing also failed for doctor {} on {}: {}; failing open with every token available",
                            doctor_id, date, listing_error
                        );
                        (
                            BTreeMap::new(),
                            AvailabilitySource::Degraded {
                                reason: DegradedReason::NoDataSource,
                            },
                        )
                    }
                }
            }
        };

        let slots = (1..=total_tokens)
            .map(|token_number| TokenSlot {
                token_number,
                display_time: slot_time::slot_display_time(
                    token_number,
                    self.grid.anchor,
                    self.grid.slot_minutes,
                ),
                is_booked: booked.contains_key(&token_number),
                holder_label: booked.get(&token_number).cloned().flatten(),
            })
            .collect();

        TokenAvailability {
            doctor_id,
            hospital_id,
            date,
            slots,
            source,
        }
    }
}
