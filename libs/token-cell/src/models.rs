// libs/token-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// TOKEN BOARD MODELS
// ==============================================================================

/// One numbered slot on a doctor's daily token board.
///
/// Tokens are numbered from 1; the display time is derived from the slot
/// grid, not stored upstream. A slot is immutable once resolved; to see
/// newer booked state, resolve again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenSlot {
    pub token_number: u32,
    pub display_time: String,
    pub is_booked: bool,
    pub holder_label: Option<String>,
}

/// Where the booked-token data came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum AvailabilitySource {
    Authoritative,
    Degraded { reason: DegradedReason },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DegradedReason {
    #[serde(rename = "endpoint-unavailable")]
    EndpointUnavailable,
    #[serde(rename = "no-data-source")]
    NoDataSource,
}

impl fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradedReason::EndpointUnavailable => write!(f, "endpoint-unavailable"),
            DegradedReason::NoDataSource => write!(f, "no-data-source"),
        }
    }
}

/// Surfaced to callers when a board was built from anything other than the
/// token-status endpoint. Not an error: the board is still usable, the
/// booked flags are just weaker claims.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DegradedDataWarning {
    pub reason: DegradedReason,
    pub message: String,
}

/// The resolved token board for one doctor-hospital-day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenAvailability {
    pub doctor_id: Uuid,
    pub hospital_id: Uuid,
    pub date: NaiveDate,
    pub slots: Vec<TokenSlot>,
    pub source: AvailabilitySource,
}

impl TokenAvailability {
    pub fn is_degraded(&self) -> bool {
        matches!(self.source, AvailabilitySource::Degraded { .. })
    }

    pub fn warning(&self) -> Option<DegradedDataWarning> {
        match self.source {
            AvailabilitySource::Authoritative => None,
            AvailabilitySource::Degraded { reason } => Some(DegradedDataWarning {
                reason,
                message: match reason {
                    DegradedReason::EndpointUnavailable => {
                        "Token status endpoint unavailable; booked tokens derived from the appointment listing".to_string()
                    }
                    DegradedReason::NoDataSource => {
                        "No availability data source reachable; every token is shown as available".to_string()
                    }
                },
            }),
        }
    }

    pub fn slot(&self, token_number: u32) -> Option<&TokenSlot> {
        self.slots.iter().find(|slot| slot.token_number == token_number)
    }

    pub fn booked_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_booked).count()
    }

    pub fn first_available(&self) -> Option<&TokenSlot> {
        self.slots.iter().find(|slot| !slot.is_booked)
    }
}

// ==============================================================================
// SLOT GRID
// ==============================================================================

/// The daily token grid: token 1 sits on the anchor, each later token one
/// slot further.
#[derive(Debug, Clone)]
pub struct SlotGrid {
    pub anchor: NaiveTime,
    pub slot_minutes: u32,
}

impl Default for SlotGrid {
    fn default() -> Self {
        Self {
            anchor: NaiveTime::from_hms_opt(9, 0, 0).unwrap(), // clinic day opens at 09:00
            slot_minutes: 15,
        }
    }
}

// ==============================================================================
// PLATFORM WIRE MODELS
// ==============================================================================

/// Response of the dedicated token-status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenStatusResponse {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub booked_tokens: Vec<u32>,
}

/// One row of the general appointment listing. Only a subset of the row is
/// relevant here; legacy rows may lack a token number entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentRecord {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: DateTime<Utc>,
    pub token_number: Option<u32>,
    pub status: String,
    pub patient_name: Option<String>,
}

impl AppointmentRecord {
    /// Cancelled rows never block a token. Upstream data carries both
    /// spellings of the status.
    pub fn is_cancelled(&self) -> bool {
        self.status.eq_ignore_ascii_case("cancelled")
            || self.status.eq_ignore_ascii_case("canceled")
    }
}
