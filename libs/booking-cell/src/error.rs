use thiserror::Error;

use shared_utils::slot_time::SlotTimeError;

use crate::models::BookingStep;

/// Everything the booking workflow can refuse or fail with.
///
/// The first four variants are the validator's vocabulary and never leave
/// the client. `Conflict`, `Validation` and `Network` are submission
/// outcomes: `Conflict` means pick another token, `Network` means the
/// request may or may not have landed and must not be retried blindly.
/// Read-path failures never appear here; the availability resolver degrades
/// instead of failing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookingError {
    #[error("No token selected")]
    NoTokenSelected,

    #[error("Token is already booked")]
    TokenAlreadyBooked,

    #[error("Selected slot is too far in the past")]
    PastDate,

    #[error("Invalid slot time: {0}")]
    InvalidTime(String),

    #[error("Token {0} does not exist on the current board")]
    UnknownToken(u32),

    #[error("Cannot proceed from step {step}: missing {missing}")]
    StepPrecondition { step: BookingStep, missing: String },

    #[error("A submission is already in flight")]
    SubmissionInFlight,

    #[error("Token was claimed by another booking")]
    Conflict,

    #[error("Booking rejected by the platform: {0}")]
    Validation(String),

    #[error("Network error during submission: {0}")]
    Network(String),
}

impl From<SlotTimeError> for BookingError {
    fn from(err: SlotTimeError) -> Self {
        match err {
            SlotTimeError::InvalidTimeFormat(raw) => BookingError::InvalidTime(raw),
        }
    }
}
