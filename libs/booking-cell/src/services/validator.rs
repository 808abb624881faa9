use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use shared_utils::slot_time;

use crate::error::BookingError;
use crate::models::{BookingPolicy, BookingSelection};

/// Pre-submission checks for a booking selection.
///
/// The rules run in a fixed order: token present, token not booked, slot
/// time decodes to a real instant, instant not before the grace window.
/// A malformed display time therefore always surfaces as `InvalidTime`,
/// never as a spurious `PastDate` computed from garbage.
///
/// The booked-token rule is an optimistic check against the availability
/// snapshot; the platform's conflict check at submission time stays the
/// final arbiter.
pub struct ReservationValidator {
    policy: BookingPolicy,
}

impl ReservationValidator {
    pub fn new() -> Self {
        Self::with_policy(BookingPolicy::default())
    }

    pub fn with_policy(policy: BookingPolicy) -> Self {
        Self { policy }
    }

    /// Validate against the current wall clock. Returns the canonical slot
    /// instant so callers build the submission from the value they validated.
    pub fn validate(&self, selection: &BookingSelection) -> Result<DateTime<Utc>, BookingError> {
        self.validate_at(selection, Utc::now())
    }

    /// Validate against an explicit current time.
    pub fn validate_at(
        &self,
        selection: &BookingSelection,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, BookingError> {
        let token = selection.token.as_ref().ok_or(BookingError::NoTokenSelected)?;

        if token.is_booked {
            debug!("Rejecting token {}: already booked in the snapshot", token.token_number);
            return Err(BookingError::TokenAlreadyBooked);
        }

        // A token without a date is a broken selection chain; the timestamp
        // cannot even be derived.
        let date = selection.date.ok_or_else(|| {
            BookingError::InvalidTime("selection has a token but no date".to_string())
        })?;

        let time_24 = slot_time::to_24_hour(&token.display_time)?;
        let timestamp = slot_time::combine(date, &time_24)?;

        let earliest_accepted = now - Duration::hours(self.policy.past_grace_hours);
        if timestamp < earliest_accepted {
            debug!(
                "Rejecting slot at {}: earlier than the {}h grace window",
                timestamp, self.policy.past_grace_hours
            );
            return Err(BookingError::PastDate);
        }

        Ok(timestamp)
    }
}

impl Default for ReservationValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;
    use uuid::Uuid;

    use token_cell::models::TokenSlot;

    use crate::models::{AppointmentType, DoctorRef, HospitalRef};

    fn slot(number: u32, display_time: &str, is_booked: bool) -> TokenSlot {
        TokenSlot {
            token_number: number,
            display_time: display_time.to_string(),
            is_booked,
            holder_label: None,
        }
    }

    fn selection_with(token: Option<TokenSlot>, date: Option<NaiveDate>) -> BookingSelection {
        BookingSelection {
            doctor: Some(DoctorRef {
                id: Uuid::new_v4(),
                name: "Dr. Rao".to_string(),
            }),
            hospital: Some(HospitalRef {
                id: Uuid::new_v4(),
                name: "Lakeside Clinic".to_string(),
                daily_token_capacity: 20,
            }),
            date,
            token,
            appointment_type: Some(AppointmentType::Consultation),
            notes: None,
        }
    }

    fn noon_utc(date: NaiveDate) -> DateTime<Utc> {
        date.and_hms_opt(12, 0, 0).unwrap().and_utc()
    }

    #[test]
    fn test_missing_token_is_rejected_first() {
        let validator = ReservationValidator::new();
        let selection = selection_with(None, NaiveDate::from_ymd_opt(2025, 3, 14));

        assert_matches!(
            validator.validate_at(&selection, noon_utc(NaiveDate::from_ymd_opt(2025, 3, 14).unwrap())),
            Err(BookingError::NoTokenSelected)
        );
    }

    #[test]
    fn test_booked_token_is_rejected() {
        let validator = ReservationValidator::new();
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let selection = selection_with(Some(slot(7, "10:30 AM", true)), Some(date));

        assert_matches!(
            validator.validate_at(&selection, noon_utc(date)),
            Err(BookingError::TokenAlreadyBooked)
        );
    }

    #[test]
    fn test_every_booked_token_on_a_board_is_rejected() {
        let validator = ReservationValidator::new();
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();

        for number in [3, 7, 19] {
            let selection = selection_with(Some(slot(number, "9:00 AM", true)), Some(date));
            assert_matches!(
                validator.validate_at(&selection, noon_utc(date)),
                Err(BookingError::TokenAlreadyBooked),
                "booked token {number} must be rejected"
            );
        }
    }

    #[test]
    fn test_malformed_display_time_is_invalid_not_past() {
        let validator = ReservationValidator::new();
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let selection = selection_with(Some(slot(1, "quarter past nine", false)), Some(date));

        // The codec failure must win over any past-date conclusion.
        assert_matches!(
            validator.validate_at(&selection, noon_utc(date)),
            Err(BookingError::InvalidTime(raw)) if raw.contains("quarter past nine")
        );
    }

    #[test]
    fn test_token_without_date_is_invalid_time() {
        let validator = ReservationValidator::new();
        let selection = selection_with(Some(slot(1, "9:00 AM", false)), None);

        assert_matches!(
            validator.validate_at(&selection, Utc::now()),
            Err(BookingError::InvalidTime(_))
        );
    }

    #[test]
    fn test_grace_window_boundary_is_inclusive() {
        let validator = ReservationValidator::new();
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let selection = selection_with(Some(slot(1, "9:00 AM", false)), Some(date));

        // Slot instant is 2025-03-14T09:00:00Z; exactly 24h later is the
        // last moment the selection is still accepted.
        let boundary = noon_utc(date) - Duration::hours(3) + Duration::hours(24);
        assert_eq!(
            validator.validate_at(&selection, boundary).unwrap(),
            date.and_hms_opt(9, 0, 0).unwrap().and_utc()
        );

        let one_second_past = boundary + Duration::seconds(1);
        assert_matches!(
            validator.validate_at(&selection, one_second_past),
            Err(BookingError::PastDate)
        );
    }

    #[test]
    fn test_valid_selection_returns_canonical_timestamp() {
        let validator = ReservationValidator::new();
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let selection = selection_with(Some(slot(17, "1:00 PM", false)), Some(date));

        let timestamp = validator
            .validate_at(&selection, noon_utc(date))
            .unwrap();
        assert_eq!(timestamp, date.and_hms_opt(13, 0, 0).unwrap().and_utc());
    }

    #[test]
    fn test_custom_grace_window_is_honored() {
        let policy = BookingPolicy {
            past_grace_hours: 0,
            ..Default::default()
        };
        let validator = ReservationValidator::with_policy(policy);
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let selection = selection_with(Some(slot(1, "9:00 AM", false)), Some(date));

        let slot_instant = date.and_hms_opt(9, 0, 0).unwrap().and_utc();
        assert!(validator.validate_at(&selection, slot_instant).is_ok());
        assert_matches!(
            validator.validate_at(&selection, slot_instant + Duration::seconds(1)),
            Err(BookingError::PastDate)
        );
    }
}
