// libs/shared/utils/src/slot_time.rs
//
// Wall-clock codec for the token board. Token slots are displayed in
// 12-hour clinic time ("9:15 AM") but the platform API speaks 24-hour
// strings and UTC instants; every conversion between the two lives here.
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SlotTimeError {
    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),
}

/// Convert a 12-hour display time ("h:mm AM|PM") to a 24-hour "HH:MM" string.
///
/// Midnight and noon follow clock convention: "12:00 AM" is "00:00" and
/// "12:00 PM" stays "12:00". A missing or unparseable AM/PM marker is an
/// error; defaulting it would shift afternoon slots by twelve hours.
pub fn to_24_hour(display: &str) -> Result<String, SlotTimeError> {
    let parsed = NaiveTime::parse_from_str(display.trim(), "%I:%M %p")
        .map_err(|_| SlotTimeError::InvalidTimeFormat(display.to_string()))?;

    Ok(parsed.format("%H:%M").to_string())
}

/// Combine a calendar date with a 24-hour "HH:MM" string into a UTC instant.
///
/// The result carries the given wall-clock fields verbatim; combining
/// never shifts the day.
pub fn combine(date: NaiveDate, time_24: &str) -> Result<DateTime<Utc>, SlotTimeError> {
    let time = NaiveTime::parse_from_str(time_24.trim(), "%H:%M")
        .map_err(|_| SlotTimeError::InvalidTimeFormat(time_24.to_string()))?;

    Ok(date.and_time(time).and_utc())
}

/// Display time for the n-th token on a slot grid.
///
/// Token 1 sits on the anchor; each following token is one slot later.
/// The addition wraps across noon and midnight.
pub fn slot_display_time(token_number: u32, anchor: NaiveTime, slot_minutes: u32) -> String {
    let offset = token_number.saturating_sub(1) as i64 * slot_minutes as i64;
    let slot = anchor + Duration::minutes(offset);

    slot.format("%-I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn nine_am() -> NaiveTime {
        NaiveTime::from_hms_opt(9, 0, 0).unwrap()
    }

    #[test]
    fn test_to_24_hour_handles_midnight_noon_and_afternoon() {
        assert_eq!(to_24_hour("12:00 AM").unwrap(), "00:00");
        assert_eq!(to_24_hour("12:00 PM").unwrap(), "12:00");
        assert_eq!(to_24_hour("1:30 PM").unwrap(), "13:30");
    }

    #[test]
    fn test_to_24_hour_morning_times_pass_through() {
        assert_eq!(to_24_hour("9:05 AM").unwrap(), "09:05");
        assert_eq!(to_24_hour("11:59 PM").unwrap(), "23:59");
    }

    #[test]
    fn test_to_24_hour_accepts_lowercase_marker_and_padding() {
        assert_eq!(to_24_hour("1:30 pm").unwrap(), "13:30");
        assert_eq!(to_24_hour("09:00 AM").unwrap(), "09:00");
        assert_eq!(to_24_hour("  10:15 AM  ").unwrap(), "10:15");
    }

    #[test]
    fn test_to_24_hour_rejects_malformed_input() {
        for bad in ["", "930", "9:00", "13:30 PM", "12:60 AM", "noon", "9:00 XM"] {
            assert_matches!(
                to_24_hour(bad),
                Err(SlotTimeError::InvalidTimeFormat(_)),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_combine_preserves_wall_clock_fields() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let combined = combine(date, "13:30").unwrap();

        assert_eq!(combined.date_naive(), date);
        assert_eq!(combined.to_rfc3339(), "2025-03-14T13:30:00+00:00");
    }

    #[test]
    fn test_combine_rejects_malformed_input() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();

        for bad in ["25:00", "i3:00", "13:30:00", "1 PM", ""] {
            assert_matches!(
                combine(date, bad),
                Err(SlotTimeError::InvalidTimeFormat(_)),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_slot_display_time_on_default_grid() {
        assert_eq!(slot_display_time(1, nine_am(), 15), "9:00 AM");
        assert_eq!(slot_display_time(5, nine_am(), 15), "10:00 AM");
        assert_eq!(slot_display_time(13, nine_am(), 15), "12:00 PM");
        assert_eq!(slot_display_time(17, nine_am(), 15), "1:00 PM");
    }

    #[test]
    fn test_slot_display_time_wraps_across_noon_and_midnight() {
        let late_morning = NaiveTime::from_hms_opt(11, 45, 0).unwrap();
        assert_eq!(slot_display_time(2, late_morning, 15), "12:00 PM");

        let late_night = NaiveTime::from_hms_opt(23, 45, 0).unwrap();
        assert_eq!(slot_display_time(2, late_night, 15), "12:00 AM");
    }

    #[test]
    fn test_grid_projection_is_non_decreasing_within_a_day() {
        let mut previous = String::new();
        for n in 1..=20 {
            let in_24 = to_24_hour(&slot_display_time(n, nine_am(), 15)).unwrap();
            assert!(in_24 >= previous, "token {n} went backwards: {in_24} < {previous}");
            previous = in_24;
        }
    }

    #[test]
    fn test_display_round_trips_through_codec() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        for n in [1, 7, 13, 20] {
            let display = slot_display_time(n, nine_am(), 15);
            let combined = combine(date, &to_24_hour(&display).unwrap()).unwrap();
            let expected = date
                .and_time(nine_am() + Duration::minutes((n as i64 - 1) * 15))
                .and_utc();

            assert_eq!(combined, expected, "token {n} did not round-trip");
        }
    }
}
