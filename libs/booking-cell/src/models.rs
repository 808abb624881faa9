// libs/booking-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use token_cell::models::{SlotGrid, TokenSlot};

use crate::error::BookingError;

// ==============================================================================
// SELECTION REFERENCES
// ==============================================================================

/// Doctor as the booking workflow sees one: enough to identify and display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorRef {
    pub id: Uuid,
    pub name: String,
}

/// Hospital as the booking workflow sees one. The daily token capacity is
/// what drives how many slots the availability resolver emits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HospitalRef {
    pub id: Uuid,
    pub name: String,
    pub daily_token_capacity: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentType {
    Consultation,
    FollowUp,
    RoutineCheckup,
    SpecialistVisit,
    Emergency,
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentType::Consultation => write!(f, "CONSULTATION"),
            AppointmentType::FollowUp => write!(f, "FOLLOW_UP"),
            AppointmentType::RoutineCheckup => write!(f, "ROUTINE_CHECKUP"),
            AppointmentType::SpecialistVisit => write!(f, "SPECIALIST_VISIT"),
            AppointmentType::Emergency => write!(f, "EMERGENCY"),
        }
    }
}

impl FromStr for AppointmentType {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "CONSULTATION" => Ok(AppointmentType::Consultation),
            "FOLLOW_UP" => Ok(AppointmentType::FollowUp),
            "ROUTINE_CHECKUP" => Ok(AppointmentType::RoutineCheckup),
            "SPECIALIST_VISIT" => Ok(AppointmentType::SpecialistVisit),
            "EMERGENCY" => Ok(AppointmentType::Emergency),
            other => Err(BookingError::Validation(format!(
                "Unknown appointment type: {other}"
            ))),
        }
    }
}

// ==============================================================================
// WORKFLOW STATE
// ==============================================================================

/// The six steps of the booking workflow, in dependency order. Each step's
/// selection depends on everything before it; the derived ordering is the
/// dependency ordering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum BookingStep {
    SelectDoctor,
    SelectHospital,
    SelectDate,
    SelectToken,
    SelectType,
    Confirm,
}

impl BookingStep {
    pub fn next(&self) -> Option<BookingStep> {
        match self {
            BookingStep::SelectDoctor => Some(BookingStep::SelectHospital),
            BookingStep::SelectHospital => Some(BookingStep::SelectDate),
            BookingStep::SelectDate => Some(BookingStep::SelectToken),
            BookingStep::SelectToken => Some(BookingStep::SelectType),
            BookingStep::SelectType => Some(BookingStep::Confirm),
            BookingStep::Confirm => None,
        }
    }

    pub fn previous(&self) -> Option<BookingStep> {
        match self {
            BookingStep::SelectDoctor => None,
            BookingStep::SelectHospital => Some(BookingStep::SelectDoctor),
            BookingStep::SelectDate => Some(BookingStep::SelectHospital),
            BookingStep::SelectToken => Some(BookingStep::SelectDate),
            BookingStep::SelectType => Some(BookingStep::SelectToken),
            BookingStep::Confirm => Some(BookingStep::SelectType),
        }
    }

    /// The selection field this step exists to fill, if any.
    pub fn required_field(&self) -> Option<&'static str> {
        match self {
            BookingStep::SelectDoctor => Some("doctor"),
            BookingStep::SelectHospital => Some("hospital"),
            BookingStep::SelectDate => Some("date"),
            BookingStep::SelectToken => Some("token"),
            BookingStep::SelectType => Some("appointment type"),
            BookingStep::Confirm => None,
        }
    }
}

impl fmt::Display for BookingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStep::SelectDoctor => write!(f, "select_doctor"),
            BookingStep::SelectHospital => write!(f, "select_hospital"),
            BookingStep::SelectDate => write!(f, "select_date"),
            BookingStep::SelectToken => write!(f, "select_token"),
            BookingStep::SelectType => write!(f, "select_type"),
            BookingStep::Confirm => write!(f, "confirm"),
        }
    }
}

/// The in-progress booking session. Owned by the workflow, mutated one step
/// at a time, reset to empty on submission or cancellation.
///
/// Invariant: a set field implies every field before it in the
/// doctor → hospital → date → token chain is also set. `appointment_type`
/// sits outside the strict chain: it survives upstream changes as stale
/// state and is re-validated at confirmation.
#[derive(Debug, Clone, Default)]
pub struct BookingSelection {
    pub doctor: Option<DoctorRef>,
    pub hospital: Option<HospitalRef>,
    pub date: Option<NaiveDate>,
    pub token: Option<TokenSlot>,
    pub appointment_type: Option<AppointmentType>,
    pub notes: Option<String>,
}

impl BookingSelection {
    /// True when no set field in the doctor → hospital → date → token chain
    /// follows an unset one.
    pub fn chain_is_consistent(&self) -> bool {
        let chain = [
            self.doctor.is_some(),
            self.hospital.is_some(),
            self.date.is_some(),
            self.token.is_some(),
        ];
        chain.windows(2).all(|pair| pair[0] || !pair[1])
    }
}

// ==============================================================================
// SUBMISSION MODELS
// ==============================================================================

/// The wire payload for one booking attempt. Built exactly once per
/// confirmation, from an already-validated selection; a retry is a new
/// confirmation and a new request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingRequest {
    pub doctor_id: Uuid,
    pub appointment_type: AppointmentType,
    pub appointment_timestamp: DateTime<Utc>,
    pub duration_minutes: i32,
    pub token_number: u32,
    pub location: String,
    pub notes: Option<String>,
}

/// The created-appointment reference the platform returns on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub appointment_id: Uuid,
    pub status: String,
    pub appointment_timestamp: DateTime<Utc>,
    pub token_number: u32,
}

// ==============================================================================
// POLICY
// ==============================================================================

/// Validation and request-building knobs for the booking workflow.
#[derive(Debug, Clone)]
pub struct BookingPolicy {
    pub past_grace_hours: i64,
    pub default_duration_minutes: i32,
    pub slot_grid: SlotGrid,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            past_grace_hours: 24, // absorbs timezone skew between client and clinic
            default_duration_minutes: 30,
            slot_grid: SlotGrid::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dr_mehta() -> DoctorRef {
        DoctorRef {
            id: Uuid::new_v4(),
            name: "Dr. Mehta".to_string(),
        }
    }

    fn city_hospital() -> HospitalRef {
        HospitalRef {
            id: Uuid::new_v4(),
            name: "City Hospital".to_string(),
            daily_token_capacity: 20,
        }
    }

    fn token(number: u32) -> TokenSlot {
        TokenSlot {
            token_number: number,
            display_time: "9:00 AM".to_string(),
            is_booked: false,
            holder_label: None,
        }
    }

    #[test]
    fn test_steps_walk_forward_and_back_in_order() {
        let forward: Vec<BookingStep> =
            std::iter::successors(Some(BookingStep::SelectDoctor), |step| step.next()).collect();

        assert_eq!(
            forward,
            vec![
                BookingStep::SelectDoctor,
                BookingStep::SelectHospital,
                BookingStep::SelectDate,
                BookingStep::SelectToken,
                BookingStep::SelectType,
                BookingStep::Confirm,
            ]
        );
        assert!(forward.windows(2).all(|pair| pair[0] < pair[1]));

        for pair in forward.windows(2) {
            assert_eq!(pair[1].previous(), Some(pair[0]));
        }
        assert_eq!(BookingStep::SelectDoctor.previous(), None);
        assert_eq!(BookingStep::Confirm.next(), None);
    }

    #[test]
    fn test_every_step_before_confirm_names_its_field() {
        assert_eq!(BookingStep::SelectDoctor.required_field(), Some("doctor"));
        assert_eq!(BookingStep::SelectType.required_field(), Some("appointment type"));
        assert_eq!(BookingStep::Confirm.required_field(), None);
    }

    #[test]
    fn test_chain_consistency_holds_for_ordered_prefixes() {
        let mut selection = BookingSelection::default();
        assert!(selection.chain_is_consistent());

        selection.doctor = Some(dr_mehta());
        assert!(selection.chain_is_consistent());

        selection.hospital = Some(city_hospital());
        selection.date = NaiveDate::from_ymd_opt(2025, 3, 14);
        selection.token = Some(token(4));
        assert!(selection.chain_is_consistent());
    }

    #[test]
    fn test_chain_consistency_rejects_gaps() {
        let selection = BookingSelection {
            doctor: Some(dr_mehta()),
            hospital: None,
            date: NaiveDate::from_ymd_opt(2025, 3, 14),
            ..Default::default()
        };
        assert!(!selection.chain_is_consistent());

        let token_without_anything = BookingSelection {
            token: Some(token(1)),
            ..Default::default()
        };
        assert!(!token_without_anything.chain_is_consistent());
    }

    #[test]
    fn test_stale_appointment_type_does_not_break_the_chain() {
        // An upstream change keeps the type; only confirm-time validation
        // may reject it.
        let selection = BookingSelection {
            doctor: Some(dr_mehta()),
            appointment_type: Some(AppointmentType::FollowUp),
            ..Default::default()
        };
        assert!(selection.chain_is_consistent());
    }

    #[test]
    fn test_appointment_type_wire_names() {
        let types = [
            (AppointmentType::Consultation, "CONSULTATION"),
            (AppointmentType::FollowUp, "FOLLOW_UP"),
            (AppointmentType::RoutineCheckup, "ROUTINE_CHECKUP"),
            (AppointmentType::SpecialistVisit, "SPECIALIST_VISIT"),
            (AppointmentType::Emergency, "EMERGENCY"),
        ];

        for (appointment_type, wire) in types {
            assert_eq!(appointment_type.to_string(), wire);
            assert_eq!(
                serde_json::to_value(appointment_type).unwrap(),
                serde_json::Value::String(wire.to_string())
            );
            assert_eq!(wire.parse::<AppointmentType>().unwrap(), appointment_type);
        }
    }

    #[test]
    fn test_appointment_type_parse_is_forgiving_about_case() {
        assert_eq!(
            "follow-up".parse::<AppointmentType>().unwrap(),
            AppointmentType::FollowUp
        );
        assert_eq!(
            " consultation ".parse::<AppointmentType>().unwrap(),
            AppointmentType::Consultation
        );
        assert!(matches!(
            "walk_in".parse::<AppointmentType>(),
            Err(BookingError::Validation(_))
        ));
    }

    #[test]
    fn test_booking_request_serializes_wire_shape() {
        let request = BookingRequest {
            doctor_id: Uuid::nil(),
            appointment_type: AppointmentType::RoutineCheckup,
            appointment_timestamp: DateTime::parse_from_rfc3339("2025-03-14T09:15:00Z")
                .unwrap()
                .with_timezone(&Utc),
            duration_minutes: 30,
            token_number: 2,
            location: "City Hospital".to_string(),
            notes: None,
        };

        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire["appointment_type"], "ROUTINE_CHECKUP");
        assert_eq!(wire["appointment_timestamp"], "2025-03-14T09:15:00Z");
        assert_eq!(wire["duration_minutes"], 30);
        assert_eq!(wire["token_number"], 2);
    }
}
