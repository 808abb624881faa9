use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_platform::PlatformClient;
use token_cell::models::{DegradedDataWarning, TokenAvailability};
use token_cell::services::TokenAvailabilityService;

use crate::error::BookingError;
use crate::models::{
    AppointmentType, BookingConfirmation, BookingPolicy, BookingRequest, BookingSelection,
    BookingStep, DoctorRef, HospitalRef,
};
use crate::services::submission::BookingSubmissionService;
use crate::services::validator::ReservationValidator;

/// Parameters of one availability fetch, captured when the fetch begins.
///
/// Comparing a fetch against the live selection is how stale results are
/// recognized: if the user changed doctor, hospital or date while the call
/// was in flight, the fetch no longer matches and its board is discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityFetch {
    pub doctor_id: Uuid,
    pub hospital_id: Uuid,
    pub date: NaiveDate,
    pub total_tokens: u32,
}

/// The booking session: one explicit state machine owning the in-progress
/// selection, the current step, and the latest token board.
///
/// Steps run doctor → hospital → date → token → type → confirm. Changing an
/// upstream selection invalidates everything that depends on it in one
/// place (the setter), and every forward move from the token step onward
/// re-runs the validator, so stale background data is caught before it can
/// reach the wire. Tokens stay server-owned: the session only ever holds a
/// snapshot, and the platform's conflict check decides races at submission.
pub struct BookingWorkflow {
    resolver: TokenAvailabilityService,
    submission: BookingSubmissionService,
    validator: ReservationValidator,
    policy: BookingPolicy,
    selection: BookingSelection,
    step: BookingStep,
    availability: Option<TokenAvailability>,
    submission_in_flight: bool,
}

impl BookingWorkflow {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_policy(config, BookingPolicy::default())
    }

    pub fn with_policy(config: &AppConfig, policy: BookingPolicy) -> Self {
        let platform = Arc::new(PlatformClient::new(config));

        Self {
            resolver: TokenAvailabilityService::with_grid(
                Arc::clone(&platform),
                policy.slot_grid.clone(),
            ),
            submission: BookingSubmissionService::new(platform),
            validator: ReservationValidator::with_policy(policy.clone()),
            policy,
            selection: BookingSelection::default(),
            step: BookingStep::SelectDoctor,
            availability: None,
            submission_in_flight: false,
        }
    }

    // ==========================================================================
    // SELECTION SETTERS (each owns its cascading invalidation)
    // ==========================================================================

    /// Choose the doctor. Clears hospital, date, token and the board; a
    /// previously chosen appointment type survives as stale state and is
    /// caught by confirm-time validation if it no longer fits.
    pub fn select_doctor(&mut self, doctor: DoctorRef) {
        debug!("Doctor selected: {} ({})", doctor.name, doctor.id);
        self.selection.doctor = Some(doctor);
        self.selection.hospital = None;
        self.selection.date = None;
        self.selection.token = None;
        self.availability = None;
    }

    /// Choose the hospital. The date survives; the token and board do not,
    /// because capacity and booked state are per-hospital.
    pub fn select_hospital(&mut self, hospital: HospitalRef) -> Result<(), BookingError> {
        if self.selection.doctor.is_none() {
            return Err(self.precondition(BookingStep::SelectHospital, "doctor"));
        }

        debug!(
            "Hospital selected: {} ({} tokens/day)",
            hospital.name, hospital.daily_token_capacity
        );
        self.selection.hospital = Some(hospital);
        self.selection.token = None;
        self.availability = None;
        Ok(())
    }

    /// Choose the visit date. Clears the token and board; the same token
    /// number can be free one day and taken the next.
    pub fn select_date(&mut self, date: NaiveDate) -> Result<(), BookingError> {
        if self.selection.doctor.is_none() {
            return Err(self.precondition(BookingStep::SelectDate, "doctor"));
        }
        if self.selection.hospital.is_none() {
            return Err(self.precondition(BookingStep::SelectDate, "hospital"));
        }

        debug!("Date selected: {}", date);
        self.selection.date = Some(date);
        self.selection.token = None;
        self.availability = None;
        Ok(())
    }

    /// Choose a token from the current board. Requires a board for the
    /// complete doctor-hospital-date triple. Selecting an already-booked
    /// token is allowed here; the validator rejects it on the next forward
    /// move, which mirrors how the race actually presents to a user.
    pub fn select_token(&mut self, token_number: u32) -> Result<(), BookingError> {
        if self.selection.date.is_none() {
            return Err(self.precondition(BookingStep::SelectToken, "date"));
        }
        let board = self
            .availability
            .as_ref()
            .ok_or_else(|| self.precondition(BookingStep::SelectToken, "availability board"))?;

        let slot = board
            .slot(token_number)
            .ok_or(BookingError::UnknownToken(token_number))?;

        debug!(
            "Token {} selected ({}, booked: {})",
            slot.token_number, slot.display_time, slot.is_booked
        );
        self.selection.token = Some(slot.clone());
        Ok(())
    }

    pub fn select_appointment_type(
        &mut self,
        appointment_type: AppointmentType,
    ) -> Result<(), BookingError> {
        if self.selection.token.is_none() {
            return Err(self.precondition(BookingStep::SelectType, "token"));
        }

        debug!("Appointment type selected: {}", appointment_type);
        self.selection.appointment_type = Some(appointment_type);
        Ok(())
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.selection.notes = notes;
    }

    // ==========================================================================
    // AVAILABILITY FETCH PROTOCOL
    // ==========================================================================

    /// True once the doctor-hospital-date triple is complete but no board
    /// for it has been applied yet. Every cascading clear brings the session
    /// back to this state.
    pub fn needs_availability_refresh(&self) -> bool {
        self.availability.is_none() && self.begin_availability_fetch().is_some()
    }

    /// Capture the parameters of an availability fetch for the current
    /// selection, or `None` while the triple is incomplete.
    pub fn begin_availability_fetch(&self) -> Option<AvailabilityFetch> {
        let doctor = self.selection.doctor.as_ref()?;
        let hospital = self.selection.hospital.as_ref()?;
        let date = self.selection.date?;

        Some(AvailabilityFetch {
            doctor_id: doctor.id,
            hospital_id: hospital.id,
            date,
            total_tokens: hospital.daily_token_capacity,
        })
    }

    /// Apply a fetched board. Returns `false` and changes nothing when the
    /// fetch was superseded by a selection change while it was in flight.
    ///
    /// A selected token is re-bound to the fresh board by number, so its
    /// booked state is current for the next validation; a number that
    /// vanished from the board clears the token.
    pub fn apply_availability(
        &mut self,
        fetch: &AvailabilityFetch,
        board: TokenAvailability,
    ) -> bool {
        if self.begin_availability_fetch().as_ref() != Some(fetch) {
            debug!(
                "Discarding superseded availability fetch for doctor {} on {}",
                fetch.doctor_id, fetch.date
            );
            return false;
        }

        if let Some(selected) = self.selection.token.take() {
            self.selection.token = board.slot(selected.token_number).cloned();
            if self.selection.token.is_none() {
                warn!(
                    "Token {} no longer exists on the refreshed board",
                    selected.token_number
                );
            }
        }

        self.availability = Some(board);
        true
    }

    /// Resolve the board for the current triple and apply it. The resolver
    /// never fails; at worst the board comes back degraded and
    /// `availability_warning` reports it.
    pub async fn refresh_availability(&mut self) -> Option<&TokenAvailability> {
        let fetch = self.begin_availability_fetch()?;
        let board = self
            .resolver
            .resolve(fetch.doctor_id, fetch.hospital_id, fetch.date, fetch.total_tokens)
            .await;

        self.apply_availability(&fetch, board);
        self.availability.as_ref()
    }

    // ==========================================================================
    // STEP NAVIGATION
    // ==========================================================================

    /// Move forward one step. The current step's field must be set, and from
    /// the token step onward the whole selection is re-validated; data may
    /// have changed underneath while the user sat on an earlier screen.
    pub fn advance(&mut self) -> Result<BookingStep, BookingError> {
        let next = self
            .step
            .next()
            .ok_or_else(|| self.precondition(BookingStep::Confirm, "a later step"))?;

        if !self.step_field_is_set(self.step) {
            let missing = self.step.required_field().unwrap_or("selection");
            return Err(self.precondition(self.step, missing));
        }

        if self.step >= BookingStep::SelectToken {
            self.validator.validate(&self.selection)?;
        }

        debug!("Advancing from {} to {}", self.step, next);
        self.step = next;
        Ok(next)
    }

    /// Step backward. Always permitted, clears nothing; correctness is
    /// preserved by re-validation on the way forward.
    pub fn back(&mut self) -> BookingStep {
        if let Some(previous) = self.step.previous() {
            debug!("Stepping back from {} to {}", self.step, previous);
            self.step = previous;
        }
        self.step
    }

    // ==========================================================================
    // CONFIRMATION
    // ==========================================================================

    /// Validate once more, build the request, and submit it, exactly once.
    ///
    /// On success the session resets to empty. A conflict clears the token,
    /// returns the session to token selection and re-fetches the board. A
    /// network failure keeps the session at confirm and is surfaced without
    /// any retry: the request may have landed, and only the caller can
    /// decide what happens next.
    pub async fn confirm(&mut self) -> Result<BookingConfirmation, BookingError> {
        if self.step != BookingStep::Confirm {
            return Err(self.precondition(self.step, "the confirm step"));
        }
        if self.submission_in_flight {
            warn!("Confirm ignored: a submission is already in flight");
            return Err(BookingError::SubmissionInFlight);
        }

        let timestamp = match self.validator.validate(&self.selection) {
            Ok(timestamp) => timestamp,
            Err(error) => {
                if let Some(owner) = Self::owning_step(&error) {
                    warn!("Confirmation failed validation ({}); returning to {}", error, owner);
                    self.step = owner;
                }
                return Err(error);
            }
        };

        let request = self.build_request(timestamp)?;

        // The gate stays closed if this future is dropped mid-flight: the
        // request may have reached the platform, and only reset() reopens it.
        self.submission_in_flight = true;
        let outcome = self.submission.submit(&request).await;
        self.submission_in_flight = false;

        match outcome {
            Ok(confirmation) => {
                info!(
                    "Token {} confirmed as appointment {}",
                    request.token_number, confirmation.appointment_id
                );
                self.reset();
                Ok(confirmation)
            }
            Err(BookingError::Conflict) => {
                warn!(
                    "Token {} was claimed by another booking; returning to token selection",
                    request.token_number
                );
                self.selection.token = None;
                self.availability = None;
                self.step = BookingStep::SelectToken;
                self.refresh_availability().await;
                Err(BookingError::Conflict)
            }
            Err(error) => Err(error),
        }
    }

    // ==========================================================================
    // SESSION STATE
    // ==========================================================================

    pub fn step(&self) -> BookingStep {
        self.step
    }

    pub fn selection(&self) -> &BookingSelection {
        &self.selection
    }

    pub fn availability(&self) -> Option<&TokenAvailability> {
        self.availability.as_ref()
    }

    /// The degraded-data warning for the current board, if any. Callers must
    /// surface this whenever it is present.
    pub fn availability_warning(&self) -> Option<DegradedDataWarning> {
        self.availability.as_ref().and_then(|board| board.warning())
    }

    pub fn is_submission_in_flight(&self) -> bool {
        self.submission_in_flight
    }

    /// Discard the session. This is the explicit cancellation path, and the
    /// only way to reopen the confirm gate after an abandoned submission.
    pub fn reset(&mut self) {
        debug!("Resetting booking session");
        self.selection = BookingSelection::default();
        self.step = BookingStep::SelectDoctor;
        self.availability = None;
        self.submission_in_flight = false;
    }

    // ==========================================================================
    // PRIVATE HELPERS
    // ==========================================================================

    fn build_request(&self, timestamp: DateTime<Utc>) -> Result<BookingRequest, BookingError> {
        let doctor = self
            .selection
            .doctor
            .as_ref()
            .ok_or_else(|| self.precondition(BookingStep::Confirm, "doctor"))?;
        let hospital = self
            .selection
            .hospital
            .as_ref()
            .ok_or_else(|| self.precondition(BookingStep::Confirm, "hospital"))?;
        let token = self.selection.token.as_ref().ok_or(BookingError::NoTokenSelected)?;
        let appointment_type = self
            .selection
            .appointment_type
            .ok_or_else(|| self.precondition(BookingStep::Confirm, "appointment type"))?;

        Ok(BookingRequest {
            doctor_id: doctor.id,
            appointment_type,
            appointment_timestamp: timestamp,
            duration_minutes: self.policy.default_duration_minutes,
            token_number: token.token_number,
            location: hospital.name.clone(),
            notes: self.selection.notes.clone(),
        })
    }

    fn precondition(&self, step: BookingStep, missing: &str) -> BookingError {
        BookingError::StepPrecondition {
            step,
            missing: missing.to_string(),
        }
    }

    fn step_field_is_set(&self, step: BookingStep) -> bool {
        match step {
            BookingStep::SelectDoctor => self.selection.doctor.is_some(),
            BookingStep::SelectHospital => self.selection.hospital.is_some(),
            BookingStep::SelectDate => self.selection.date.is_some(),
            BookingStep::SelectToken => self.selection.token.is_some(),
            BookingStep::SelectType => self.selection.appointment_type.is_some(),
            BookingStep::Confirm => true,
        }
    }

    /// The step a validation failure sends the user back to at confirmation.
    fn owning_step(error: &BookingError) -> Option<BookingStep> {
        match error {
            BookingError::NoTokenSelected
            | BookingError::TokenAlreadyBooked
            | BookingError::UnknownToken(_)
            | BookingError::InvalidTime(_) => Some(BookingStep::SelectToken),
            BookingError::PastDate => Some(BookingStep::SelectDate),
            _ => None,
        }
    }
}
