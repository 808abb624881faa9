pub mod validator;
pub mod workflow;
pub mod submission;

pub use validator::ReservationValidator;
pub use workflow::{AvailabilityFetch, BookingWorkflow};
pub use submission::BookingSubmissionService;
