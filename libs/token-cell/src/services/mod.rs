pub mod status;
pub mod listing;
pub mod resolver;

pub use status::TokenStatusService;
pub use listing::AppointmentListingService;
pub use resolver::TokenAvailabilityService;
