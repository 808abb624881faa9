use thiserror::Error;

/// Transport-level error taxonomy for the care platform REST API.
///
/// Every cell talks to the platform through this one vocabulary; the
/// status-code mapping happens once, in `shared-platform`. Read paths may
/// degrade on any of these, write paths must tell `Conflict` apart from
/// transport failures before surfacing anything to the caller.
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },
}

impl PlatformError {
    /// True for failures where the request may not have reached the platform
    /// at all. Callers use this to phrase "try again later" versus
    /// "the platform said no".
    pub fn is_transport(&self) -> bool {
        matches!(self, PlatformError::Network(_))
    }
}
