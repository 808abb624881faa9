pub mod error;

pub use error::PlatformError;
