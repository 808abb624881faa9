pub mod client;

pub use client::PlatformClient;
