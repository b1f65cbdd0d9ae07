//! Configuration management module
//!
//! Client timing policy, logging settings and JSON profile files

pub mod file;
pub mod settings;

pub use file::ClientProfiles;
pub use settings::{ClientConfig, LoggingConfig};
