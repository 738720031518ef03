//! Parsing, validation, and saving of `quarry.toml` project descriptors.
//!
//! The descriptor names the project and its top-level package and records the
//! build dependencies and repositories the search integration registers.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, save_config, CONFIG_FILE};
pub use types::*;
