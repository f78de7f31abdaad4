//! # formwork-core
//!
//! Core types, settings, logging, and error types for formwork.
//! This crate has no framework dependencies and provides the foundation for the other crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`utils`] - Utility types (`MultiValueDict`)
//! - [`settings`] - Parser settings and global configuration
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod utils;

// Re-export the most commonly used types at the crate root.
pub use error::{FormworkError, FormworkResult, ValidationError};
pub use settings::{EmptyArrayPolicy, Settings, SETTINGS};
