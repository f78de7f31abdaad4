//! Settings for formwork.
//!
//! This module provides the [`Settings`] struct, which holds the knobs that
//! change how raw form input is interpreted, and [`LazySettings`], a
//! globally-accessible, lazily-initialized settings instance for
//! applications that configure once at startup.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{FormworkError, FormworkResult};

/// Whether a stored zero-length array counts as an empty value when a
/// required field is checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyArrayPolicy {
    /// A zero-length array fails the required check.
    #[default]
    Empty,
    /// A zero-length array that was stored at all satisfies the required check.
    Filled,
}

/// The complete set of formwork settings.
///
/// # Examples
///
/// ```
/// use formwork_core::settings::{EmptyArrayPolicy, Settings};
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.array_separator, ',');
/// assert_eq!(settings.empty_array, EmptyArrayPolicy::Empty);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled (pretty logs instead of JSON).
    pub debug: bool,

    // ── Parsing ──────────────────────────────────────────────────────

    /// Separator used to split a single raw string into array elements.
    pub array_separator: char,
    /// Whether array elements are trimmed of surrounding whitespace.
    pub trim_array_elements: bool,
    /// The literal a checkbox submits when ticked; it always parses to `true`.
    pub checkbox_on_literal: String,
    /// How zero-length arrays are treated by the required check.
    pub empty_array: EmptyArrayPolicy,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level filter (e.g. "info", "debug", "formwork_forms=trace").
    pub log_level: String,

    // ── Escape hatch ─────────────────────────────────────────────────

    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            array_separator: ',',
            trim_array_elements: true,
            checkbox_on_literal: "on".to_string(),
            empty_array: EmptyArrayPolicy::Empty,
            log_level: "info".to_string(),
            extra: HashMap::new(),
        }
    }
}

/// A lazily-initialized, globally-accessible settings container.
///
/// Call [`configure`](LazySettings::configure) once at startup, then use
/// [`get`](LazySettings::get) to access the settings. Unlike a framework
/// that cannot run unconfigured, forms fall back to [`Settings::default`]
/// when nothing was configured.
pub struct LazySettings {
    inner: OnceLock<Settings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// Creates a new, unconfigured `LazySettings`.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Configures the global settings. Must be called at most once.
    ///
    /// Returns a [`FormworkError::ConfigurationError`] if settings have
    /// already been configured or materialized.
    pub fn configure(&self, settings: Settings) -> FormworkResult<()> {
        self.inner.set(settings).map_err(|_| {
            FormworkError::ConfigurationError("Settings have already been configured".to_string())
        })
    }

    /// Returns the configured settings, or the defaults if none were configured.
    pub fn get(&self) -> &Settings {
        self.inner.get_or_init(Settings::default)
    }

    /// Returns a copy of the configured settings, or the defaults.
    ///
    /// Unlike [`get`](LazySettings::get) this never materializes the
    /// defaults, so a later [`configure`](LazySettings::configure) still
    /// succeeds.
    pub fn current(&self) -> Settings {
        self.inner.get().cloned().unwrap_or_default()
    }

    /// Returns `true` if [`configure`](LazySettings::configure) has been called
    /// (or the defaults were already materialized by [`get`](LazySettings::get)).
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The global settings instance.
pub static SETTINGS: LazySettings = LazySettings::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert!(s.debug);
        assert_eq!(s.array_separator, ',');
        assert!(s.trim_array_elements);
        assert_eq!(s.checkbox_on_literal, "on");
        assert_eq!(s.empty_array, EmptyArrayPolicy::Empty);
        assert_eq!(s.log_level, "info");
        assert!(s.extra.is_empty());
    }

    #[test]
    fn test_settings_serde_roundtrip() {
        let mut s = Settings::default();
        s.empty_array = EmptyArrayPolicy::Filled;
        s.array_separator = ';';
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"filled\""));
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.empty_array, EmptyArrayPolicy::Filled);
        assert_eq!(back.array_separator, ';');
    }

    #[test]
    fn test_lazy_settings_defaults_when_unconfigured() {
        let lazy = LazySettings::new();
        assert!(!lazy.is_configured());
        assert_eq!(lazy.get().log_level, "info");
        assert!(lazy.is_configured());
    }

    #[test]
    fn test_lazy_settings_configure() {
        let lazy = LazySettings::new();
        let mut s = Settings::default();
        s.debug = false;
        lazy.configure(s).unwrap();
        assert!(!lazy.get().debug);
    }

    #[test]
    fn test_lazy_settings_current_does_not_materialize() {
        let lazy = LazySettings::new();
        assert_eq!(lazy.current().log_level, "info");
        assert!(!lazy.is_configured());

        let mut s = Settings::default();
        s.checkbox_on_literal = "checked".to_string();
        lazy.configure(s).unwrap();
        assert_eq!(lazy.current().checkbox_on_literal, "checked");
    }

    #[test]
    fn test_lazy_settings_double_configure() {
        let lazy = LazySettings::new();
        lazy.configure(Settings::default()).unwrap();
        let err = lazy.configure(Settings::default()).unwrap_err();
        assert!(err.is_configuration());
    }
}
