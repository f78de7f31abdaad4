//! Core error types for formwork.
//!
//! Two kinds of failure exist and they travel on different channels:
//!
//! - [`ValidationError`] records bad user input (a value that does not parse,
//!   a missing required field, a value outside the allowed set). These are
//!   accumulated by a form over a whole parse cycle and never abort it.
//! - [`FormworkError`] signals a programming or infrastructure failure
//!   (duplicate field names, unknown fields, persistence errors). These are
//!   returned immediately from the operation that detected them.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// A single accumulated validation failure.
///
/// # Examples
///
/// ```
/// use formwork_core::error::ValidationError;
///
/// let err = ValidationError::new("required", "required");
/// assert_eq!(err.to_string(), "required");
///
/// let err = ValidationError::new("\"abc\" is no int", "invalid")
///     .with_param("value", "abc");
/// assert_eq!(err.params["value"], "abc");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The human-readable error message.
    pub message: String,
    /// A short code identifying the failure (e.g. "required", "invalid").
    pub code: String,
    /// Additional parameters providing context for the message.
    pub params: HashMap<String, String>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            params: HashMap::new(),
        }
    }

    /// Shorthand for the error recorded on an empty required field.
    pub fn required() -> Self {
        Self::new("required", "required")
    }

    /// Adds a parameter to this validation error.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Returns `true` if this error carries the given code.
    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for formwork.
#[derive(Error, Debug)]
pub enum FormworkError {
    // ── Form configuration ───────────────────────────────────────────

    /// A field with the same name was already added to the form.
    #[error("Field {0} already defined")]
    DuplicateField(String),

    /// The named field does not exist in the form.
    #[error("Field {0} does not exist")]
    UnknownField(String),

    /// An allowed-value set does not match the field's type.
    #[error("Selection for field {field} does not fit type {expected}: {detail}")]
    SelectionTypeMismatch {
        /// The field the selection was attached to.
        field: String,
        /// The field's declared type.
        expected: String,
        /// What was wrong with the offending value.
        detail: String,
    },

    /// A value of the wrong kind was stored for a field.
    #[error("Field {field} holds {expected} values, got {found}")]
    TypeMismatch {
        /// The field name.
        field: String,
        /// The field's declared type.
        expected: String,
        /// The type of the offending value.
        found: String,
    },

    /// The form or one of its collaborators is set up incorrectly.
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    // ── Settings ─────────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Persistence ──────────────────────────────────────────────────

    /// A generic database error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A database integrity constraint was violated.
    #[error("Integrity error: {0}")]
    IntegrityError(String),

    /// The requested row or column does not exist.
    #[error("Object does not exist: {0}")]
    DoesNotExist(String),

    // ── Actions ──────────────────────────────────────────────────────

    /// A user-supplied action reported a failure.
    #[error("Action failed: {0}")]
    ActionFailed(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl FormworkError {
    /// Returns `true` for errors caused by a mistake in form setup.
    ///
    /// These are never the user's fault and should not be shown as input
    /// validation feedback.
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::DuplicateField(_)
                | Self::UnknownField(_)
                | Self::SelectionTypeMismatch { .. }
                | Self::TypeMismatch { .. }
                | Self::ImproperlyConfigured(_)
                | Self::ConfigurationError(_)
        )
    }
}

impl From<serde_json::Error> for FormworkError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// A convenience type alias for `Result<T, FormworkError>`.
pub type FormworkResult<T> = Result<T, FormworkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("\"x\" is no int", "invalid");
        assert_eq!(err.to_string(), "\"x\" is no int");
        assert!(err.is("invalid"));
        assert!(!err.is("required"));
    }

    #[test]
    fn test_validation_error_required() {
        let err = ValidationError::required();
        assert_eq!(err.message, "required");
        assert_eq!(err.code, "required");
        assert!(err.params.is_empty());
    }

    #[test]
    fn test_validation_error_with_param() {
        let err = ValidationError::new("not allowed", "not_allowed").with_param("value", "c");
        assert_eq!(err.params.get("value").unwrap(), "c");
    }

    #[test]
    fn test_formwork_error_display() {
        let err = FormworkError::DuplicateField("Name".into());
        assert_eq!(err.to_string(), "Field Name already defined");

        let err = FormworkError::TypeMismatch {
            field: "Age".into(),
            expected: "int".into(),
            found: "string".into(),
        };
        assert_eq!(err.to_string(), "Field Age holds int values, got string");
    }

    #[test]
    fn test_is_configuration() {
        assert!(FormworkError::UnknownField("x".into()).is_configuration());
        assert!(FormworkError::DuplicateField("x".into()).is_configuration());
        assert!(!FormworkError::DatabaseError("x".into()).is_configuration());
        assert!(!FormworkError::ActionFailed("x".into()).is_configuration());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: FormworkError = io_err.into();
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: FormworkError = json_err.into();
        assert!(matches!(err, FormworkError::SerializationError(_)));
    }
}
