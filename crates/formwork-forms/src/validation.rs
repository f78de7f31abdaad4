//! The validation pipeline.
//!
//! Runs after parsing, in a fixed order:
//! 1. Required check: every required field whose value is empty gets a
//!    `required` error.
//! 2. Selection check: every field with an allowed-value set is checked
//!    against its stored value.
//! 3. The form's cross-field validation function, if any.
//! 4. Every stored `Fill` target validates itself.
//!
//! Errors accumulate rather than short-circuiting, so all validation
//! issues are reported at once.

use formwork_core::ValidationError;

use crate::form::{FormState, ValidationFn};
use crate::value::FieldValue;

/// Returns a `required` error for every required field that is empty.
pub fn required_errors(state: &FormState) -> Vec<(String, ValidationError)> {
    let policy = state.settings().empty_array;
    state
        .required_fields()
        .iter()
        .filter_map(|name| {
            let field = state.field(name).ok()?;
            state
                .store()
                .is_empty_value(name, field.type_tag, policy)
                .then(|| (name.clone(), ValidationError::required()))
        })
        .collect()
}

/// Returns a `not_allowed` error for every stored value outside its selection.
pub fn selection_errors(state: &FormState) -> Vec<(String, ValidationError)> {
    state
        .fields()
        .filter_map(|field| {
            field
                .check_allowed(state.store().get(&field.name))
                .map(|e| (field.name.clone(), e))
        })
        .collect()
}

/// Runs every stored `Fill` target's own validation.
pub fn fill_errors(state: &FormState) -> Vec<(String, ValidationError)> {
    state
        .fields()
        .filter_map(|field| match state.store().get(&field.name) {
            Some(FieldValue::Fill { value, .. }) => value
                .validate()
                .err()
                .map(|message| (field.name.clone(), ValidationError::new(message, "invalid_fill"))),
            _ => None,
        })
        .collect()
}

/// Runs the whole pipeline, recording errors on the form.
pub fn validate_form(state: &mut FormState, validation: Option<&mut ValidationFn>) {
    for (name, error) in required_errors(state) {
        state.record_field_error(name, error);
    }
    for (name, error) in selection_errors(state) {
        state.record_field_error(name, error);
    }
    if let Some(validation) = validation {
        validation(state);
    }
    for (name, error) in fill_errors(state) {
        state.record_field_error(name, error);
    }
    tracing::debug!(
        field_errors = state.field_errors().len(),
        general_errors = state.general_errors().len(),
        "validation finished"
    );
}
