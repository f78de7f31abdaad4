//! Forms and the parse/validate/act cycle.
//!
//! [`FormState`] is the registry and value store: fields in declaration
//! order, interleaved HTML fragments, the required list, parsed values and
//! accumulated errors. Hooks receive it mutably.
//!
//! [`Form`] owns a `FormState`, the [`Hooks`], and the state of the last
//! cycle. [`Form::parse`] runs one cycle:
//!
//! ```text
//! reset → before_parsing → parse → after_parsing → before_validation
//!       → validate → after_validation
//!       → (clean and action set) before_action → re-check → action → after_action
//! ```
//!
//! A form is synchronous and handles one cycle at a time (`&mut self`).
//! Hooks are `Send`, so a form can be moved into a per-request worker, but
//! it is never shared between overlapping cycles.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use thiserror::Error;

use formwork_core::logging::cycle_span;
use formwork_core::{FormworkError, FormworkResult, Settings, ValidationError, SETTINGS};
use formwork_db::value::Value;

use crate::fields::FieldDescriptor;
use crate::input::FormData;
use crate::parser::parse_field;
use crate::presentation::{Child, FieldChild, FragmentList, Presentation};
use crate::store::{FieldErrors, ValueStore};
use crate::type_tag::TypeTag;
use crate::validation::validate_form;
use crate::value::{FieldValue, Filler, JsonMap};
use crate::widgets::WidgetType;

/// A lifecycle hook.
pub type Hook = Box<dyn FnMut(&mut FormState) + Send>;
/// Cross-field validation; records errors on the state.
pub type ValidationFn = Box<dyn FnMut(&mut FormState) + Send>;
/// The action run on a clean submission.
pub type ActionFn = Box<dyn FnMut(&mut FormState) -> FormworkResult<()> + Send>;
/// Receives the action error (if any), general errors and field errors.
pub type ErrorHandler =
    Box<dyn FnMut(Option<&FormworkError>, &[ValidationError], &FieldErrors) + Send>;

/// An entry of a form's declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// A field, by name.
    Field(String),
    /// A literal HTML fragment.
    Html(String),
}

/// The registry and value store of a form.
#[derive(Debug)]
pub struct FormState {
    name: String,
    settings: Settings,
    fields: HashMap<String, FieldDescriptor>,
    order: Vec<Item>,
    required: Vec<String>,
    store: ValueStore,
    field_errors: FieldErrors,
    general_errors: Vec<ValidationError>,
    presentation: Box<dyn Presentation>,
}

impl FormState {
    fn new(name: String, settings: Settings, presentation: Box<dyn Presentation>) -> Self {
        Self {
            name,
            settings,
            fields: HashMap::new(),
            order: Vec::new(),
            required: Vec::new(),
            store: ValueStore::new(),
            field_errors: FieldErrors::new(),
            general_errors: Vec::new(),
            presentation,
        }
    }

    /// The form name, used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parser settings of this form.
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    // ── Registry ─────────────────────────────────────────────────────

    /// Adds a field at the end of the declaration order.
    ///
    /// Fails with [`FormworkError::DuplicateField`] if the name is taken and
    /// with [`FormworkError::ImproperlyConfigured`] if a structured field
    /// lacks its constructor or factory.
    pub fn add_field(&mut self, field: FieldDescriptor) -> FormworkResult<()> {
        if self.fields.contains_key(&field.name) {
            return Err(FormworkError::DuplicateField(field.name));
        }
        field.check()?;
        if field.required {
            self.required.push(field.name.clone());
        }
        self.order.push(Item::Field(field.name.clone()));
        self.presentation
            .add_child(Child::Field(FieldChild::from(&field)));
        tracing::trace!(form = %self.name, field = %field.name, tag = %field.type_tag, "field added");
        self.fields.insert(field.name.clone(), field);
        Ok(())
    }

    /// Appends a literal HTML fragment.
    pub fn add_html(&mut self, fragment: impl Into<String>) {
        let fragment = fragment.into();
        self.order.push(Item::Html(fragment.clone()));
        self.presentation.add_child(Child::Html(fragment));
    }

    /// Removes a field from every structure that references it.
    pub fn remove_field(&mut self, name: &str) -> FormworkResult<FieldDescriptor> {
        let field = self
            .fields
            .remove(name)
            .ok_or_else(|| FormworkError::UnknownField(name.to_string()))?;
        self.order
            .retain(|item| !matches!(item, Item::Field(n) if n == name));
        self.required.retain(|n| n != name);
        self.store.remove(name);
        self.field_errors.remove(name);
        self.presentation.remove_field(name);
        Ok(field)
    }

    /// Returns `true` if a field with this name exists.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Returns a field's descriptor.
    pub fn field(&self, name: &str) -> FormworkResult<&FieldDescriptor> {
        self.fields
            .get(name)
            .ok_or_else(|| FormworkError::UnknownField(name.to_string()))
    }

    /// Field descriptors in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.order.iter().filter_map(|item| match item {
            Item::Field(name) => self.fields.get(name),
            Item::Html(_) => None,
        })
    }

    /// Fields and HTML fragments in declaration order.
    pub fn order(&self) -> &[Item] {
        &self.order
    }

    /// Names of required fields, in the order they became required.
    pub fn required_fields(&self) -> &[String] {
        &self.required
    }

    /// Marks a field as required. Idempotent.
    pub fn require(&mut self, name: &str) -> FormworkResult<()> {
        self.set_required(name, true)
    }

    /// Marks a field as optional. Idempotent.
    pub fn unrequire(&mut self, name: &str) -> FormworkResult<()> {
        self.set_required(name, false)
    }

    fn set_required(&mut self, name: &str, required: bool) -> FormworkResult<()> {
        let field = self
            .fields
            .get_mut(name)
            .ok_or_else(|| FormworkError::UnknownField(name.to_string()))?;
        field.required = required;
        let listed = self.required.iter().any(|n| n == name);
        if required && !listed {
            self.required.push(name.to_string());
        } else if !required && listed {
            self.required.retain(|n| n != name);
        }
        self.presentation.set_required(name, required);
        Ok(())
    }

    /// Restricts a field to a set of allowed values.
    pub fn set_selection(&mut self, name: &str, values: &[Value]) -> FormworkResult<()> {
        let field = self
            .fields
            .get_mut(name)
            .ok_or_else(|| FormworkError::UnknownField(name.to_string()))?;
        field.set_selection(values)?;
        let options = field.select_options();
        let widget = field.widget;
        self.presentation.set_selection(name, options, widget);
        Ok(())
    }

    /// Replaces a field's label.
    pub fn set_label(&mut self, name: &str, label: &str) -> FormworkResult<()> {
        let field = self
            .fields
            .get_mut(name)
            .ok_or_else(|| FormworkError::UnknownField(name.to_string()))?;
        field.label = label.to_string();
        self.presentation.set_label(name, label);
        Ok(())
    }

    /// Replaces a field's widget.
    pub fn set_widget(&mut self, name: &str, widget: WidgetType) -> FormworkResult<()> {
        let field = self
            .fields
            .get_mut(name)
            .ok_or_else(|| FormworkError::UnknownField(name.to_string()))?;
        field.widget = widget;
        if let Some(child) = self.presentation.field_mut(name) {
            child.widget = widget;
        }
        Ok(())
    }

    /// The presentation tree.
    pub fn presentation(&self) -> &dyn Presentation {
        self.presentation.as_ref()
    }

    // ── Values ───────────────────────────────────────────────────────

    /// The value store.
    pub const fn store(&self) -> &ValueStore {
        &self.store
    }

    /// Returns the stored value of a field, `None` if nothing is stored.
    pub fn get(&self, name: &str) -> FormworkResult<Option<&FieldValue>> {
        self.field(name)?;
        Ok(self.store.get(name))
    }

    /// Stores a value. Its variant must match the field's tag.
    pub fn set(&mut self, name: &str, value: FieldValue) -> FormworkResult<()> {
        let field = self.field(name)?;
        if field.type_tag != value.tag() {
            return Err(FormworkError::TypeMismatch {
                field: name.to_string(),
                expected: field.type_tag.to_string(),
                found: value.tag().to_string(),
            });
        }
        self.store.insert(name, value);
        Ok(())
    }

    /// Whether the field counts as empty for the required check.
    pub fn is_empty(&self, name: &str) -> FormworkResult<bool> {
        let field = self.field(name)?;
        Ok(self
            .store
            .is_empty_value(name, field.type_tag, self.settings.empty_array))
    }

    fn typed(&self, name: &str, tag: TypeTag) -> FormworkResult<Option<&FieldValue>> {
        let field = self.field(name)?;
        if field.type_tag != tag {
            return Err(FormworkError::TypeMismatch {
                field: name.to_string(),
                expected: field.type_tag.to_string(),
                found: tag.to_string(),
            });
        }
        Ok(self.store.get(name))
    }

    /// The integer value, `0` if unset.
    pub fn get_int(&self, name: &str) -> FormworkResult<i64> {
        Ok(match self.typed(name, TypeTag::Int)? {
            Some(FieldValue::Int(i)) => *i,
            _ => 0,
        })
    }

    /// The float value, `0.0` if unset.
    pub fn get_float(&self, name: &str) -> FormworkResult<f64> {
        Ok(match self.typed(name, TypeTag::Float)? {
            Some(FieldValue::Float(f)) => *f,
            _ => 0.0,
        })
    }

    /// The string value, `""` if unset.
    pub fn get_str(&self, name: &str) -> FormworkResult<&str> {
        Ok(match self.typed(name, TypeTag::String)? {
            Some(FieldValue::String(s)) => s,
            _ => "",
        })
    }

    /// The boolean value, `false` if unset.
    pub fn get_bool(&self, name: &str) -> FormworkResult<bool> {
        Ok(matches!(
            self.typed(name, TypeTag::Bool)?,
            Some(FieldValue::Bool(true))
        ))
    }

    /// The integer list, empty if unset.
    pub fn get_int_array(&self, name: &str) -> FormworkResult<&[i64]> {
        Ok(match self.typed(name, TypeTag::IntArray)? {
            Some(FieldValue::IntArray(v)) => v,
            _ => &[],
        })
    }

    /// The float list, empty if unset.
    pub fn get_float_array(&self, name: &str) -> FormworkResult<&[f64]> {
        Ok(match self.typed(name, TypeTag::FloatArray)? {
            Some(FieldValue::FloatArray(v)) => v,
            _ => &[],
        })
    }

    /// The string list, empty if unset.
    pub fn get_string_array(&self, name: &str) -> FormworkResult<&[String]> {
        Ok(match self.typed(name, TypeTag::StringArray)? {
            Some(FieldValue::StringArray(v)) => v,
            _ => &[],
        })
    }

    /// The decoded map, `None` if unset.
    pub fn get_map(&self, name: &str) -> FormworkResult<Option<&JsonMap>> {
        Ok(match self.typed(name, TypeTag::Map)? {
            Some(FieldValue::Map { value, .. }) => Some(value),
            _ => None,
        })
    }

    /// The decoded struct, `None` if unset, undecodable or of another type.
    pub fn get_struct<T: 'static>(&self, name: &str) -> FormworkResult<Option<&T>> {
        Ok(match self.typed(name, TypeTag::Struct)? {
            Some(FieldValue::Struct {
                value: Some(value), ..
            }) => value.as_any().downcast_ref::<T>(),
            _ => None,
        })
    }

    /// The fill target, `None` if unset or of another type.
    pub fn get_fill<T: Filler + 'static>(&self, name: &str) -> FormworkResult<Option<&T>> {
        Ok(match self.typed(name, TypeTag::Fill)? {
            Some(FieldValue::Fill { value, .. }) => value.as_any().downcast_ref::<T>(),
            _ => None,
        })
    }

    /// Names supplied with a non-empty raw value in the last cycle, in
    /// declaration order.
    pub fn filled(&self) -> &[String] {
        self.store.filled()
    }

    /// Every stored value, converted for rows.
    ///
    /// Unsupplied `Bool` fields appear as `false`, the same value
    /// [`get_bool`](FormState::get_bool) reports; other unsupplied fields
    /// are left out.
    pub fn values(&self) -> HashMap<String, Value> {
        self.fields()
            .filter_map(|field| match self.store.get(&field.name) {
                Some(value) => Some((field.name.clone(), value.to_value())),
                None if field.type_tag == TypeTag::Bool => {
                    Some((field.name.clone(), Value::Bool(false)))
                }
                None => None,
            })
            .collect()
    }

    // ── Errors ───────────────────────────────────────────────────────

    /// Records an error against a field.
    pub fn add_field_error(&mut self, name: &str, error: ValidationError) -> FormworkResult<()> {
        if !self.has_field(name) {
            return Err(FormworkError::UnknownField(name.to_string()));
        }
        self.record_field_error(name.to_string(), error);
        Ok(())
    }

    pub(crate) fn record_field_error(&mut self, name: String, error: ValidationError) {
        tracing::debug!(form = %self.name, field = %name, code = %error.code, "field error");
        self.field_errors.append(name, error);
    }

    /// Records an error not tied to a field.
    pub fn add_general_error(&mut self, error: ValidationError) {
        tracing::debug!(form = %self.name, code = %error.code, "general error");
        self.general_errors.push(error);
    }

    /// Field errors, in the order fields first failed.
    pub const fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    /// Errors recorded against one field.
    pub fn errors_for(&self, name: &str) -> &[ValidationError] {
        self.field_errors.get_list(name).map_or(&[], Vec::as_slice)
    }

    /// Errors not tied to a field.
    pub fn general_errors(&self) -> &[ValidationError] {
        &self.general_errors
    }

    /// Returns `true` if any field or general error is recorded.
    pub fn has_errors(&self) -> bool {
        !self.field_errors.is_empty() || !self.general_errors.is_empty()
    }

    /// Clears values, the filled list and both error collections.
    pub fn reset(&mut self) {
        self.store.clear();
        self.field_errors = FieldErrors::new();
        self.general_errors.clear();
    }

    fn parse_input(&mut self, data: &FormData) {
        for item in &self.order {
            let Item::Field(name) = item else { continue };
            let Some(raw) = data.get(name).filter(|raw| !raw.is_absent()) else {
                continue;
            };
            let Some(field) = self.fields.get(name) else {
                continue;
            };
            let parsed = parse_field(field, raw, &self.settings);
            self.store.mark_filled(name.clone());
            if let Some(value) = parsed.value {
                self.store.insert(name.clone(), value);
            }
            for error in parsed.errors {
                tracing::debug!(form = %self.name, field = %name, code = %error.code, "parse error");
                self.field_errors.append(name.clone(), error);
            }
        }
    }
}

/// Lifecycle callbacks of a form. Every slot is optional.
#[derive(Default)]
pub struct Hooks {
    /// Runs after the reset, before any input is read.
    pub before_parsing: Option<Hook>,
    /// Runs after parsing.
    pub after_parsing: Option<Hook>,
    /// Runs before validation.
    pub before_validation: Option<Hook>,
    /// Cross-field validation, after the required and selection checks.
    pub validation: Option<ValidationFn>,
    /// Runs after validation.
    pub after_validation: Option<Hook>,
    /// Runs on a clean submission before the action.
    pub before_action: Option<Hook>,
    /// The side effect of a clean submission.
    pub action: Option<ActionFn>,
    /// Runs after a successful action.
    pub after_action: Option<Hook>,
    /// Receives the errors of a failed cycle.
    pub error_handler: Option<ErrorHandler>,
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("before_parsing", &self.before_parsing.is_some())
            .field("after_parsing", &self.after_parsing.is_some())
            .field("before_validation", &self.before_validation.is_some())
            .field("validation", &self.validation.is_some())
            .field("after_validation", &self.after_validation.is_some())
            .field("before_action", &self.before_action.is_some())
            .field("action", &self.action.is_some())
            .field("after_action", &self.after_action.is_some())
            .field("error_handler", &self.error_handler.is_some())
            .finish()
    }
}

/// Where the last cycle got to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CycleState {
    /// No cycle has run.
    #[default]
    Idle,
    /// Reading input.
    Parsing,
    /// Running the validation pipeline.
    Validating,
    /// Validation passed; no action ran.
    Clean,
    /// The cycle ended with errors before or instead of the action.
    Rejected,
    /// The action is running.
    Acting,
    /// The action ran.
    Acted,
}

/// Why a cycle failed.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Only field errors were recorded.
    #[error("Field errors")]
    FieldErrors,
    /// Only general errors were recorded.
    #[error("General errors")]
    GeneralErrors,
    /// Both field and general errors were recorded.
    #[error("Field errors and general errors")]
    FieldAndGeneralErrors,
    /// The action returned an error.
    #[error("Action failed: {0}")]
    Action(#[source] FormworkError),
}

impl SubmitError {
    fn classify(state: &FormState) -> Self {
        match (state.field_errors.is_empty(), state.general_errors.is_empty()) {
            (false, false) => Self::FieldAndGeneralErrors,
            (false, true) => Self::FieldErrors,
            _ => Self::GeneralErrors,
        }
    }

    /// A short name of the variant, for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::FieldErrors => "field",
            Self::GeneralErrors => "general",
            Self::FieldAndGeneralErrors => "field_and_general",
            Self::Action(_) => "action",
        }
    }

    /// Returns `true` if field errors were recorded.
    pub const fn has_field_errors(&self) -> bool {
        matches!(self, Self::FieldErrors | Self::FieldAndGeneralErrors)
    }

    /// Returns `true` if general errors were recorded.
    pub const fn has_general_errors(&self) -> bool {
        matches!(self, Self::GeneralErrors | Self::FieldAndGeneralErrors)
    }
}

/// A form: registry, hooks and the dispatcher.
///
/// Dereferences to [`FormState`] for the registry and value operations.
///
/// # Examples
///
/// ```
/// use formwork_forms::fields::FieldDescriptor;
/// use formwork_forms::form::Form;
/// use formwork_forms::input::FormData;
/// use formwork_forms::type_tag::TypeTag;
///
/// let mut form = Form::new("person");
/// form.add_field(FieldDescriptor::new_required("Name", TypeTag::String)).unwrap();
/// form.add_field(FieldDescriptor::new_optional("Age", TypeTag::Int)).unwrap();
///
/// let data: FormData = [("Name", "Ann"), ("Age", "30")].into_iter().collect();
/// form.parse(&data).unwrap();
/// assert_eq!(form.get_int("Age").unwrap(), 30);
/// ```
#[derive(Debug)]
pub struct Form {
    state: FormState,
    hooks: Hooks,
    cycle: CycleState,
}

impl Form {
    /// Creates an empty form using the global settings.
    ///
    /// The settings are copied at construction; configuring [`SETTINGS`]
    /// later affects only forms created afterwards.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_settings(name, SETTINGS.current())
    }

    /// Creates an empty form with explicit settings.
    pub fn with_settings(name: impl Into<String>, settings: Settings) -> Self {
        Self::with_presentation(name, settings, Box::new(FragmentList::new()))
    }

    /// Creates an empty form with a custom presentation collaborator.
    pub fn with_presentation(
        name: impl Into<String>,
        settings: Settings,
        presentation: Box<dyn Presentation>,
    ) -> Self {
        Self {
            state: FormState::new(name.into(), settings, presentation),
            hooks: Hooks::default(),
            cycle: CycleState::Idle,
        }
    }

    /// The state reached by the last cycle.
    pub const fn cycle_state(&self) -> CycleState {
        self.cycle
    }

    /// The hooks, for direct access to every slot.
    pub fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }

    /// Sets the hook run before parsing.
    pub fn on_before_parsing(&mut self, hook: impl FnMut(&mut FormState) + Send + 'static) -> &mut Self {
        self.hooks.before_parsing = Some(Box::new(hook));
        self
    }

    /// Sets the hook run after parsing.
    pub fn on_after_parsing(&mut self, hook: impl FnMut(&mut FormState) + Send + 'static) -> &mut Self {
        self.hooks.after_parsing = Some(Box::new(hook));
        self
    }

    /// Sets the hook run before validation.
    pub fn on_before_validation(
        &mut self,
        hook: impl FnMut(&mut FormState) + Send + 'static,
    ) -> &mut Self {
        self.hooks.before_validation = Some(Box::new(hook));
        self
    }

    /// Sets the hook run after validation.
    pub fn on_after_validation(
        &mut self,
        hook: impl FnMut(&mut FormState) + Send + 'static,
    ) -> &mut Self {
        self.hooks.after_validation = Some(Box::new(hook));
        self
    }

    /// Sets the hook run before the action.
    pub fn on_before_action(&mut self, hook: impl FnMut(&mut FormState) + Send + 'static) -> &mut Self {
        self.hooks.before_action = Some(Box::new(hook));
        self
    }

    /// Sets the hook run after a successful action.
    pub fn on_after_action(&mut self, hook: impl FnMut(&mut FormState) + Send + 'static) -> &mut Self {
        self.hooks.after_action = Some(Box::new(hook));
        self
    }

    /// Sets the cross-field validation function.
    pub fn set_validation(&mut self, validation: impl FnMut(&mut FormState) + Send + 'static) -> &mut Self {
        self.hooks.validation = Some(Box::new(validation));
        self
    }

    /// Sets the action.
    pub fn set_action(
        &mut self,
        action: impl FnMut(&mut FormState) -> FormworkResult<()> + Send + 'static,
    ) -> &mut Self {
        self.hooks.action = Some(Box::new(action));
        self
    }

    /// Sets the error handler.
    pub fn set_error_handler(
        &mut self,
        handler: impl FnMut(Option<&FormworkError>, &[ValidationError], &FieldErrors) + Send + 'static,
    ) -> &mut Self {
        self.hooks.error_handler = Some(Box::new(handler));
        self
    }

    /// Runs one full cycle over `data`.
    ///
    /// Returns `Ok(())` when the cycle ends without errors, whether or not
    /// an action is set. Errors recorded by `before_action` prevent the
    /// action. Errors recorded by the action itself or by `after_action`
    /// still fail the cycle, although the side effect has happened.
    pub fn parse(&mut self, data: &FormData) -> Result<(), SubmitError> {
        let span = cycle_span(&self.state.name);
        let _enter = span.enter();

        self.state.reset();
        self.transition(CycleState::Parsing);
        run_hook(self.hooks.before_parsing.as_mut(), &mut self.state);
        self.state.parse_input(data);
        run_hook(self.hooks.after_parsing.as_mut(), &mut self.state);

        run_hook(self.hooks.before_validation.as_mut(), &mut self.state);
        self.transition(CycleState::Validating);
        validate_form(&mut self.state, self.hooks.validation.as_mut());
        run_hook(self.hooks.after_validation.as_mut(), &mut self.state);

        if self.state.has_errors() {
            return Err(self.reject(None));
        }
        self.transition(CycleState::Clean);
        if self.hooks.action.is_none() {
            tracing::debug!("submission clean, no action set");
            return Ok(());
        }

        run_hook(self.hooks.before_action.as_mut(), &mut self.state);
        if self.state.has_errors() {
            return Err(self.reject(None));
        }

        self.transition(CycleState::Acting);
        let result = match self.hooks.action.as_mut() {
            Some(action) => action(&mut self.state),
            None => Ok(()),
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, "action failed");
            return Err(self.reject(Some(err)));
        }
        run_hook(self.hooks.after_action.as_mut(), &mut self.state);
        self.transition(CycleState::Acted);

        if self.state.has_errors() {
            return Err(self.report(None));
        }
        Ok(())
    }

    /// Parses a urlencoded body or query string and runs a cycle.
    pub fn parse_query(&mut self, query_string: &str) -> Result<(), SubmitError> {
        self.parse(&FormData::parse(query_string))
    }

    fn transition(&mut self, next: CycleState) {
        tracing::trace!(from = ?self.cycle, to = ?next, "cycle transition");
        self.cycle = next;
    }

    fn reject(&mut self, action_error: Option<FormworkError>) -> SubmitError {
        self.transition(CycleState::Rejected);
        self.report(action_error)
    }

    fn report(&mut self, action_error: Option<FormworkError>) -> SubmitError {
        if let Some(handler) = self.hooks.error_handler.as_mut() {
            handler(
                action_error.as_ref(),
                &self.state.general_errors,
                &self.state.field_errors,
            );
        }
        let error = match action_error {
            Some(err) => SubmitError::Action(err),
            None => SubmitError::classify(&self.state),
        };
        tracing::info!(
            kind = error.kind(),
            field_errors = self.state.field_errors.len(),
            general_errors = self.state.general_errors.len(),
            "submission rejected"
        );
        error
    }
}

impl Deref for Form {
    type Target = FormState;

    fn deref(&self) -> &FormState {
        &self.state
    }
}

impl DerefMut for Form {
    fn deref_mut(&mut self) -> &mut FormState {
        &mut self.state
    }
}

fn run_hook(hook: Option<&mut Hook>, state: &mut FormState) {
    if let Some(hook) = hook {
        hook(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use formwork_core::EmptyArrayPolicy;

    fn person() -> Form {
        let mut form = Form::with_settings("person", Settings::default());
        form.add_field(FieldDescriptor::new_required("Name", TypeTag::String))
            .unwrap();
        form.add_field(FieldDescriptor::new_optional("Age", TypeTag::Int))
            .unwrap();
        form
    }

    fn data(pairs: &[(&str, &str)]) -> FormData {
        pairs.iter().copied().collect()
    }

    fn trace() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn push(trace: &Arc<Mutex<Vec<String>>>, entry: &str) -> impl FnMut(&mut FormState) + Send + 'static {
        let trace = Arc::clone(trace);
        let entry = entry.to_string();
        move |_state: &mut FormState| trace.lock().unwrap().push(entry.clone())
    }

    // ── Registry ─────────────────────────────────────────────────────

    #[test]
    fn test_duplicate_field() {
        let mut form = person();
        let err = form
            .add_field(FieldDescriptor::new_optional("Name", TypeTag::Int))
            .unwrap_err();
        assert!(matches!(err, FormworkError::DuplicateField(ref n) if n == "Name"));
        assert_eq!(form.fields().count(), 2);
    }

    #[test]
    fn test_structured_field_needs_constructor() {
        let mut form = person();
        let err = form
            .add_field(FieldDescriptor::new_optional("Addr", TypeTag::Struct))
            .unwrap_err();
        assert!(matches!(err, FormworkError::ImproperlyConfigured(_)));
        assert!(!form.has_field("Addr"));
    }

    #[test]
    fn test_order_interleaves_html() {
        let mut form = person();
        form.add_html("<hr>");
        form.add_field(FieldDescriptor::new_optional("Vita", TypeTag::String))
            .unwrap();
        assert_eq!(
            form.order(),
            [
                Item::Field("Name".into()),
                Item::Field("Age".into()),
                Item::Html("<hr>".into()),
                Item::Field("Vita".into()),
            ]
        );
        assert_eq!(form.presentation().children().len(), 4);
        let names: Vec<_> = form.fields().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Name", "Age", "Vita"]);
    }

    #[test]
    fn test_remove_field() {
        let mut form = person();
        form.parse(&data(&[("Age", "x")])).unwrap_err();
        form.remove_field("Name").unwrap();
        form.remove_field("Age").unwrap();
        assert!(!form.has_field("Name"));
        assert!(form.required_fields().is_empty());
        assert!(form.field_errors().is_empty());
        assert!(form.presentation().children().is_empty());
        assert!(matches!(
            form.remove_field("Name"),
            Err(FormworkError::UnknownField(_))
        ));
    }

    #[test]
    fn test_require_is_idempotent() {
        let mut form = person();
        form.require("Age").unwrap();
        form.require("Age").unwrap();
        assert_eq!(form.required_fields(), ["Name".to_string(), "Age".to_string()]);
        form.unrequire("Name").unwrap();
        form.unrequire("Name").unwrap();
        assert_eq!(form.required_fields(), ["Age".to_string()]);
        assert!(!form.field("Name").unwrap().required);
        let Some(Child::Field(age)) = form.presentation().find(&|c| c.field_name() == Some("Age")) else {
            panic!("Age missing");
        };
        assert!(age.required);
        assert!(form.require("Missing").is_err());
    }

    #[test]
    fn test_set_selection_type_mismatch() {
        let mut form = person();
        let err = form.set_selection("Age", &[Value::from("old")]).unwrap_err();
        assert!(matches!(err, FormworkError::SelectionTypeMismatch { .. }));
        form.set_selection("Age", &[Value::Int(1), Value::Int(2)]).unwrap();
        assert_eq!(form.field("Age").unwrap().widget, WidgetType::Select);
    }

    #[test]
    fn test_set_type_mismatch() {
        let mut form = person();
        let err = form.set("Age", FieldValue::String("x".into())).unwrap_err();
        assert!(matches!(err, FormworkError::TypeMismatch { .. }));
        assert!(form.get_str("Age").is_err());
        assert!(matches!(form.get_int("Nope"), Err(FormworkError::UnknownField(_))));
    }

    #[test]
    fn test_getters_default_to_zero() {
        let mut form = person();
        form.add_field(FieldDescriptor::new_optional("Tags", TypeTag::StringArray))
            .unwrap();
        form.add_field(FieldDescriptor::new_optional("On", TypeTag::Bool))
            .unwrap();
        assert_eq!(form.get_int("Age").unwrap(), 0);
        assert_eq!(form.get_str("Name").unwrap(), "");
        assert!(form.get_string_array("Tags").unwrap().is_empty());
        assert!(!form.get_bool("On").unwrap());
        assert!(form.get("Age").unwrap().is_none());
    }

    #[test]
    fn test_add_field_error_unknown() {
        let mut form = person();
        let err = form
            .add_field_error("Nope", ValidationError::new("x", "custom"))
            .unwrap_err();
        assert!(matches!(err, FormworkError::UnknownField(_)));
    }

    // ── Cycle ────────────────────────────────────────────────────────

    #[test]
    fn test_clean_submission_without_action() {
        let mut form = person();
        form.parse(&data(&[("Name", "Ann"), ("Age", "30")])).unwrap();
        assert_eq!(form.cycle_state(), CycleState::Clean);
        assert_eq!(form.get_str("Name").unwrap(), "Ann");
        assert_eq!(form.get_int("Age").unwrap(), 30);
        assert_eq!(form.filled(), ["Name".to_string(), "Age".to_string()]);
    }

    #[test]
    fn test_hook_order_on_success() {
        let t = trace();
        let mut form = person();
        form.on_before_parsing(push(&t, "before_parsing"))
            .on_after_parsing(push(&t, "after_parsing"))
            .on_before_validation(push(&t, "before_validation"))
            .set_validation(push(&t, "validation"))
            .on_after_validation(push(&t, "after_validation"))
            .on_before_action(push(&t, "before_action"))
            .on_after_action(push(&t, "after_action"));
        let at = Arc::clone(&t);
        form.set_action(move |_| {
            at.lock().unwrap().push("action".into());
            Ok(())
        });

        form.parse(&data(&[("Name", "Ann")])).unwrap();
        assert_eq!(
            *t.lock().unwrap(),
            [
                "before_parsing",
                "after_parsing",
                "before_validation",
                "validation",
                "after_validation",
                "before_action",
                "action",
                "after_action"
            ]
        );
        assert_eq!(form.cycle_state(), CycleState::Acted);
    }

    #[test]
    fn test_errors_skip_action_and_call_handler_once() {
        let t = trace();
        let calls = Arc::new(Mutex::new(0));
        let mut form = person();
        form.on_before_action(push(&t, "before_action"));
        let at = Arc::clone(&t);
        form.set_action(move |_| {
            at.lock().unwrap().push("action".into());
            Ok(())
        });
        let c = Arc::clone(&calls);
        form.set_error_handler(move |action, general, fields| {
            assert!(action.is_none());
            assert!(general.is_empty());
            assert!(fields.contains_key("Name"));
            *c.lock().unwrap() += 1;
        });

        let err = form.parse(&data(&[("Age", "abc")])).unwrap_err();
        assert!(matches!(err, SubmitError::FieldErrors));
        assert!(t.lock().unwrap().is_empty());
        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(form.cycle_state(), CycleState::Rejected);
        assert_eq!(form.errors_for("Age").len(), 1);
        assert!(form.errors_for("Name")[0].is("required"));
    }

    #[test]
    fn test_before_action_errors_prevent_action() {
        let ran = Arc::new(Mutex::new(false));
        let mut form = person();
        form.on_before_action(|state| {
            state.add_general_error(ValidationError::new("locked", "locked"));
        });
        let r = Arc::clone(&ran);
        form.set_action(move |_| {
            *r.lock().unwrap() = true;
            Ok(())
        });
        let err = form.parse(&data(&[("Name", "Ann")])).unwrap_err();
        assert!(matches!(err, SubmitError::GeneralErrors));
        assert!(!*ran.lock().unwrap());
        assert_eq!(form.cycle_state(), CycleState::Rejected);
    }

    #[test]
    fn test_errors_after_action_fail_the_cycle() {
        let mut form = person();
        form.set_action(|_| Ok(()));
        form.on_after_action(|state| {
            state
                .add_field_error("Name", ValidationError::new("taken", "taken"))
                .unwrap();
            state.add_general_error(ValidationError::new("retry", "retry"));
        });
        let err = form.parse(&data(&[("Name", "Ann")])).unwrap_err();
        assert!(matches!(err, SubmitError::FieldAndGeneralErrors));
        assert!(err.has_field_errors() && err.has_general_errors());
        assert_eq!(form.cycle_state(), CycleState::Acted);
    }

    #[test]
    fn test_action_error_reaches_handler() {
        let seen = Arc::new(Mutex::new(None));
        let mut form = person();
        form.set_action(|_| Err(FormworkError::ActionFailed("disk full".into())));
        let s = Arc::clone(&seen);
        form.set_error_handler(move |action, _, _| {
            *s.lock().unwrap() = action.map(ToString::to_string);
        });
        let err = form.parse(&data(&[("Name", "Ann")])).unwrap_err();
        assert_eq!(err.kind(), "action");
        assert!(seen.lock().unwrap().as_deref().unwrap().contains("disk full"));
    }

    #[test]
    fn test_each_cycle_starts_clean() {
        let mut form = person();
        form.parse(&data(&[("Age", "x")])).unwrap_err();
        assert!(form.has_errors());
        form.parse(&data(&[("Name", "Bo")])).unwrap();
        assert!(!form.has_errors());
        assert_eq!(form.get_int("Age").unwrap(), 0);
        assert_eq!(form.filled(), ["Name".to_string()]);
    }

    #[test]
    fn test_empty_raw_values_are_not_supplied() {
        let mut form = person();
        let mut input = FormData::new();
        input.insert("Name", "");
        input.insert_list("Age", Vec::<String>::new());
        let err = form.parse(&input).unwrap_err();
        assert!(matches!(err, SubmitError::FieldErrors));
        assert!(form.filled().is_empty());
        assert!(form.errors_for("Age").is_empty());
    }

    #[test]
    fn test_unknown_input_keys_are_ignored() {
        let mut form = person();
        form.parse(&data(&[("Name", "Ann"), ("Other", "1")])).unwrap();
        assert_eq!(form.values().len(), 1);
    }

    #[test]
    fn test_hook_set_empty_array_follows_policy() {
        for (policy, ok) in [(EmptyArrayPolicy::Empty, false), (EmptyArrayPolicy::Filled, true)] {
            let settings = Settings {
                empty_array: policy,
                ..Settings::default()
            };
            let mut form = Form::with_settings("tags", settings);
            form.add_field(FieldDescriptor::new_required("Tags", TypeTag::IntArray))
                .unwrap();
            form.on_after_parsing(|state| {
                state.set("Tags", FieldValue::IntArray(vec![])).unwrap();
            });
            assert_eq!(form.parse(&FormData::new()).is_ok(), ok, "{policy:?}");
        }
    }

    #[test]
    fn test_values_for_rows() {
        let mut form = person();
        form.parse(&data(&[("Name", "Ann"), ("Age", "30")])).unwrap();
        let values = form.values();
        assert_eq!(values["Name"], Value::from("Ann"));
        assert_eq!(values["Age"], Value::Int(30));
    }

    #[test]
    fn test_values_include_unsupplied_bool_as_false() {
        let mut form = person();
        form.add_field(FieldDescriptor::new_optional("Active", TypeTag::Bool))
            .unwrap();
        form.parse(&data(&[("Name", "Ann")])).unwrap();
        let values = form.values();
        assert!(!form.get_bool("Active").unwrap());
        assert_eq!(values["Active"], Value::Bool(false));
        assert!(!values.contains_key("Age"));
    }

    #[test]
    fn test_parse_query() {
        let mut form = person();
        form.parse_query("Name=Ann+Lee&Age=4").unwrap();
        assert_eq!(form.get_str("Name").unwrap(), "Ann Lee");
    }

    #[test]
    fn test_new_leaves_global_settings_unconfigured() {
        let form = Form::new("early");
        assert_eq!(form.settings().checkbox_on_literal, "on");
        assert!(!SETTINGS.is_configured());
    }

    #[test]
    fn test_form_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Form>();
    }
}
