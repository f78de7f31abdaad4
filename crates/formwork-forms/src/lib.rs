//! # formwork-forms
//!
//! Typed form fields, parsing, validation and action dispatch for formwork.
//!
//! ## Modules
//!
//! - [`type_tag`] - The kinds a field value can have
//! - [`value`] - Parsed values, struct constructors and fill targets
//! - [`fields`] - Field descriptors and allowed-value sets
//! - [`input`] - Raw submissions (`FormData`, `RawValue`)
//! - [`parser`] - Raw input to typed values
//! - [`store`] - The value store and field error collection
//! - [`validation`] - Required, selection, custom and fill validation
//! - [`form`] - `Form`, hooks and the parse/validate/act cycle
//! - [`presentation`] - The presentation tree a renderer consumes
//! - [`widgets`] - Widget kinds
//! - [`table_form`] - Forms generated from table definitions

pub mod fields;
pub mod form;
pub mod input;
pub mod parser;
pub mod presentation;
pub mod store;
pub mod table_form;
pub mod type_tag;
pub mod validation;
pub mod value;
pub mod widgets;

pub use fields::{FieldDescriptor, Selection};
pub use form::{CycleState, Form, FormState, Hooks, SubmitError};
pub use input::{FormData, RawValue};
pub use presentation::{Child, FieldChild, FragmentList, Presentation};
pub use store::{FieldErrors, ValueStore};
pub use table_form::TableForm;
pub use type_tag::TypeTag;
pub use value::{Constructor, FieldValue, FillFactory, Filler, JsonMap};
pub use widgets::WidgetType;
