//! Per-form storage of parsed values and accumulated field errors.

use std::collections::HashMap;

use formwork_core::settings::EmptyArrayPolicy;
use formwork_core::utils::MultiValueDict;
use formwork_core::ValidationError;

use crate::type_tag::TypeTag;
use crate::value::FieldValue;

/// Field name to accumulated errors, in the order fields first failed.
pub type FieldErrors = MultiValueDict<String, ValidationError>;

/// Parsed values keyed by field name, plus the names supplied in the
/// current cycle.
#[derive(Debug, Default)]
pub struct ValueStore {
    values: HashMap<String, FieldValue>,
    filled: Vec<String>,
}

impl ValueStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored value for a field.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Returns the stored value for a field, mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldValue> {
        self.values.get_mut(name)
    }

    /// Stores a value, replacing any previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.values.insert(name.into(), value);
    }

    /// Removes a field's value and its filled marker.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.filled.retain(|n| n != name);
        self.values.remove(name)
    }

    /// Records that a non-empty raw value was supplied for `name`.
    pub fn mark_filled(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.filled.contains(&name) {
            self.filled.push(name);
        }
    }

    /// Names supplied in the current cycle.
    pub fn filled(&self) -> &[String] {
        &self.filled
    }

    /// Whether the field counts as empty for the required check.
    ///
    /// A missing value is empty unless the field is a `Bool`.
    pub fn is_empty_value(&self, name: &str, tag: TypeTag, policy: EmptyArrayPolicy) -> bool {
        self.values
            .get(name)
            .map_or(tag != TypeTag::Bool, |v| v.is_empty(policy))
    }

    /// Iterates stored values in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drops every value and filled marker.
    pub fn clear(&mut self) {
        self.values.clear();
        self.filled.clear();
    }
}
