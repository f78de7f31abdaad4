//! Widget kinds for the presentation layer.
//!
//! A [`WidgetType`] tells whatever renders a form which HTML control to use
//! for a field. Rendering itself lives outside this crate; the dispatcher
//! only records the choice on each presentation child.

use std::fmt;

use crate::type_tag::TypeTag;

/// Enumerates the built-in widget kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum WidgetType {
    /// `<input type="text">`.
    TextInput,
    /// `<input type="number">`.
    NumberInput,
    /// `<input type="hidden">`.
    HiddenInput,
    /// `<textarea>`.
    Textarea,
    /// `<input type="checkbox">`.
    CheckboxInput,
    /// `<select>`.
    Select,
    /// `<select multiple>`.
    SelectMultiple,
    /// `<input type="date">`.
    DateInput,
    /// `<input type="time">`.
    TimeInput,
}

impl WidgetType {
    /// The default widget for a field of the given kind.
    pub const fn for_tag(tag: TypeTag) -> Self {
        match tag {
            TypeTag::Int | TypeTag::Float => Self::NumberInput,
            TypeTag::Bool => Self::CheckboxInput,
            TypeTag::String | TypeTag::IntArray | TypeTag::StringArray | TypeTag::FloatArray => {
                Self::TextInput
            }
            TypeTag::Map | TypeTag::Struct | TypeTag::Fill => Self::Textarea,
        }
    }

    /// The widget used once an allowed-value set is attached.
    pub const fn for_selection(tag: TypeTag) -> Self {
        if tag.is_array() {
            Self::SelectMultiple
        } else {
            Self::Select
        }
    }

    /// The `type` attribute for `<input>` widgets, `None` for other elements.
    pub const fn input_type(self) -> Option<&'static str> {
        match self {
            Self::TextInput => Some("text"),
            Self::NumberInput => Some("number"),
            Self::HiddenInput => Some("hidden"),
            Self::CheckboxInput => Some("checkbox"),
            Self::DateInput => Some("date"),
            Self::TimeInput => Some("time"),
            Self::Textarea | Self::Select | Self::SelectMultiple => None,
        }
    }
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TextInput => "TextInput",
            Self::NumberInput => "NumberInput",
            Self::HiddenInput => "HiddenInput",
            Self::Textarea => "Textarea",
            Self::CheckboxInput => "CheckboxInput",
            Self::Select => "Select",
            Self::SelectMultiple => "SelectMultiple",
            Self::DateInput => "DateInput",
            Self::TimeInput => "TimeInput",
        };
        write!(f, "{name}")
    }
}
