//! Type tags: the semantic kind of a form field's value.
//!
//! A [`TypeTag`] is fixed when a field is created. It selects which
//! [`FieldValue`](crate::value::FieldValue) variant holds the field's value,
//! which parse routine applies to raw input, and which emptiness rule the
//! required check uses.

use std::fmt;

/// The closed set of field value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TypeTag {
    /// A base-10 integer.
    Int,
    /// Verbatim text.
    String,
    /// A floating-point number.
    Float,
    /// A boolean; the checkbox literal (`"on"`) maps to `true`, otherwise
    /// `1 t T true TRUE True` and `0 f F false FALSE False` are accepted.
    Bool,
    /// A list of integers.
    IntArray,
    /// A list of strings.
    StringArray,
    /// A list of floats.
    FloatArray,
    /// A JSON object decoded into a string-keyed map.
    Map,
    /// A JSON object decoded into a caller-defined type.
    Struct,
    /// A JSON object handed to a [`Filler`](crate::value::Filler).
    Fill,
}

impl TypeTag {
    /// Every tag, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Int,
        Self::String,
        Self::Float,
        Self::Bool,
        Self::IntArray,
        Self::StringArray,
        Self::FloatArray,
        Self::Map,
        Self::Struct,
        Self::Fill,
    ];

    /// A short lowercase name, used in messages.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::String => "string",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::IntArray => "int array",
            Self::StringArray => "string array",
            Self::FloatArray => "float array",
            Self::Map => "map",
            Self::Struct => "struct",
            Self::Fill => "fill",
        }
    }

    /// Returns `true` for the three array kinds.
    pub const fn is_array(self) -> bool {
        matches!(self, Self::IntArray | Self::StringArray | Self::FloatArray)
    }

    /// Returns `true` for kinds whose raw input is a JSON payload.
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Map | Self::Struct | Self::Fill)
    }

    /// Returns `true` if an allowed-value set can be declared for this kind.
    pub const fn supports_selection(self) -> bool {
        matches!(self, Self::Int | Self::Float | Self::String)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
