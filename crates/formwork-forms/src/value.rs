//! Parsed field values.
//!
//! [`FieldValue`] has one variant per [`TypeTag`]. A form stores at most one
//! value per field, and the variant always matches the field's tag.
//!
//! Structured fields come in two flavours:
//!
//! - `Struct` fields decode their JSON payload into a caller-defined type
//!   through a [`Constructor`]. Any `T: Serialize + DeserializeOwned` works.
//! - `Fill` fields hand the decoded map to a [`Filler`], a polymorphic
//!   target that fills itself and can validate itself afterwards. A
//!   [`FillFactory`] yields a fresh target for every parse cycle.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

use formwork_core::settings::EmptyArrayPolicy;
use formwork_db::value::Value;

use crate::type_tag::TypeTag;

/// A JSON object, as decoded from a `Map` or `Fill` payload.
pub type JsonMap = serde_json::Map<String, JsonValue>;

/// A decoded `Struct` field value.
///
/// Implemented for every `Serialize + Debug + Send + 'static` type.
pub trait StructValue: fmt::Debug + Send {
    /// Upcasts for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Serializes the value back to JSON.
    fn to_json(&self) -> JsonValue;
}

impl<T> StructValue for T
where
    T: Serialize + fmt::Debug + Send + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

type DecodeFn = dyn Fn(&str) -> Result<Box<dyn StructValue>, serde_json::Error> + Send + Sync;

/// Produces a `Struct` field's value from its raw JSON payload.
#[derive(Clone)]
pub struct Constructor {
    type_name: &'static str,
    decode: Arc<DecodeFn>,
}

impl Constructor {
    /// A constructor decoding payloads into `T`.
    pub fn of<T>() -> Self
    where
        T: DeserializeOwned + Serialize + fmt::Debug + Send + 'static,
    {
        Self {
            type_name: type_name::<T>(),
            decode: Arc::new(|raw| {
                let value: T = serde_json::from_str(raw)?;
                Ok(Box::new(value) as Box<dyn StructValue>)
            }),
        }
    }

    /// Decodes a raw payload into a fresh value.
    pub fn decode(&self, raw: &str) -> Result<Box<dyn StructValue>, serde_json::Error> {
        (self.decode)(raw)
    }

    /// The name of the produced type.
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Constructor").field(&self.type_name).finish()
    }
}

/// A polymorphic target for `Fill` fields.
///
/// # Examples
///
/// ```
/// use std::any::Any;
/// use formwork_forms::value::{Filler, JsonMap};
///
/// #[derive(Debug, Default)]
/// struct Point { x: i64, y: i64 }
///
/// impl Filler for Point {
///     fn fill(&mut self, values: &JsonMap) -> Result<(), String> {
///         self.x = values.get("x").and_then(|v| v.as_i64()).ok_or("x missing")?;
///         self.y = values.get("y").and_then(|v| v.as_i64()).ok_or("y missing")?;
///         Ok(())
///     }
///
///     fn validate(&self) -> Result<(), String> {
///         if self.x < 0 { Err("x must not be negative".into()) } else { Ok(()) }
///     }
///
///     fn to_json(&self) -> serde_json::Value {
///         serde_json::json!({"x": self.x, "y": self.y})
///     }
///
///     fn as_any(&self) -> &dyn Any { self }
/// }
/// ```
pub trait Filler: fmt::Debug + Send {
    /// Populates the target from a decoded JSON object.
    ///
    /// Whole-number floats in `values` have already been turned into integers.
    fn fill(&mut self, values: &JsonMap) -> Result<(), String>;

    /// Checks the filled target. Runs during validation.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Serializes the target for persistence.
    fn to_json(&self) -> JsonValue;

    /// Upcasts for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;
}

type MakeFn = dyn Fn() -> Box<dyn Filler> + Send + Sync;

/// Yields a fresh [`Filler`] target for each parse cycle.
#[derive(Clone)]
pub struct FillFactory {
    type_name: &'static str,
    make: Arc<MakeFn>,
}

impl FillFactory {
    /// A factory producing `T::default()`.
    pub fn of<T: Filler + Default + 'static>() -> Self {
        Self {
            type_name: type_name::<T>(),
            make: Arc::new(|| Box::new(T::default())),
        }
    }

    /// A factory from an arbitrary closure.
    pub fn new<F>(type_name: &'static str, make: F) -> Self
    where
        F: Fn() -> Box<dyn Filler> + Send + Sync + 'static,
    {
        Self {
            type_name,
            make: Arc::new(make),
        }
    }

    /// Produces a fresh target.
    pub fn make(&self) -> Box<dyn Filler> {
        (self.make)()
    }

    /// The name of the produced type.
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for FillFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FillFactory").field(&self.type_name).finish()
    }
}

/// Rewrites every float without a fractional part to an integer, recursively.
///
/// JSON does not distinguish `3` from `3.0`; fill targets expect integers
/// where the submitted number is whole.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
pub fn normalize_numbers(value: &mut JsonValue) {
    let whole = value
        .as_f64()
        .filter(|f| value.is_f64() && f.fract() == 0.0 && (-9.0e18..9.0e18).contains(f));
    if let Some(f) = whole {
        *value = JsonValue::from(f as i64);
        return;
    }
    match value {
        JsonValue::Array(items) => items.iter_mut().for_each(normalize_numbers),
        JsonValue::Object(map) => map.values_mut().for_each(normalize_numbers),
        _ => {}
    }
}

/// The parsed value of one field.
///
/// Emptiness, as used by the required check, conflates "never set" with
/// "set to the zero value": an `Int` holding `0` is empty. See
/// [`is_empty`](FieldValue::is_empty).
#[derive(Debug)]
pub enum FieldValue {
    /// An integer.
    Int(i64),
    /// Text.
    String(String),
    /// A float.
    Float(f64),
    /// A boolean.
    Bool(bool),
    /// A list of integers.
    IntArray(Vec<i64>),
    /// A list of strings.
    StringArray(Vec<String>),
    /// A list of floats.
    FloatArray(Vec<f64>),
    /// A decoded JSON object and its raw payload.
    Map {
        /// The submitted payload.
        raw: String,
        /// The decoded object; empty if decoding failed.
        value: JsonMap,
    },
    /// A caller-defined value and its raw payload.
    Struct {
        /// The submitted payload.
        raw: String,
        /// The decoded value; `None` if decoding failed.
        value: Option<Box<dyn StructValue>>,
    },
    /// A filled target and its raw payload.
    Fill {
        /// The submitted payload.
        raw: String,
        /// The target.
        value: Box<dyn Filler>,
    },
}

impl FieldValue {
    /// The tag this value belongs to.
    pub const fn tag(&self) -> TypeTag {
        match self {
            Self::Int(_) => TypeTag::Int,
            Self::String(_) => TypeTag::String,
            Self::Float(_) => TypeTag::Float,
            Self::Bool(_) => TypeTag::Bool,
            Self::IntArray(_) => TypeTag::IntArray,
            Self::StringArray(_) => TypeTag::StringArray,
            Self::FloatArray(_) => TypeTag::FloatArray,
            Self::Map { .. } => TypeTag::Map,
            Self::Struct { .. } => TypeTag::Struct,
            Self::Fill { .. } => TypeTag::Fill,
        }
    }

    /// The zero value for a tag. `Fill` has none.
    pub fn zero(tag: TypeTag) -> Option<Self> {
        Some(match tag {
            TypeTag::Int => Self::Int(0),
            TypeTag::String => Self::String(String::new()),
            TypeTag::Float => Self::Float(0.0),
            TypeTag::Bool => Self::Bool(false),
            TypeTag::IntArray => Self::IntArray(Vec::new()),
            TypeTag::StringArray => Self::StringArray(Vec::new()),
            TypeTag::FloatArray => Self::FloatArray(Vec::new()),
            TypeTag::Map => Self::Map {
                raw: String::new(),
                value: JsonMap::new(),
            },
            TypeTag::Struct => Self::Struct {
                raw: String::new(),
                value: None,
            },
            TypeTag::Fill => return None,
        })
    }

    /// Whether the value counts as empty for the required check.
    ///
    /// `0`, `0.0` and `""` are empty. A stored zero-length array is empty
    /// under [`EmptyArrayPolicy::Empty`]. `Map` and `Struct` values are empty
    /// when their raw payload is. A stored `Fill` target and any `Bool` are
    /// never empty.
    #[allow(clippy::float_cmp)]
    pub fn is_empty(&self, policy: EmptyArrayPolicy) -> bool {
        let empty_arrays = policy == EmptyArrayPolicy::Empty;
        match self {
            Self::Int(i) => *i == 0,
            Self::String(s) => s.is_empty(),
            Self::Float(f) => *f == 0.0,
            Self::Bool(_) | Self::Fill { .. } => false,
            Self::IntArray(v) => empty_arrays && v.is_empty(),
            Self::StringArray(v) => empty_arrays && v.is_empty(),
            Self::FloatArray(v) => empty_arrays && v.is_empty(),
            Self::Map { raw, .. } | Self::Struct { raw, .. } => raw.is_empty(),
        }
    }

    /// The raw payload of a structured value.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::Map { raw, .. } | Self::Struct { raw, .. } | Self::Fill { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Converts to the value handed to rows.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(i) => Value::Int(*i),
            Self::String(s) => Value::String(s.clone()),
            Self::Float(f) => Value::Float(*f),
            Self::Bool(b) => Value::Bool(*b),
            Self::IntArray(v) => Value::List(v.iter().copied().map(Value::Int).collect()),
            Self::StringArray(v) => Value::List(v.iter().cloned().map(Value::String).collect()),
            Self::FloatArray(v) => Value::List(v.iter().copied().map(Value::Float).collect()),
            Self::Map { value, .. } => Value::Json(JsonValue::Object(value.clone())),
            Self::Struct { value, .. } => value
                .as_ref()
                .map_or(Value::Null, |v| Value::Json(v.to_json())),
            Self::Fill { value, .. } => Value::Json(value.to_json()),
        }
    }

    /// Renders scalar values for messages: strings quoted, numbers plain.
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => format!("{s:?}"),
            Self::Bool(b) => b.to_string(),
            other => other.to_value().to_string(),
        }
    }
}

impl PartialEq for FieldValue {
    /// Structured values compare by raw payload.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::IntArray(a), Self::IntArray(b)) => a == b,
            (Self::StringArray(a), Self::StringArray(b)) => a == b,
            (Self::FloatArray(a), Self::FloatArray(b)) => a == b,
            (Self::Map { raw: a, .. }, Self::Map { raw: b, .. })
            | (Self::Struct { raw: a, .. }, Self::Struct { raw: b, .. })
            | (Self::Fill { raw: a, .. }, Self::Fill { raw: b, .. }) => a == b,
            _ => false,
        }
    }
}
