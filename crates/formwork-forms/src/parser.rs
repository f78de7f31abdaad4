//! Turning raw input into typed field values.
//!
//! [`parse_field`] dispatches on the field's [`TypeTag`]. It never fails as
//! a whole: a value that does not parse yields a [`ValidationError`] next to
//! whatever could be stored, and the cycle carries on with the next field.

use formwork_core::{Settings, ValidationError};

use crate::fields::FieldDescriptor;
use crate::input::RawValue;
use crate::type_tag::TypeTag;
use crate::value::{normalize_numbers, FieldValue, JsonMap};

/// The outcome of parsing one field.
#[derive(Debug, Default)]
pub struct Parsed {
    /// The value to store, if any.
    pub value: Option<FieldValue>,
    /// Errors to record against the field.
    pub errors: Vec<ValidationError>,
}

impl Parsed {
    fn ok(value: FieldValue) -> Self {
        Self {
            value: Some(value),
            errors: Vec::new(),
        }
    }

    fn with_error(value: FieldValue, error: ValidationError) -> Self {
        Self {
            value: Some(value),
            errors: vec![error],
        }
    }
}

/// Parses a supplied raw value for `field`.
///
/// Scalar and structured kinds read the last element of a list. Array kinds
/// split a single string on [`Settings::array_separator`] and take a list
/// element by element.
pub fn parse_field(field: &FieldDescriptor, raw: &RawValue, settings: &Settings) -> Parsed {
    let last = raw.last().unwrap_or_default();
    match field.type_tag {
        TypeTag::Int => match parse_int(last) {
            Ok(i) => Parsed::ok(FieldValue::Int(i)),
            Err(e) => Parsed::with_error(FieldValue::Int(0), e),
        },
        TypeTag::Float => match parse_float(last) {
            Ok(f) => Parsed::ok(FieldValue::Float(f)),
            Err(e) => Parsed::with_error(FieldValue::Float(0.0), e),
        },
        TypeTag::String => Parsed::ok(FieldValue::String(last.to_string())),
        TypeTag::Bool => match parse_bool(last, &settings.checkbox_on_literal) {
            Ok(b) => Parsed::ok(FieldValue::Bool(b)),
            Err(e) => Parsed::with_error(FieldValue::Bool(false), e),
        },
        TypeTag::IntArray => {
            let (items, errors) = parse_elements(raw, settings, parse_int);
            Parsed {
                value: Some(FieldValue::IntArray(items)),
                errors,
            }
        }
        TypeTag::FloatArray => {
            let (items, errors) = parse_elements(raw, settings, parse_float);
            Parsed {
                value: Some(FieldValue::FloatArray(items)),
                errors,
            }
        }
        TypeTag::StringArray => {
            Parsed::ok(FieldValue::StringArray(split_elements(raw, settings)))
        }
        TypeTag::Map => parse_map(last),
        TypeTag::Struct => parse_struct(field, last),
        TypeTag::Fill => parse_fill(field, last),
    }
}

/// Parses a base-10 integer.
pub fn parse_int(raw: &str) -> Result<i64, ValidationError> {
    raw.parse::<i64>().map_err(|_| invalid(raw, "int"))
}

/// Parses a float.
pub fn parse_float(raw: &str) -> Result<f64, ValidationError> {
    raw.parse::<f64>().map_err(|_| invalid(raw, "float"))
}

/// Parses a boolean.
///
/// `on_literal` (the checkbox value) means `true`. Otherwise only
/// `1 t T true TRUE True` and `0 f F false FALSE False` are accepted.
pub fn parse_bool(raw: &str, on_literal: &str) -> Result<bool, ValidationError> {
    if raw == on_literal {
        return Ok(true);
    }
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(invalid(raw, "bool")),
    }
}

fn invalid(raw: &str, kind: &str) -> ValidationError {
    ValidationError::new(format!("{raw:?} is no {kind}"), "invalid").with_param("value", raw)
}

fn split_elements(raw: &RawValue, settings: &Settings) -> Vec<String> {
    match raw {
        RawValue::Single(s) => s
            .split(settings.array_separator)
            .map(|part| {
                if settings.trim_array_elements {
                    part.trim().to_string()
                } else {
                    part.to_string()
                }
            })
            .collect(),
        RawValue::Multi(list) => list.clone(),
    }
}

/// Parses every element; failures are reported per element and skipped.
fn parse_elements<T>(
    raw: &RawValue,
    settings: &Settings,
    parse: fn(&str) -> Result<T, ValidationError>,
) -> (Vec<T>, Vec<ValidationError>) {
    let mut items = Vec::new();
    let mut errors = Vec::new();
    for (index, element) in split_elements(raw, settings).iter().enumerate() {
        match parse(element) {
            Ok(item) => items.push(item),
            Err(e) => errors.push(e.with_param("index", index.to_string())),
        }
    }
    (items, errors)
}

fn decode_error(raw: &str, err: &serde_json::Error) -> ValidationError {
    ValidationError::new(format!("{raw:?} could not be decoded: {err}"), "invalid")
        .with_param("value", raw)
}

fn parse_map(raw: &str) -> Parsed {
    match serde_json::from_str::<JsonMap>(raw) {
        Ok(value) => Parsed::ok(FieldValue::Map {
            raw: raw.to_string(),
            value,
        }),
        Err(e) => Parsed::with_error(
            FieldValue::Map {
                raw: raw.to_string(),
                value: JsonMap::new(),
            },
            decode_error(raw, &e),
        ),
    }
}

fn parse_struct(field: &FieldDescriptor, raw: &str) -> Parsed {
    let Some(constructor) = &field.constructor else {
        return Parsed {
            value: None,
            errors: vec![missing_collaborator(field)],
        };
    };
    match constructor.decode(raw) {
        Ok(value) => Parsed::ok(FieldValue::Struct {
            raw: raw.to_string(),
            value: Some(value),
        }),
        Err(e) => Parsed::with_error(
            FieldValue::Struct {
                raw: raw.to_string(),
                value: None,
            },
            decode_error(raw, &e),
        ),
    }
}

/// Decodes, normalizes, then fills a fresh target.
///
/// The target is stored even when decoding or filling fails so that its own
/// validation still runs.
fn parse_fill(field: &FieldDescriptor, raw: &str) -> Parsed {
    let Some(factory) = &field.filler else {
        return Parsed {
            value: None,
            errors: vec![missing_collaborator(field)],
        };
    };
    let mut target = factory.make();
    let mut errors = Vec::new();
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(mut decoded) => {
            normalize_numbers(&mut decoded);
            match decoded {
                serde_json::Value::Object(map) => {
                    if let Err(message) = target.fill(&map) {
                        errors.push(ValidationError::new(message, "invalid_fill"));
                    }
                }
                other => errors.push(
                    ValidationError::new(format!("{raw:?} is no object"), "invalid")
                        .with_param("value", other.to_string()),
                ),
            }
        }
        Err(e) => errors.push(decode_error(raw, &e)),
    }
    Parsed {
        value: Some(FieldValue::Fill {
            raw: raw.to_string(),
            value: target,
        }),
        errors,
    }
}

fn missing_collaborator(field: &FieldDescriptor) -> ValidationError {
    ValidationError::new(
        format!("{} field {} cannot be decoded", field.type_tag, field.name),
        "improperly_configured",
    )
}
