//! Field descriptors.
//!
//! A [`FieldDescriptor`] names a field, fixes its [`TypeTag`], and carries
//! the per-field parameters: whether it is required, an optional set of
//! allowed values ([`Selection`]), the [`Constructor`] or [`FillFactory`]
//! structured fields need, and presentation hints.

use formwork_core::{FormworkError, FormworkResult, ValidationError};
use formwork_db::value::Value;

use crate::type_tag::TypeTag;
use crate::value::{Constructor, FieldValue, FillFactory, Filler};
use crate::widgets::WidgetType;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// An allowed-value set, typed after the field it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Allowed integers.
    Int(Vec<i64>),
    /// Allowed floats.
    Float(Vec<f64>),
    /// Allowed strings.
    String(Vec<String>),
}

impl Selection {
    /// Converts declared allowed values to the field's tag.
    ///
    /// `Int` fields accept integers and integral strings, `Float` fields
    /// floats and integers, `String` fields strings and scalars rendered as
    /// text. Anything else fails with
    /// [`FormworkError::SelectionTypeMismatch`].
    pub fn for_tag(field: &str, tag: TypeTag, values: &[Value]) -> FormworkResult<Self> {
        let mismatch = |detail: String| FormworkError::SelectionTypeMismatch {
            field: field.to_string(),
            expected: tag.to_string(),
            detail,
        };
        match tag {
            TypeTag::Int => values
                .iter()
                .map(|v| match v {
                    Value::Int(i) => Ok(*i),
                    Value::String(s) => s
                        .parse::<i64>()
                        .map_err(|_| mismatch(format!("{s:?} is no int"))),
                    other => Err(mismatch(format!("{} value {other}", other.kind()))),
                })
                .collect::<FormworkResult<_>>()
                .map(Self::Int),
            TypeTag::Float => values
                .iter()
                .map(|v| {
                    v.as_float()
                        .ok_or_else(|| mismatch(format!("{} value {v}", v.kind())))
                })
                .collect::<FormworkResult<_>>()
                .map(Self::Float),
            TypeTag::String => values
                .iter()
                .map(|v| match v {
                    Value::String(s) => Ok(s.clone()),
                    Value::Int(_) | Value::Float(_) | Value::Bool(_) => Ok(v.to_string()),
                    other => Err(mismatch(format!("{} value {other}", other.kind()))),
                })
                .collect::<FormworkResult<_>>()
                .map(Self::String),
            _ => Err(mismatch("type does not support a selection".to_string())),
        }
    }

    /// Returns `true` if `value` is one of the allowed values.
    ///
    /// A value of another kind is never contained.
    pub fn contains(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (Self::Int(allowed), FieldValue::Int(i)) => allowed.contains(i),
            (Self::Float(allowed), FieldValue::Float(f)) => allowed.contains(f),
            (Self::String(allowed), FieldValue::String(s)) => allowed.contains(s),
            _ => false,
        }
    }

    /// The allowed values as option strings, in declaration order.
    pub fn options(&self) -> Vec<String> {
        match self {
            Self::Int(v) => v.iter().map(ToString::to_string).collect(),
            Self::Float(v) => v.iter().map(ToString::to_string).collect(),
            Self::String(v) => v.clone(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Int(v) => format!("{v:?}"),
            Self::Float(v) => format!("{v:?}"),
            Self::String(v) => format!("{v:?}"),
        }
    }
}

/// Complete definition of a form field.
///
/// # Examples
///
/// ```
/// use formwork_forms::fields::FieldDescriptor;
/// use formwork_forms::type_tag::TypeTag;
///
/// let age = FieldDescriptor::new_required("Age", TypeTag::Int).label("Your age");
/// assert!(age.required);
/// assert_eq!(age.label, "Your age");
/// ```
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// The field name, unique within a form.
    pub name: String,
    /// The value kind.
    pub type_tag: TypeTag,
    /// Whether an empty value is an error.
    pub required: bool,
    /// Allowed values, if restricted.
    pub selection: Option<Selection>,
    /// Decoder for `Struct` fields.
    pub constructor: Option<Constructor>,
    /// Target factory for `Fill` fields.
    pub filler: Option<FillFactory>,
    /// Human-readable label.
    pub label: String,
    /// The widget used for rendering.
    pub widget: WidgetType,
    /// Fixed options for select widgets on fields without a selection.
    pub options: Vec<String>,
}

impl FieldDescriptor {
    /// Creates an optional field with the default widget for its kind.
    pub fn new(name: impl Into<String>, type_tag: TypeTag) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            type_tag,
            required: false,
            selection: None,
            constructor: None,
            filler: None,
            widget: WidgetType::for_tag(type_tag),
            options: Vec::new(),
        }
    }

    /// Creates a required field.
    pub fn new_required(name: impl Into<String>, type_tag: TypeTag) -> Self {
        Self::new(name, type_tag).required(true)
    }

    /// Creates an optional field.
    pub fn new_optional(name: impl Into<String>, type_tag: TypeTag) -> Self {
        Self::new(name, type_tag)
    }

    /// Creates a `Struct` field decoding into `T`.
    pub fn structured<T>(name: impl Into<String>) -> Self
    where
        T: DeserializeOwned + Serialize + std::fmt::Debug + Send + 'static,
    {
        Self::new(name, TypeTag::Struct).constructor(Constructor::of::<T>())
    }

    /// Creates a `Fill` field filling fresh `T::default()` targets.
    pub fn fill<T: Filler + Default + 'static>(name: impl Into<String>) -> Self {
        Self::new(name, TypeTag::Fill).filler(FillFactory::of::<T>())
    }

    /// Sets whether this field is required.
    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the widget.
    #[must_use]
    pub const fn widget(mut self, widget: WidgetType) -> Self {
        self.widget = widget;
        self
    }

    /// Sets fixed select options, shown when no selection is declared.
    #[must_use]
    pub fn options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    /// The options a select widget offers: the selection if declared,
    /// otherwise the fixed options.
    pub fn select_options(&self) -> Vec<String> {
        self.selection
            .as_ref()
            .map_or_else(|| self.options.clone(), Selection::options)
    }

    /// Sets the constructor for a `Struct` field.
    #[must_use]
    pub fn constructor(mut self, constructor: Constructor) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Sets the target factory for a `Fill` field.
    #[must_use]
    pub fn filler(mut self, factory: FillFactory) -> Self {
        self.filler = Some(factory);
        self
    }

    /// Restricts the field to `values`, switching to a select widget.
    pub fn selection(mut self, values: &[Value]) -> FormworkResult<Self> {
        self.set_selection(values)?;
        Ok(self)
    }

    pub(crate) fn set_selection(&mut self, values: &[Value]) -> FormworkResult<()> {
        self.selection = Some(Selection::for_tag(&self.name, self.type_tag, values)?);
        self.widget = WidgetType::for_selection(self.type_tag);
        Ok(())
    }

    /// Verifies that the descriptor is usable.
    ///
    /// `Struct` fields need a constructor and `Fill` fields a factory.
    pub fn check(&self) -> FormworkResult<()> {
        let missing = match self.type_tag {
            TypeTag::Struct if self.constructor.is_none() => Some("a constructor"),
            TypeTag::Fill if self.filler.is_none() => Some("a fill factory"),
            _ => None,
        };
        match missing {
            Some(what) => Err(FormworkError::ImproperlyConfigured(format!(
                "{} field {} needs {what}",
                self.type_tag, self.name
            ))),
            None => Ok(()),
        }
    }

    /// Checks a parsed value against the selection.
    ///
    /// Returns `None` when no selection is declared or nothing was stored.
    /// An unsupplied field is never checked: its zero value is not compared
    /// against the selection, so an optional field may stay unset.
    pub fn check_allowed(&self, value: Option<&FieldValue>) -> Option<ValidationError> {
        let selection = self.selection.as_ref()?;
        let value = value?;
        if selection.contains(value) {
            return None;
        }
        let shown = value.describe();
        Some(
            ValidationError::new(
                format!("{shown} not in {}", selection.describe()),
                "not_allowed",
            )
            .with_param("value", shown),
        )
    }
}
