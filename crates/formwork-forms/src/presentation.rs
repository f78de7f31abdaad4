//! The presentation collaborator.
//!
//! A form keeps an ordered tree of children for whatever renders it: one
//! [`Child::Field`] per field and [`Child::Html`] for literal fragments
//! interleaved between fields. The form updates the tree when fields are
//! added, removed, required, relabelled or restricted to a selection.
//!
//! [`Presentation`] is the seam; [`FragmentList`] is the plain in-memory
//! implementation.

use std::fmt;

use crate::fields::FieldDescriptor;
use crate::widgets::WidgetType;

/// Presentation data for a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChild {
    /// The field name (HTML name attribute).
    pub name: String,
    /// Human-readable label.
    pub label: String,
    /// The widget to render.
    pub widget: WidgetType,
    /// Whether the field is marked as required.
    pub required: bool,
    /// Options for select widgets, in order.
    pub options: Vec<String>,
}

impl From<&FieldDescriptor> for FieldChild {
    fn from(field: &FieldDescriptor) -> Self {
        Self {
            name: field.name.clone(),
            label: field.label.clone(),
            widget: field.widget,
            required: field.required,
            options: field.select_options(),
        }
    }
}

/// One entry of the presentation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    /// A field.
    Field(FieldChild),
    /// A literal HTML fragment.
    Html(String),
}

impl Child {
    /// The field name, for field children.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Self::Field(f) => Some(&f.name),
            Self::Html(_) => None,
        }
    }
}

/// Receives a form's presentation updates.
pub trait Presentation: fmt::Debug + Send {
    /// Appends a child.
    fn add_child(&mut self, child: Child);

    /// Removes the field child named `name`. Returns `true` if one was removed.
    fn remove_field(&mut self, name: &str) -> bool;

    /// Returns the field child named `name`, mutably.
    fn field_mut(&mut self, name: &str) -> Option<&mut FieldChild>;

    /// All children, in order.
    fn children(&self) -> &[Child];

    /// Returns the first child matching `predicate`.
    fn find(&self, predicate: &dyn Fn(&Child) -> bool) -> Option<&Child> {
        self.children().iter().find(|c| predicate(c))
    }

    /// Marks a field as required or optional.
    fn set_required(&mut self, name: &str, required: bool) {
        if let Some(field) = self.field_mut(name) {
            field.required = required;
        }
    }

    /// Replaces a field's options and widget.
    fn set_selection(&mut self, name: &str, options: Vec<String>, widget: WidgetType) {
        if let Some(field) = self.field_mut(name) {
            field.options = options;
            field.widget = widget;
        }
    }

    /// Replaces a field's label.
    fn set_label(&mut self, name: &str, label: &str) {
        if let Some(field) = self.field_mut(name) {
            field.label = label.to_string();
        }
    }
}

/// An in-memory list of children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentList {
    children: Vec<Child>,
}

impl FragmentList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Presentation for FragmentList {
    fn add_child(&mut self, child: Child) {
        self.children.push(child);
    }

    fn remove_field(&mut self, name: &str) -> bool {
        let before = self.children.len();
        self.children.retain(|c| c.field_name() != Some(name));
        self.children.len() != before
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut FieldChild> {
        self.children.iter_mut().find_map(|c| match c {
            Child::Field(f) if f.name == name => Some(f),
            _ => None,
        })
    }

    fn children(&self) -> &[Child] {
        &self.children
    }
}
