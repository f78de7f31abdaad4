//! Forms generated from a table definition.
//!
//! [`TableForm`] derives one field per column of a [`TableDef`]: the column
//! type picks the field's tag and widget, nullability decides whether the
//! field is required, and column choices become its selection. A save
//! action binds the form to a [`Row`].

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};

use formwork_core::{FormworkError, FormworkResult, Settings, SETTINGS};
use formwork_db::fields::{ColumnDef, ColumnType, TableDef};
use formwork_db::row::Row;
use formwork_db::value::Value;

use crate::fields::FieldDescriptor;
use crate::form::Form;
use crate::type_tag::TypeTag;
use crate::widgets::WidgetType;

/// Maps a column type to a field tag. Only numbers and booleans keep their
/// type; everything else is edited as text.
pub const fn tag_for_column(column_type: &ColumnType) -> TypeTag {
    match column_type {
        ColumnType::Int => TypeTag::Int,
        ColumnType::Float => TypeTag::Float,
        ColumnType::Bool => TypeTag::Bool,
        _ => TypeTag::String,
    }
}

/// Picks the widget for a column.
pub const fn widget_for_column(column: &ColumnDef) -> WidgetType {
    if column.choices.is_some() {
        return WidgetType::Select;
    }
    match column.column_type {
        ColumnType::Bool => WidgetType::Select,
        ColumnType::Text | ColumnType::Xml => WidgetType::Textarea,
        ColumnType::Int | ColumnType::Float => WidgetType::NumberInput,
        ColumnType::Date => WidgetType::DateInput,
        ColumnType::Time => WidgetType::TimeInput,
        ColumnType::VarChar { .. } | ColumnType::Timestamp => WidgetType::TextInput,
    }
}

/// Builds the descriptor for one column.
///
/// Every non-nullable column is required, the primary key included. Forms
/// that insert new rows remove or unrequire the key field themselves.
pub fn descriptor_for_column(column: &ColumnDef) -> FormworkResult<FieldDescriptor> {
    let tag = tag_for_column(&column.column_type);
    let mut field = FieldDescriptor::new(&column.name, tag).required(!column.null);
    if let Some(choices) = &column.choices {
        field = field.selection(choices)?;
    }
    field = field.widget(widget_for_column(column));
    if column.column_type == ColumnType::Bool {
        field = field.options(vec!["true".to_string(), "false".to_string()]);
    }
    Ok(field)
}

/// A form bound to a table.
///
/// Dereferences to [`Form`], so hooks, parsing and every registry
/// operation are available directly.
///
/// # Examples
///
/// ```
/// use formwork_db::fields::{ColumnDef, ColumnType, TableDef};
/// use formwork_forms::table_form::TableForm;
///
/// let table = TableDef::new(
///     "person",
///     vec![
///         ColumnDef::new("Id", ColumnType::Int).primary_key(),
///         ColumnDef::new("Name", ColumnType::Text),
///         ColumnDef::new("Vita", ColumnType::Text).nullable(),
///     ],
/// );
/// let mut form = TableForm::new(&table).unwrap();
/// assert!(form.field("Id").unwrap().required);
/// assert!(form.field("Name").unwrap().required);
/// assert!(!form.field("Vita").unwrap().required);
///
/// // A form for new rows drops the key.
/// form.remove_field("Id").unwrap();
/// assert!(!form.has_field("Id"));
/// ```
#[derive(Debug)]
pub struct TableForm {
    form: Form,
    table: TableDef,
}

impl TableForm {
    /// Creates a form for `table` using the global settings.
    pub fn new(table: &TableDef) -> FormworkResult<Self> {
        Self::with_settings(table, SETTINGS.current())
    }

    /// Creates a form for `table` with explicit settings.
    ///
    /// Fails if two columns share a name or column choices do not fit the
    /// column type.
    pub fn with_settings(table: &TableDef, settings: Settings) -> FormworkResult<Self> {
        let mut form = Form::with_settings(&table.name, settings);
        for column in &table.columns {
            form.add_field(descriptor_for_column(column)?)?;
        }
        tracing::debug!(table = %table.name, fields = table.columns.len(), "table form created");
        Ok(Self {
            form,
            table: table.clone(),
        })
    }

    /// The table this form edits.
    pub const fn table(&self) -> &TableDef {
        &self.table
    }

    /// Unwraps the inner form.
    pub fn into_form(self) -> Form {
        self.form
    }

    /// Sets several labels at once.
    pub fn set_labels(&mut self, labels: &[(&str, &str)]) -> FormworkResult<()> {
        for (name, label) in labels {
            self.form.set_label(name, label)?;
        }
        Ok(())
    }

    /// Sets the action to fill `row` from the form's values and save it.
    ///
    /// When `pk` is given it is written to the primary key column after
    /// filling, so an existing record is updated.
    pub fn set_save_action<R>(&mut self, row: Arc<Mutex<R>>, pk: Option<Value>)
    where
        R: Row + ?Sized + 'static,
    {
        let pk_column = self.table.primary_key().map(|c| c.name.clone());
        let table = self.table.name.clone();
        self.form.set_action(move |state| {
            let mut row = row
                .lock()
                .map_err(|_| FormworkError::DatabaseError(format!("row of {table} is poisoned")))?;
            row.fill(&state.values())?;
            if let Some(pk) = &pk {
                let column = pk_column.as_deref().ok_or_else(|| {
                    FormworkError::ImproperlyConfigured(format!("table {table} has no primary key"))
                })?;
                row.set(column, pk.clone())?;
            }
            row.save()?;
            tracing::info!(table = %table, "row saved from form");
            Ok(())
        });
    }

    /// Renders a row's values as raw strings for pre-filling the form.
    ///
    /// Columns the row has no value for are left out. Date columns render
    /// as `YYYY-MM-DD` even when the row holds a timestamp.
    pub fn initial_values(&self, row: &dyn Row) -> HashMap<String, String> {
        self.form
            .fields()
            .filter_map(|field| {
                let value = row.get(&field.name)?;
                let is_date = self
                    .table
                    .column(&field.name)
                    .is_some_and(|c| c.column_type == ColumnType::Date);
                let rendered = if is_date {
                    render_date(value)
                } else {
                    value.to_form_string()
                };
                Some((field.name.clone(), rendered))
            })
            .collect()
    }
}

fn render_date(value: &Value) -> String {
    let date = match value {
        Value::Date(d) => Some(*d),
        Value::DateTime(dt) => Some(dt.date()),
        Value::String(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                    .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
                    .ok()
                    .map(|dt| dt.date())
            }),
        _ => None,
    };
    date.map_or_else(|| value.to_form_string(), |d| d.format("%Y-%m-%d").to_string())
}

impl Deref for TableForm {
    type Target = Form;

    fn deref(&self) -> &Form {
        &self.form
    }
}

impl DerefMut for TableForm {
    fn deref_mut(&mut self) -> &mut Form {
        &mut self.form
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_db::row::MemoryRow;

    use crate::form::SubmitError;
    use crate::input::FormData;
    use crate::presentation::Child;

    fn person_table() -> TableDef {
        TableDef::new(
            "person",
            vec![
                ColumnDef::new("Id", ColumnType::Int).primary_key(),
                ColumnDef::new("FirstName", ColumnType::VarChar { max_length: 123 }),
                ColumnDef::new("Age", ColumnType::Int),
                ColumnDef::new("Vita", ColumnType::Text).nullable(),
                ColumnDef::new("Member", ColumnType::Bool).nullable(),
                ColumnDef::new("Born", ColumnType::Date).nullable(),
                ColumnDef::new("Color", ColumnType::VarChar { max_length: 10 })
                    .nullable()
                    .choices(vec![Value::from("red"), Value::from("blue")]),
            ],
        )
    }

    fn form() -> TableForm {
        TableForm::with_settings(&person_table(), Settings::default()).unwrap()
    }

    /// A form for new rows: the key field is removed.
    fn insert_form() -> TableForm {
        let mut form = form();
        form.remove_field("Id").unwrap();
        form
    }

    fn data(pairs: &[(&str, &str)]) -> FormData {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_tags_and_required() {
        let form = form();
        assert_eq!(form.field("Age").unwrap().type_tag, TypeTag::Int);
        assert_eq!(form.field("Member").unwrap().type_tag, TypeTag::Bool);
        assert_eq!(form.field("Born").unwrap().type_tag, TypeTag::String);
        assert!(form.field("FirstName").unwrap().required);
        assert!(!form.field("Vita").unwrap().required);
        assert!(form.field("Id").unwrap().required);
    }

    #[test]
    fn test_non_null_primary_key_is_required() {
        let mut form = form();
        let err = form
            .parse(&data(&[("FirstName", "Ann"), ("Age", "30")]))
            .unwrap_err();
        assert!(matches!(err, SubmitError::FieldErrors));
        assert!(form.errors_for("Id")[0].is("required"));

        form.parse(&data(&[("Id", "4"), ("FirstName", "Ann"), ("Age", "30")]))
            .unwrap();
    }

    #[test]
    fn test_unsubmitted_non_null_bool_column_saves_false() {
        let table = TableDef::new(
            "member",
            vec![
                ColumnDef::new("Id", ColumnType::Int).primary_key(),
                ColumnDef::new("Name", ColumnType::Text),
                ColumnDef::new("Active", ColumnType::Bool),
            ],
        );
        let row = Arc::new(Mutex::new(MemoryRow::new(table.clone())));
        let mut form = TableForm::with_settings(&table, Settings::default()).unwrap();
        form.remove_field("Id").unwrap();
        form.set_save_action(Arc::clone(&row), None);

        form.parse(&data(&[("Name", "Ann")])).unwrap();
        assert!(!form.get_bool("Active").unwrap());
        let row = row.lock().unwrap();
        assert_eq!(row.saves(), 1);
        assert_eq!(row.get("Active"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_widgets() {
        let form = form();
        assert_eq!(form.field("FirstName").unwrap().widget, WidgetType::TextInput);
        assert_eq!(form.field("Vita").unwrap().widget, WidgetType::Textarea);
        assert_eq!(form.field("Age").unwrap().widget, WidgetType::NumberInput);
        assert_eq!(form.field("Born").unwrap().widget, WidgetType::DateInput);
        assert_eq!(form.field("Color").unwrap().widget, WidgetType::Select);
        let Some(Child::Field(member)) = form
            .presentation()
            .find(&|c| c.field_name() == Some("Member"))
        else {
            panic!("Member missing");
        };
        assert_eq!(member.widget, WidgetType::Select);
        assert_eq!(member.options, ["true".to_string(), "false".to_string()]);
    }

    #[test]
    fn test_choices_become_selection() {
        let mut form = insert_form();
        let err = form
            .parse(&data(&[("FirstName", "Ann"), ("Age", "3"), ("Color", "green")]))
            .unwrap_err();
        assert!(matches!(err, SubmitError::FieldErrors));
        assert!(form.errors_for("Color")[0].is("not_allowed"));
    }

    #[test]
    fn test_bad_choices_fail_construction() {
        let table = TableDef::new(
            "t",
            vec![ColumnDef::new("n", ColumnType::Int).choices(vec![Value::from("one")])],
        );
        assert!(matches!(
            TableForm::new(&table),
            Err(FormworkError::SelectionTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_unrequire_and_labels() {
        let mut form = insert_form();
        form.unrequire("Age").unwrap();
        form.set_labels(&[("Age", "Age (years)"), ("Vita", "CV")]).unwrap();
        assert_eq!(form.field("Vita").unwrap().label, "CV");
        assert!(form.set_labels(&[("Nope", "x")]).is_err());
        form.parse(&data(&[("FirstName", "Ann")])).unwrap();
    }

    #[test]
    fn test_save_action_inserts() {
        let row = Arc::new(Mutex::new(MemoryRow::new(person_table())));
        let mut form = insert_form();
        form.set_save_action(Arc::clone(&row), None);
        form.parse(&data(&[("FirstName", "Ann"), ("Age", "30"), ("Member", "true")]))
            .unwrap();

        let row = row.lock().unwrap();
        assert_eq!(row.saves(), 1);
        assert_eq!(row.get("FirstName"), Some(&Value::from("Ann")));
        assert_eq!(row.get("Age"), Some(&Value::Int(30)));
        assert_eq!(row.get("Member"), Some(&Value::Bool(true)));
        assert_eq!(row.pk(), None);
    }

    #[test]
    fn test_save_action_sets_primary_key() {
        let row = Arc::new(Mutex::new(MemoryRow::new(person_table())));
        let mut form = insert_form();
        form.set_save_action(Arc::clone(&row), Some(Value::Int(7)));
        form.parse(&data(&[("FirstName", "Ann"), ("Age", "30")])).unwrap();
        assert_eq!(row.lock().unwrap().pk(), Some(&Value::Int(7)));
    }

    #[test]
    fn test_save_failure_is_an_action_error() {
        let row = Arc::new(Mutex::new(MemoryRow::new(person_table())));
        row.lock().unwrap().fail_next_save("connection reset");
        let mut form = insert_form();
        form.set_save_action(Arc::clone(&row), None);
        let err = form
            .parse(&data(&[("FirstName", "Ann"), ("Age", "30")]))
            .unwrap_err();
        assert!(matches!(err, SubmitError::Action(FormworkError::DatabaseError(_))));
        assert_eq!(row.lock().unwrap().saves(), 0);
    }

    #[test]
    fn test_invalid_input_never_saves() {
        let row = Arc::new(Mutex::new(MemoryRow::new(person_table())));
        let mut form = insert_form();
        form.set_save_action(Arc::clone(&row), None);
        form.parse(&data(&[("FirstName", "Ann"), ("Age", "old")]))
            .unwrap_err();
        assert_eq!(row.lock().unwrap().saves(), 0);
    }

    #[test]
    fn test_initial_values() {
        let mut row = MemoryRow::new(person_table());
        row.set("FirstName", Value::from("Ann")).unwrap();
        row.set("Age", Value::Int(30)).unwrap();
        row.set("Born", Value::from("1990-05-04T12:00:00")).unwrap();

        let form = form();
        let initial = form.initial_values(&row);
        assert_eq!(initial["FirstName"], "Ann");
        assert_eq!(initial["Age"], "30");
        assert_eq!(initial["Born"], "1990-05-04");
        assert!(!initial.contains_key("Vita"));
    }

    #[test]
    fn test_render_date() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(render_date(&Value::Date(d)), "2024-03-07");
        assert_eq!(render_date(&Value::from("2024-03-07 08:00:00")), "2024-03-07");
        assert_eq!(render_date(&Value::from("soon")), "soon");
    }
}
