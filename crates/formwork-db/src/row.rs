//! The row collaborator.
//!
//! A [`Row`] is one record of a [`TableDef`]: it can be read column by
//! column, filled in bulk from a form's values, and persisted. Forms never
//! talk to a database directly; they only see this trait.
//!
//! [`MemoryRow`] keeps its values in memory and records how often it was
//! saved. It backs tests and demos, and serves as the reference
//! implementation of the trait's contract.

use std::collections::HashMap;

use formwork_core::{FormworkError, FormworkResult};

use crate::fields::TableDef;
use crate::value::Value;

/// A single record of a table.
pub trait Row: Send {
    /// Returns the table this row belongs to.
    fn table(&self) -> &TableDef;

    /// Returns the current value of a column, or `None` if never set.
    fn get(&self, column: &str) -> Option<&Value>;

    /// Sets a single column.
    ///
    /// Returns [`FormworkError::DoesNotExist`] for an unknown column and
    /// [`FormworkError::IntegrityError`] for a value the column cannot hold.
    fn set(&mut self, column: &str, value: Value) -> FormworkResult<()>;

    /// Sets every column named in `values`. Keys without a matching column
    /// are ignored; the first incompatible value aborts with an error.
    fn fill(&mut self, values: &HashMap<String, Value>) -> FormworkResult<()>;

    /// Persists the row.
    fn save(&mut self) -> FormworkResult<()>;

    /// Returns the primary key value, if the table has one and it is set.
    fn pk(&self) -> Option<&Value> {
        let pk = self.table().primary_key()?;
        self.get(&pk.name)
    }
}

/// An in-memory [`Row`].
///
/// `save` checks that every non-nullable, non-key column holds a value and
/// then bumps a counter. A failure can be injected with
/// [`fail_next_save`](MemoryRow::fail_next_save).
#[derive(Debug, Clone)]
pub struct MemoryRow {
    table: TableDef,
    values: HashMap<String, Value>,
    saves: usize,
    fail_next_save: Option<String>,
}

impl MemoryRow {
    /// Creates an empty row for the given table.
    pub fn new(table: TableDef) -> Self {
        Self {
            table,
            values: HashMap::new(),
            saves: 0,
            fail_next_save: None,
        }
    }

    /// Number of successful saves.
    pub const fn saves(&self) -> usize {
        self.saves
    }

    /// Makes the next call to `save` fail with a database error.
    pub fn fail_next_save(&mut self, message: impl Into<String>) {
        self.fail_next_save = Some(message.into());
    }

    /// Returns all column values currently set.
    pub const fn values(&self) -> &HashMap<String, Value> {
        &self.values
    }
}

impl Row for MemoryRow {
    fn table(&self) -> &TableDef {
        &self.table
    }

    fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    fn set(&mut self, column: &str, value: Value) -> FormworkResult<()> {
        let col = self.table.column(column).ok_or_else(|| {
            FormworkError::DoesNotExist(format!("column {column} in table {}", self.table.name))
        })?;
        if !col.column_type.accepts(&value) {
            return Err(FormworkError::IntegrityError(format!(
                "column {column} ({}) cannot hold a {} value",
                col.column_type.sql_type(),
                value.kind()
            )));
        }
        self.values.insert(column.to_string(), value);
        Ok(())
    }

    fn fill(&mut self, values: &HashMap<String, Value>) -> FormworkResult<()> {
        for (name, value) in values {
            if self.table.column(name).is_none() {
                tracing::trace!(column = %name, table = %self.table.name, "fill: skipping unknown column");
                continue;
            }
            self.set(name, value.clone())?;
        }
        Ok(())
    }

    fn save(&mut self) -> FormworkResult<()> {
        if let Some(message) = self.fail_next_save.take() {
            return Err(FormworkError::DatabaseError(message));
        }
        for col in &self.table.columns {
            if col.null || col.primary_key {
                continue;
            }
            match self.values.get(&col.name) {
                None | Some(Value::Null) => {
                    return Err(FormworkError::IntegrityError(format!(
                        "null value in column {} violates not-null constraint",
                        col.name
                    )));
                }
                Some(_) => {}
            }
        }
        self.saves += 1;
        tracing::debug!(table = %self.table.name, saves = self.saves, "row saved");
        Ok(())
    }
}
