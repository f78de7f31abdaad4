//! Column type definitions.
//!
//! Each [`ColumnType`] variant corresponds to a SQL column type, and
//! [`ColumnDef`] captures the metadata a form needs about a single column:
//! its name, whether it accepts NULL, and an optional set of allowed values.

use crate::value::Value;

/// The type of a table column.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ColumnType {
    /// 32/64-bit signed integer.
    Int,
    /// Floating-point number.
    Float,
    /// Boolean (true/false).
    Bool,
    /// Variable-length string with a max length.
    VarChar {
        /// Maximum number of characters.
        max_length: usize,
    },
    /// Unlimited-length text.
    Text,
    /// XML document stored as text.
    Xml,
    /// Date without time.
    Date,
    /// Time without date.
    Time,
    /// Date and time.
    Timestamp,
}

impl ColumnType {
    /// Returns the SQL column type name on PostgreSQL.
    pub fn sql_type(&self) -> String {
        match self {
            Self::Int => "INTEGER".to_string(),
            Self::Float => "DOUBLE PRECISION".to_string(),
            Self::Bool => "BOOLEAN".to_string(),
            Self::VarChar { max_length } => format!("VARCHAR({max_length})"),
            Self::Text => "TEXT".to_string(),
            Self::Xml => "XML".to_string(),
            Self::Date => "DATE".to_string(),
            Self::Time => "TIME".to_string(),
            Self::Timestamp => "TIMESTAMP".to_string(),
        }
    }

    /// Returns `true` if a value of this kind may be stored in the column.
    ///
    /// `Null` is accepted here; nullability is checked separately against
    /// [`ColumnDef::null`].
    pub const fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null)
            | (Self::Int, Value::Int(_))
            | (Self::Float, Value::Float(_) | Value::Int(_))
            | (Self::Bool, Value::Bool(_))
            | (Self::VarChar { .. } | Self::Text | Self::Xml, Value::String(_))
            | (Self::Date, Value::Date(_) | Value::String(_))
            | (Self::Time, Value::Time(_) | Value::String(_))
            | (Self::Timestamp, Value::DateTime(_) | Value::String(_)) => true,
            _ => false,
        }
    }
}

/// Definition of a single table column.
///
/// # Examples
///
/// ```
/// use formwork_db::fields::{ColumnDef, ColumnType};
///
/// let vita = ColumnDef::new("Vita", ColumnType::Text)
///     .nullable()
///     .choices(vec!["a".into(), "b".into()]);
/// assert!(vita.null);
/// assert_eq!(vita.choices.as_ref().map(Vec::len), Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ColumnDef {
    /// The column name.
    pub name: String,
    /// The type of this column.
    pub column_type: ColumnType,
    /// Whether NULL is allowed.
    pub null: bool,
    /// Whether this column is the primary key.
    pub primary_key: bool,
    /// Allowed values, if the column is restricted to a fixed set.
    pub choices: Option<Vec<Value>>,
}

impl ColumnDef {
    /// Creates a new non-null, non-key column without choices.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            null: false,
            primary_key: false,
            choices: None,
        }
    }

    /// Allows NULL values.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.null = true;
        self
    }

    /// Marks this column as the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Restricts the column to a fixed set of values.
    #[must_use]
    pub fn choices(mut self, values: Vec<Value>) -> Self {
        self.choices = Some(values);
        self
    }
}

/// A table: a name and its ordered columns.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TableDef {
    /// The table name.
    pub name: String,
    /// The columns, in declaration order.
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    /// Creates a table from its columns.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the primary key column, if one is declared.
    pub fn primary_key(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.primary_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> TableDef {
        TableDef::new(
            "person",
            vec![
                ColumnDef::new("Id", ColumnType::Int).primary_key(),
                ColumnDef::new("FirstName", ColumnType::VarChar { max_length: 123 }).nullable(),
                ColumnDef::new("Age", ColumnType::Int),
            ],
        )
    }

    #[test]
    fn test_column_lookup() {
        let table = person();
        assert_eq!(table.column("Age").unwrap().column_type, ColumnType::Int);
        assert!(table.column("Missing").is_none());
        assert_eq!(table.primary_key().unwrap().name, "Id");
    }

    #[test]
    fn test_column_defaults() {
        let col = ColumnDef::new("x", ColumnType::Text);
        assert!(!col.null);
        assert!(!col.primary_key);
        assert!(col.choices.is_none());
    }

    #[test]
    fn test_sql_type() {
        assert_eq!(ColumnType::VarChar { max_length: 20 }.sql_type(), "VARCHAR(20)");
        assert_eq!(ColumnType::Bool.sql_type(), "BOOLEAN");
    }

    #[test]
    fn test_accepts() {
        assert!(ColumnType::Int.accepts(&Value::Int(1)));
        assert!(!ColumnType::Int.accepts(&Value::from("1")));
        assert!(ColumnType::Float.accepts(&Value::Int(1)));
        assert!(ColumnType::Text.accepts(&Value::Null));
        assert!(ColumnType::Date.accepts(&Value::from("2024-01-01")));
        assert!(!ColumnType::Bool.accepts(&Value::Int(0)));
    }
}
