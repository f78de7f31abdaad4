//! # formwork
//!
//! Typed HTML form parsing, validation and table binding.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access. Depend on `formwork` to get everything, or on the individual
//! crates for finer-grained control.
//!
//! ## Feature flags
//!
//! - `full` (default): enables every sub-crate.
//! - `db`: table schema descriptors, values and the row collaborator.
//! - `forms`: typed fields, the value store and the action dispatcher
//!   (implies `db`).

/// Settings, logging and error types.
pub use formwork_core as core;

/// Table schema descriptors, values and the row collaborator.
#[cfg(feature = "db")]
pub use formwork_db as db;

/// Forms, field descriptors, hooks and table-backed forms.
#[cfg(feature = "forms")]
pub use formwork_forms as forms;

// Third-party re-exports
pub use chrono;
pub use serde;
pub use serde_json;
pub use tracing;
pub use tracing_subscriber;

/// Commonly used items, importable with `use formwork::prelude::*`.
pub mod prelude {
    pub use formwork_core::{EmptyArrayPolicy, FormworkError, FormworkResult, Settings, ValidationError};

    #[cfg(feature = "db")]
    pub use formwork_db::{ColumnDef, ColumnType, MemoryRow, Row, TableDef, Value};

    #[cfg(feature = "forms")]
    pub use formwork_forms::{
        CycleState, FieldDescriptor, FieldValue, Form, FormData, FormState, SubmitError,
        TableForm, TypeTag,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_builds_a_form() {
        let mut form = Form::with_settings("contact", Settings::default());
        form.add_field(FieldDescriptor::new_required("Email", TypeTag::String))
            .unwrap();
        assert!(form.parse_query("Email=a%40b.c").is_ok());
        assert_eq!(form.get_str("Email").unwrap(), "a@b.c");
    }

    #[test]
    fn test_prelude_table_form() {
        let table = TableDef::new("t", vec![ColumnDef::new("n", ColumnType::Int)]);
        let form = TableForm::with_settings(&table, Settings::default()).unwrap();
        assert!(form.has_field("n"));
    }
}
