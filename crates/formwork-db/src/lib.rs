//! # formwork-db
//!
//! Table-side collaborators for formwork. Provides the [`Value`](value::Value)
//! enum exchanged between forms and rows, column and table descriptors a
//! form can be generated from, and the [`Row`](row::Row) trait a form's save
//! action writes through.
//!
//! ## Module Overview
//!
//! - [`value`] - The backend-agnostic [`Value`](value::Value) enum
//! - [`fields`] - Column ([`ColumnDef`](fields::ColumnDef)) and table descriptors
//! - [`row`] - The [`Row`](row::Row) trait and the in-memory [`MemoryRow`](row::MemoryRow)

pub mod fields;
pub mod row;
pub mod value;

pub use fields::{ColumnDef, ColumnType, TableDef};
pub use row::{MemoryRow, Row};
pub use value::Value;
