//! Column and table descriptors.
//!
//! This module provides the [`ColumnDef`] struct, the [`ColumnType`] enum,
//! and [`TableDef`], which together describe the schema a table-backed form
//! is generated from.

pub mod types;

pub use types::{ColumnDef, ColumnType, TableDef};
