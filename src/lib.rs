//! An in-process, column-oriented analytical data engine: build a [`Table`]
//! from a schema or a sequence of records, then query it eagerly (methods on
//! `Table`, see the `eager` module) or lazily through [`LazyFrame`], which
//! compiles a [`plan::LogicalPlan`] through the rewrite-rule optimizer before
//! lowering it onto the vectorized kernels, grouping engine and join kernel
//! below.

pub mod agg;
pub mod bitmap;
pub mod column;
pub mod config;
mod eager;
pub mod error;
pub mod group;
pub mod jit;
pub mod join;
pub mod kernels;
pub mod lazy;
pub mod plan;
pub mod pool;
pub mod records;
pub mod row;
pub mod schema;
pub mod sort;
pub mod table;
#[cfg(test)]
mod tests;
pub mod value;

pub use column::{Column, ColumnType};
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use group::GroupedTable;
pub use join::JoinKind;
pub use lazy::LazyFrame;
pub use records::{ColumnSpec, FromRecord};
pub use row::RowCursor;
pub use schema::{ColumnDef, Schema};
pub use table::Table;
pub use value::ScalarValue;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
