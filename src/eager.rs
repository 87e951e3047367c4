//! Eager table operations: convenience methods on [`Table`] that run a
//! single relational step immediately against a materialized table, built on
//! top of the same kernels the lazy pipeline lowers onto ([`crate::plan`],
//! [`crate::group`], [`crate::join`], [`crate::sort`]).

use crate::column::{Column, ColumnType};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::group::{group_by, GroupedTable};
use crate::join::JoinKind;
use crate::lazy::LazyFrame;
use crate::plan::expr::Expr;
use crate::plan::physical::{filter_table, project_table};
use crate::schema::{ColumnDef, Schema};
use crate::sort::{arg_sort, largest, smallest, SortKey};
use crate::table::Table;
use crate::value::ScalarValue;
use std::rc::Rc;

impl Table {
    /// Keep only rows where `predicate` evaluates to `true`.
    pub fn filter(&self, predicate: &Expr) -> Result<Table> {
        filter_table(self, predicate)
    }

    /// Project down to the named columns, in the order given.
    pub fn select(&self, names: &[&str]) -> Result<Table> {
        let exprs: Vec<Expr> = names.iter().map(|n| Expr::col(*n)).collect();
        project_table(self, &exprs)
    }

    /// Rows `[start, start + length)`, or every remaining row if `length`
    /// runs past the end.
    pub fn slice(&self, start: usize, length: usize) -> Result<Table> {
        if start > self.row_count() {
            return Err(Error::OutOfRange { index: start, length: self.row_count() });
        }
        let end = (start + length).min(self.row_count());
        self.gather(&(start..end).collect::<Vec<_>>())
    }

    /// The first `n` rows (or every row, if `n` exceeds the row count).
    pub fn head(&self, n: usize) -> Result<Table> {
        self.slice(0, n)
    }

    /// The last `n` rows (or every row, if `n` exceeds the row count).
    pub fn tail(&self, n: usize) -> Result<Table> {
        let n = n.min(self.row_count());
        self.slice(self.row_count() - n, n)
    }

    /// One row per distinct combination of `names`, keeping the first row
    /// (in source order) that produced each combination.
    pub fn distinct(&self, names: &[&str]) -> Result<Table> {
        let group_columns: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        let grouped = group_by(self, &group_columns, &EngineConfig::default())?;
        let mut indices: Vec<usize> = (0..grouped.num_groups())
            .map(|g| grouped.csr().group(g)[0])
            .collect();
        if grouped.has_null_group() {
            indices.push(grouped.null_group_indices()[0]);
        }
        indices.sort_unstable();
        self.gather(&indices)
    }

    /// Rows with no null value in any column.
    pub fn drop_nulls(&self) -> Result<Table> {
        let mut indices = Vec::with_capacity(self.row_count());
        for row in 0..self.row_count() {
            let mut has_null = false;
            for col in self.columns() {
                if col.is_null(row)? {
                    has_null = true;
                    break;
                }
            }
            if !has_null {
                indices.push(row);
            }
        }
        self.gather(&indices)
    }

    /// Replace every null in column `name` with `value`; the output column
    /// is non-nullable, since no null can remain after the fill.
    pub fn fill_null(&self, name: &str, value: ScalarValue) -> Result<Table> {
        let mut defs = Vec::with_capacity(self.column_count());
        let mut columns = Vec::with_capacity(self.column_count());
        for col in self.columns() {
            if col.name() == name {
                let def = ColumnDef::new(col.name().to_string(), col.column_type(), false);
                let mut out = Column::new_empty(&def, col.len());
                for row in 0..col.len() {
                    let v = if col.is_null(row)? { value.clone() } else { col.get_boxed(row)? };
                    out.push_boxed(v)?;
                }
                defs.push(def);
                columns.push(out);
            } else {
                defs.push(self.schema().get(col.name()).expect("schema/column in lockstep").clone());
                columns.push(col.clone());
            }
        }
        let schema = Schema::new(defs)?;
        Table::new(schema, columns)
    }

    /// Append a computed column evaluated from `expr` against every row,
    /// aliased as `name`.
    pub fn add_column(&self, name: impl Into<String>, expr: Expr) -> Result<Table> {
        let mut exprs: Vec<Expr> = self.columns().iter().map(|c| Expr::col(c.name())).collect();
        exprs.push(expr.alias(name));
        project_table(self, &exprs)
    }

    /// A stable multi-key sort. `names` and `ascending` must be the same
    /// length; `ascending[i]` sets the direction for `names[i]`.
    pub fn order_by(&self, names: &[&str], ascending: &[bool]) -> Result<Table> {
        let keys: Vec<SortKey> = names
            .iter()
            .zip(ascending)
            .map(|(name, &asc)| SortKey { column: name.to_string(), ascending: asc })
            .collect();
        let order = arg_sort(self, &keys)?;
        self.gather(&order)
    }

    /// The `n` rows with the smallest values of `column`, ascending.
    pub fn smallest(&self, n: usize, column: &str) -> Result<Table> {
        let order = smallest(self, n, column)?;
        self.gather(&order)
    }

    /// The `n` rows with the largest values of `column`, descending.
    pub fn largest(&self, n: usize, column: &str) -> Result<Table> {
        let order = largest(self, n, column)?;
        self.gather(&order)
    }

    /// Equi-join this table (as the left side) with `other` on column `on`.
    pub fn join(&self, other: &Table, on: &str, kind: JoinKind) -> Result<Table> {
        crate::join::join(self, other, on, kind)
    }

    /// Partition rows by `names` into a [`GroupedTable`], ready for
    /// aggregation.
    pub fn group_by(&self, names: &[&str]) -> Result<GroupedTable<'_>> {
        let group_columns: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        group_by(self, &group_columns, &EngineConfig::default())
    }

    /// Partition rows by `names` using an explicit [`EngineConfig`] (e.g. to
    /// tune the radix/hash grouping thresholds for a known data shape).
    pub fn group_by_with_config(&self, names: &[&str], config: &EngineConfig) -> Result<GroupedTable<'_>> {
        let group_columns: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        group_by(self, &group_columns, config)
    }

    /// Enter the lazy pipeline: the table becomes the leaf scan of a
    /// [`LazyFrame`], using default engine tuning.
    pub fn lazy(self) -> LazyFrame {
        LazyFrame::scan(Rc::new(self), EngineConfig::default())
    }

    /// Enter the lazy pipeline with an explicit [`EngineConfig`].
    pub fn lazy_with_config(self, config: EngineConfig) -> LazyFrame {
        LazyFrame::scan(Rc::new(self), config)
    }
}
