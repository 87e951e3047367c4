//! Aggregation kernels (component J): dispatches a list of aggregation
//! definitions over a [`GroupedTable`]'s CSR, using the typed
//! `compute_sum`/`compute_mean`/`compute_min`/`compute_max` hooks already
//! implemented on [`PrimitiveColumn`](crate::column::numeric::PrimitiveColumn).
//!
//! A bare `count()` never touches column data — group sizes are already
//! known from the CSR's offsets, so counting reads `Csr::group_len` directly
//! instead of scanning rows.

use crate::column::{Column, ColumnType};
use crate::error::{Error, Result};
use crate::group::GroupedTable;
use crate::plan::expr::AggOp;
use crate::schema::{ColumnDef, Schema};
use crate::table::Table;
use crate::value::ScalarValue;

/// One aggregation to compute: `target = op(source)`.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationDef {
    /// The aggregation function to apply.
    pub op: AggOp,
    /// Name of the source column in the grouped table.
    pub source: String,
    /// Name of the output column.
    pub target: String,
}

impl AggregationDef {
    /// Build a new aggregation definition.
    pub fn new(op: AggOp, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self { op, source: source.into(), target: target.into() }
    }
}

/// The output type and nullability of `op` applied to a column of `source`'s
/// logical type. `Sum` always reports a value (even `0` over an empty
/// group), so its result column is never nullable; `Mean`/`Min`/`Max` report
/// `None` for an empty or all-null group and so are always nullable.
fn result_spec(source: &Column, op: AggOp) -> Result<(ColumnType, bool)> {
    if op == AggOp::Count {
        return Ok((ColumnType::I32, false));
    }
    match (source.column_type(), op) {
        (ColumnType::I32, AggOp::Sum) => Ok((ColumnType::F64, false)),
        (ColumnType::I32, AggOp::Mean) => Ok((ColumnType::F64, true)),
        (ColumnType::I32, AggOp::Min | AggOp::Max) => Ok((ColumnType::I32, true)),
        (ColumnType::F64, AggOp::Sum) => Ok((ColumnType::F64, false)),
        (ColumnType::F64, AggOp::Mean | AggOp::Min | AggOp::Max) => Ok((ColumnType::F64, true)),
        (ColumnType::Timestamp, AggOp::Sum) => Ok((ColumnType::F64, false)),
        (ColumnType::Timestamp, AggOp::Mean) => Ok((ColumnType::F64, true)),
        (ColumnType::Timestamp, AggOp::Min | AggOp::Max) => Ok((ColumnType::Timestamp, true)),
        (ColumnType::Bool, _) | (ColumnType::String, _) => {
            Err(Error::NotSupported("aggregation op on a bool/string column"))
        }
        _ => Err(Error::NotSupported("aggregation op unsupported for this column type")),
    }
}

fn aggregate_value(source: &Column, indices: &[usize], op: AggOp) -> Result<ScalarValue> {
    if op == AggOp::Count {
        return Ok(ScalarValue::I32(indices.len() as i32));
    }
    let end = indices.len();
    match source {
        Column::I32(c) => Ok(match op {
            AggOp::Sum => ScalarValue::F64(c.compute_sum(indices, 0, end).unwrap() as f64),
            AggOp::Mean => c.compute_mean(indices, 0, end).map(ScalarValue::F64).unwrap_or(ScalarValue::Null),
            AggOp::Min => c.compute_min(indices, 0, end).map(ScalarValue::I32).unwrap_or(ScalarValue::Null),
            AggOp::Max => c.compute_max(indices, 0, end).map(ScalarValue::I32).unwrap_or(ScalarValue::Null),
            AggOp::Count => unreachable!("handled above"),
        }),
        Column::F64(c) => Ok(match op {
            AggOp::Sum => ScalarValue::F64(c.compute_sum(indices, 0, end).unwrap()),
            AggOp::Mean => c.compute_mean(indices, 0, end).map(ScalarValue::F64).unwrap_or(ScalarValue::Null),
            AggOp::Min => c.compute_min(indices, 0, end).map(ScalarValue::F64).unwrap_or(ScalarValue::Null),
            AggOp::Max => c.compute_max(indices, 0, end).map(ScalarValue::F64).unwrap_or(ScalarValue::Null),
            AggOp::Count => unreachable!("handled above"),
        }),
        Column::Timestamp(c) => Ok(match op {
            AggOp::Sum => ScalarValue::F64(c.compute_sum(indices, 0, end).unwrap() as f64),
            AggOp::Mean => c.compute_mean(indices, 0, end).map(ScalarValue::F64).unwrap_or(ScalarValue::Null),
            AggOp::Min => c.compute_min(indices, 0, end).map(ScalarValue::Timestamp).unwrap_or(ScalarValue::Null),
            AggOp::Max => c.compute_max(indices, 0, end).map(ScalarValue::Timestamp).unwrap_or(ScalarValue::Null),
            AggOp::Count => unreachable!("handled above"),
        }),
        Column::Bool(_) | Column::StringOwned(_) | Column::Varchar(_) | Column::Categorical(_) => {
            Err(Error::NotSupported("aggregation op on a bool/string column"))
        }
        Column::Window(_) | Column::Gather(_) => {
            Err(Error::NotSupported("aggregation op unsupported for this column type"))
        }
    }
}

/// Compute `defs` over every group of `grouped`, emitting one row per group
/// (key columns first, then `defs` in order) plus, when any row had a null
/// key, a trailing row with null keys aggregating
/// [`GroupedTable::null_group_indices`].
pub fn aggregate(grouped: &GroupedTable, defs: &[AggregationDef]) -> Result<Table> {
    let mut key_defs = Vec::with_capacity(grouped.group_columns().len());
    for name in grouped.group_columns() {
        let def = grouped.source().schema().get(name).expect("schema/group column in lockstep");
        let nullable = def.nullable || grouped.has_null_group();
        key_defs.push(ColumnDef::new(name.clone(), def.logical_type(), nullable));
    }

    let mut agg_defs = Vec::with_capacity(defs.len());
    for def in defs {
        let source = grouped.source().column(&def.source)?;
        let (ty, nullable) = result_spec(source, def.op)?;
        agg_defs.push(ColumnDef::new(def.target.clone(), ty, nullable));
    }

    let mut all_defs = key_defs.clone();
    all_defs.extend(agg_defs);
    let schema = Schema::new(all_defs)?;

    let total_rows = grouped.num_groups() + usize::from(grouped.has_null_group());
    let mut columns: Vec<Column> =
        schema.columns().iter().map(|d| Column::new_empty(d, total_rows)).collect();

    for g in 0..grouped.num_groups() {
        let rows = grouped.csr().group(g);
        for (i, key_value) in grouped.keys(g).iter().enumerate() {
            columns[i].push_boxed(key_value.clone())?;
        }
        for (j, def) in defs.iter().enumerate() {
            let source = grouped.source().column(&def.source)?;
            let value = aggregate_value(source, rows, def.op)?;
            columns[key_defs.len() + j].push_boxed(value)?;
        }
    }

    if grouped.has_null_group() {
        for col in &mut columns[..key_defs.len()] {
            col.push_boxed(ScalarValue::Null)?;
        }
        for (j, def) in defs.iter().enumerate() {
            let source = grouped.source().column(&def.source)?;
            let value = aggregate_value(source, grouped.null_group_indices(), def.op)?;
            columns[key_defs.len() + j].push_boxed(value)?;
        }
    }

    Table::new(schema, columns)
}

impl<'a> GroupedTable<'a> {
    /// Compute `defs` over every group. See the free [`aggregate`] function.
    pub fn aggregate(&self, defs: &[AggregationDef]) -> Result<Table> {
        aggregate(self, defs)
    }

    /// Group sizes as a table of keys plus a `count` column. Reads
    /// `Csr::group_len` directly rather than scanning any column.
    pub fn count(&self) -> Result<Table> {
        let placeholder = self.group_columns().first().cloned().expect("group_by requires at least one key column");
        self.aggregate(&[AggregationDef::new(AggOp::Count, placeholder, "count")])
    }

    /// Sum of `column` within each group.
    pub fn sum(&self, column: &str) -> Result<Table> {
        self.aggregate(&[AggregationDef::new(AggOp::Sum, column, format!("sum_{column}"))])
    }

    /// Arithmetic mean of `column` within each group.
    pub fn mean(&self, column: &str) -> Result<Table> {
        self.aggregate(&[AggregationDef::new(AggOp::Mean, column, format!("mean_{column}"))])
    }

    /// Minimum of `column` within each group.
    pub fn min(&self, column: &str) -> Result<Table> {
        self.aggregate(&[AggregationDef::new(AggOp::Min, column, format!("min_{column}"))])
    }

    /// Maximum of `column` within each group.
    pub fn max(&self, column: &str) -> Result<Table> {
        self.aggregate(&[AggregationDef::new(AggOp::Max, column, format!("max_{column}"))])
    }

    /// Stream `(group key, group size)` pairs without materializing a
    /// `Table` — the row-iterator mode used by the physical planner to
    /// avoid a full aggregate when only a running total is needed.
    pub fn count_stream(&self) -> impl Iterator<Item = (Vec<ScalarValue>, usize)> + '_ {
        (0..self.num_groups()).map(move |g| (self.keys(g).to_vec(), self.csr().group_len(g)))
    }
}
