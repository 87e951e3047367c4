//! Lazy query building: a thin, chainable wrapper over [`LogicalPlan`] that
//! defers execution until [`LazyFrame::collect`] (or
//! [`LazyFrame::collect_count_stream`]) is called. Every builder method
//! consumes and returns a `LazyFrame` — the underlying plan tree is
//! immutable, built up node by node exactly as [`LogicalPlan`]'s own builder
//! methods do.

use crate::agg::AggregationDef;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::join::JoinKind;
use crate::plan::expr::Expr;
use crate::plan::logical::LogicalPlan;
use crate::plan::{execute, execute_count_stream, optimize};
use crate::sort::SortKey;
use crate::table::Table;
use crate::value::ScalarValue;
use std::rc::Rc;

/// A deferred query plan over one or more tables. Built up with chained
/// `filter`/`project`/`aggregate`/`join`/`sort`/`top_n` calls, then run with
/// [`LazyFrame::collect`].
#[derive(Debug, Clone)]
pub struct LazyFrame {
    plan: LogicalPlan,
    config: EngineConfig,
}

impl LazyFrame {
    /// Start a new lazy plan scanning `table`.
    pub fn scan(table: Rc<Table>, config: EngineConfig) -> Self {
        Self { plan: LogicalPlan::scan(table), config }
    }

    fn map(self, f: impl FnOnce(LogicalPlan) -> LogicalPlan) -> Self {
        Self { plan: f(self.plan), config: self.config }
    }

    /// Keep only rows where `predicate` evaluates to `true`.
    pub fn filter(self, predicate: Expr) -> Self {
        self.map(|plan| plan.filter(predicate))
    }

    /// Evaluate `exprs` against each row, producing a new column list.
    pub fn project(self, exprs: Vec<Expr>) -> Self {
        self.map(|plan| plan.project(exprs))
    }

    /// Partition rows by `group_columns` and compute `agg_defs` per group.
    pub fn aggregate(self, group_columns: Vec<String>, agg_defs: Vec<AggregationDef>) -> Self {
        self.map(|plan| plan.aggregate(group_columns, agg_defs))
    }

    /// Equi-join with `other` on the shared column `on`.
    pub fn join(self, other: LazyFrame, on: impl Into<String>, kind: JoinKind) -> Self {
        let config = self.config;
        Self { plan: self.plan.join(other.plan, on, kind), config }
    }

    /// A full stable multi-key sort.
    pub fn sort(self, keys: Vec<SortKey>) -> Self {
        self.map(|plan| plan.sort(keys))
    }

    /// Bounded top-N selection on one column.
    pub fn top_n(self, n: usize, column: impl Into<String>, smallest: bool) -> Self {
        self.map(|plan| plan.top_n(n, column, smallest))
    }

    /// Optimize and run the plan, materializing the result.
    pub fn collect(self) -> Result<Table> {
        let optimized = optimize(self.plan);
        execute(&optimized, &self.config)
    }

    /// Optimize and run the plan in streaming mode, yielding `(key, count)`
    /// pairs with no materialized result table. Fails with
    /// [`crate::error::Error::NotSupported`] unless the plan is (or reduces
    /// to) a bare single-key `count()` aggregate.
    pub fn collect_count_stream(self) -> Result<Vec<(Vec<ScalarValue>, usize)>> {
        let optimized = optimize(self.plan);
        Ok(execute_count_stream(&optimized, &self.config)?.collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::numeric::PrimitiveColumn;
    use crate::column::{Column, ColumnType};
    use crate::plan::expr::BinOp;
    use crate::schema::{ColumnDef, Schema};

    fn sample() -> Rc<Table> {
        let mut a: PrimitiveColumn<i32> = PrimitiveColumn::new("a", false, 0);
        for v in [1, 2, 3, 4] {
            a.append(v);
        }
        let schema = Schema::new(vec![ColumnDef::new("a", ColumnType::I32, false)]).unwrap();
        Rc::new(Table::new(schema, vec![Column::I32(a)]).unwrap())
    }

    #[test]
    fn filter_then_project_collects_matching_rows() {
        let frame = LazyFrame::scan(sample(), EngineConfig::default())
            .filter(Expr::col("a").binary(BinOp::Gt, Expr::lit(ScalarValue::I32(2))))
            .project(vec![Expr::col("a")]);
        let result = frame.collect().unwrap();
        assert_eq!(result.row_count(), 2);
    }

    #[test]
    fn top_n_collects_smallest_two() {
        let frame = LazyFrame::scan(sample(), EngineConfig::default()).top_n(2, "a", true);
        let result = frame.collect().unwrap();
        assert_eq!(result.row_count(), 2);
    }

    #[test]
    fn count_stream_matches_group_sizes() {
        let frame = LazyFrame::scan(sample(), EngineConfig::default())
            .aggregate(vec!["a".to_string()], vec![AggregationDef::new(crate::plan::AggOp::Count, "a", "n")]);
        let pairs = frame.collect_count_stream().unwrap();
        assert_eq!(pairs.len(), 4);
        assert!(pairs.iter().all(|(_, n)| *n == 1));
    }
}
