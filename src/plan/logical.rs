//! Logical plan (component M): an immutable tree of relational operators
//! built up by [`crate::lazy::LazyFrame`] and rewritten by
//! [`crate::plan::optimizer::optimize`] before execution.

use crate::agg::AggregationDef;
use crate::join::JoinKind;
use crate::plan::expr::Expr;
use crate::sort::SortKey;
use crate::table::Table;
use std::rc::Rc;

/// One node of a logical query plan. Every variant borrows its input(s) as a
/// boxed subtree, so a plan is a tree, never a DAG.
#[derive(Debug, Clone)]
pub enum LogicalPlan {
    /// A materialized table, the leaf of every plan.
    Scan(Rc<Table>),
    /// Keep only rows where `predicate` evaluates to `true`.
    Filter(Box<LogicalPlan>, Expr),
    /// Evaluate `exprs` against each row, producing a new column list.
    Projection(Box<LogicalPlan>, Vec<Expr>),
    /// Partition rows by `group_columns` and compute `agg_defs` per group.
    Aggregate {
        /// The plan producing rows to group.
        input: Box<LogicalPlan>,
        /// Key column names.
        group_columns: Vec<String>,
        /// Aggregations to compute per group.
        agg_defs: Vec<AggregationDef>,
        /// Set by the optimizer when `agg_defs` is exactly one bare `Count`
        /// — the physical planner then reads `Csr::group_len` directly
        /// instead of scanning any column.
        count_fast_path: bool,
    },
    /// Equi-join `left` and `right` on a shared column name.
    Join {
        /// Left input.
        left: Box<LogicalPlan>,
        /// Right input.
        right: Box<LogicalPlan>,
        /// The shared equi-key column name.
        on: String,
        /// Inner or left join.
        kind: JoinKind,
    },
    /// A full stable multi-key sort.
    Sort(Box<LogicalPlan>, Vec<SortKey>),
    /// Bounded top-N selection on one column.
    TopN {
        /// The plan producing rows to select from.
        input: Box<LogicalPlan>,
        /// Number of rows to keep.
        n: usize,
        /// Column to rank by.
        column: String,
        /// `true` for the `n` smallest values, `false` for the `n` largest.
        smallest: bool,
    },
}

impl LogicalPlan {
    /// A leaf node scanning `table`.
    pub fn scan(table: Rc<Table>) -> Self {
        LogicalPlan::Scan(table)
    }

    /// Wrap this plan in a filter.
    pub fn filter(self, predicate: Expr) -> Self {
        LogicalPlan::Filter(Box::new(self), predicate)
    }

    /// Wrap this plan in a projection.
    pub fn project(self, exprs: Vec<Expr>) -> Self {
        LogicalPlan::Projection(Box::new(self), exprs)
    }

    /// Wrap this plan in an aggregate. `count_fast_path` starts `false`; the
    /// optimizer sets it when applicable.
    pub fn aggregate(self, group_columns: Vec<String>, agg_defs: Vec<AggregationDef>) -> Self {
        LogicalPlan::Aggregate { input: Box::new(self), group_columns, agg_defs, count_fast_path: false }
    }

    /// Join this plan with `right`.
    pub fn join(self, right: LogicalPlan, on: impl Into<String>, kind: JoinKind) -> Self {
        LogicalPlan::Join { left: Box::new(self), right: Box::new(right), on: on.into(), kind }
    }

    /// Wrap this plan in a sort.
    pub fn sort(self, keys: Vec<SortKey>) -> Self {
        LogicalPlan::Sort(Box::new(self), keys)
    }

    /// Wrap this plan in a bounded top-N selection.
    pub fn top_n(self, n: usize, column: impl Into<String>, smallest: bool) -> Self {
        LogicalPlan::TopN { input: Box::new(self), n, column: column.into(), smallest }
    }
}
