//! Optimizer (component N): a small set of rewrite rules applied to a
//! logical plan to a fixpoint. Each rule is purely structural — no rule
//! touches table data, so optimization never fails.

use crate::agg::AggregationDef;
use crate::plan::expr::{AggOp, BinOp, Expr};
use crate::plan::logical::LogicalPlan;
use crate::value::ScalarValue;
use std::collections::HashSet;

const MAX_PASSES: usize = 8;

/// Rewrite `plan` by repeatedly applying every rule until none of them
/// change the tree, or [`MAX_PASSES`] is reached.
pub fn optimize(plan: LogicalPlan) -> LogicalPlan {
    let mut current = plan;
    for _ in 0..MAX_PASSES {
        let (next, changed) = apply_once(current);
        current = next;
        if !changed {
            break;
        }
    }
    current
}

fn apply_once(plan: LogicalPlan) -> (LogicalPlan, bool) {
    let mut changed = false;
    let plan = rewrite_node(plan, &mut changed);
    let plan = prune_columns(plan, None, &mut changed);
    (plan, changed)
}

fn rewrite_node(plan: LogicalPlan, changed: &mut bool) -> LogicalPlan {
    match plan {
        LogicalPlan::Scan(t) => LogicalPlan::Scan(t),

        LogicalPlan::Filter(input, predicate) => {
            let input = Box::new(rewrite_node(*input, changed));
            let predicate = fold_constants(canonicalize_comparisons(predicate, changed), changed);
            push_filter_down(input, predicate, changed)
        }

        LogicalPlan::Projection(input, exprs) => {
            let input = Box::new(rewrite_node(*input, changed));
            let exprs: Vec<Expr> =
                exprs.into_iter().map(|e| fold_constants(canonicalize_comparisons(e, changed), changed)).collect();
            prune_identity_projection(input, exprs, changed)
        }

        LogicalPlan::Aggregate { input, group_columns, agg_defs, count_fast_path } => {
            let input = Box::new(rewrite_node(*input, changed));
            let fast_path = is_count_fast_path(&agg_defs);
            if fast_path != count_fast_path {
                *changed = true;
            }
            LogicalPlan::Aggregate { input, group_columns, agg_defs, count_fast_path: fast_path }
        }

        LogicalPlan::Join { left, right, on, kind } => {
            let left = Box::new(rewrite_node(*left, changed));
            let right = Box::new(rewrite_node(*right, changed));
            LogicalPlan::Join { left, right, on, kind }
        }

        LogicalPlan::Sort(input, keys) => {
            let input = Box::new(rewrite_node(*input, changed));
            LogicalPlan::Sort(input, keys)
        }

        LogicalPlan::TopN { input, n, column, smallest } => {
            let input = Box::new(rewrite_node(*input, changed));
            LogicalPlan::TopN { input, n, column, smallest }
        }
    }
}

/// A bare single-key `count()` needs no column scan: the physical planner
/// reads group sizes straight from the CSR.
fn is_count_fast_path(agg_defs: &[AggregationDef]) -> bool {
    matches!(agg_defs, [def] if def.op == AggOp::Count)
}

/// Move a literal from the left side of a comparison to the right,
/// flipping the operator accordingly, so later rules only have to match one
/// shape. Recurses into both arithmetic and comparison subtrees.
fn canonicalize_comparisons(expr: Expr, changed: &mut bool) -> Expr {
    match expr {
        Expr::Binary(l, op, r) => {
            let l = Box::new(canonicalize_comparisons(*l, changed));
            let r = Box::new(canonicalize_comparisons(*r, changed));
            if !op.is_arithmetic() && matches!(*l, Expr::Lit(_)) && !matches!(*r, Expr::Lit(_)) {
                *changed = true;
                Expr::Binary(r, op.swapped(), l)
            } else {
                Expr::Binary(l, op, r)
            }
        }
        Expr::Alias(child, name) => Expr::Alias(Box::new(canonicalize_comparisons(*child, changed)), name),
        Expr::Agg(op, child) => Expr::Agg(op, Box::new(canonicalize_comparisons(*child, changed))),
        other => other,
    }
}

/// Fold a `Lit op Lit` arithmetic subtree into a single literal wherever
/// both operands are already literals after recursing into children, and
/// simplify the multiplicative/additive identities `col × 1 → col` and
/// `col + 0 → col` (either operand order, since both operators commute).
/// Comparisons between two literals are left alone — a constant-`true`
/// filter with no predicate to evaluate is not worth a dedicated rule here.
fn fold_constants(expr: Expr, changed: &mut bool) -> Expr {
    match expr {
        Expr::Binary(l, op, r) => {
            let l = fold_constants(*l, changed);
            let r = fold_constants(*r, changed);
            if op.is_arithmetic() {
                if let (Expr::Lit(lv), Expr::Lit(rv)) = (&l, &r) {
                    if let Some(folded) = crate::plan::physical::fold_literal(lv, op, rv) {
                        *changed = true;
                        return Expr::Lit(folded);
                    }
                }
                if let Some(identity) = simplify_identity(&l, op, &r) {
                    *changed = true;
                    return identity;
                }
            }
            Expr::Binary(Box::new(l), op, Box::new(r))
        }
        Expr::Alias(child, name) => Expr::Alias(Box::new(fold_constants(*child, changed)), name),
        Expr::Agg(op, child) => Expr::Agg(op, Box::new(fold_constants(*child, changed))),
        other => other,
    }
}

/// `true` iff `lit` is the numeric value `1` (`i32` or `f64`, matching
/// whichever literal type appears) — the multiplicative identity.
fn is_one(lit: &Expr) -> bool {
    match lit {
        Expr::Lit(ScalarValue::I32(v)) => *v == 1,
        Expr::Lit(ScalarValue::F64(v)) => *v == 1.0,
        _ => false,
    }
}

/// `true` iff `lit` is the numeric value `0` — the additive identity.
fn is_zero(lit: &Expr) -> bool {
    match lit {
        Expr::Lit(ScalarValue::I32(v)) => *v == 0,
        Expr::Lit(ScalarValue::F64(v)) => *v == 0.0,
        _ => false,
    }
}

/// Recognize `col × 1`, `1 × col`, `col + 0`, `0 + col` and return the bare
/// `col` subexpression; `None` for every other shape (including non-`Col`
/// non-literal operands, which are left for the literal-on-one-side scalar
/// broadcast path rather than simplified away here).
fn simplify_identity(l: &Expr, op: BinOp, r: &Expr) -> Option<Expr> {
    match op {
        BinOp::Mul if is_one(l) => Some(r.clone()),
        BinOp::Mul if is_one(r) => Some(l.clone()),
        BinOp::Add if is_zero(l) => Some(r.clone()),
        BinOp::Add if is_zero(r) => Some(l.clone()),
        _ => None,
    }
}

/// Swap `Filter(Projection(input, exprs), predicate)` into
/// `Projection(Filter(input, predicate), exprs)` when every column
/// `predicate` reads is a plain pass-through in `exprs` (not a computed
/// alias) — filtering narrower, unprojected rows is cheaper and never
/// changes which rows survive.
fn push_filter_down(input: Box<LogicalPlan>, predicate: Expr, changed: &mut bool) -> LogicalPlan {
    if let LogicalPlan::Projection(inner, exprs) = *input {
        let projects_plain_columns = exprs.iter().all(|e| matches!(e, Expr::Col(_)));
        if projects_plain_columns {
            *changed = true;
            return LogicalPlan::Projection(Box::new(LogicalPlan::Filter(inner, predicate)), exprs);
        }
        return LogicalPlan::Filter(Box::new(LogicalPlan::Projection(inner, exprs)), predicate);
    }
    if let LogicalPlan::Sort(inner, keys) = *input {
        *changed = true;
        return LogicalPlan::Sort(Box::new(LogicalPlan::Filter(inner, predicate)), keys);
    }
    LogicalPlan::Filter(input, predicate)
}

/// Drop a projection whose expression list is exactly `Col(name)` for every
/// input column, in order — a no-op pass-through.
fn prune_identity_projection(input: Box<LogicalPlan>, exprs: Vec<Expr>, changed: &mut bool) -> LogicalPlan {
    if let LogicalPlan::Scan(table) = input.as_ref() {
        let identity = exprs.len() == table.column_count()
            && exprs.iter().zip(table.columns()).all(|(e, c)| matches!(e, Expr::Col(name) if name == c.name()));
        if identity {
            *changed = true;
            return LogicalPlan::Scan(table.clone());
        }
    }
    LogicalPlan::Projection(input, exprs)
}

/// The ordered column names `plan`'s output table would have, computed
/// structurally from the plan shape alone (no table data is read). Used by
/// [`prune_columns`] to work out, for a node like `Join` whose output
/// carries columns from more than one input, which of those columns a
/// `Projection` feeding it may safely drop.
fn output_columns(plan: &LogicalPlan) -> Vec<String> {
    match plan {
        LogicalPlan::Scan(table) => table.columns().iter().map(|c| c.name().to_string()).collect(),
        LogicalPlan::Filter(input, _) => output_columns(input),
        LogicalPlan::Projection(_, exprs) => exprs.iter().map(Expr::output_name).collect(),
        LogicalPlan::Aggregate { group_columns, agg_defs, .. } => {
            group_columns.iter().cloned().chain(agg_defs.iter().map(|d| d.target.clone())).collect()
        }
        LogicalPlan::Join { left, right, on, .. } => {
            let mut cols = output_columns(left);
            cols.extend(output_columns(right).into_iter().filter(|c| c != on));
            cols
        }
        LogicalPlan::Sort(input, _) => output_columns(input),
        LogicalPlan::TopN { input, .. } => output_columns(input),
    }
}

/// Projection pruning (spec §4.M/N rule 2): push column-need information
/// down the tree so a `Projection` only ever computes/carries the columns
/// something above it will actually read. `required` is the set of output
/// column names a node must produce for its caller, or `None` at the plan
/// root (and anywhere else the caller needs everything the node naturally
/// produces) — `None` always means "do not prune here".
///
/// `Aggregate`'s own output schema is fixed (group columns plus aggregate
/// targets) regardless of what's required of it, so its input's needed set
/// is exactly its own group/source columns. `Filter`, `Sort`, `TopN` and
/// `Join` all pass through columns they don't otherwise reference, so their
/// input's needed set is `required` widened by whatever column(s) the node
/// itself reads (a predicate, a sort key, a rank column, the equi-join key).
fn prune_columns(plan: LogicalPlan, required: Option<&HashSet<String>>, changed: &mut bool) -> LogicalPlan {
    match plan {
        LogicalPlan::Scan(t) => LogicalPlan::Scan(t),

        LogicalPlan::Projection(input, exprs) => {
            let exprs = match required {
                Some(req) => {
                    let filtered: Vec<Expr> = exprs.iter().filter(|e| req.contains(&e.output_name())).cloned().collect();
                    if filtered.len() != exprs.len() && !filtered.is_empty() {
                        *changed = true;
                        filtered
                    } else {
                        exprs
                    }
                }
                None => exprs,
            };
            let child_required: HashSet<String> = exprs.iter().flat_map(Expr::referenced_columns).collect();
            let input = Box::new(prune_columns(*input, Some(&child_required), changed));
            LogicalPlan::Projection(input, exprs)
        }

        LogicalPlan::Filter(input, predicate) => {
            let mut need = required.cloned().unwrap_or_else(|| output_columns(&input).into_iter().collect());
            need.extend(predicate.referenced_columns());
            let input = Box::new(prune_columns(*input, Some(&need), changed));
            LogicalPlan::Filter(input, predicate)
        }

        LogicalPlan::Aggregate { input, group_columns, agg_defs, count_fast_path } => {
            let mut need: HashSet<String> = group_columns.iter().cloned().collect();
            need.extend(agg_defs.iter().filter(|d| d.op != AggOp::Count).map(|d| d.source.clone()));
            let input = Box::new(prune_columns(*input, Some(&need), changed));
            LogicalPlan::Aggregate { input, group_columns, agg_defs, count_fast_path }
        }

        LogicalPlan::Join { left, right, on, kind } => {
            let own_output = required.cloned().unwrap_or_else(|| {
                output_columns(&LogicalPlan::Join { left: left.clone(), right: right.clone(), on: on.clone(), kind })
                    .into_iter()
                    .collect()
            });
            let left_cols: HashSet<String> = output_columns(&left).into_iter().collect();
            let right_cols: HashSet<String> = output_columns(&right).into_iter().collect();
            let mut left_need: HashSet<String> = own_output.intersection(&left_cols).cloned().collect();
            left_need.insert(on.clone());
            let mut right_need: HashSet<String> = own_output.intersection(&right_cols).cloned().collect();
            right_need.insert(on.clone());
            let left = Box::new(prune_columns(*left, Some(&left_need), changed));
            let right = Box::new(prune_columns(*right, Some(&right_need), changed));
            LogicalPlan::Join { left, right, on, kind }
        }

        LogicalPlan::Sort(input, keys) => {
            let mut need = required.cloned().unwrap_or_else(|| output_columns(&input).into_iter().collect());
            need.extend(keys.iter().map(|k| k.column.clone()));
            let input = Box::new(prune_columns(*input, Some(&need), changed));
            LogicalPlan::Sort(input, keys)
        }

        LogicalPlan::TopN { input, n, column, smallest } => {
            let mut need = required.cloned().unwrap_or_else(|| output_columns(&input).into_iter().collect());
            need.insert(column.clone());
            let input = Box::new(prune_columns(*input, Some(&need), changed));
            LogicalPlan::TopN { input, n, column, smallest }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::numeric::PrimitiveColumn;
    use crate::column::{Column, ColumnType};
    use crate::schema::{ColumnDef, Schema};
    use crate::value::ScalarValue;
    use std::rc::Rc;

    fn sample() -> Rc<crate::table::Table> {
        let mut a: PrimitiveColumn<i32> = PrimitiveColumn::new("a", false, 0);
        a.append(1);
        let schema = Schema::new(vec![ColumnDef::new("a", ColumnType::I32, false)]).unwrap();
        Rc::new(crate::table::Table::new(schema, vec![Column::I32(a)]).unwrap())
    }

    /// Three `i32` columns, `a`/`b`/`c`, used by the column-pruning tests
    /// below so a `Projection` over the scan has something non-trivial to
    /// trim.
    fn sample_abc() -> Rc<crate::table::Table> {
        let mut a: PrimitiveColumn<i32> = PrimitiveColumn::new("a", false, 0);
        let mut b: PrimitiveColumn<i32> = PrimitiveColumn::new("b", false, 0);
        let mut c: PrimitiveColumn<i32> = PrimitiveColumn::new("c", false, 0);
        a.append(1);
        b.append(2);
        c.append(3);
        let schema = Schema::new(vec![
            ColumnDef::new("a", ColumnType::I32, false),
            ColumnDef::new("b", ColumnType::I32, false),
            ColumnDef::new("c", ColumnType::I32, false),
        ])
        .unwrap();
        Rc::new(crate::table::Table::new(schema, vec![Column::I32(a), Column::I32(b), Column::I32(c)]).unwrap())
    }

    #[test]
    fn canonicalizes_literal_on_left_of_comparison() {
        let predicate = Expr::lit(ScalarValue::I32(5)).binary(BinOp::Lt, Expr::col("a"));
        let plan = LogicalPlan::scan(sample()).filter(predicate);
        let optimized = optimize(plan);
        match optimized {
            LogicalPlan::Filter(_, Expr::Binary(l, op, r)) => {
                assert!(matches!(*l, Expr::Col(_)));
                assert!(matches!(*r, Expr::Lit(_)));
                assert_eq!(op, BinOp::Gt);
            }
            _ => panic!("expected a canonicalized comparison"),
        }
    }

    #[test]
    fn folds_constant_arithmetic() {
        let predicate = Expr::col("a").binary(
            BinOp::Gt,
            Expr::lit(ScalarValue::I32(2)).binary(BinOp::Add, Expr::lit(ScalarValue::I32(3))),
        );
        let plan = LogicalPlan::scan(sample()).filter(predicate);
        let optimized = optimize(plan);
        match optimized {
            LogicalPlan::Filter(_, Expr::Binary(_, _, r)) => {
                assert_eq!(*r, Expr::Lit(ScalarValue::I32(5)));
            }
            _ => panic!("expected a folded literal"),
        }
    }

    #[test]
    fn pushes_filter_below_an_identity_projection() {
        let predicate = Expr::col("a").binary(BinOp::Gt, Expr::lit(ScalarValue::I32(0)));
        let plan = LogicalPlan::scan(sample()).project(vec![Expr::col("a")]).filter(predicate);
        let optimized = optimize(plan);
        // identity projection is pruned, so the filter ends up directly on the scan
        assert!(matches!(optimized, LogicalPlan::Filter(inner, _) if matches!(*inner, LogicalPlan::Scan(_))));
    }

    #[test]
    fn annotates_bare_count_as_fast_path() {
        let plan = LogicalPlan::scan(sample())
            .aggregate(vec!["a".to_string()], vec![AggregationDef::new(AggOp::Count, "a", "n")]);
        let optimized = optimize(plan);
        match optimized {
            LogicalPlan::Aggregate { count_fast_path, .. } => assert!(count_fast_path),
            _ => panic!("expected an Aggregate node"),
        }
    }

    #[test]
    fn folds_multiplicative_and_additive_identities() {
        let mul = Expr::col("a").binary(BinOp::Mul, Expr::lit(ScalarValue::I32(1)));
        assert_eq!(fold_constants(mul, &mut false), Expr::col("a"));
        let mul_lhs = Expr::lit(ScalarValue::F64(1.0)).binary(BinOp::Mul, Expr::col("a"));
        assert_eq!(fold_constants(mul_lhs, &mut false), Expr::col("a"));

        let add = Expr::col("a").binary(BinOp::Add, Expr::lit(ScalarValue::I32(0)));
        assert_eq!(fold_constants(add, &mut false), Expr::col("a"));
        let add_lhs = Expr::lit(ScalarValue::F64(0.0)).binary(BinOp::Add, Expr::col("a"));
        assert_eq!(fold_constants(add_lhs, &mut false), Expr::col("a"));

        // non-identity literals are left alone
        let not_identity = Expr::col("a").binary(BinOp::Mul, Expr::lit(ScalarValue::I32(2)));
        assert_eq!(fold_constants(not_identity.clone(), &mut false), not_identity);
    }

    #[test]
    fn aggregate_prunes_projection_to_group_and_source_columns() {
        // `[a, c, b]` (reordered) rather than `[a, b, c]` so the projection
        // isn't already a full in-order identity over the scan — otherwise
        // the unrelated identity-projection rule would collapse it first and
        // this test wouldn't be exercising the general pruning rule at all.
        let plan = LogicalPlan::scan(sample_abc())
            .project(vec![Expr::col("a"), Expr::col("c"), Expr::col("b")])
            .aggregate(vec!["a".to_string()], vec![AggregationDef::new(AggOp::Sum, "b", "total")]);
        let optimized = optimize(plan);
        match optimized {
            LogicalPlan::Aggregate { input, .. } => match *input {
                LogicalPlan::Projection(_, exprs) => {
                    let names: Vec<String> = exprs.iter().map(Expr::output_name).collect();
                    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
                }
                _ => panic!("expected the projection to survive, narrowed to a/b"),
            },
            _ => panic!("expected an Aggregate node"),
        }
    }

    #[test]
    fn aggregate_count_does_not_need_its_source_column() {
        let plan = LogicalPlan::scan(sample_abc())
            .project(vec![Expr::col("a"), Expr::col("c"), Expr::col("b")])
            .aggregate(vec!["a".to_string()], vec![AggregationDef::new(AggOp::Count, "b", "n")]);
        let optimized = optimize(plan);
        match optimized {
            LogicalPlan::Aggregate { input, .. } => match *input {
                LogicalPlan::Projection(_, exprs) => {
                    let names: Vec<String> = exprs.iter().map(Expr::output_name).collect();
                    assert_eq!(names, vec!["a".to_string()]);
                }
                _ => panic!("expected the projection to survive, narrowed to just a"),
            },
            _ => panic!("expected an Aggregate node"),
        }
    }

    #[test]
    fn sort_prunes_projection_to_its_own_output_plus_sort_key() {
        let plan = LogicalPlan::scan(sample_abc())
            .project(vec![Expr::col("a"), Expr::col("b")])
            .sort(vec![crate::sort::SortKey::asc("a")])
            .project(vec![Expr::col("a")]);
        let optimized = optimize(plan);
        // the outer projection only reads `a`, so the inner projection (whose
        // output still has to survive the sort unchanged) is narrowed to `a`
        match optimized {
            LogicalPlan::Projection(inner, _) => match *inner {
                LogicalPlan::Sort(sort_input, _) => match *sort_input {
                    LogicalPlan::Projection(_, exprs) => {
                        let names: Vec<String> = exprs.iter().map(Expr::output_name).collect();
                        assert_eq!(names, vec!["a".to_string()]);
                    }
                    _ => panic!("expected the inner projection to survive"),
                },
                _ => panic!("expected a Sort node"),
            },
            _ => panic!("expected an outer Projection node"),
        }
    }

    #[test]
    fn join_prunes_each_side_to_its_key_plus_columns_required_above() {
        // the equi-key column must be named `a` on both sides; only the
        // non-key columns are renamed. Left is reordered (`[a, c, b]` rather
        // than `[a, b, c]`) so it isn't already a full in-order identity
        // over the scan, which the unrelated identity-projection rule would
        // otherwise collapse before this test can exercise general pruning.
        let left = LogicalPlan::scan(sample_abc()).project(vec![Expr::col("a"), Expr::col("c"), Expr::col("b")]);
        let right = LogicalPlan::scan(sample_abc())
            .project(vec![Expr::col("a"), Expr::col("b").alias("b2"), Expr::col("c").alias("c2")]);
        let joined = left.join(right, "a", crate::join::JoinKind::Inner);
        let plan = joined.project(vec![Expr::col("a"), Expr::col("b2")]);
        let optimized = optimize(plan);
        match optimized {
            LogicalPlan::Projection(join_plan, _) => match *join_plan {
                LogicalPlan::Join { left, right, .. } => {
                    match *left {
                        LogicalPlan::Projection(_, exprs) => {
                            let names: Vec<String> = exprs.iter().map(Expr::output_name).collect();
                            assert_eq!(names, vec!["a".to_string()]);
                        }
                        _ => panic!("expected the left projection to survive, narrowed to the key"),
                    }
                    match *right {
                        LogicalPlan::Projection(_, exprs) => {
                            let names: Vec<String> = exprs.iter().map(Expr::output_name).collect();
                            assert_eq!(names, vec!["a".to_string(), "b2".to_string()]);
                        }
                        _ => panic!("expected the right projection to survive, narrowed to the key plus b2"),
                    }
                }
                _ => panic!("expected a Join node"),
            },
            _ => panic!("expected an outer Projection node"),
        }
    }
}
