//! Physical planner (component O): a structural-match executor lowering an
//! (optimized) logical plan directly onto the storage/kernel/group/join/sort
//! modules — there is no separate physical plan representation, since every
//! logical node already maps onto exactly one execution strategy.

use crate::agg::AggregationDef;
use crate::column::numeric::PrimitiveColumn;
use crate::column::{Column, ColumnType};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::group;
use crate::jit;
use crate::join;
use crate::kernels::compare;
use crate::kernels::compare::CompareOp;
use crate::plan::expr::{AggOp, BinOp, Expr};
use crate::plan::logical::LogicalPlan;
use crate::schema::{ColumnDef, Schema};
use crate::sort;
use crate::table::Table;
use crate::value::ScalarValue;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Run `plan` to completion against `config`, materializing the result.
pub fn execute(plan: &LogicalPlan, config: &EngineConfig) -> Result<Table> {
    match plan {
        LogicalPlan::Scan(table) => table.gather(&(0..table.row_count()).collect::<Vec<_>>()),

        LogicalPlan::Filter(input, predicate) => {
            let table = execute(input, config)?;
            filter_table(&table, predicate)
        }

        LogicalPlan::Projection(input, exprs) => {
            let table = execute(input, config)?;
            project_table(&table, exprs)
        }

        LogicalPlan::Aggregate { input, group_columns, agg_defs, count_fast_path } => {
            let table = execute(input, config)?;
            let grouped = group::group_by(&table, group_columns, config)?;
            if *count_fast_path {
                grouped.count()
            } else {
                grouped.aggregate(agg_defs)
            }
        }

        LogicalPlan::Join { left, right, on, kind } => {
            let left_table = execute(left, config)?;
            let right_table = execute(right, config)?;
            join::join(&left_table, &right_table, on, *kind)
        }

        LogicalPlan::Sort(input, keys) => {
            let table = execute(input, config)?;
            let order = sort::arg_sort(&table, keys)?;
            table.gather(&order)
        }

        LogicalPlan::TopN { input, n, column, smallest } => {
            let table = execute(input, config)?;
            let order =
                if *smallest { sort::smallest(&table, *n, column)? } else { sort::largest(&table, *n, column)? };
            table.gather(&order)
        }
    }
}

/// Run `plan` assuming it is (or reduces to) a single-key bare `count()`
/// aggregate, streaming `(key, count)` pairs without ever materializing a
/// result `Table`. Fails with [`Error::NotSupported`] for any other plan
/// shape.
pub fn execute_count_stream(
    plan: &LogicalPlan,
    config: &EngineConfig,
) -> Result<impl Iterator<Item = (Vec<ScalarValue>, usize)>> {
    match plan {
        LogicalPlan::Aggregate { input, group_columns, agg_defs, .. }
            if matches!(agg_defs, [def] if def.op == AggOp::Count) =>
        {
            let table = execute(input, config)?;
            let grouped = group::group_by(&table, group_columns, config)?;
            let pairs: Vec<_> = grouped.count_stream().collect();
            Ok(pairs.into_iter())
        }
        _ => Err(Error::NotSupported("count_stream requires a bare single-key count() aggregate")),
    }
}

/// Schema-level output type for `expr` evaluated against `schema`'s columns.
fn infer_output_type(expr: &Expr, schema: &Schema) -> Result<(ColumnType, bool)> {
    match expr {
        Expr::Col(name) => {
            let def = schema.get(name).ok_or_else(|| Error::MissingColumn(name.clone()))?;
            Ok((def.logical_type(), def.nullable))
        }
        Expr::Lit(v) => Ok((literal_type(v)?, matches!(v, ScalarValue::Null))),
        Expr::Binary(l, op, r) => {
            let (lt, ln) = infer_output_type(l, schema)?;
            let (rt, rn) = infer_output_type(r, schema)?;
            let nullable = ln || rn;
            if op.is_arithmetic() {
                match (lt, rt) {
                    (ColumnType::I32, ColumnType::I32) => Ok((ColumnType::I32, nullable)),
                    (ColumnType::I32, ColumnType::F64) | (ColumnType::F64, ColumnType::I32) | (ColumnType::F64, ColumnType::F64) => {
                        Ok((ColumnType::F64, nullable))
                    }
                    _ => Err(Error::NotSupported("arithmetic on a non-numeric column")),
                }
            } else {
                Ok((ColumnType::Bool, nullable))
            }
        }
        Expr::Alias(child, _) => infer_output_type(child, schema),
        Expr::Agg(..) => Err(Error::NotSupported("aggregation expression outside an Aggregate node")),
    }
}

fn literal_type(v: &ScalarValue) -> Result<ColumnType> {
    match v {
        ScalarValue::Null => Ok(ColumnType::I32),
        ScalarValue::I32(_) => Ok(ColumnType::I32),
        ScalarValue::F64(_) => Ok(ColumnType::F64),
        ScalarValue::Bool(_) => Ok(ColumnType::Bool),
        ScalarValue::Str(_) => Ok(ColumnType::String),
        ScalarValue::Timestamp(_) => Ok(ColumnType::Timestamp),
    }
}

fn to_f64(v: &ScalarValue) -> Result<f64> {
    match v {
        ScalarValue::I32(x) => Ok(*x as f64),
        ScalarValue::F64(x) => Ok(*x),
        _ => Err(Error::NotSupported("non-numeric operand in arithmetic expression")),
    }
}

fn compare_scalars(l: &ScalarValue, r: &ScalarValue) -> Result<Ordering> {
    match (l, r) {
        (ScalarValue::I32(a), ScalarValue::I32(b)) => Ok(a.cmp(b)),
        (ScalarValue::F64(a), ScalarValue::F64(b)) => Ok(a.total_cmp(b)),
        (ScalarValue::I32(a), ScalarValue::F64(b)) => Ok((*a as f64).total_cmp(b)),
        (ScalarValue::F64(a), ScalarValue::I32(b)) => Ok(a.total_cmp(&(*b as f64))),
        (ScalarValue::Bool(a), ScalarValue::Bool(b)) => Ok(a.cmp(b)),
        (ScalarValue::Str(a), ScalarValue::Str(b)) => Ok(a.cmp(b)),
        (ScalarValue::Timestamp(a), ScalarValue::Timestamp(b)) => Ok(a.0.cmp(&b.0)),
        _ => Err(Error::NotSupported("comparison between incompatible operand types")),
    }
}

/// Evaluate a binary node given already-evaluated operands. Shared by the
/// row-wise interpreter and the optimizer's constant-folding pass.
fn eval_binary(l: ScalarValue, op: BinOp, r: ScalarValue) -> Result<ScalarValue> {
    if l.is_null() || r.is_null() {
        return Ok(ScalarValue::Null);
    }
    if op.is_arithmetic() {
        if let (ScalarValue::I32(a), ScalarValue::I32(b)) = (&l, &r) {
            return match op {
                BinOp::Add => Ok(ScalarValue::I32(a.wrapping_add(*b))),
                BinOp::Sub => Ok(ScalarValue::I32(a.wrapping_sub(*b))),
                BinOp::Mul => Ok(ScalarValue::I32(a.wrapping_mul(*b))),
                BinOp::Div => {
                    if *b == 0 {
                        Err(Error::Arithmetic("integer division by zero"))
                    } else {
                        Ok(ScalarValue::I32(a / b))
                    }
                }
                _ => unreachable!("comparisons handled below"),
            };
        }
        let (a, b) = (to_f64(&l)?, to_f64(&r)?);
        Ok(ScalarValue::F64(match op {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => a / b,
            _ => unreachable!("comparisons handled below"),
        }))
    } else {
        let ord = compare_scalars(&l, &r)?;
        Ok(ScalarValue::Bool(match op {
            BinOp::Eq => ord == Ordering::Equal,
            BinOp::Ne => ord != Ordering::Equal,
            BinOp::Lt => ord == Ordering::Less,
            BinOp::Le => ord != Ordering::Greater,
            BinOp::Gt => ord == Ordering::Greater,
            BinOp::Ge => ord != Ordering::Less,
            _ => unreachable!("arithmetic handled above"),
        }))
    }
}

/// Fold two literals into one without a row or table in scope — used by the
/// optimizer's constant-folding rule. `None` when either side isn't numeric
/// or the fold would itself fail (the unfolded tree still evaluates fine at
/// execution time, so a fold failure just means "don't fold").
pub(crate) fn fold_literal(l: &ScalarValue, op: BinOp, r: &ScalarValue) -> Option<ScalarValue> {
    eval_binary(l.clone(), op, r.clone()).ok()
}

fn eval_expr_row(table: &Table, expr: &Expr, row: usize) -> Result<ScalarValue> {
    match expr {
        Expr::Col(name) => table.column(name)?.get_boxed(row),
        Expr::Lit(v) => Ok(v.clone()),
        Expr::Binary(l, op, r) => {
            let lv = eval_expr_row(table, l, row)?;
            let rv = eval_expr_row(table, r, row)?;
            eval_binary(lv, *op, rv)
        }
        Expr::Alias(child, _) => eval_expr_row(table, child, row),
        Expr::Agg(..) => Err(Error::NotSupported("aggregation expression outside an Aggregate node")),
    }
}

/// `true` iff `expr` is `Col op Lit` or `Lit op Gt` with a numeric scalar —
/// the shape `kernels::compare` can execute directly over a dense column
/// without a per-row interpreter loop.
fn as_scalar_compare<'e>(expr: &'e Expr) -> Option<(&'e str, CompareOp, &'e ScalarValue)> {
    if let Expr::Binary(l, op, r) = expr {
        if let (Expr::Col(name), Expr::Lit(v)) = (l.as_ref(), r.as_ref()) {
            if let Some(cmp) = to_compare_op(*op) {
                return Some((name, cmp, v));
            }
        }
    }
    None
}

fn to_compare_op(op: BinOp) -> Option<CompareOp> {
    Some(match op {
        BinOp::Eq => CompareOp::Eq,
        BinOp::Ne => CompareOp::Ne,
        BinOp::Lt => CompareOp::Lt,
        BinOp::Le => CompareOp::Le,
        BinOp::Gt => CompareOp::Gt,
        BinOp::Ge => CompareOp::Ge,
        _ => return None,
    })
}

/// Keep only the rows of `table` where `predicate` evaluates to `true`.
/// Takes the vectorized `kernels::compare` fast path for a plain
/// `column op scalar` shape over a non-null numeric column (after
/// canonicalization this covers a literal on either side); otherwise falls
/// back to the row-wise interpreter. A null predicate result excludes the
/// row, matching the three-valued-logic convention used elsewhere.
pub fn filter_table(table: &Table, predicate: &Expr) -> Result<Table> {
    if let Some((name, op, scalar)) = as_scalar_compare(predicate) {
        let col = table.column(name)?;
        match (col, scalar) {
            (Column::I32(c), ScalarValue::I32(v)) => {
                let idx = compare::filter_i32(c, op, *v);
                return table.gather(&idx);
            }
            (Column::F64(c), ScalarValue::F64(v)) => {
                let idx = compare::filter_f64(c, op, *v);
                return table.gather(&idx);
            }
            _ => {}
        }
    }
    let mut idx = Vec::new();
    for row in 0..table.row_count() {
        if matches!(eval_expr_row(table, predicate, row)?, ScalarValue::Bool(true)) {
            idx.push(row);
        }
    }
    table.gather(&idx)
}

/// Evaluate `exprs` against every row of `table`, producing a new table with
/// one output column per expression. A bare `Col(name)` passes the source
/// column through via `gather` over the identity permutation (cheap, no
/// per-row boxing); a pure-arithmetic expression over non-nullable `i32`/
/// `f64` columns compiles through the expression JIT; everything else falls
/// back to the row-wise interpreter.
pub fn project_table(table: &Table, exprs: &[Expr]) -> Result<Table> {
    let identity: Vec<usize> = (0..table.row_count()).collect();
    let mut defs = Vec::with_capacity(exprs.len());
    let mut columns = Vec::with_capacity(exprs.len());

    for expr in exprs {
        let name = expr.output_name();
        if let Expr::Col(source) = strip_alias(expr) {
            let col = table.column(source)?;
            let def = ColumnDef::new(name, col.column_type(), col.nullable());
            columns.push(col.gather(&identity)?);
            defs.push(def);
            continue;
        }
        let (ty, nullable) = infer_output_type(expr, table.schema())?;
        if let Some(col) = try_jit_project(table, expr, &name, ty, nullable)? {
            defs.push(ColumnDef::new(name, ty, nullable));
            columns.push(col);
            continue;
        }
        let def = ColumnDef::new(name.clone(), ty, nullable);
        let mut out = Column::new_empty(&def, table.row_count());
        for row in 0..table.row_count() {
            out.push_boxed(eval_expr_row(table, expr, row)?)?;
        }
        defs.push(def);
        columns.push(out);
    }

    Table::new(Schema::new(defs)?, columns)
}

/// Try the expression JIT for a pure-arithmetic projection expression.
/// Returns `None` (never an error) whenever the JIT can't or won't help —
/// a nullable result, a comparison/aggregation node, or a nullable input
/// column all fall back to [`eval_expr_row`] instead. Non-`i32` numeric
/// inputs are widened to `f64` up front, matching the contract
/// [`crate::jit::CompiledExpr::F64`] documents.
fn try_jit_project(
    table: &Table,
    expr: &Expr,
    name: &str,
    ty: ColumnType,
    nullable: bool,
) -> Result<Option<Column>> {
    if nullable || matches!(strip_alias(expr), Expr::Col(_)) {
        return Ok(None);
    }
    let mut column_types: HashMap<String, ColumnType> = HashMap::new();
    for col_name in expr.referenced_columns() {
        let col = table.column(&col_name)?;
        if col.nullable() || !matches!(col.column_type(), ColumnType::I32 | ColumnType::F64) {
            return Ok(None);
        }
        column_types.insert(col_name, col.column_type());
    }
    let compiled = match jit::cache().compile(expr, &column_types) {
        Ok(c) => c,
        Err(_) => return Ok(None),
    };
    let names = compiled.input_columns().to_vec();
    match ty {
        ColumnType::I32 => {
            let owned: Vec<&[i32]> = names.iter().map(|n| table.column(n)?.values_i32()).collect::<Result<_>>()?;
            let mut out = Vec::new();
            compiled.eval_i32(table.row_count(), &mut out, &owned)?;
            Ok(Some(Column::I32(PrimitiveColumn::from_parts(name.to_string(), false, out, None))))
        }
        ColumnType::F64 => {
            let mut widened: Vec<Vec<f64>> = Vec::with_capacity(names.len());
            for n in &names {
                let col = table.column(n)?;
                let values = match col {
                    Column::I32(c) => c.values().iter().map(|&x| x as f64).collect(),
                    Column::F64(c) => c.values().to_vec(),
                    _ => return Ok(None),
                };
                widened.push(values);
            }
            let slices: Vec<&[f64]> = widened.iter().map(Vec::as_slice).collect();
            let mut out = Vec::new();
            compiled.eval_f64(table.row_count(), &mut out, &slices)?;
            Ok(Some(Column::F64(PrimitiveColumn::from_parts(name.to_string(), false, out, None))))
        }
        _ => Ok(None),
    }
}

fn strip_alias(expr: &Expr) -> &Expr {
    match expr {
        Expr::Alias(child, _) => strip_alias(child),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::numeric::PrimitiveColumn;
    use crate::plan::logical::LogicalPlan;
    use crate::schema::{ColumnDef, Schema};
    use std::rc::Rc;

    fn sample() -> Rc<Table> {
        let mut a: PrimitiveColumn<i32> = PrimitiveColumn::new("a", false, 0);
        let mut b: PrimitiveColumn<i32> = PrimitiveColumn::new("b", false, 0);
        for (x, y) in [(1, 10), (2, 20), (3, 30)] {
            a.append(x);
            b.append(y);
        }
        let schema =
            Schema::new(vec![ColumnDef::new("a", ColumnType::I32, false), ColumnDef::new("b", ColumnType::I32, false)])
                .unwrap();
        Rc::new(Table::new(schema, vec![Column::I32(a), Column::I32(b)]).unwrap())
    }

    #[test]
    fn filter_table_uses_the_vectorized_path_for_scalar_comparisons() {
        let table = sample();
        let predicate = Expr::col("a").binary(BinOp::Gt, Expr::lit(ScalarValue::I32(1)));
        let result = filter_table(&table, &predicate).unwrap();
        assert_eq!(result.row_count(), 2);
    }

    #[test]
    fn project_table_computes_arithmetic_expressions() {
        let table = sample();
        let expr = Expr::col("a").binary(BinOp::Add, Expr::col("b")).alias("sum");
        let result = project_table(&table, &[expr]).unwrap();
        assert_eq!(result.column("sum").unwrap().get_boxed(0).unwrap(), ScalarValue::I32(11));
        assert_eq!(result.column("sum").unwrap().get_boxed(2).unwrap(), ScalarValue::I32(33));
    }

    #[test]
    fn execute_runs_a_full_filter_project_sort_pipeline() {
        let plan = LogicalPlan::scan(sample())
            .filter(Expr::col("a").binary(BinOp::Gt, Expr::lit(ScalarValue::I32(1))))
            .project(vec![Expr::col("a"), Expr::col("b")])
            .sort(vec![crate::sort::SortKey::desc("a")]);
        let result = execute(&plan, &EngineConfig::default()).unwrap();
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.column("a").unwrap().get_boxed(0).unwrap(), ScalarValue::I32(3));
    }

    #[test]
    fn execute_count_stream_rejects_non_count_plans() {
        let plan = LogicalPlan::scan(sample());
        assert!(matches!(
            execute_count_stream(&plan, &EngineConfig::default()),
            Err(Error::NotSupported(_))
        ));
    }
}
