//! Expression JIT (component H): compiles an arithmetic expression tree into
//! a closure that evaluates one row at a time against positional input
//! slices, specialized to `i32` or `f64` so there is no per-row type dispatch
//! left once the kernel is built. "JIT" here means compiling to a native
//! Rust closure captured at expression-build time, not emitting machine code
//! — the column names resolve to input-slice positions once, at compile
//! time, rather than on every row.
//!
//! Only `Col`, `Lit`, `Binary(+|-|×|÷)` and `Alias` are supported; anything
//! else (comparisons, aggregations) returns [`Error::JitUnsupported`] and the
//! caller falls back to the interpreted path in [`crate::kernels`].

use crate::column::ColumnType;
use crate::error::{Error, Result};
use crate::plan::expr::{BinOp, Expr};
use crate::value::ScalarValue;
use log::{debug, trace};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A compiled `i32` row kernel: given the positional input slices and a row
/// index, produces the expression's value at that row (or an arithmetic
/// error, e.g. integer division by zero).
pub type I32Kernel = Box<dyn Fn(&[&[i32]], usize) -> Result<i32> + Send + Sync>;

/// A compiled `f64` row kernel. Division by zero is never an error here —
/// it follows IEEE-754 and produces `inf`/`NaN`.
pub type F64Kernel = Box<dyn Fn(&[&[f64]], usize) -> f64 + Send + Sync>;

/// A compiled expression, specialized to one numeric type, plus the ordered
/// list of column names its positional inputs expect.
pub enum CompiledExpr {
    /// An `i32`-specialized kernel.
    I32(I32Kernel, Vec<String>),
    /// An `f64`-specialized kernel. `i32` input columns must be widened to
    /// `f64` by the caller before invocation.
    F64(F64Kernel, Vec<String>),
}

impl CompiledExpr {
    /// The input column names this kernel expects, in positional order.
    pub fn input_columns(&self) -> &[String] {
        match self {
            CompiledExpr::I32(_, names) => names,
            CompiledExpr::F64(_, names) => names,
        }
    }

    /// Evaluate the `i32` kernel over `length` rows, writing into `out`.
    /// Fails if this is not an `i32`-specialized kernel.
    pub fn eval_i32(&self, length: usize, out: &mut Vec<i32>, inputs: &[&[i32]]) -> Result<()> {
        match self {
            CompiledExpr::I32(kernel, _) => {
                out.clear();
                out.reserve(length);
                for row in 0..length {
                    out.push(kernel(inputs, row)?);
                }
                Ok(())
            }
            CompiledExpr::F64(..) => Err(Error::JitUnsupported("kernel is f64-specialized, not i32")),
        }
    }

    /// Evaluate the `f64` kernel over `length` rows, writing into `out`.
    /// Fails if this is not an `f64`-specialized kernel.
    pub fn eval_f64(&self, length: usize, out: &mut Vec<f64>, inputs: &[&[f64]]) -> Result<()> {
        match self {
            CompiledExpr::F64(kernel, _) => {
                out.clear();
                out.reserve(length);
                for row in 0..length {
                    out.push(kernel(inputs, row));
                }
                Ok(())
            }
            CompiledExpr::I32(..) => Err(Error::JitUnsupported("kernel is i32-specialized, not f64")),
        }
    }
}

/// Process-wide cache of compiled kernels, keyed by an expression's
/// structural identity (operator shape and column references, not literal
/// values or alias names).
pub struct JitCache {
    entries: Mutex<HashMap<String, Arc<CompiledExpr>>>,
}

impl JitCache {
    fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }

    /// Compile `expr` against the given column type map, or return a cached
    /// kernel if an expression of the same structural shape — including its
    /// literal values and the logical types of the columns it reads, both of
    /// which the compiled kernel bakes in — was compiled before.
    pub fn compile(&self, expr: &Expr, column_types: &HashMap<String, ColumnType>) -> Result<Arc<CompiledExpr>> {
        let key = cache_key(expr, column_types);
        if let Some(hit) = self.entries.lock().get(&key) {
            trace!("jit cache hit for {key}");
            return Ok(hit.clone());
        }
        debug!("jit cache miss for {key}, compiling");
        let compiled = Arc::new(compile_expr(expr, column_types)?);
        self.entries.lock().insert(key, compiled.clone());
        Ok(compiled)
    }
}

/// The cache key for `expr` under `column_types`: the expression's own
/// structural key (which already bakes in literal values) plus the logical
/// type of every column it reads, sorted by name for a deterministic key.
/// Two expressions of the same shape and literals but different input
/// column types must compile to different kernels (e.g. an `i32` kernel vs.
/// an `f64` kernel for `a + 1` depending on whether `a` is `i32` or `f64`),
/// so the type map has to be part of the cache identity too.
fn cache_key(expr: &Expr, column_types: &HashMap<String, ColumnType>) -> String {
    let mut cols = expr.referenced_columns();
    cols.sort();
    cols.dedup();
    let mut key = expr.structural_key();
    key.push('|');
    for name in cols {
        let ty = column_types.get(&name);
        key.push_str(&format!("{name}:{ty:?};"));
    }
    key
}

static CACHE: std::sync::OnceLock<JitCache> = std::sync::OnceLock::new();

/// The process-wide JIT kernel cache.
pub fn cache() -> &'static JitCache {
    CACHE.get_or_init(JitCache::new)
}

/// `true` iff every node in `expr` is one the JIT supports: `Col`, `Lit`,
/// arithmetic `Binary`, or `Alias`.
fn is_jit_supported(expr: &Expr) -> bool {
    match expr {
        Expr::Col(_) | Expr::Lit(_) => true,
        Expr::Binary(l, op, r) => op.is_arithmetic() && is_jit_supported(l) && is_jit_supported(r),
        Expr::Alias(child, _) => is_jit_supported(child),
        Expr::Agg(..) => false,
    }
}

fn compile_expr(expr: &Expr, column_types: &HashMap<String, ColumnType>) -> Result<CompiledExpr> {
    if !is_jit_supported(expr) {
        return Err(Error::JitUnsupported("expression contains a comparison or aggregation"));
    }
    let columns = expr.referenced_columns();
    let mut seen = Vec::new();
    for c in columns {
        if !seen.contains(&c) {
            seen.push(c);
        }
    }
    let all_i32 = seen.iter().all(|name| matches!(column_types.get(name), Some(ColumnType::I32)));
    let index_of: HashMap<String, usize> =
        seen.iter().enumerate().map(|(i, name)| (name.clone(), i)).collect();

    if all_i32 {
        let kernel = build_i32(expr, &index_of)?;
        Ok(CompiledExpr::I32(kernel, seen))
    } else {
        let kernel = build_f64(expr, &index_of)?;
        Ok(CompiledExpr::F64(kernel, seen))
    }
}

fn build_i32(expr: &Expr, index_of: &HashMap<String, usize>) -> Result<I32Kernel> {
    match expr {
        Expr::Col(name) => {
            let idx = *index_of.get(name).ok_or(Error::MissingColumn(name.clone()))?;
            Ok(Box::new(move |inputs: &[&[i32]], row: usize| Ok(inputs[idx][row])))
        }
        Expr::Lit(ScalarValue::I32(v)) => {
            let v = *v;
            Ok(Box::new(move |_: &[&[i32]], _: usize| Ok(v)))
        }
        Expr::Lit(_) => Err(Error::JitUnsupported("non-i32 literal inside an i32-specialized kernel")),
        Expr::Binary(l, op, r) => {
            let lf = build_i32(l, index_of)?;
            let rf = build_i32(r, index_of)?;
            let op = *op;
            Ok(Box::new(move |inputs: &[&[i32]], row: usize| {
                let (a, b) = (lf(inputs, row)?, rf(inputs, row)?);
                match op {
                    BinOp::Add => Ok(a.wrapping_add(b)),
                    BinOp::Sub => Ok(a.wrapping_sub(b)),
                    BinOp::Mul => Ok(a.wrapping_mul(b)),
                    BinOp::Div => {
                        if b == 0 {
                            Err(Error::Arithmetic("integer division by zero"))
                        } else {
                            Ok(a / b)
                        }
                    }
                    _ => unreachable!("comparisons are rejected by is_jit_supported"),
                }
            }))
        }
        Expr::Alias(child, _) => build_i32(child, index_of),
        Expr::Agg(..) => unreachable!("rejected by is_jit_supported"),
    }
}

fn build_f64(expr: &Expr, index_of: &HashMap<String, usize>) -> Result<F64Kernel> {
    match expr {
        Expr::Col(name) => {
            let idx = *index_of.get(name).ok_or(Error::MissingColumn(name.clone()))?;
            Ok(Box::new(move |inputs: &[&[f64]], row: usize| inputs[idx][row]))
        }
        Expr::Lit(ScalarValue::F64(v)) => {
            let v = *v;
            Ok(Box::new(move |_: &[&[f64]], _: usize| v))
        }
        Expr::Lit(ScalarValue::I32(v)) => {
            let v = *v as f64;
            Ok(Box::new(move |_: &[&[f64]], _: usize| v))
        }
        Expr::Lit(_) => Err(Error::JitUnsupported("non-numeric literal inside an f64-specialized kernel")),
        Expr::Binary(l, op, r) => {
            let lf = build_f64(l, index_of)?;
            let rf = build_f64(r, index_of)?;
            let op = *op;
            Ok(Box::new(move |inputs: &[&[f64]], row: usize| {
                let (a, b) = (lf(inputs, row), rf(inputs, row));
                match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => a / b,
                    _ => unreachable!("comparisons are rejected by is_jit_supported"),
                }
            }))
        }
        Expr::Alias(child, _) => build_f64(child, index_of),
        Expr::Agg(..) => unreachable!("rejected by is_jit_supported"),
    }
}

/// `true` iff `expr` is a literal on one side of a binary comparison or
/// arithmetic operator with a plain column (or vice versa) — the shape the
/// physical planner routes to scalar broadcast even when the JIT itself
/// can't or won't compile the node (e.g. it's a comparison).
pub fn is_scalar_broadcast_shape(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Binary(l, _, r)
            if matches!((l.as_ref(), r.as_ref()), (Expr::Col(_), Expr::Lit(_)) | (Expr::Lit(_), Expr::Col(_)))
    )
}
