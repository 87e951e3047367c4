//! Vectorized comparison: `filter_vec(col, op, scalar)` compacts a boolean
//! predicate over a column into a dense list of matching row indices in
//! input order. Null rows never match, regardless of operator.

use crate::column::numeric::PrimitiveColumn;

/// The six comparison operators a predicate may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `≠`
    Ne,
    /// `<`
    Lt,
    /// `≤`
    Le,
    /// `>`
    Gt,
    /// `≥`
    Ge,
}

fn matches<T: PartialOrd>(op: CompareOp, lhs: T, rhs: T) -> bool {
    match op {
        CompareOp::Eq => lhs == rhs,
        CompareOp::Ne => lhs != rhs,
        CompareOp::Lt => lhs < rhs,
        CompareOp::Le => lhs <= rhs,
        CompareOp::Gt => lhs > rhs,
        CompareOp::Ge => lhs >= rhs,
    }
}

/// Row indices where `col[i] op scalar` holds, skipping null rows entirely.
pub fn filter_i32(col: &PrimitiveColumn<i32>, op: CompareOp, scalar: i32) -> Vec<usize> {
    let mut out = Vec::new();
    match col.validity() {
        None => {
            for (i, &v) in col.values().iter().enumerate() {
                if matches(op, v, scalar) {
                    out.push(i);
                }
            }
        }
        Some(mask) => {
            for (i, &v) in col.values().iter().enumerate() {
                if mask.is_valid(i).unwrap_or(false) && matches(op, v, scalar) {
                    out.push(i);
                }
            }
        }
    }
    out
}

/// Row indices where `col[i] op scalar` holds, skipping null rows entirely.
pub fn filter_f64(col: &PrimitiveColumn<f64>, op: CompareOp, scalar: f64) -> Vec<usize> {
    let mut out = Vec::new();
    match col.validity() {
        None => {
            for (i, &v) in col.values().iter().enumerate() {
                if matches(op, v, scalar) {
                    out.push(i);
                }
            }
        }
        Some(mask) => {
            for (i, &v) in col.values().iter().enumerate() {
                if mask.is_valid(i).unwrap_or(false) && matches(op, v, scalar) {
                    out.push(i);
                }
            }
        }
    }
    out
}
