//! Element-wise arithmetic over numeric columns: column-column and
//! column-scalar variants of `+`, `-`, `×`, `÷`. Aligned lanes run through a
//! chunked loop shaped for auto-vectorization; the remainder is scalar.
//! Nullable columns still run the same loop — only the output mask
//! changes — since the arithmetic itself is well-defined on the `NULL_FILL`
//! sentinel and callers never observe a masked-out slot's computed value.

use crate::bitmap::Bitmap;
use crate::column::numeric::PrimitiveColumn;
use crate::error::{Error, Result};

const LANES: usize = 4;

/// The four arithmetic operators a kernel or the expression JIT may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
}

fn check_same_length(a_len: usize, b_len: usize, name: &str) -> Result<()> {
    if a_len != b_len {
        return Err(Error::ShapeMismatch { column: name.to_string(), expected: a_len, found: b_len });
    }
    Ok(())
}

/// Column-column `i32` arithmetic. Integer division by zero fails with
/// [`Error::Arithmetic`] at the offending row — earlier rows already written
/// into the result buffer are simply discarded along with the whole result.
pub fn binary_i32(
    a: &PrimitiveColumn<i32>,
    op: ArithOp,
    b: &PrimitiveColumn<i32>,
    result_name: impl Into<String>,
) -> Result<PrimitiveColumn<i32>> {
    check_same_length(a.len(), b.len(), b.name())?;
    let nullable = a.nullable() || b.nullable();
    let mut out: Vec<i32> = Vec::with_capacity(a.len());
    let av = a.values();
    let bv = b.values();
    let chunks = av.len() / LANES * LANES;
    let mut i = 0;
    while i < chunks {
        for lane in 0..LANES {
            out.push(apply_i32(op, av[i + lane], bv[i + lane])?);
        }
        i += LANES;
    }
    while i < av.len() {
        out.push(apply_i32(op, av[i], bv[i])?);
        i += 1;
    }
    let mask = Bitmap::merge_or(a.validity(), b.validity(), a.len());
    Ok(build_i32(result_name, nullable, out, mask))
}

fn apply_i32(op: ArithOp, x: i32, y: i32) -> Result<i32> {
    match op {
        ArithOp::Add => Ok(x.wrapping_add(y)),
        ArithOp::Sub => Ok(x.wrapping_sub(y)),
        ArithOp::Mul => Ok(x.wrapping_mul(y)),
        ArithOp::Div => {
            if y == 0 {
                Err(Error::Arithmetic("integer division by zero"))
            } else {
                Ok(x / y)
            }
        }
    }
}

/// Column-scalar `i32` arithmetic (scalar broadcast lane-wise).
pub fn scalar_i32(
    a: &PrimitiveColumn<i32>,
    op: ArithOp,
    scalar: i32,
    result_name: impl Into<String>,
) -> Result<PrimitiveColumn<i32>> {
    let mut out = Vec::with_capacity(a.len());
    for &v in a.values() {
        out.push(apply_i32(op, v, scalar)?);
    }
    Ok(build_i32(result_name, a.nullable(), out, a.validity().cloned()))
}

fn build_i32(
    name: impl Into<String>,
    nullable: bool,
    values: Vec<i32>,
    mask: Option<Bitmap>,
) -> PrimitiveColumn<i32> {
    PrimitiveColumn::from_parts(name, nullable, values, mask)
}

/// Column-column `f64` arithmetic. Division by zero follows IEEE-754
/// (`inf`/`NaN`), never an error.
pub fn binary_f64(
    a: &PrimitiveColumn<f64>,
    op: ArithOp,
    b: &PrimitiveColumn<f64>,
    result_name: impl Into<String>,
) -> Result<PrimitiveColumn<f64>> {
    check_same_length(a.len(), b.len(), b.name())?;
    let nullable = a.nullable() || b.nullable();
    let av = a.values();
    let bv = b.values();
    let mut out: Vec<f64> = Vec::with_capacity(av.len());
    let chunks = av.len() / LANES * LANES;
    let mut i = 0;
    while i < chunks {
        for lane in 0..LANES {
            out.push(apply_f64(op, av[i + lane], bv[i + lane]));
        }
        i += LANES;
    }
    while i < av.len() {
        out.push(apply_f64(op, av[i], bv[i]));
        i += 1;
    }
    let mask = Bitmap::merge_or(a.validity(), b.validity(), a.len());
    Ok(PrimitiveColumn::from_parts(result_name, nullable, out, mask))
}

fn apply_f64(op: ArithOp, x: f64, y: f64) -> f64 {
    match op {
        ArithOp::Add => x + y,
        ArithOp::Sub => x - y,
        ArithOp::Mul => x * y,
        ArithOp::Div => x / y,
    }
}

/// Column-scalar `f64` arithmetic (scalar broadcast lane-wise).
pub fn scalar_f64(
    a: &PrimitiveColumn<f64>,
    op: ArithOp,
    scalar: f64,
    result_name: impl Into<String>,
) -> PrimitiveColumn<f64> {
    let out: Vec<f64> = a.values().iter().map(|&v| apply_f64(op, v, scalar)).collect();
    PrimitiveColumn::from_parts(result_name, a.nullable(), out, a.validity().cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col_i32(name: &str, nullable: bool, vals: &[i32]) -> PrimitiveColumn<i32> {
        let mut c = PrimitiveColumn::new(name, nullable, vals.len());
        for &v in vals {
            c.append(v);
        }
        c
    }

    #[test]
    fn add_two_dense_i32_columns() {
        let a = col_i32("a", false, &[1, 2, 3, 4, 5]);
        let b = col_i32("b", false, &[10, 20, 30, 40, 50]);
        let out = binary_i32(&a, ArithOp::Add, &b, "sum").unwrap();
        assert_eq!(out.values(), &[11, 22, 33, 44, 55]);
        assert!(!out.nullable());
    }

    #[test]
    fn division_by_zero_is_an_arithmetic_error() {
        let a = col_i32("a", false, &[10]);
        let b = col_i32("b", false, &[0]);
        assert_eq!(
            binary_i32(&a, ArithOp::Div, &b, "q"),
            Err(Error::Arithmetic("integer division by zero"))
        );
    }

    #[test]
    fn float_division_by_zero_follows_ieee754() {
        let mut a: PrimitiveColumn<f64> = PrimitiveColumn::new("a", false, 0);
        a.append(1.0);
        let mut b: PrimitiveColumn<f64> = PrimitiveColumn::new("b", false, 0);
        b.append(0.0);
        let out = binary_f64(&a, ArithOp::Div, &b, "q").unwrap();
        assert!(out.values()[0].is_infinite());
    }

    #[test]
    fn result_is_nullable_iff_either_operand_is_and_mask_is_merged() {
        let mut a: PrimitiveColumn<i32> = PrimitiveColumn::new("a", true, 0);
        a.append(1);
        a.append_optional(None).unwrap();
        let b = col_i32("b", false, &[10, 20]);
        let out = binary_i32(&a, ArithOp::Add, &b, "sum").unwrap();
        assert!(out.nullable());
        assert!(!out.is_null(0).unwrap());
        assert!(out.is_null(1).unwrap());
    }

    #[test]
    fn mismatched_lengths_fail_shape_mismatch() {
        let a = col_i32("a", false, &[1, 2]);
        let b = col_i32("b", false, &[1, 2, 3]);
        assert!(matches!(binary_i32(&a, ArithOp::Add, &b, "s"), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn scalar_broadcast_applies_to_every_lane() {
        let a = col_i32("a", false, &[1, 2, 3]);
        let out = scalar_i32(&a, ArithOp::Mul, 10, "x").unwrap();
        assert_eq!(out.values(), &[10, 20, 30]);
    }
}
