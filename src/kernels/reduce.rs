//! Whole-column reductions: sum, min, max, mean. Non-nullable inputs take a
//! lane-chunked path shaped so the compiler can auto-vectorize it on stable
//! Rust (four independent accumulators, combined at the end); nullable inputs
//! always take the scalar guarded path, since skipping nulls mid-lane would
//! otherwise force per-element branches that defeat vectorization anyway.

use crate::bitmap::Bitmap;
use crate::column::numeric::PrimitiveColumn;

const LANES: usize = 4;

/// Sum of `i32` values, widened to `i64` to avoid overflow, over a
/// non-nullable buffer.
fn sum_i32_dense(values: &[i32]) -> i64 {
    let mut acc = [0i64; LANES];
    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();
    for chunk in chunks {
        for lane in 0..LANES {
            acc[lane] += chunk[lane] as i64;
        }
    }
    let mut total: i64 = acc.iter().sum();
    for &v in remainder {
        total += v as i64;
    }
    total
}

/// Sum of `i32` values, skipping null slots, scalar.
fn sum_i32_masked(values: &[i32], mask: &Bitmap) -> i64 {
    let mut total: i64 = 0;
    for (i, &v) in values.iter().enumerate() {
        if mask.is_valid(i).unwrap_or(false) {
            total += v as i64;
        }
    }
    total
}

/// Sum over an entire `i32` column: the dense lane-chunked path when there is
/// no validity mask, the scalar guarded path otherwise.
pub fn sum_i32(col: &PrimitiveColumn<i32>) -> i64 {
    match col.validity() {
        Some(mask) => sum_i32_masked(col.values(), mask),
        None => sum_i32_dense(col.values()),
    }
}

/// Sum of `f64` values over a non-nullable buffer, one accumulator per lane.
fn sum_f64_dense(values: &[f64]) -> f64 {
    let mut acc = [0.0f64; LANES];
    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();
    for chunk in chunks {
        for lane in 0..LANES {
            acc[lane] += chunk[lane];
        }
    }
    let mut total: f64 = acc.iter().sum();
    for &v in remainder {
        total += v;
    }
    total
}

fn sum_f64_masked(values: &[f64], mask: &Bitmap) -> f64 {
    let mut total = 0.0f64;
    for (i, &v) in values.iter().enumerate() {
        if mask.is_valid(i).unwrap_or(false) {
            total += v;
        }
    }
    total
}

/// Sum over an entire `f64` column. Nullable inputs never take the SIMD-style
/// lane path — a `NaN` fill value in a skipped lane would poison the
/// horizontal sum even though the row itself should be excluded.
pub fn sum_f64(col: &PrimitiveColumn<f64>) -> f64 {
    match col.validity() {
        Some(mask) => sum_f64_masked(col.values(), mask),
        None => sum_f64_dense(col.values()),
    }
}

/// Arithmetic mean over an entire `i32` column; `None` if the column is empty
/// or entirely null.
pub fn mean_i32(col: &PrimitiveColumn<i32>) -> Option<f64> {
    let count = match col.validity() {
        Some(mask) => mask.count_valid(),
        None => col.len(),
    };
    if count == 0 {
        return None;
    }
    Some(sum_i32(col) as f64 / count as f64)
}

/// Arithmetic mean over an entire `f64` column; `None` if the column is empty
/// or entirely null.
pub fn mean_f64(col: &PrimitiveColumn<f64>) -> Option<f64> {
    let count = match col.validity() {
        Some(mask) => mask.count_valid(),
        None => col.len(),
    };
    if count == 0 {
        return None;
    }
    Some(sum_f64(col) / count as f64)
}

/// Minimum non-null `i32` value in the column; `None` if empty or all-null.
pub fn min_i32(col: &PrimitiveColumn<i32>) -> Option<i32> {
    (0..col.len())
        .filter(|&i| !col.is_null(i).unwrap_or(true))
        .map(|i| col.get(i).unwrap())
        .min()
}

/// Maximum non-null `i32` value in the column; `None` if empty or all-null.
pub fn max_i32(col: &PrimitiveColumn<i32>) -> Option<i32> {
    (0..col.len())
        .filter(|&i| !col.is_null(i).unwrap_or(true))
        .map(|i| col.get(i).unwrap())
        .max()
}

/// Minimum non-null `f64` value in the column; `None` if empty or all-null.
pub fn min_f64(col: &PrimitiveColumn<f64>) -> Option<f64> {
    (0..col.len())
        .filter(|&i| !col.is_null(i).unwrap_or(true))
        .map(|i| col.get(i).unwrap())
        .fold(None, |acc, v| match acc {
            None => Some(v),
            Some(m) if v < m => Some(v),
            Some(m) => Some(m),
        })
}

/// Maximum non-null `f64` value in the column; `None` if empty or all-null.
pub fn max_f64(col: &PrimitiveColumn<f64>) -> Option<f64> {
    (0..col.len())
        .filter(|&i| !col.is_null(i).unwrap_or(true))
        .map(|i| col.get(i).unwrap())
        .fold(None, |acc, v| match acc {
            None => Some(v),
            Some(m) if v > m => Some(v),
            Some(m) => Some(m),
        })
}
