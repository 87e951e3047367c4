//! Fixed-width numeric column storage (component C, variant 1): `i32`, `f64`
//! and `timestamp` (modeled as `i64` epoch-millis). Backed by a dense `Vec<T>`
//! plus an optional [`Bitmap`]; a null slot stores `T::NULL_FILL` so that
//! SIMD-style reductions over *non-nullable* data can read the raw buffer
//! directly — nullable columns always take the scalar guarded path (see
//! `kernels::reduce`).

use crate::bitmap::Bitmap;
use crate::error::{Error, Result};
use crate::pool;

/// A fixed-width scalar usable as a `PrimitiveColumn<T>` element.
pub trait NumericScalar: Copy + PartialEq + PartialOrd + std::fmt::Debug + Send + Sync + 'static {
    /// The value written into a slot whose validity bit is clear.
    const NULL_FILL: Self;
    /// Stable type-name token used for schema reporting and error messages.
    const TYPE_NAME: &'static str;
}

impl NumericScalar for i32 {
    const NULL_FILL: Self = 0;
    const TYPE_NAME: &'static str = "i32";
}

impl NumericScalar for f64 {
    const NULL_FILL: Self = f64::NAN;
    const TYPE_NAME: &'static str = "f64";
}

/// Timestamps share `i64`'s storage but get their own type-name token;
/// implemented by [`Timestamp`] so `PrimitiveColumn<Timestamp>` is distinct
/// from a plain `i64` column at the type level.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Timestamp(pub i64);

impl NumericScalar for Timestamp {
    const NULL_FILL: Self = Timestamp(0);
    const TYPE_NAME: &'static str = "timestamp";
}

/// A dense, growable, optionally-nullable column of `T`.
#[derive(Debug, Clone)]
pub struct PrimitiveColumn<T: NumericScalar> {
    pub(crate) name: String,
    pub(crate) nullable: bool,
    pub(crate) values: Vec<T>,
    pub(crate) validity: Option<Bitmap>,
}

impl<T: NumericScalar> PrimitiveColumn<T> {
    /// A new, empty column pre-sized to `capacity`.
    pub fn new(name: impl Into<String>, nullable: bool, capacity: usize) -> Self {
        Self {
            name: name.into(),
            nullable,
            values: Vec::with_capacity(capacity),
            validity: None,
        }
    }

    /// Build a column directly from its parts — used by kernels that compute
    /// a full values buffer and mask up front rather than appending one row
    /// at a time.
    pub fn from_parts(name: impl Into<String>, nullable: bool, values: Vec<T>, validity: Option<Bitmap>) -> Self {
        Self { name: name.into(), nullable, values, validity }
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this column accepts nulls.
    pub fn nullable(&self) -> bool {
        self.nullable
    }

    /// Number of logical rows.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the column has zero rows.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn check(&self, i: usize) -> Result<()> {
        if i >= self.values.len() {
            return Err(Error::OutOfRange { index: i, length: self.values.len() });
        }
        Ok(())
    }

    /// `true` iff slot `i` is null. A column with no mask never has nulls.
    pub fn is_null(&self, i: usize) -> Result<bool> {
        self.check(i)?;
        Ok(match &self.validity {
            Some(mask) => mask.is_null(i)?,
            None => false,
        })
    }

    /// Typed read. The value at a null slot is `T::NULL_FILL`; callers must
    /// consult [`PrimitiveColumn::is_null`] for the real truth.
    pub fn get(&self, i: usize) -> Result<T> {
        self.check(i)?;
        Ok(self.values[i])
    }

    /// Untyped read: `None` when null, `Some(value)` otherwise.
    pub fn get_optional(&self, i: usize) -> Result<Option<T>> {
        if self.is_null(i)? {
            Ok(None)
        } else {
            Ok(Some(self.values[i]))
        }
    }

    fn ensure_validity(&mut self) -> &mut Bitmap {
        if self.validity.is_none() {
            self.validity = Some(Bitmap::new_all_valid(self.values.len()));
        }
        self.validity.as_mut().unwrap()
    }

    /// Append a non-null value.
    pub fn append(&mut self, value: T) {
        self.ensure_capacity(self.values.len() + 1);
        self.values.push(value);
        if let Some(mask) = &mut self.validity {
            mask.push(true);
        }
    }

    /// Append a possibly-null value. Fails with [`Error::NotNullable`] if
    /// `value` is `None` and the column does not accept nulls.
    pub fn append_optional(&mut self, value: Option<T>) -> Result<()> {
        match value {
            Some(v) => {
                self.values.push(v);
                if let Some(mask) = &mut self.validity {
                    mask.push(true);
                }
                Ok(())
            }
            None => {
                if !self.nullable {
                    return Err(Error::NotNullable(self.name.clone()));
                }
                // Materialize/extend the mask from the pre-push length
                // before growing `values`, so the two stay in lockstep.
                self.ensure_validity().push(false);
                self.values.push(T::NULL_FILL);
                Ok(())
            }
        }
    }

    /// Overwrite slot `i` with a non-null value.
    pub fn set(&mut self, i: usize, value: T) -> Result<()> {
        self.check(i)?;
        self.values[i] = value;
        if let Some(mask) = &mut self.validity {
            mask.set_valid(i)?;
        }
        Ok(())
    }

    /// Mark slot `i` as null, keeping `T::NULL_FILL` as its stored value.
    pub fn set_null(&mut self, i: usize) -> Result<()> {
        if !self.nullable {
            return Err(Error::NotNullable(self.name.clone()));
        }
        self.check(i)?;
        self.values[i] = T::NULL_FILL;
        self.ensure_validity().set_null(i)
    }

    /// Mark slot `i` as present, leaving its stored value untouched.
    pub fn set_not_null(&mut self, i: usize) -> Result<()> {
        self.check(i)?;
        if let Some(mask) = &mut self.validity {
            mask.set_valid(i)?;
        }
        Ok(())
    }

    /// Grow the backing buffer so it can hold at least `n` elements without
    /// reallocating again, following the pool's `2x`-or-requested policy.
    pub fn ensure_capacity(&mut self, n: usize) {
        if self.values.capacity() >= n {
            return;
        }
        let new_cap = pool::grow_capacity(self.values.capacity(), n);
        self.values.reserve(new_cap - self.values.len());
    }

    /// A read-only contiguous view of every value, including the
    /// `NULL_FILL` sentinel at null slots. Borrow-checked: the borrow this
    /// returns cannot outlive a subsequent `&mut self` call, so callers can't
    /// hold a view across a growth that reallocates the backing buffer.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// The validity mask, if one has been materialized.
    pub fn validity(&self) -> Option<&Bitmap> {
        self.validity.as_ref()
    }

    /// Consume the column, handing its backing buffer back to the caller —
    /// used by table disposal to return the allocation to the buffer pool.
    pub fn into_buffer(self) -> Vec<T> {
        self.values
    }

    /// Deep-copy the rows at `indices` into a new owning column.
    pub fn gather(&self, indices: &[usize]) -> Result<Self> {
        let mut out = Self::new(self.name.clone(), self.nullable, indices.len());
        for &i in indices {
            self.check(i)?;
            let valid = match &self.validity {
                Some(mask) => mask.is_valid(i)?,
                None => true,
            };
            // Grow the mask (if any) in lockstep with `values`, one bit per
            // iteration, before pushing the value itself.
            if valid {
                if let Some(mask) = &mut out.validity {
                    mask.push(true);
                }
            } else {
                out.ensure_validity().push(false);
            }
            out.values.push(self.values[i]);
        }
        Ok(out)
    }
}

impl PrimitiveColumn<i32> {
    /// Sum over `indices[start..end]`, widening to 64 bits to avoid overflow.
    /// `None` only when every row in the slice is
    /// null or the slice is empty and the caller wants group semantics for
    /// min/max/mean; sum itself still reports `Some(0)` for an empty group.
    pub fn compute_sum(&self, indices: &[usize], start: usize, end: usize) -> Option<i64> {
        let mut acc: i64 = 0;
        for &row in &indices[start..end] {
            if self.is_null(row).unwrap_or(false) {
                continue;
            }
            acc += self.values[row] as i64;
        }
        Some(acc)
    }

    /// Arithmetic mean; `None` for an empty or all-null group.
    pub fn compute_mean(&self, indices: &[usize], start: usize, end: usize) -> Option<f64> {
        let mut acc: i64 = 0;
        let mut count: usize = 0;
        for &row in &indices[start..end] {
            if self.is_null(row).unwrap_or(false) {
                continue;
            }
            acc += self.values[row] as i64;
            count += 1;
        }
        if count == 0 {
            None
        } else {
            Some(acc as f64 / count as f64)
        }
    }

    /// Minimum non-null value; `None` for an empty or all-null group.
    pub fn compute_min(&self, indices: &[usize], start: usize, end: usize) -> Option<i32> {
        indices[start..end]
            .iter()
            .filter(|&&row| !self.is_null(row).unwrap_or(false))
            .map(|&row| self.values[row])
            .min()
    }

    /// Maximum non-null value; `None` for an empty or all-null group.
    pub fn compute_max(&self, indices: &[usize], start: usize, end: usize) -> Option<i32> {
        indices[start..end]
            .iter()
            .filter(|&&row| !self.is_null(row).unwrap_or(false))
            .map(|&row| self.values[row])
            .max()
    }
}

impl PrimitiveColumn<f64> {
    /// Sum over the group's index slice, scalar (never SIMD — nullable
    /// columns always bypass the vectorized reduction path).
    pub fn compute_sum(&self, indices: &[usize], start: usize, end: usize) -> Option<f64> {
        let mut acc = 0.0f64;
        for &row in &indices[start..end] {
            if self.is_null(row).unwrap_or(false) {
                continue;
            }
            acc += self.values[row];
        }
        Some(acc)
    }

    /// Arithmetic mean; `None` for an empty or all-null group.
    pub fn compute_mean(&self, indices: &[usize], start: usize, end: usize) -> Option<f64> {
        let mut acc = 0.0f64;
        let mut count: usize = 0;
        for &row in &indices[start..end] {
            if self.is_null(row).unwrap_or(false) {
                continue;
            }
            acc += self.values[row];
            count += 1;
        }
        if count == 0 {
            None
        } else {
            Some(acc / count as f64)
        }
    }

    /// Minimum non-null value; `None` for an empty or all-null group.
    pub fn compute_min(&self, indices: &[usize], start: usize, end: usize) -> Option<f64> {
        indices[start..end]
            .iter()
            .filter(|&&row| !self.is_null(row).unwrap_or(false))
            .map(|&row| self.values[row])
            .fold(None, |acc: Option<f64>, v| match acc {
                None => Some(v),
                Some(m) if v < m => Some(v),
                Some(m) => Some(m),
            })
    }

    /// Maximum non-null value; `None` for an empty or all-null group.
    pub fn compute_max(&self, indices: &[usize], start: usize, end: usize) -> Option<f64> {
        indices[start..end]
            .iter()
            .filter(|&&row| !self.is_null(row).unwrap_or(false))
            .map(|&row| self.values[row])
            .fold(None, |acc: Option<f64>, v| match acc {
                None => Some(v),
                Some(m) if v > m => Some(v),
                Some(m) => Some(m),
            })
    }
}

impl PrimitiveColumn<Timestamp> {
    /// Sum of epoch-millis values; rarely meaningful on its own but kept for
    /// uniformity with the other fixed-width numeric hooks.
    pub fn compute_sum(&self, indices: &[usize], start: usize, end: usize) -> Option<i64> {
        let mut acc: i64 = 0;
        for &row in &indices[start..end] {
            if self.is_null(row).unwrap_or(false) {
                continue;
            }
            acc += self.values[row].0;
        }
        Some(acc)
    }

    /// Mean epoch-millis; `None` for an empty or all-null group.
    pub fn compute_mean(&self, indices: &[usize], start: usize, end: usize) -> Option<f64> {
        let mut acc: i64 = 0;
        let mut count: usize = 0;
        for &row in &indices[start..end] {
            if self.is_null(row).unwrap_or(false) {
                continue;
            }
            acc += self.values[row].0;
            count += 1;
        }
        if count == 0 {
            None
        } else {
            Some(acc as f64 / count as f64)
        }
    }

    /// Earliest non-null timestamp in the group.
    pub fn compute_min(&self, indices: &[usize], start: usize, end: usize) -> Option<Timestamp> {
        indices[start..end]
            .iter()
            .filter(|&&row| !self.is_null(row).unwrap_or(false))
            .map(|&row| self.values[row])
            .min_by(|a, b| a.0.cmp(&b.0))
    }

    /// Latest non-null timestamp in the group.
    pub fn compute_max(&self, indices: &[usize], start: usize, end: usize) -> Option<Timestamp> {
        indices[start..end]
            .iter()
            .filter(|&&row| !self.is_null(row).unwrap_or(false))
            .map(|&row| self.values[row])
            .max_by(|a, b| a.0.cmp(&b.0))
    }
}
