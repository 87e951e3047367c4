//! Bit-packed boolean column. One bit per value in a byte array, plus an
//! optional validity [`Bitmap`]. There is no contiguous `bool` view —
//! `values()` is unsupported for this layout.

use crate::error::{Error, Result};
use crate::bitmap::Bitmap;

/// A dense, bit-packed column of booleans.
#[derive(Debug, Clone)]
pub struct BooleanColumn {
    name: String,
    nullable: bool,
    bits: Vec<u8>,
    len: usize,
    validity: Option<Bitmap>,
}

impl BooleanColumn {
    /// A new, empty boolean column.
    pub fn new(name: impl Into<String>, nullable: bool, capacity: usize) -> Self {
        Self {
            name: name.into(),
            nullable,
            bits: Vec::with_capacity(capacity.div_ceil(8)),
            len: 0,
            validity: None,
        }
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
        self.len
    }

    /// True when the column has zero rows.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn check(&self, i: usize) -> Result<()> {
        if i >= self.len {
            return Err(Error::OutOfRange { index: i, length: self.len });
        }
        Ok(())
    }

    fn raw_bit(&self, i: usize) -> bool {
        (self.bits[i >> 3] >> (i & 7)) & 1 == 1
    }

    /// `true` iff slot `i` is null.
    pub fn is_null(&self, i: usize) -> Result<bool> {
        self.check(i)?;
        Ok(match &self.validity {
            Some(mask) => mask.is_null(i)?,
            None => false,
        })
    }

    /// Typed read. Undefined-but-stable (`false`) at a null slot.
    pub fn get(&self, i: usize) -> Result<bool> {
        self.check(i)?;
        Ok(self.raw_bit(i))
    }

    /// Untyped read: `None` when null.
    pub fn get_optional(&self, i: usize) -> Result<Option<bool>> {
        if self.is_null(i)? {
            Ok(None)
        } else {
            Ok(Some(self.raw_bit(i)))
        }
    }

    fn push_bit(&mut self, value: bool) {
        let bit = self.len & 7;
        if bit == 0 {
            self.bits.push(0);
        }
        if value {
            let last = self.bits.len() - 1;
            self.bits[last] |= 1 << bit;
        }
        self.len += 1;
    }

    /// Append a non-null value.
    pub fn append(&mut self, value: bool) {
        if let Some(mask) = &mut self.validity {
            mask.push(true);
        }
        self.push_bit(value);
    }

    /// Append a possibly-null value.
    pub fn append_optional(&mut self, value: Option<bool>) -> Result<()> {
        match value {
            Some(v) => {
                self.append(v);
                Ok(())
            }
            None => {
                if !self.nullable {
                    return Err(Error::NotNullable(self.name.clone()));
                }
                self.ensure_validity().push(false);
                self.push_bit(false);
                Ok(())
            }
        }
    }

    fn ensure_validity(&mut self) -> &mut Bitmap {
        if self.validity.is_none() {
            self.validity = Some(Bitmap::new_all_valid(self.len));
        }
        self.validity.as_mut().unwrap()
    }

    /// Overwrite slot `i` with a non-null value.
    pub fn set(&mut self, i: usize, value: bool) -> Result<()> {
        self.check(i)?;
        if value {
            self.bits[i >> 3] |= 1 << (i & 7);
        } else {
            self.bits[i >> 3] &= !(1 << (i & 7));
        }
        if let Some(mask) = &mut self.validity {
            mask.set_valid(i)?;
        }
        Ok(())
    }

    /// Mark slot `i` as null.
    pub fn set_null(&mut self, i: usize) -> Result<()> {
        if !self.nullable {
            return Err(Error::NotNullable(self.name.clone()));
        }
        self.check(i)?;
        self.bits[i >> 3] &= !(1 << (i & 7));
        self.ensure_validity().set_null(i)
    }

    /// Mark slot `i` as present.
    pub fn set_not_null(&mut self, i: usize) -> Result<()> {
        self.check(i)?;
        if let Some(mask) = &mut self.validity {
            mask.set_valid(i)?;
        }
        Ok(())
    }

    /// Contiguous `bool` views are unsupported for bit-packed storage.
    pub fn values(&self) -> Result<&[bool]> {
        Err(Error::NotSupported("contiguous values() on a bit-packed boolean column"))
    }

    /// The validity mask, if materialized.
    pub fn validity(&self) -> Option<&Bitmap> {
        self.validity.as_ref()
    }

    /// Consume the column, handing its backing byte buffer back to the
    /// caller — used by table disposal to return the allocation to the
    /// buffer pool.
    pub fn into_bits(self) -> Vec<u8> {
        self.bits
    }

    /// `true` iff at least one non-null value is `true`. Byte-scan fast path
    /// (`byte != 0`) when the column has no nulls.
    pub fn any_true(&self) -> bool {
        if self.validity.is_none() {
            let full_bytes = self.len / 8;
            if self.bits[..full_bytes].iter().any(|&b| b != 0) {
                return true;
            }
            for i in full_bytes * 8..self.len {
                if self.raw_bit(i) {
                    return true;
                }
            }
            return false;
        }
        (0..self.len).any(|i| !self.is_null(i).unwrap_or(true) && self.raw_bit(i))
    }

    /// `true` iff every non-null value is `true` (vacuously `true` when all
    /// rows are null or the column is empty). Byte-scan fast path
    /// (`byte == 0xFF`) when the column has no nulls.
    pub fn all_true(&self) -> bool {
        if self.validity.is_none() {
            let full_bytes = self.len / 8;
            let rem = self.len & 7;
            if self.bits[..full_bytes].iter().any(|&b| b != 0xFF) {
                return false;
            }
            for i in full_bytes * 8..full_bytes * 8 + rem {
                if !self.raw_bit(i) {
                    return false;
                }
            }
            return true;
        }
        (0..self.len).all(|i| self.is_null(i).unwrap_or(true) || self.raw_bit(i))
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
            if valid {
                out.append(self.raw_bit(i));
            } else {
                out.append_optional(None)?;
            }
        }
        Ok(out)
    }
}
