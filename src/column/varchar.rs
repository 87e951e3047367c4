//! Variable-length UTF-8 column: a single contiguous byte buffer plus an
//! `(N + 1)`-entry offset array, `offsets[i]..offsets[i + 1]` giving the byte
//! range of row `i`. Append-only — there is no random `set`, since inserting
//! or replacing a value of a different byte length would require shifting
//! every later offset and the bytes after it.

use crate::bitmap::Bitmap;
use crate::error::{Error, Result};

/// A dense, append-only column of UTF-8 strings packed into one byte buffer.
#[derive(Debug, Clone)]
pub struct VarcharColumn {
    name: String,
    nullable: bool,
    data: Vec<u8>,
    offsets: Vec<u32>,
    validity: Option<Bitmap>,
}

impl VarcharColumn {
    /// A new, empty varchar column.
    pub fn new(name: impl Into<String>, nullable: bool, capacity: usize) -> Self {
        let mut offsets = Vec::with_capacity(capacity + 1);
        offsets.push(0);
        Self { name: name.into(), nullable, data: Vec::new(), offsets, validity: None }
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
        self.offsets.len() - 1
    }

    /// True when the column has zero rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self, i: usize) -> Result<()> {
        if i >= self.len() {
            return Err(Error::OutOfRange { index: i, length: self.len() });
        }
        Ok(())
    }

    /// `true` iff slot `i` is null.
    pub fn is_null(&self, i: usize) -> Result<bool> {
        self.check(i)?;
        Ok(match &self.validity {
            Some(mask) => mask.is_null(i)?,
            None => false,
        })
    }

    /// Typed read. Null slots read back as `""`, since the offset range is
    /// still zero-length regardless of the validity bit.
    pub fn get(&self, i: usize) -> Result<&str> {
        self.check(i)?;
        let start = self.offsets[i] as usize;
        let end = self.offsets[i + 1] as usize;
        std::str::from_utf8(&self.data[start..end])
            .map_err(|_| Error::NotSupported("non-UTF-8 bytes in varchar column"))
    }

    /// Untyped read: `None` when null.
    pub fn get_optional(&self, i: usize) -> Result<Option<&str>> {
        if self.is_null(i)? {
            Ok(None)
        } else {
            self.get(i).map(Some)
        }
    }

    fn ensure_validity(&mut self) -> &mut Bitmap {
        if self.validity.is_none() {
            self.validity = Some(Bitmap::new_all_valid(self.len()));
        }
        self.validity.as_mut().unwrap()
    }

    /// Append a non-null value.
    pub fn append(&mut self, value: &str) {
        if let Some(mask) = &mut self.validity {
            mask.push(true);
        }
        self.data.extend_from_slice(value.as_bytes());
        self.offsets.push(self.data.len() as u32);
    }

    /// Append a possibly-null value. A null row still gets a zero-length
    /// offset range, so lookups on it are well-defined (`""`) even though
    /// callers should check [`VarcharColumn::is_null`] first.
    pub fn append_optional(&mut self, value: Option<&str>) -> Result<()> {
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
                self.offsets.push(self.data.len() as u32);
                Ok(())
            }
        }
    }

    /// Mark slot `i` as null; the underlying bytes are left in place (they
    /// are shared with no later row, so this cannot corrupt anything), only
    /// the validity bit changes.
    pub fn set_null(&mut self, i: usize) -> Result<()> {
        if !self.nullable {
            return Err(Error::NotNullable(self.name.clone()));
        }
        self.check(i)?;
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

    /// The validity mask, if materialized.
    pub fn validity(&self) -> Option<&Bitmap> {
        self.validity.as_ref()
    }

    /// Deep-copy the rows at `indices` into a new owning column.
    pub fn gather(&self, indices: &[usize]) -> Result<Self> {
        let mut out = Self::new(self.name.clone(), self.nullable, indices.len());
        for &i in indices {
            self.check(i)?;
            if self.is_null(i)? {
                out.append_optional(None)?;
            } else {
                out.append(self.get(i)?);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_get_roundtrip_variable_lengths() {
        let mut c = VarcharColumn::new("v", false, 0);
        c.append("a");
        c.append("longer string");
        c.append("");
        assert_eq!(c.get(0).unwrap(), "a");
        assert_eq!(c.get(1).unwrap(), "longer string");
        assert_eq!(c.get(2).unwrap(), "");
    }

    #[test]
    fn null_rows_read_back_empty_but_report_null() {
        let mut c = VarcharColumn::new("v", true, 0);
        c.append("x");
        c.append_optional(None).unwrap();
        assert!(!c.is_null(0).unwrap());
        assert!(c.is_null(1).unwrap());
        assert_eq!(c.get(1).unwrap(), "");
    }

    #[test]
    fn append_null_on_non_nullable_fails() {
        let mut c = VarcharColumn::new("v", false, 0);
        assert_eq!(c.append_optional(None), Err(Error::NotNullable("v".into())));
    }

    #[test]
    fn gather_preserves_values_and_nulls() {
        let mut c = VarcharColumn::new("v", true, 0);
        c.append("first");
        c.append_optional(None).unwrap();
        c.append("third");
        let g = c.gather(&[2, 1, 0]).unwrap();
        assert_eq!(g.get(0).unwrap(), "third");
        assert!(g.is_null(1).unwrap());
        assert_eq!(g.get(2).unwrap(), "first");
    }

    #[test]
    fn offsets_len_is_row_count_plus_one() {
        let mut c = VarcharColumn::new("v", false, 0);
        for s in ["one", "two", "three"] {
            c.append(s);
        }
        assert_eq!(c.len(), 3);
        assert_eq!(c.offsets.len(), 4);
    }
}
