//! Owned-pointer string column: an array of string handles (`Rc<str>`) plus
//! an optional validity mask. An optional intern table lets repeated values
//! share one allocation, which matters for low-cardinality columns (status
//! codes, categories).

use crate::bitmap::Bitmap;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::rc::Rc;

/// A column of interned, reference-counted string handles.
#[derive(Debug, Clone)]
pub struct StringColumn {
    name: String,
    nullable: bool,
    values: Vec<Option<Rc<str>>>,
    validity: Option<Bitmap>,
    intern: Option<HashMap<Rc<str>, ()>>,
}

impl StringColumn {
    /// A new, empty string column. `intern` enables value deduplication.
    pub fn new(name: impl Into<String>, nullable: bool, capacity: usize, intern: bool) -> Self {
        Self {
            name: name.into(),
            nullable,
            values: Vec::with_capacity(capacity),
            validity: None,
            intern: intern.then(HashMap::new),
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

    /// `true` iff slot `i` is null.
    pub fn is_null(&self, i: usize) -> Result<bool> {
        self.check(i)?;
        Ok(self.values[i].is_none())
    }

    /// Typed read. Fails with [`Error::OutOfRange`] if `i` is out of bounds,
    /// returns `""` when the slot is null (callers should check
    /// [`StringColumn::is_null`] first).
    pub fn get(&self, i: usize) -> Result<Rc<str>> {
        self.check(i)?;
        Ok(self.values[i].clone().unwrap_or_else(|| Rc::from("")))
    }

    /// Untyped read.
    pub fn get_optional(&self, i: usize) -> Result<Option<Rc<str>>> {
        self.check(i)?;
        Ok(self.values[i].clone())
    }

    fn intern_value(&mut self, s: &str) -> Rc<str> {
        match &mut self.intern {
            Some(table) => {
                if let Some((k, _)) = table.get_key_value(s) {
                    return k.clone();
                }
                let rc: Rc<str> = Rc::from(s);
                table.insert(rc.clone(), ());
                rc
            }
            None => Rc::from(s),
        }
    }

    /// Append a non-null value.
    pub fn append(&mut self, value: &str) {
        let rc = self.intern_value(value);
        if let Some(mask) = &mut self.validity {
            mask.push(true);
        }
        self.values.push(Some(rc));
    }

    /// Append a possibly-null value.
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
                self.values.push(None);
                Ok(())
            }
        }
    }

    fn ensure_validity(&mut self) -> &mut Bitmap {
        if self.validity.is_none() {
            self.validity = Some(Bitmap::new_all_valid(self.values.len()));
        }
        self.validity.as_mut().unwrap()
    }

    /// Overwrite slot `i` with a non-null value.
    pub fn set(&mut self, i: usize, value: &str) -> Result<()> {
        self.check(i)?;
        let rc = self.intern_value(value);
        self.values[i] = Some(rc);
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
        self.values[i] = None;
        self.ensure_validity().set_null(i)
    }

    /// Mark slot `i` as present; a no-op if it already held a value, but a
    /// previously-null slot becomes an empty string rather than staying
    /// unset, since owned-pointer storage has nothing else to fall back to.
    pub fn set_not_null(&mut self, i: usize) -> Result<()> {
        self.check(i)?;
        if self.values[i].is_none() {
            self.values[i] = Some(self.intern_value(""));
        }
        if let Some(mask) = &mut self.validity {
            mask.set_valid(i)?;
        }
        Ok(())
    }

    /// Deep-copy the rows at `indices` into a new owning column. Handles are
    /// `Rc`s, so this clones pointers rather than bytes.
    pub fn gather(&self, indices: &[usize]) -> Result<Self> {
        let mut out = Self::new(self.name.clone(), self.nullable, indices.len(), self.intern.is_some());
        for &i in indices {
            self.check(i)?;
            match &self.values[i] {
                Some(s) => {
                    if let Some(mask) = &mut out.validity {
                        mask.push(true);
                    }
                    out.values.push(Some(s.clone()));
                }
                None => {
                    out.ensure_validity().push(false);
                    out.values.push(None);
                }
            }
        }
        Ok(out)
    }
}
