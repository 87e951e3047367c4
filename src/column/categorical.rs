//! Dictionary-encoded (categorical) column: an `i32` code column over an
//! ordered dictionary of distinct strings. Code `0` is reserved for null —
//! the dictionary's first real entry is code `1` — so a categorical column
//! never needs a separate validity mask; the code itself carries nullness.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// A column of strings represented as small integer codes into a shared,
/// insertion-ordered dictionary.
#[derive(Debug, Clone)]
pub struct CategoricalColumn {
    name: String,
    nullable: bool,
    codes: Vec<i32>,
    dictionary: Vec<String>,
    lookup: HashMap<String, i32>,
}

impl CategoricalColumn {
    /// A new, empty categorical column.
    pub fn new(name: impl Into<String>, nullable: bool, capacity: usize) -> Self {
        Self {
            name: name.into(),
            nullable,
            codes: Vec::with_capacity(capacity),
            dictionary: Vec::new(),
            lookup: HashMap::new(),
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
        self.codes.len()
    }

    /// True when the column has zero rows.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Number of distinct non-null values seen so far.
    pub fn cardinality(&self) -> usize {
        self.dictionary.len()
    }

    fn check(&self, i: usize) -> Result<()> {
        if i >= self.codes.len() {
            return Err(Error::OutOfRange { index: i, length: self.codes.len() });
        }
        Ok(())
    }

    /// `true` iff slot `i` is null (code `0`).
    pub fn is_null(&self, i: usize) -> Result<bool> {
        self.check(i)?;
        Ok(self.codes[i] == 0)
    }

    /// The raw dictionary code at slot `i`; `0` means null.
    pub fn code_at(&self, i: usize) -> Result<i32> {
        self.check(i)?;
        Ok(self.codes[i])
    }

    /// Typed read. Fails with [`Error::OutOfRange`] if `i` is out of bounds;
    /// returns `""` at a null slot.
    pub fn get(&self, i: usize) -> Result<&str> {
        self.check(i)?;
        let code = self.codes[i];
        if code == 0 {
            Ok("")
        } else {
            Ok(&self.dictionary[(code - 1) as usize])
        }
    }

    /// Untyped read: `None` when null.
    pub fn get_optional(&self, i: usize) -> Result<Option<&str>> {
        self.check(i)?;
        let code = self.codes[i];
        if code == 0 {
            Ok(None)
        } else {
            Ok(Some(&self.dictionary[(code - 1) as usize]))
        }
    }

    /// Look up `value` in the dictionary, inserting it with a fresh code if
    /// it hasn't been seen before.
    fn lookup_or_insert(&mut self, value: &str) -> i32 {
        if let Some(&code) = self.lookup.get(value) {
            return code;
        }
        self.dictionary.push(value.to_string());
        let code = self.dictionary.len() as i32;
        self.lookup.insert(value.to_string(), code);
        code
    }

    /// Append a non-null value, looking it up (or inserting it) in the
    /// dictionary.
    pub fn append(&mut self, value: &str) {
        let code = self.lookup_or_insert(value);
        self.codes.push(code);
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
                self.codes.push(0);
                Ok(())
            }
        }
    }

    /// Overwrite slot `i` with a non-null value.
    pub fn set(&mut self, i: usize, value: &str) -> Result<()> {
        self.check(i)?;
        let code = self.lookup_or_insert(value);
        self.codes[i] = code;
        Ok(())
    }

    /// Mark slot `i` as null.
    pub fn set_null(&mut self, i: usize) -> Result<()> {
        if !self.nullable {
            return Err(Error::NotNullable(self.name.clone()));
        }
        self.check(i)?;
        self.codes[i] = 0;
        Ok(())
    }

    /// The dictionary in code order: `dictionary()[0]` is code `1`, and so on.
    pub fn dictionary(&self) -> &[String] {
        &self.dictionary
    }

    /// Deep-copy the rows at `indices` into a new owning column, sharing the
    /// same lookup discipline (codes are re-resolved, not copied verbatim,
    /// so the output's dictionary can differ in order and size from the
    /// source's).
    pub fn gather(&self, indices: &[usize]) -> Result<Self> {
        let mut out = Self::new(self.name.clone(), self.nullable, indices.len());
        for &i in indices {
            self.check(i)?;
            if self.codes[i] == 0 {
                out.codes.push(0);
            } else {
                let value = &self.dictionary[(self.codes[i] - 1) as usize];
                let code = out.lookup_or_insert(value);
                out.codes.push(code);
            }
        }
        Ok(out)
    }
}
