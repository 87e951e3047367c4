//! Table (component E): an ordered set of equal-length, uniquely-named
//! columns plus the schema describing them.

use crate::column::Column;
use crate::error::{Error, Result};
use crate::row::RowCursor;
use crate::schema::Schema;

/// An ordered collection of columns of equal length, addressable by name or
/// position.
#[derive(Debug)]
pub struct Table {
    schema: Schema,
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Build a table from already-constructed columns and their schema.
    /// Verifies every column's length matches (reporting the first
    /// mismatch) and that names are unique and line up with the schema.
    pub fn new(schema: Schema, columns: Vec<Column>) -> Result<Self> {
        if columns.is_empty() {
            return Ok(Self { schema, columns, row_count: 0 });
        }
        let row_count = columns[0].len();
        let mut seen = std::collections::HashSet::with_capacity(columns.len());
        for col in &columns {
            if col.len() != row_count {
                return Err(Error::ShapeMismatch {
                    column: col.name().to_string(),
                    expected: row_count,
                    found: col.len(),
                });
            }
            if !seen.insert(col.name().to_string()) {
                return Err(Error::DuplicateName(col.name().to_string()));
            }
        }
        Ok(Self { schema, columns, row_count })
    }

    /// Build an empty table from a schema, with each column factory-built and
    /// pre-sized to `capacity`.
    pub fn create_empty(schema: Schema, capacity: usize) -> Self {
        let columns = schema.columns().iter().map(|def| Column::new_empty(def, capacity)).collect();
        Self { schema, columns, row_count: 0 }
    }

    /// The table's schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of rows every column in this table has.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// All columns, in schema order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// `true` iff a column named `name` exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name() == name)
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns.iter().find(|c| c.name() == name).ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// A mutable handle to a column by name, for builders appending rows.
    pub fn column_mut(&mut self, name: &str) -> Result<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.name() == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// Look up a column by position.
    pub fn column_at(&self, index: usize) -> Result<&Column> {
        self.columns.get(index).ok_or(Error::OutOfRange { index, length: self.columns.len() })
    }

    /// A read-only cursor positioned at `row`.
    pub fn row(&self, row: usize) -> Result<RowCursor<'_>> {
        RowCursor::new(&self.columns, &self.schema, row)
    }

    /// Materialize a new table holding only the rows at `indices`, preserving
    /// column order and the schema.
    pub fn gather(&self, indices: &[usize]) -> Result<Table> {
        let columns =
            self.columns.iter().map(|c| c.gather(indices)).collect::<Result<Vec<_>>>()?;
        Table::new(self.schema.clone(), columns)
    }

    /// Release every column's backing allocation back to the buffer pool.
    pub fn dispose(self) {
        for col in self.columns {
            col.dispose();
        }
    }
}
