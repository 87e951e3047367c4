//! Row cursor (component F): a stack-only, read-only view of one row across
//! every column in a table. Typed accessors dispatch on the column's actual
//! storage variant; a mismatched request fails with [`Error::KindMismatch`]
//! rather than panicking.

use crate::column::numeric::Timestamp;
use crate::column::Column;
use crate::error::{Error, Result};
use crate::schema::Schema;

/// A read-only cursor over one row of a table's columns.
pub struct RowCursor<'a> {
    columns: &'a [Column],
    schema: &'a Schema,
    row: usize,
}

impl<'a> RowCursor<'a> {
    /// A cursor at `row` over `columns`, resolving names through `schema`.
    pub fn new(columns: &'a [Column], schema: &'a Schema, row: usize) -> Result<Self> {
        if let Some(first) = columns.first() {
            if row >= first.len() {
                return Err(Error::OutOfRange { index: row, length: first.len() });
            }
        } else if row != 0 {
            return Err(Error::OutOfRange { index: row, length: 0 });
        }
        Ok(Self { columns, schema, row })
    }

    fn column_at(&self, col_idx: usize) -> Result<&Column> {
        self.columns.get(col_idx).ok_or(Error::OutOfRange { index: col_idx, length: self.columns.len() })
    }

    fn column_named(&self, name: &str) -> Result<&Column> {
        let idx = self.schema.index_of(name)?;
        self.column_at(idx)
    }

    /// `true` iff the value at `col_idx` is null.
    pub fn is_null(&self, col_idx: usize) -> Result<bool> {
        self.column_at(col_idx)?.is_null(self.row)
    }

    /// `true` iff the value named `name` is null.
    pub fn is_null_named(&self, name: &str) -> Result<bool> {
        self.column_named(name)?.is_null(self.row)
    }

    fn kind_mismatch(col: &Column, requested: &'static str) -> Error {
        Error::KindMismatch {
            column: col.name().to_string(),
            actual: col.column_type().type_name(),
            requested,
        }
    }

    /// Typed `i32` read at `col_idx`.
    pub fn get_i32(&self, col_idx: usize) -> Result<i32> {
        let col = self.column_at(col_idx)?;
        match col {
            Column::I32(c) => c.get(self.row),
            other => Err(Self::kind_mismatch(other, "i32")),
        }
    }

    /// Typed `i32` read by name.
    pub fn get_i32_named(&self, name: &str) -> Result<i32> {
        self.get_i32(self.schema.index_of(name)?)
    }

    /// Typed `f64` read at `col_idx`.
    pub fn get_f64(&self, col_idx: usize) -> Result<f64> {
        let col = self.column_at(col_idx)?;
        match col {
            Column::F64(c) => c.get(self.row),
            other => Err(Self::kind_mismatch(other, "f64")),
        }
    }

    /// Typed `f64` read by name.
    pub fn get_f64_named(&self, name: &str) -> Result<f64> {
        self.get_f64(self.schema.index_of(name)?)
    }

    /// Typed `bool` read at `col_idx`.
    pub fn get_bool(&self, col_idx: usize) -> Result<bool> {
        let col = self.column_at(col_idx)?;
        match col {
            Column::Bool(c) => c.get(self.row),
            other => Err(Self::kind_mismatch(other, "bool")),
        }
    }

    /// Typed `bool` read by name.
    pub fn get_bool_named(&self, name: &str) -> Result<bool> {
        self.get_bool(self.schema.index_of(name)?)
    }

    /// Typed `timestamp` read at `col_idx`.
    pub fn get_timestamp(&self, col_idx: usize) -> Result<Timestamp> {
        let col = self.column_at(col_idx)?;
        match col {
            Column::Timestamp(c) => c.get(self.row),
            other => Err(Self::kind_mismatch(other, "timestamp")),
        }
    }

    /// Typed `timestamp` read by name.
    pub fn get_timestamp_named(&self, name: &str) -> Result<Timestamp> {
        self.get_timestamp(self.schema.index_of(name)?)
    }

    /// Typed string read at `col_idx`, accepting any of the three string
    /// storage variants.
    pub fn get_str(&self, col_idx: usize) -> Result<String> {
        let col = self.column_at(col_idx)?;
        match col {
            Column::StringOwned(c) => Ok(c.get(self.row)?.to_string()),
            Column::Varchar(c) => Ok(c.get(self.row)?.to_string()),
            Column::Categorical(c) => Ok(c.get(self.row)?.to_string()),
            other => Err(Self::kind_mismatch(other, "string")),
        }
    }

    /// Typed string read by name.
    pub fn get_str_named(&self, name: &str) -> Result<String> {
        self.get_str(self.schema.index_of(name)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::numeric::PrimitiveColumn;
    use crate::column::varchar::VarcharColumn;
    use crate::column::ColumnType;
    use crate::schema::ColumnDef;

    fn schema() -> Schema {
        Schema::new(vec![
            ColumnDef::new("a", ColumnType::I32, false),
            ColumnDef::new("b", ColumnType::String, false),
        ])
        .unwrap()
    }

    fn columns() -> Vec<Column> {
        let mut a: PrimitiveColumn<i32> = PrimitiveColumn::new("a", false, 0);
        a.append(7);
        a.append(8);
        let mut b = VarcharColumn::new("b", false, 0);
        b.append("x");
        b.append("y");
        vec![Column::I32(a), Column::Varchar(b)]
    }

    #[test]
    fn typed_accessors_read_correct_values() {
        let cols = columns();
        let schema = schema();
        let cursor = RowCursor::new(&cols, &schema, 1).unwrap();
        assert_eq!(cursor.get_i32(0).unwrap(), 8);
        assert_eq!(cursor.get_str(1).unwrap(), "y");
        assert_eq!(cursor.get_i32_named("a").unwrap(), 8);
        assert_eq!(cursor.get_str_named("b").unwrap(), "y");
    }

    #[test]
    fn mismatched_type_request_fails() {
        let cols = columns();
        let schema = schema();
        let cursor = RowCursor::new(&cols, &schema, 0).unwrap();
        assert!(matches!(cursor.get_f64(0), Err(Error::KindMismatch { .. })));
    }

    #[test]
    fn out_of_range_row_fails_at_construction() {
        let cols = columns();
        let schema = schema();
        assert!(RowCursor::new(&cols, &schema, 5).is_err());
    }
}
