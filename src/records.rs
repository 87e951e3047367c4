//! `from_records` adapter: rather than reflection (unavailable in stable
//! Rust), callers implement [`FromRecord`] for their own record type and
//! hand an iterator of them to [`Table::from_records`].

use crate::column::{Column, ColumnType};
use crate::error::{Error, Result};
use crate::schema::{ColumnDef, Schema};
use crate::table::Table;
use crate::value::ScalarValue;

/// One field's static shape within a [`FromRecord::SCHEMA`].
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    /// Output column name.
    pub name: &'static str,
    /// Logical type.
    pub column_type: ColumnType,
    /// Whether the field may be absent.
    pub nullable: bool,
}

impl ColumnSpec {
    /// A new column spec, usable in a `const` `SCHEMA` array.
    pub const fn new(name: &'static str, column_type: ColumnType, nullable: bool) -> Self {
        Self { name, column_type, nullable }
    }
}

/// Implemented by a caller's own record type to describe how it maps onto a
/// table's columns. `SCHEMA` fixes the output column list; `write_row`
/// appends this record's fields, one [`TableBuilder::set`] call per column.
pub trait FromRecord {
    /// The output schema, one entry per field this record contributes.
    const SCHEMA: &'static [ColumnSpec];

    /// Append this record's fields onto `table`. `row` is the 0-based index
    /// of the row being appended — informational, since each column is
    /// append-only and `table.set` always appends to the end.
    fn write_row(&self, table: &mut TableBuilder, row: usize) -> Result<()>;
}

/// An in-progress table being filled one [`FromRecord`] row at a time.
pub struct TableBuilder {
    schema: Schema,
    columns: Vec<Column>,
}

impl TableBuilder {
    fn new(schema: Schema, capacity: usize) -> Self {
        let columns = schema.columns().iter().map(|def| Column::new_empty(def, capacity)).collect();
        Self { schema, columns }
    }

    /// Append `value` to the column named `name`.
    pub fn set(&mut self, name: &str, value: ScalarValue) -> Result<()> {
        self.columns
            .iter_mut()
            .find(|c| c.name() == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))?
            .push_boxed(value)
    }

    fn finish(self) -> Result<Table> {
        Table::new(self.schema, self.columns)
    }
}

impl Table {
    /// Build a table from an iterator of records implementing [`FromRecord`].
    /// Fails with [`Error::SchemaEmpty`] if `R::SCHEMA` is empty.
    pub fn from_records<R: FromRecord>(records: impl IntoIterator<Item = R>) -> Result<Table> {
        if R::SCHEMA.is_empty() {
            return Err(Error::SchemaEmpty { record_type: std::any::type_name::<R>() });
        }
        let defs: Vec<ColumnDef> =
            R::SCHEMA.iter().map(|spec| ColumnDef::new(spec.name, spec.column_type, spec.nullable)).collect();
        let schema = Schema::new(defs)?;
        let iter = records.into_iter();
        let capacity = iter.size_hint().0;
        let mut builder = TableBuilder::new(schema, capacity);
        for (row, record) in iter.enumerate() {
            record.write_row(&mut builder, row)?;
        }
        builder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Order {
        id: i32,
        amount: Option<f64>,
    }

    impl FromRecord for Order {
        const SCHEMA: &'static [ColumnSpec] = &[
            ColumnSpec::new("id", ColumnType::I32, false),
            ColumnSpec::new("amount", ColumnType::F64, true),
        ];

        fn write_row(&self, table: &mut TableBuilder, _row: usize) -> Result<()> {
            table.set("id", ScalarValue::I32(self.id))?;
            table.set("amount", self.amount.map(ScalarValue::F64).unwrap_or(ScalarValue::Null))
        }
    }

    #[test]
    fn from_records_builds_a_table_matching_the_schema() {
        let records = vec![
            Order { id: 1, amount: Some(9.5) },
            Order { id: 2, amount: None },
        ];
        let table = Table::from_records(records).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column("id").unwrap().get_boxed(0).unwrap(), ScalarValue::I32(1));
        assert!(table.column("amount").unwrap().is_null(1).unwrap());
    }

    #[test]
    fn empty_schema_fails() {
        struct Empty;
        impl FromRecord for Empty {
            const SCHEMA: &'static [ColumnSpec] = &[];
            fn write_row(&self, _table: &mut TableBuilder, _row: usize) -> Result<()> {
                Ok(())
            }
        }
        let records: Vec<Empty> = vec![Empty];
        assert!(matches!(Table::from_records(records), Err(Error::SchemaEmpty { .. })));
    }
}
