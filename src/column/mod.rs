//! The column storage layer: a tagged sum type over every storage variant and
//! view kind a column can take, dispatched by matching rather than dynamic
//! trait objects — the hot paths (kernels, grouping, aggregation) always know
//! which concrete layout they are touching, so a `Box<dyn Column>` vtable call
//! per element would cost real throughput for no abstraction benefit here.

pub mod boolean;
pub mod categorical;
pub mod numeric;
pub mod string;
pub mod varchar;
pub mod view;

use crate::error::{Error, Result};
use crate::schema::ColumnDef;
use crate::value::ScalarValue;
use boolean::BooleanColumn;
use categorical::CategoricalColumn;
use numeric::{PrimitiveColumn, Timestamp};
use string::StringColumn;
use varchar::VarcharColumn;
use view::{GatherView, WindowView};

/// The logical primitive type of a column, independent of storage layout.
/// Categorical, owned-string and variable-length UTF-8 columns all report
/// [`ColumnType::String`] — the schema only cares about the logical type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// 32-bit signed integer.
    I32,
    /// 64-bit floating point.
    F64,
    /// Boolean.
    Bool,
    /// UTF-8 string, any storage variant.
    String,
    /// Epoch-millis timestamp.
    Timestamp,
}

impl ColumnType {
    /// The stable type-name token exposed to the (out-of-scope) schema-JSON
    /// collaborator: exactly `"i32" | "f64" | "bool" | "string" | "timestamp"`.
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnType::I32 => "i32",
            ColumnType::F64 => "f64",
            ColumnType::Bool => "bool",
            ColumnType::String => "string",
            ColumnType::Timestamp => "timestamp",
        }
    }
}

/// Any column storage variant or view, unified under one type so `Table`,
/// kernels and the grouping engine can hold a homogeneous collection of
/// columns regardless of layout.
#[derive(Debug, Clone)]
pub enum Column {
    /// Fixed-width `i32` storage.
    I32(PrimitiveColumn<i32>),
    /// Fixed-width `f64` storage.
    F64(PrimitiveColumn<f64>),
    /// Fixed-width `timestamp` storage.
    Timestamp(PrimitiveColumn<Timestamp>),
    /// Bit-packed boolean storage.
    Bool(BooleanColumn),
    /// Owned-pointer string storage.
    StringOwned(StringColumn),
    /// Variable-length UTF-8 (offset-array) storage.
    Varchar(VarcharColumn),
    /// Dictionary-encoded (categorical) storage.
    Categorical(CategoricalColumn),
    /// A zero-copy contiguous window over another column.
    Window(WindowView),
    /// A zero-copy arbitrary-permutation view over another column.
    Gather(GatherView),
}

impl Column {
    /// Build a fresh, empty owning column matching `def`, pre-sized to
    /// `capacity`. Used by the table factory and by `create_empty`.
    pub fn new_empty(def: &ColumnDef, capacity: usize) -> Column {
        match def.logical_type() {
            ColumnType::I32 => Column::I32(PrimitiveColumn::new(def.name.clone(), def.nullable, capacity)),
            ColumnType::F64 => Column::F64(PrimitiveColumn::new(def.name.clone(), def.nullable, capacity)),
            ColumnType::Timestamp => {
                Column::Timestamp(PrimitiveColumn::new(def.name.clone(), def.nullable, capacity))
            }
            ColumnType::Bool => Column::Bool(BooleanColumn::new(def.name.clone(), def.nullable, capacity)),
            ColumnType::String => {
                Column::Varchar(VarcharColumn::new(def.name.clone(), def.nullable, capacity))
            }
        }
    }

    /// Column name. Views report their source's name.
    pub fn name(&self) -> &str {
        match self {
            Column::I32(c) => c.name(),
            Column::F64(c) => c.name(),
            Column::Timestamp(c) => c.name(),
            Column::Bool(c) => c.name(),
            Column::StringOwned(c) => c.name(),
            Column::Varchar(c) => c.name(),
            Column::Categorical(c) => c.name(),
            Column::Window(v) => v.source().name(),
            Column::Gather(v) => v.source().name(),
        }
    }

    /// Whether this column accepts nulls. Views report their source's
    /// nullability.
    pub fn nullable(&self) -> bool {
        match self {
            Column::I32(c) => c.nullable(),
            Column::F64(c) => c.nullable(),
            Column::Timestamp(c) => c.nullable(),
            Column::Bool(c) => c.nullable(),
            Column::StringOwned(c) => c.nullable(),
            Column::Varchar(c) => c.nullable(),
            Column::Categorical(c) => c.nullable(),
            Column::Window(v) => v.source().nullable(),
            Column::Gather(v) => v.source().nullable(),
        }
    }

    /// The logical type of this column.
    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::I32(_) => ColumnType::I32,
            Column::F64(_) => ColumnType::F64,
            Column::Timestamp(_) => ColumnType::Timestamp,
            Column::Bool(_) => ColumnType::Bool,
            Column::StringOwned(_) | Column::Varchar(_) | Column::Categorical(_) => {
                ColumnType::String
            }
            Column::Window(v) => v.source().column_type(),
            Column::Gather(v) => v.source().column_type(),
        }
    }

    /// Number of logical rows.
    pub fn len(&self) -> usize {
        match self {
            Column::I32(c) => c.len(),
            Column::F64(c) => c.len(),
            Column::Timestamp(c) => c.len(),
            Column::Bool(c) => c.len(),
            Column::StringOwned(c) => c.len(),
            Column::Varchar(c) => c.len(),
            Column::Categorical(c) => c.len(),
            Column::Window(v) => v.len(),
            Column::Gather(v) => v.len(),
        }
    }

    /// True when the column has zero rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` iff logical row `i` is null.
    pub fn is_null(&self, i: usize) -> Result<bool> {
        match self {
            Column::I32(c) => c.is_null(i),
            Column::F64(c) => c.is_null(i),
            Column::Timestamp(c) => c.is_null(i),
            Column::Bool(c) => c.is_null(i),
            Column::StringOwned(c) => c.is_null(i),
            Column::Varchar(c) => c.is_null(i),
            Column::Categorical(c) => c.is_null(i),
            Column::Window(v) => v.is_null(i),
            Column::Gather(v) => v.is_null(i),
        }
    }

    /// Untyped read at row `i`, boxed into a [`ScalarValue`].
    pub fn get_boxed(&self, i: usize) -> Result<ScalarValue> {
        if self.is_null(i)? {
            return Ok(ScalarValue::Null);
        }
        match self {
            Column::I32(c) => Ok(ScalarValue::I32(c.get(i)?)),
            Column::F64(c) => Ok(ScalarValue::F64(c.get(i)?)),
            Column::Timestamp(c) => Ok(ScalarValue::Timestamp(c.get(i)?)),
            Column::Bool(c) => Ok(ScalarValue::Bool(c.get(i)?)),
            Column::StringOwned(c) => Ok(ScalarValue::Str(c.get(i)?.to_string())),
            Column::Varchar(c) => Ok(ScalarValue::Str(c.get(i)?.to_string())),
            Column::Categorical(c) => Ok(ScalarValue::Str(c.get(i)?.to_string())),
            Column::Window(v) => v.source().get_boxed(v.source_index(i)?),
            Column::Gather(v) => v.source().get_boxed(v.source_index(i)?),
        }
    }

    /// A read-only contiguous view of the underlying `i32` values, including
    /// undefined sentinel values at null slots. Fails with
    /// [`Error::KindMismatch`] unless this is an `i32` column.
    pub fn values_i32(&self) -> Result<&[i32]> {
        match self {
            Column::I32(c) => Ok(c.values()),
            other => Err(Error::KindMismatch {
                column: other.name().to_string(),
                actual: other.column_type().type_name(),
                requested: "i32",
            }),
        }
    }

    /// A read-only contiguous view of the underlying `f64` values, including
    /// undefined sentinel values at null slots. Fails with
    /// [`Error::KindMismatch`] unless this is an `f64` column.
    pub fn values_f64(&self) -> Result<&[f64]> {
        match self {
            Column::F64(c) => Ok(c.values()),
            other => Err(Error::KindMismatch {
                column: other.name().to_string(),
                actual: other.column_type().type_name(),
                requested: "f64",
            }),
        }
    }

    /// Release this column's backing allocation, if any, back to the process
    /// buffer pool. A no-op for views, which never owned their source's
    /// memory in the first place, and for string-based storage, which the
    /// pool does not track.
    pub fn dispose(self) {
        match self {
            Column::I32(c) => crate::pool::pool().release_i32(c.into_buffer()),
            Column::F64(c) => crate::pool::pool().release_f64(c.into_buffer()),
            Column::Timestamp(_) => {}
            Column::Bool(c) => crate::pool::pool().release_u8(c.into_bits()),
            Column::StringOwned(_) | Column::Varchar(_) | Column::Categorical(_) => {}
            Column::Window(_) | Column::Gather(_) => {}
        }
    }

    /// Untyped append: push a boxed [`ScalarValue`] onto an owning builder
    /// column, dispatching to the matching variant's typed `append`/
    /// `append_optional`. Used wherever a caller only has an erased value in
    /// hand — join/aggregate materialization, `from_records`, `fill_null`.
    /// Fails with [`Error::KindMismatch`] if `value`'s variant does not match
    /// this column's logical type, and with [`Error::NotSupported`] on a
    /// view, which never owns storage to append into.
    pub fn push_boxed(&mut self, value: ScalarValue) -> Result<()> {
        fn mismatch(col: &Column, requested: &'static str) -> Error {
            Error::KindMismatch {
                column: col.name().to_string(),
                actual: col.column_type().type_name(),
                requested,
            }
        }
        match self {
            Column::I32(c) => match value {
                ScalarValue::Null => c.append_optional(None),
                ScalarValue::I32(v) => {
                    c.append(v);
                    Ok(())
                }
                _ => Err(mismatch(self, "i32")),
            },
            Column::F64(c) => match value {
                ScalarValue::Null => c.append_optional(None),
                ScalarValue::F64(v) => {
                    c.append(v);
                    Ok(())
                }
                _ => Err(mismatch(self, "f64")),
            },
            Column::Timestamp(c) => match value {
                ScalarValue::Null => c.append_optional(None),
                ScalarValue::Timestamp(v) => {
                    c.append(v);
                    Ok(())
                }
                _ => Err(mismatch(self, "timestamp")),
            },
            Column::Bool(c) => match value {
                ScalarValue::Null => c.append_optional(None),
                ScalarValue::Bool(v) => {
                    c.append(v);
                    Ok(())
                }
                _ => Err(mismatch(self, "bool")),
            },
            Column::StringOwned(c) => match value {
                ScalarValue::Null => c.append_optional(None),
                ScalarValue::Str(ref s) => {
                    c.append(s);
                    Ok(())
                }
                _ => Err(mismatch(self, "string")),
            },
            Column::Varchar(c) => match value {
                ScalarValue::Null => c.append_optional(None),
                ScalarValue::Str(ref s) => {
                    c.append(s);
                    Ok(())
                }
                _ => Err(mismatch(self, "string")),
            },
            Column::Categorical(c) => match value {
                ScalarValue::Null => c.append_optional(None),
                ScalarValue::Str(ref s) => {
                    c.append(s);
                    Ok(())
                }
                _ => Err(mismatch(self, "string")),
            },
            Column::Window(_) | Column::Gather(_) => Err(Error::NotSupported("append on a view")),
        }
    }

    /// Deep-copy the rows at `indices` into a new owning column of the same
    /// storage variant (views materialize into their source's variant).
    pub fn gather(&self, indices: &[usize]) -> Result<Column> {
        match self {
            Column::I32(c) => Ok(Column::I32(c.gather(indices)?)),
            Column::F64(c) => Ok(Column::F64(c.gather(indices)?)),
            Column::Timestamp(c) => Ok(Column::Timestamp(c.gather(indices)?)),
            Column::Bool(c) => Ok(Column::Bool(c.gather(indices)?)),
            Column::StringOwned(c) => Ok(Column::StringOwned(c.gather(indices)?)),
            Column::Varchar(c) => Ok(Column::Varchar(c.gather(indices)?)),
            Column::Categorical(c) => Ok(Column::Categorical(c.gather(indices)?)),
            Column::Window(v) => v.gather(indices),
            Column::Gather(v) => v.gather(indices),
        }
    }
}
