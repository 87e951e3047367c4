//! Schema: an ordered, uniquely-named sequence of column definitions.

use crate::column::ColumnType;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// One column's static shape: name, logical type, and nullability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name, unique within its schema.
    pub name: String,
    /// Logical type token.
    #[serde(rename = "type")]
    pub column_type: SerializableColumnType,
    /// Whether this column accepts nulls.
    pub nullable: bool,
}

/// A serde-friendly mirror of [`ColumnType`]; kept separate so [`ColumnType`]
/// itself stays a plain in-memory enum with no serialization concerns bleeding
/// into the hot storage path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializableColumnType {
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

impl From<ColumnType> for SerializableColumnType {
    fn from(t: ColumnType) -> Self {
        match t {
            ColumnType::I32 => SerializableColumnType::I32,
            ColumnType::F64 => SerializableColumnType::F64,
            ColumnType::Bool => SerializableColumnType::Bool,
            ColumnType::String => SerializableColumnType::String,
            ColumnType::Timestamp => SerializableColumnType::Timestamp,
        }
    }
}

impl From<SerializableColumnType> for ColumnType {
    fn from(t: SerializableColumnType) -> Self {
        match t {
            SerializableColumnType::I32 => ColumnType::I32,
            SerializableColumnType::F64 => ColumnType::F64,
            SerializableColumnType::Bool => ColumnType::Bool,
            SerializableColumnType::String => ColumnType::String,
            SerializableColumnType::Timestamp => ColumnType::Timestamp,
        }
    }
}

impl ColumnDef {
    /// A new column definition.
    pub fn new(name: impl Into<String>, column_type: ColumnType, nullable: bool) -> Self {
        Self { name: name.into(), column_type: column_type.into(), nullable }
    }

    /// The logical type, as the in-memory [`ColumnType`].
    pub fn logical_type(&self) -> ColumnType {
        self.column_type.into()
    }
}

/// An ordered sequence of [`ColumnDef`]s with unique names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<ColumnDef>,
}

impl Schema {
    /// Build a schema from column definitions, rejecting duplicate names.
    pub fn new(columns: Vec<ColumnDef>) -> Result<Self> {
        let mut seen = std::collections::HashSet::with_capacity(columns.len());
        for def in &columns {
            if !seen.insert(def.name.as_str()) {
                return Err(Error::DuplicateName(def.name.clone()));
            }
        }
        Ok(Self { columns })
    }

    /// Number of columns in this schema.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// All column definitions, in schema order.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Look up a column definition by name.
    pub fn get(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Position of a column by name, for schema-to-table index resolution.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }
}
