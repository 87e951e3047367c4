//! Closed error set for the engine.
//!
//! Every fallible public operation returns [`Result<T, Error>`](Result). No
//! component retries internally and no component silently converts one kind
//! into another — callers see the precise failure, not a generic wrapper.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The engine's single, closed error type.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum Error {
    /// Index outside `[0, length)`, or a slice outside its source's bounds.
    #[error("index {index} out of range for length {length}")]
    OutOfRange {
        /// The offending index.
        index: usize,
        /// The length it was checked against.
        length: usize,
    },

    /// A typed accessor was called against a column of a different type.
    #[error("kind mismatch: column `{column}` is {actual}, requested {requested}")]
    KindMismatch {
        /// Column name, or a synthetic label when unnamed.
        column: String,
        /// The column's actual type name.
        actual: &'static str,
        /// The type name that was requested.
        requested: &'static str,
    },

    /// Columns of differing lengths were composed into a table, or arithmetic
    /// was attempted between operands of differing lengths.
    #[error("shape mismatch: expected length {expected}, found {found} (column `{column}`)")]
    ShapeMismatch {
        /// The column whose length differs from the rest.
        column: String,
        /// The length established by earlier columns.
        expected: usize,
        /// The offending column's length.
        found: usize,
    },

    /// `from_records` found no fields of a supported logical type.
    #[error("record type `{record_type}` produced an empty schema")]
    SchemaEmpty {
        /// The name of the record type that produced no columns.
        record_type: &'static str,
    },

    /// Two columns in the same schema share a name.
    #[error("duplicate column name `{0}`")]
    DuplicateName(String),

    /// A name was not found in a schema or table.
    #[error("no column named `{0}`")]
    MissingColumn(String),

    /// A null value was appended or set on a non-nullable column.
    #[error("column `{0}` is not nullable")]
    NotNullable(String),

    /// The operation is not supported by this column/view layout.
    #[error("operation not supported: {0}")]
    NotSupported(&'static str),

    /// A join produced a result column name collision between the two sides.
    #[error("join produced colliding column name `{0}`; rename before joining")]
    NameCollision(String),

    /// Integer division by zero.
    #[error("arithmetic error: {0}")]
    Arithmetic(&'static str),

    /// The expression JIT refused to compile a node; caller should fall back
    /// to the interpreted path.
    #[error("expression JIT does not support: {0}")]
    JitUnsupported(&'static str),
}
