//! # Protocol Error Types

use thiserror::Error;

/// Errors raised while building or decoding protocol values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A raw frame carried a discriminant outside the known range.
    #[error("unknown {field} tag: {value}")]
    UnknownTag {
        /// Which discriminant was being decoded.
        field: &'static str,
        /// The raw value found on the wire.
        value: i32,
    },

    /// A slot that must reference something was null.
    #[error("null pointer in {0}")]
    NullPointer(&'static str),

    /// A method name contained an interior NUL byte.
    #[error("method name contains an interior NUL at byte {position}")]
    InteriorNul {
        /// Byte offset of the first NUL.
        position: usize,
    },

    /// A method name was not valid UTF-8.
    #[error("method name is not valid UTF-8")]
    InvalidName,

    /// A function table has no free slots left.
    #[error("function table {table} is full ({capacity} slots)")]
    TableFull {
        /// Table name.
        table: &'static str,
        /// Slot capacity of the table.
        capacity: usize,
    },

    /// Too many function tables were registered.
    #[error("too many function tables (capacity {0})")]
    TooManyTables(usize),
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
