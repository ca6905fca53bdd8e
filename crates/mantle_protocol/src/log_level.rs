//! Severity of a log message reported by the managed side.

use std::fmt;

/// Log severity. Discriminants are the wire values.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogLevel {
    /// Informational.
    Display = 0,
    /// Something looks wrong, execution continues.
    Warning = 1,
    /// Something failed, execution continues.
    Error = 2,
    /// Unrecoverable. The host goes down.
    Fatal = 3,
}

impl LogLevel {
    /// Decodes a wire value. Out-of-range values are treated as errors so
    /// nothing reported by the managed side is silently dropped.
    #[must_use]
    pub const fn from_raw(value: i32) -> Self {
        match value {
            0 => Self::Display,
            1 => Self::Warning,
            3 => Self::Fatal,
            _ => Self::Error,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Display => "display",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Fatal => "fatal",
        })
    }
}
