//! # Commands
//!
//! The five verbs the native side can send to the managed runtime.
//!
//! | Verb | Payload | Result |
//! |------|---------|--------|
//! | `Initialize` | table pointer, checksum | non-empty when accepted |
//! | `LoadAssemblies` | none | non-empty when loaded |
//! | `UnloadAssemblies` | none | ignored |
//! | `Find` | method name, optional flag | method handle or empty |
//! | `Execute` | method handle, one argument | ignored |

use std::ffi::CStr;
use std::fmt;

use crate::argument::{Address, Argument};

/// Wire discriminant of a [`Command`].
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Hand the host tables to the runtime.
    Initialize = 1,
    /// Resolve and activate user assemblies.
    LoadAssemblies = 2,
    /// Deactivate user assemblies.
    UnloadAssemblies = 3,
    /// Resolve a method by name.
    Find = 4,
    /// Invoke a resolved method.
    Execute = 5,
}

impl Verb {
    /// Decodes a wire discriminant.
    #[must_use]
    pub const fn from_raw(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Initialize),
            2 => Some(Self::LoadAssemblies),
            3 => Some(Self::UnloadAssemblies),
            4 => Some(Self::Find),
            5 => Some(Self::Execute),
            _ => None,
        }
    }

    /// Human readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Initialize => "Initialize",
            Self::LoadAssemblies => "LoadAssemblies",
            Self::UnloadAssemblies => "UnloadAssemblies",
            Self::Find => "Find",
            Self::Execute => "Execute",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single native-to-managed request.
///
/// `Find` borrows its method name so the pointer placed on the wire stays
/// valid for as long as the command exists.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command<'a> {
    /// Hand the 3-entry host table to the runtime.
    Initialize {
        /// Address of the `[runtime, events, functions]` pointer array.
        tables: Address,
        /// Build checksum the runtime validates before accepting the tables.
        checksum: i32,
    },
    /// Activate user assemblies.
    LoadAssemblies,
    /// Deactivate user assemblies.
    UnloadAssemblies,
    /// Resolve a method by name.
    Find {
        /// NUL-terminated method name.
        method: &'a CStr,
        /// When set, a missing method returns empty instead of raising.
        optional: bool,
    },
    /// Invoke a previously resolved method.
    Execute {
        /// Handle returned by an earlier `Find`.
        function: Address,
        /// Zero or one argument.
        value: Argument,
    },
}

impl<'a> Command<'a> {
    /// Builds an `Initialize` command.
    #[inline]
    #[must_use]
    pub const fn initialize(tables: Address, checksum: i32) -> Self {
        Self::Initialize { tables, checksum }
    }

    /// Builds `LoadAssemblies` when `load` is true, `UnloadAssemblies` otherwise.
    #[inline]
    #[must_use]
    pub const fn assemblies(load: bool) -> Self {
        if load {
            Self::LoadAssemblies
        } else {
            Self::UnloadAssemblies
        }
    }

    /// Builds a `Find` command.
    #[inline]
    #[must_use]
    pub const fn find(method: &'a CStr, optional: bool) -> Self {
        Self::Find { method, optional }
    }

    /// Builds an `Execute` command with no argument.
    #[inline]
    #[must_use]
    pub const fn execute(function: Address) -> Self {
        Self::Execute {
            function,
            value: Argument::None,
        }
    }

    /// Builds an `Execute` command carrying one argument.
    #[inline]
    #[must_use]
    pub const fn execute_with(function: Address, value: Argument) -> Self {
        Self::Execute { function, value }
    }

    /// Returns the verb of this command.
    #[inline]
    #[must_use]
    pub const fn verb(&self) -> Verb {
        match self {
            Self::Initialize { .. } => Verb::Initialize,
            Self::LoadAssemblies => Verb::LoadAssemblies,
            Self::UnloadAssemblies => Verb::UnloadAssemblies,
            Self::Find { .. } => Verb::Find,
            Self::Execute { .. } => Verb::Execute,
        }
    }
}
