//! # Function Tables
//!
//! Native entry points the managed side calls into, grouped per subsystem.
//!
//! ```text
//! directory [128 x ptr]          subsystem table [64 x ptr]
//! ┌──────────┐                   ┌────────┬────────┬─────┐
//! │ table 0  │ ────────────────► │ slot 0 │ slot 1 │ ... │
//! │ table 1  │ ──► ...           └────────┴────────┴─────┘
//! │ ...      │
//! └──────────┘
//! ```
//!
//! Storage is boxed so the addresses handed to the managed side stay put
//! when the owning value moves.

use crate::argument::Address;
use crate::error::{ProtocolError, ProtocolResult};

/// Slots per subsystem table.
pub const FUNCTION_TABLE_SLOTS: usize = 64;

/// Maximum number of subsystem tables in the directory.
pub const FUNCTION_TABLE_CAPACITY: usize = 128;

/// One subsystem's table of native function pointers.
#[derive(Debug)]
pub struct FunctionTable {
    name: &'static str,
    slots: Box<[usize; FUNCTION_TABLE_SLOTS]>,
    len: usize,
}

impl FunctionTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: Box::new([0; FUNCTION_TABLE_SLOTS]),
            len: 0,
        }
    }

    /// Appends a function pointer and returns its slot index.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::TableFull`] once all slots are taken.
    pub fn push(&mut self, function: Address) -> ProtocolResult<usize> {
        if self.len >= FUNCTION_TABLE_SLOTS {
            return Err(ProtocolError::TableFull {
                table: self.name,
                capacity: FUNCTION_TABLE_SLOTS,
            });
        }
        let index = self.len;
        self.slots[index] = function.get();
        self.len += 1;
        Ok(index)
    }

    /// Subsystem name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Number of populated slots.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no slot is populated.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the function in a slot.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<Address> {
        self.slots.get(index).copied().and_then(Address::new)
    }

    /// Address of the slot array.
    #[must_use]
    pub fn address(&self) -> Option<Address> {
        Address::from_ptr(self.slots.as_ptr())
    }
}

/// The directory of subsystem tables handed over at `Initialize`.
#[derive(Debug)]
pub struct FunctionTables {
    tables: Vec<FunctionTable>,
    directory: Box<[usize; FUNCTION_TABLE_CAPACITY]>,
}

impl FunctionTables {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: Vec::new(),
            directory: Box::new([0; FUNCTION_TABLE_CAPACITY]),
        }
    }

    /// Adds a table and returns its directory index.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::TooManyTables`] when the directory is full.
    pub fn register(&mut self, table: FunctionTable) -> ProtocolResult<usize> {
        let index = self.tables.len();
        if index >= FUNCTION_TABLE_CAPACITY {
            return Err(ProtocolError::TooManyTables(FUNCTION_TABLE_CAPACITY));
        }
        self.directory[index] = Address::raw_or_null(table.address());
        self.tables.push(table);
        Ok(index)
    }

    /// Looks a table up by subsystem name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FunctionTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Number of registered tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if no table is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Address of the directory array.
    #[must_use]
    pub fn address(&self) -> Option<Address> {
        Address::from_ptr(self.directory.as_ptr())
    }

    /// Build checksum: the total number of populated slots.
    ///
    /// Both sides compute it from their own view of the tables. A mismatch
    /// means the native and managed halves were built from different sources.
    #[must_use]
    pub fn checksum(&self) -> i32 {
        let total: usize = self.tables.iter().map(FunctionTable::len).sum();
        i32::try_from(total).unwrap_or(i32::MAX)
    }
}

impl Default for FunctionTables {
    fn default() -> Self {
        Self::new()
    }
}
