//! # Host Tables
//!
//! What `Initialize` hands to the managed side, one pointer to a root of
//! three entries:
//!
//! ```text
//! root [3 x ptr]
//! ├── runtime callbacks   [invoke, exception, log]
//! ├── event handlers      [128 x ptr], filled after assemblies load
//! └── function directory  [128 x ptr] → subsystem tables
//! ```

use mantle_protocol::{Address, FunctionTables};

use crate::callbacks::runtime_entry_points;
use crate::context::RuntimeContext;

/// Root table and the storage it points at.
///
/// Must stay alive, and in place, as long as the managed side is initialized.
#[derive(Debug)]
pub struct HostTables {
    runtime: Box<[usize; 3]>,
    functions: FunctionTables,
    root: Box<[usize; 3]>,
}

impl HostTables {
    /// Builds the root for a context and a set of function tables.
    #[must_use]
    pub fn new(context: &RuntimeContext, functions: FunctionTables) -> Self {
        let runtime = Box::new(runtime_entry_points());
        let root = Box::new([
            runtime.as_ptr() as usize,
            Address::raw_or_null(context.events_address()),
            Address::raw_or_null(functions.address()),
        ]);
        Self {
            runtime,
            functions,
            root,
        }
    }

    /// Address sent as the `Initialize` tables pointer.
    #[must_use]
    pub fn root_address(&self) -> Address {
        Address::from_ptr(self.root.as_ptr())
            .unwrap_or_else(|| unreachable!("boxed storage is never null"))
    }

    /// Checksum sent alongside the tables.
    #[must_use]
    pub fn checksum(&self) -> i32 {
        self.functions.checksum()
    }

    /// Runtime callbacks in wire order.
    #[must_use]
    pub fn runtime_entry_points(&self) -> &[usize; 3] {
        &self.runtime
    }

    /// Registered subsystem tables.
    #[must_use]
    pub fn functions(&self) -> &FunctionTables {
        &self.functions
    }
}
