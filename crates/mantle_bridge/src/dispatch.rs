//! # Command Dispatch
//!
//! The verbs, as the rest of the bridge uses them. Every call goes through
//! [`RuntimeContext::send`], which holds the dispatch lock for the duration of
//! the managed call.

use std::ffi::CString;

use mantle_protocol::{Address, Argument, Command, EventSlot, ProtocolError};

use crate::context::{RuntimeContext, Status};
use crate::error::BridgeResult;

impl RuntimeContext {
    /// Sends one command through the attached channel.
    ///
    /// Returns `None` when no channel is attached.
    pub fn send(&self, command: &Command<'_>) -> Option<Address> {
        let _serial = self.dispatch.lock();
        let Some(channel) = self.channel() else {
            tracing::trace!("dropping {} command, no managed channel", command.verb());
            return None;
        };
        channel.send(command)
    }

    /// Hands the host tables to the runtime. Returns true if accepted.
    pub fn initialize(&self, tables: Address, checksum: i32) -> bool {
        self.send(&Command::initialize(tables, checksum)).is_some()
    }

    /// Loads user assemblies and moves to [`Status::Running`] on success.
    pub fn load_assemblies(&self) -> bool {
        let loaded = self.send(&Command::assemblies(true)).is_some();
        if loaded {
            self.set_status(Status::Running);
        }
        loaded
    }

    /// Unloads user assemblies and moves to [`Status::Idle`].
    pub fn unload_assemblies(&self) {
        let _ = self.send(&Command::assemblies(false));
        if self.status() != Status::Stopped {
            self.set_status(Status::Idle);
        }
    }

    /// Resolves a managed method by name.
    ///
    /// With `optional` set a missing method is simply `Ok(None)`. Without it
    /// the managed side reports an exception and the result is still `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InteriorNul`] if the name can't be sent.
    pub fn find(&self, name: &str, optional: bool) -> BridgeResult<Option<Address>> {
        let method = CString::new(name).map_err(|e| ProtocolError::InteriorNul {
            position: e.nul_position(),
        })?;
        Ok(self.send(&Command::find(&method, optional)))
    }

    /// Invokes a resolved method.
    pub fn execute(&self, function: Address, value: Argument) -> Option<Address> {
        self.send(&Command::execute_with(function, value))
    }

    /// Resolves every event slot. Handlers are optional.
    ///
    /// Returns the number of slots that resolved.
    pub fn resolve_events(&self) -> usize {
        let mut resolved = 0;
        for slot in EventSlot::ALL {
            // Names are static and NUL-free.
            let handler = self.find(slot.name(), true).ok().flatten();
            self.events.write().set(slot, handler);
            if handler.is_some() {
                resolved += 1;
            }
        }
        tracing::debug!("resolved {} of {} event handlers", resolved, EventSlot::ALL.len());
        resolved
    }

    /// Forgets every resolved handler.
    pub fn clear_events(&self) {
        self.events.write().clear();
    }

    /// Raises an event if the runtime is running and a handler is resolved.
    ///
    /// Returns true if the handler was invoked.
    pub fn raise(&self, slot: EventSlot, value: Argument) -> bool {
        if self.status() != Status::Running {
            return false;
        }
        match self.event(slot) {
            Some(handler) => {
                let _ = self.execute(handler, value);
                true
            }
            None => false,
        }
    }
}
