//! # Managed Command Channel
//!
//! The sole native → managed entry point. One [`Command`] in, one optional
//! opaque address out. Failures are reported through the host callbacks, not
//! through the return value.

use std::ffi::c_void;
use std::fmt;

use mantle_protocol::{Address, Command, RawCommand};

/// Signature of the managed command entry point on the wire.
pub type ManagedCommandFn = extern "C" fn(RawCommand) -> *mut c_void;

/// Something that accepts commands on behalf of the managed runtime.
///
/// The channel itself provides no locking. Callers serialize access; see
/// [`RuntimeContext::send`](crate::RuntimeContext::send).
pub trait ManagedChannel: Send + Sync {
    /// Sends one command and returns the verb-specific result.
    fn send(&self, command: &Command<'_>) -> Option<Address>;
}

/// Channel backed by a raw function pointer exported by the hosting library.
#[derive(Clone, Copy)]
pub struct FfiChannel {
    command: ManagedCommandFn,
}

impl FfiChannel {
    /// Wraps a managed command entry point.
    ///
    /// The pointer must remain callable for the channel's lifetime. The
    /// hosting layer guarantees this by keeping its library loaded until the
    /// channel is detached.
    #[must_use]
    pub const fn new(command: ManagedCommandFn) -> Self {
        Self { command }
    }
}

impl ManagedChannel for FfiChannel {
    fn send(&self, command: &Command<'_>) -> Option<Address> {
        let raw = RawCommand::encode(command);
        Address::from_ptr((self.command)(raw).cast_const())
    }
}

impl fmt::Debug for FfiChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FfiChannel")
            .field("command", &format_args!("0x{:X}", self.command as usize))
            .finish()
    }
}
