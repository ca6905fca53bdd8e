//! # Managed → Host Callbacks
//!
//! The only directions from managed code into the host:
//!
//! | Entry point | Effect |
//! |-------------|--------|
//! | host error | fatal, the host process goes down |
//! | exception | logged, execution continues |
//! | log | leveled message, never changes control flow |
//! | invoke | call a native function with one argument |
//!
//! Rust code reports through [`HostCallbacks`]. The managed runtime gets the
//! `extern "C"` trampolines from [`runtime_entry_points`], which forward to
//! whatever sink is installed with [`install`]. The sink is process-wide.

#![allow(unsafe_code)]

use std::ffi::{c_char, CStr};
use std::sync::Arc;

use mantle_protocol::{LogLevel, RawArgument};
use parking_lot::RwLock;

/// Log target for everything reported by the managed side.
pub const MANAGED_TARGET: &str = "mantle::managed";

/// Native function the managed side can ask the host to invoke.
pub type InvokeFn = extern "C" fn(RawArgument);

/// Receiver of managed-side reports.
pub trait HostCallbacks: Send + Sync {
    /// Unrecoverable error. Implementations for a real host do not return.
    fn host_error(&self, message: &str);

    /// Managed exception. Logged, execution continues.
    fn exception(&self, message: &str);

    /// Leveled log message. [`LogLevel::Fatal`] escalates to [`HostCallbacks::host_error`].
    fn log(&self, level: LogLevel, message: &str);
}

/// Routes reports into `tracing` and aborts on fatal errors.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingCallbacks;

impl HostCallbacks for TracingCallbacks {
    fn host_error(&self, message: &str) {
        tracing::error!(target: MANAGED_TARGET, "fatal host error: {}", message);
        std::process::abort();
    }

    fn exception(&self, message: &str) {
        tracing::error!(target: MANAGED_TARGET, "managed exception: {}", message);
    }

    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Display => tracing::info!(target: MANAGED_TARGET, "{}", message),
            LogLevel::Warning => tracing::warn!(target: MANAGED_TARGET, "{}", message),
            LogLevel::Error => tracing::error!(target: MANAGED_TARGET, "{}", message),
            LogLevel::Fatal => self.host_error(message),
        }
    }
}

static SINK: RwLock<Option<Arc<dyn HostCallbacks>>> = parking_lot::const_rwlock(None);

fn same_sink(a: &Arc<dyn HostCallbacks>, b: &Arc<dyn HostCallbacks>) -> bool {
    Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
}

/// Installs the sink the `extern "C"` trampolines forward to.
///
/// There is one sink per process, because the managed runtime receives one
/// callback table per process. A host runs a single [`Module`](crate::Module);
/// a later install replaces the earlier sink.
pub fn install(callbacks: Arc<dyn HostCallbacks>) {
    let mut sink = SINK.write();
    if sink.as_ref().is_some_and(|live| !same_sink(live, &callbacks)) {
        tracing::warn!("replacing the installed host callback sink");
    }
    *sink = Some(callbacks);
}

/// Removes `callbacks` if it is the installed sink. Trampolines then fall back
/// to [`TracingCallbacks`]. A sink installed by someone else is left alone.
///
/// Returns true if the sink was removed.
pub fn release(callbacks: &Arc<dyn HostCallbacks>) -> bool {
    let mut sink = SINK.write();
    if sink.as_ref().is_some_and(|live| same_sink(live, callbacks)) {
        *sink = None;
        return true;
    }
    false
}

fn with_sink(report: impl FnOnce(&dyn HostCallbacks)) {
    let sink = SINK.read().clone();
    match sink {
        Some(callbacks) => report(callbacks.as_ref()),
        None => report(&TracingCallbacks),
    }
}

fn message_from(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    // SAFETY: the managed side passes NUL-terminated strings that stay alive
    // for the duration of the call.
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

extern "C" fn invoke_trampoline(function: Option<InvokeFn>, value: RawArgument) {
    match function {
        Some(function) => function(value),
        None => with_sink(|sink| sink.exception("invoke called with a null function")),
    }
}

extern "C" fn exception_trampoline(message: *const c_char) {
    let message = message_from(message);
    with_sink(|sink| sink.exception(&message));
}

extern "C" fn log_trampoline(level: i32, message: *const c_char) {
    let message = message_from(message);
    with_sink(|sink| sink.log(LogLevel::from_raw(level), &message));
}

/// Error writer handed to the hosting layer. Any call is fatal.
pub extern "C" fn host_error_trampoline(message: *const c_char) {
    let message = message_from(message);
    with_sink(|sink| sink.host_error(&message));
}

/// The runtime callback table in wire order: `invoke, exception, log`.
#[must_use]
pub fn runtime_entry_points() -> [usize; 3] {
    [
        invoke_trampoline as *const () as usize,
        exception_trampoline as *const () as usize,
        log_trampoline as *const () as usize,
    ]
}
