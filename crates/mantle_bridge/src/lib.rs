//! # MANTLE Bridge
//!
//! The native half of the managed runtime bridge, as loaded by the host engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                        HOST ENGINE                         │
//! │   TickGraph        WorldDelegates        HostCallbacks     │
//! └──────┬──────────────────┬──────────────────────▲───────────┘
//!        │ execute_tick     │ world events         │ log / exception / fatal
//! ┌──────▼──────────────────▼──────────────────────┴───────────┐
//! │  TickHook x4 ──► RuntimeContext ◄── Module                 │
//! │                  status · ticks · events                   │
//! └─────────────────────────┬──────────────────────────────────┘
//!                           │ Command (40 bytes)
//! ┌─────────────────────────▼──────────────────────────────────┐
//! │            MANAGED RUNTIME (hosted or embedded)            │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Threading
//!
//! Tick hooks run on arbitrary host worker threads. Status and world tick
//! state are atomics; every command to the managed side is serialized through
//! the context's dispatch lock.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod callbacks;
pub mod channel;
pub mod config;
pub mod context;
mod dispatch;
pub mod embedded;
pub mod error;
pub mod hosting;
pub mod module;
pub mod tables;
pub mod tick;
pub mod world;

pub use callbacks::{HostCallbacks, TracingCallbacks};
pub use channel::{FfiChannel, ManagedChannel, ManagedCommandFn};
pub use config::BridgeConfig;
pub use context::{RuntimeContext, Status, WorldTickState};
pub use embedded::{EmbeddedHost, EmbeddedRuntime};
pub use error::{BridgeError, BridgeResult, HostingError};
pub use hosting::{DynamicLibraryHost, RuntimeHost};
pub use module::{HostServices, Module, ModuleState};
pub use tables::HostTables;
pub use tick::{CompletionEvent, LevelTick, NamedThread, TickFunction, TickGraph, TickGroup, TickHook};
pub use world::{DelegateHandle, WorldDelegates, WorldEvent, WorldHandle, WorldKind};

pub use mantle_protocol as protocol;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Installs a `tracing` subscriber for the bridge.
///
/// Honors `RUST_LOG`, defaulting to `mantle=info`. Does nothing if a global
/// subscriber is already set, which is normal inside a host that owns logging.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mantle=info")),
        )
        .with_thread_ids(true)
        .try_init();
}
