//! # Bridge Error Types
//!
//! Fatal host errors, exceptions and log messages travel through
//! [`HostCallbacks`](crate::callbacks::HostCallbacks). These types cover what
//! the native side itself can fail at.

use std::path::PathBuf;

use mantle_protocol::{EventSlot, ObjectKind, ProtocolError, TickPhase};
use thiserror::Error;

use crate::module::ModuleState;

/// Failures while bringing up or tearing down the hosting library.
#[derive(Error, Debug)]
pub enum HostingError {
    /// The shared library could not be loaded.
    #[error("failed to load hosting library {path}: {reason}")]
    LibraryLoad {
        /// Library path.
        path: PathBuf,
        /// Loader message.
        reason: String,
    },

    /// The library loaded but does not export the entry point.
    #[error("hosting library does not export {symbol}: {reason}")]
    MissingEntryPoint {
        /// Symbol name.
        symbol: String,
        /// Loader message.
        reason: String,
    },

    /// The host could not start the runtime for another reason.
    #[error("managed runtime failed to start: {0}")]
    Startup(String),
}

/// Errors that can occur in the bridge.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Hosting library failure.
    #[error(transparent)]
    Hosting(#[from] HostingError),

    /// Malformed protocol value.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Configuration values are unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    ConfigIo {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for [`BridgeConfig`](crate::BridgeConfig).
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The managed side rejected the `Initialize` tables.
    #[error("managed runtime rejected initialization (checksum {checksum})")]
    InitializationRejected {
        /// Checksum that was sent.
        checksum: i32,
    },

    /// The managed side failed to load user assemblies.
    #[error("managed runtime failed to load user assemblies")]
    AssembliesRejected,

    /// The host refused a tick function.
    #[error("tick registration failed for {phase}: {reason}")]
    TickRegistration {
        /// Phase being registered.
        phase: TickPhase,
        /// Host message.
        reason: String,
    },

    /// A lifecycle operation was called in a state that doesn't allow it.
    #[error("{operation} is not valid while the module is {state:?}")]
    InvalidTransition {
        /// Operation attempted.
        operation: &'static str,
        /// Module state at the time.
        state: ModuleState,
    },

    /// A delegate object was dispatched to a slot of another category.
    #[error("event {slot} does not accept {kind:?} objects")]
    DelegateMismatch {
        /// Target slot.
        slot: EventSlot,
        /// Kind of the object that was passed.
        kind: ObjectKind,
    },
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
