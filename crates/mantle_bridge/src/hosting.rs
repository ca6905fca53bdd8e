//! # Managed Runtime Hosting
//!
//! Brings the managed runtime up and hands back the command channel.
//!
//! The hosting library exports one bootstrap symbol (configurable, default
//! [`DEFAULT_ENTRY_POINT`](crate::config::DEFAULT_ENTRY_POINT)):
//!
//! ```text
//! extern "C" fn(assemblies_dir: *const c_char,
//!               host_error: extern "C" fn(*const c_char)) -> ManagedCommandFn?
//! ```
//!
//! A null return means the runtime failed to start.

#![allow(unsafe_code)]

use std::ffi::{c_char, CString};
use std::fmt;
use std::sync::Arc;

use libloading::{Library, Symbol};

use crate::callbacks::host_error_trampoline;
use crate::channel::{FfiChannel, ManagedChannel, ManagedCommandFn};
use crate::config::BridgeConfig;
use crate::error::HostingError;

/// Signature of the hosting library's bootstrap symbol.
pub type HostingEntryFn = unsafe extern "C" fn(
    assemblies_dir: *const c_char,
    host_error: extern "C" fn(*const c_char),
) -> Option<ManagedCommandFn>;

/// Starts and stops the managed runtime.
pub trait RuntimeHost: Send {
    /// Starts the runtime and returns its command channel.
    ///
    /// # Errors
    ///
    /// Returns a [`HostingError`] if the runtime can't be brought up.
    fn start(&mut self, config: &BridgeConfig) -> Result<Arc<dyn ManagedChannel>, HostingError>;

    /// Stops the runtime. Safe to call when not started.
    fn stop(&mut self);
}

/// Host that loads the runtime from a shared library.
#[derive(Default)]
pub struct DynamicLibraryHost {
    library: Option<Library>,
}

impl DynamicLibraryHost {
    /// Creates an unloaded host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while the hosting library is loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.library.is_some()
    }
}

impl RuntimeHost for DynamicLibraryHost {
    fn start(&mut self, config: &BridgeConfig) -> Result<Arc<dyn ManagedChannel>, HostingError> {
        let path = &config.hosting_library;
        let assemblies = CString::new(config.user_assemblies_dir().to_string_lossy().into_owned())
            .map_err(|_| HostingError::Startup("assemblies path contains a NUL byte".into()))?;
        let mut symbol = config.entry_point.clone().into_bytes();
        symbol.push(0);

        tracing::info!("loading hosting library {}", path.display());

        // SAFETY: loading runs the library's initializers. The hosting library
        // is trusted configuration, same as the host's own plugins.
        let library = unsafe { Library::new(path) }.map_err(|e| HostingError::LibraryLoad {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let command = {
            // SAFETY: the symbol is declared with the documented bootstrap
            // signature and is only used while `library` is alive.
            let entry: Symbol<HostingEntryFn> =
                unsafe { library.get(&symbol) }.map_err(|e| HostingError::MissingEntryPoint {
                    symbol: config.entry_point.clone(),
                    reason: e.to_string(),
                })?;
            // SAFETY: both pointers are valid for the duration of the call.
            unsafe { entry(assemblies.as_ptr(), host_error_trampoline) }
        };

        let Some(command) = command else {
            return Err(HostingError::Startup(format!(
                "{} returned no command entry point",
                config.entry_point
            )));
        };

        self.library = Some(library);
        Ok(Arc::new(FfiChannel::new(command)))
    }

    fn stop(&mut self) {
        if self.library.take().is_some() {
            tracing::info!("hosting library unloaded");
        }
    }
}

impl fmt::Debug for DynamicLibraryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicLibraryHost")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
