//! # Embedded Runtime
//!
//! An in-process managed side. Handlers are plain Rust closures registered by
//! name; "loading assemblies" makes them resolvable.
//!
//! Follows the same rules a hosted runtime does:
//! - `Initialize` with the wrong checksum is a fatal host error
//! - `LoadAssemblies` before `Initialize` is an exception
//! - a non-optional `Find` that misses is an exception
//! - unknown `Execute` targets are an exception

use std::fmt;
use std::sync::Arc;

use mantle_protocol::{Address, Argument, Command, LogLevel, ProtocolError};
use parking_lot::RwLock;

use crate::callbacks::HostCallbacks;
use crate::channel::ManagedChannel;
use crate::config::BridgeConfig;
use crate::error::HostingError;
use crate::hosting::RuntimeHost;

/// A managed method body.
pub type ManagedHandler = Arc<dyn Fn(&Argument) + Send + Sync>;

#[derive(Clone, Copy, Debug, Default)]
struct RuntimeState {
    initialized: bool,
    loaded: bool,
}

/// In-process implementation of the managed command semantics.
pub struct EmbeddedRuntime {
    checksum: i32,
    callbacks: Arc<dyn HostCallbacks>,
    state: RwLock<RuntimeState>,
    methods: RwLock<Vec<(String, ManagedHandler)>>,
}

impl EmbeddedRuntime {
    /// Creates a runtime expecting `checksum` at `Initialize`.
    #[must_use]
    pub fn new(checksum: i32, callbacks: Arc<dyn HostCallbacks>) -> Self {
        Self {
            checksum,
            callbacks,
            state: RwLock::new(RuntimeState::default()),
            methods: RwLock::new(Vec::new()),
        }
    }

    /// Registers a method and returns its handle. Re-registering a name
    /// replaces the body and keeps the handle.
    pub fn register<F>(&self, name: impl Into<String>, handler: F) -> Address
    where
        F: Fn(&Argument) + Send + Sync + 'static,
    {
        let name = name.into();
        let handler: ManagedHandler = Arc::new(handler);
        let mut methods = self.methods.write();
        let index = match methods.iter().position(|(n, _)| *n == name) {
            Some(index) => {
                methods[index].1 = handler;
                index
            }
            None => {
                methods.push((name, handler));
                methods.len() - 1
            }
        };
        Self::handle(index)
    }

    /// Returns true after an accepted `Initialize`.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state.read().initialized
    }

    /// Returns true while user assemblies are loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.state.read().loaded
    }

    fn handle(index: usize) -> Address {
        Address::new(index + 1).unwrap_or_else(|| unreachable!("index + 1 is never zero"))
    }

    fn lookup(&self, name: &str) -> Option<Address> {
        self.methods
            .read()
            .iter()
            .position(|(n, _)| n == name)
            .map(Self::handle)
    }

    fn handler(&self, function: Address) -> Option<ManagedHandler> {
        let index = function.get() - 1;
        self.methods.read().get(index).map(|(_, h)| h.clone())
    }

    fn initialize(&self, tables: Address, checksum: i32) -> Option<Address> {
        if checksum != self.checksum {
            self.callbacks.host_error(&format!(
                "host tables checksum {checksum} does not match runtime checksum {}",
                self.checksum
            ));
            return None;
        }
        self.state.write().initialized = true;
        Some(tables)
    }

    fn load(&self) -> Option<Address> {
        let mut state = self.state.write();
        if !state.initialized {
            drop(state);
            self.callbacks.exception("assemblies loaded before initialization");
            return None;
        }
        state.loaded = true;
        drop(state);
        self.callbacks.log(LogLevel::Display, "user assemblies loaded");
        Address::new(1)
    }

    fn unload(&self) {
        let was_loaded = std::mem::take(&mut self.state.write().loaded);
        if was_loaded {
            self.callbacks.log(LogLevel::Display, "user assemblies unloaded");
        }
    }

    fn find(&self, name: &str, optional: bool) -> Option<Address> {
        let found = if self.is_loaded() { self.lookup(name) } else { None };
        if found.is_none() && !optional {
            self.callbacks.exception(&format!("method {name} not found"));
        }
        found
    }

    fn execute(&self, function: Address, value: &Argument) {
        match self.handler(function) {
            Some(handler) => handler(value),
            None => self
                .callbacks
                .exception(&format!("execute on unknown function {function:?}")),
        }
    }
}

impl ManagedChannel for EmbeddedRuntime {
    fn send(&self, command: &Command<'_>) -> Option<Address> {
        match command {
            Command::Initialize { tables, checksum } => self.initialize(*tables, *checksum),
            Command::LoadAssemblies => self.load(),
            Command::UnloadAssemblies => {
                self.unload();
                None
            }
            Command::Find { method, optional } => match method.to_str() {
                Ok(name) => self.find(name, *optional),
                Err(_) => {
                    self.callbacks.exception(&ProtocolError::InvalidName.to_string());
                    None
                }
            },
            Command::Execute { function, value } => {
                self.execute(*function, value);
                None
            }
        }
    }
}

impl fmt::Debug for EmbeddedRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = *self.state.read();
        f.debug_struct("EmbeddedRuntime")
            .field("checksum", &self.checksum)
            .field("initialized", &state.initialized)
            .field("loaded", &state.loaded)
            .field("methods", &self.methods.read().len())
            .finish()
    }
}

/// [`RuntimeHost`] serving an [`EmbeddedRuntime`].
#[derive(Debug)]
pub struct EmbeddedHost {
    runtime: Arc<EmbeddedRuntime>,
    running: bool,
}

impl EmbeddedHost {
    /// Wraps a runtime.
    #[must_use]
    pub fn new(runtime: Arc<EmbeddedRuntime>) -> Self {
        Self {
            runtime,
            running: false,
        }
    }

    /// The hosted runtime.
    #[must_use]
    pub fn runtime(&self) -> &Arc<EmbeddedRuntime> {
        &self.runtime
    }
}

impl RuntimeHost for EmbeddedHost {
    fn start(&mut self, _config: &BridgeConfig) -> Result<Arc<dyn ManagedChannel>, HostingError> {
        if self.running {
            return Err(HostingError::Startup("embedded runtime already running".into()));
        }
        self.running = true;
        Ok(self.runtime.clone())
    }

    fn stop(&mut self) {
        if std::mem::take(&mut self.running) {
            *self.runtime.state.write() = RuntimeState::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::sync::atomic::{AtomicU32, Ordering};

    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        lines: Mutex<Vec<String>>,
    }

    impl HostCallbacks for Recorder {
        fn host_error(&self, message: &str) {
            self.lines.lock().push(format!("fatal:{message}"));
        }

        fn exception(&self, message: &str) {
            self.lines.lock().push(format!("exception:{message}"));
        }

        fn log(&self, level: LogLevel, message: &str) {
            self.lines.lock().push(format!("{level}:{message}"));
        }
    }

    fn runtime(checksum: i32) -> (EmbeddedRuntime, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        (EmbeddedRuntime::new(checksum, recorder.clone()), recorder)
    }

    fn tables() -> Address {
        Address::new(0x7000).unwrap()
    }

    #[test]
    fn test_checksum_mismatch_is_fatal() {
        let (runtime, recorder) = runtime(5);
        assert_eq!(runtime.send(&Command::initialize(tables(), 4)), None);
        assert!(!runtime.is_initialized());
        assert!(recorder.lines.lock()[0].starts_with("fatal:"));

        assert_eq!(runtime.send(&Command::initialize(tables(), 5)), Some(tables()));
        assert!(runtime.is_initialized());
    }

    #[test]
    fn test_load_requires_initialize() {
        let (runtime, recorder) = runtime(0);
        assert_eq!(runtime.send(&Command::LoadAssemblies), None);
        assert_eq!(
            *recorder.lines.lock(),
            vec!["exception:assemblies loaded before initialization".to_owned()]
        );
    }

    #[test]
    fn test_find_respects_optional() {
        let (runtime, recorder) = runtime(0);
        let handle = runtime.register("OnWorldBegin", |_| {});
        runtime.send(&Command::initialize(tables(), 0));
        runtime.send(&Command::LoadAssemblies);
        recorder.lines.lock().clear();

        let name = CString::new("OnWorldBegin").unwrap();
        assert_eq!(runtime.send(&Command::find(&name, false)), Some(handle));

        let missing = CString::new("OnActorHit").unwrap();
        assert_eq!(runtime.send(&Command::find(&missing, true)), None);
        assert!(recorder.lines.lock().is_empty());

        assert_eq!(runtime.send(&Command::find(&missing, false)), None);
        assert_eq!(
            *recorder.lines.lock(),
            vec!["exception:method OnActorHit not found".to_owned()]
        );
    }

    #[test]
    fn test_find_before_load_misses() {
        let (runtime, _recorder) = runtime(0);
        runtime.register("OnWorldBegin", |_| {});
        runtime.send(&Command::initialize(tables(), 0));

        let name = CString::new("OnWorldBegin").unwrap();
        assert_eq!(runtime.send(&Command::find(&name, true)), None);
    }

    #[test]
    fn test_find_rejects_non_utf8_name() {
        let (runtime, recorder) = runtime(0);
        runtime.register("OnWorldBegin", |_| {});
        runtime.send(&Command::initialize(tables(), 0));
        runtime.send(&Command::LoadAssemblies);
        recorder.lines.lock().clear();

        let name = CString::new(vec![0xff, 0xfe]).unwrap();
        assert_eq!(runtime.send(&Command::find(&name, true)), None);
        assert_eq!(
            *recorder.lines.lock(),
            vec!["exception:method name is not valid UTF-8".to_owned()]
        );
    }

    #[test]
    fn test_execute_passes_argument() {
        let (runtime, recorder) = runtime(0);
        let seen = Arc::new(AtomicU32::new(0));
        let sink = seen.clone();
        let handle = runtime.register("Count", move |value| {
            if let Argument::Integer(n) = value {
                sink.store(*n, Ordering::SeqCst);
            }
        });

        runtime.send(&Command::execute_with(handle, Argument::Integer(9)));
        assert_eq!(seen.load(Ordering::SeqCst), 9);

        runtime.send(&Command::execute(Address::new(99).unwrap()));
        assert_eq!(recorder.lines.lock().len(), 1);
    }

    #[test]
    fn test_reregister_keeps_handle() {
        let (runtime, _recorder) = runtime(0);
        let first = runtime.register("Tick", |_| {});
        let second = runtime.register("Tick", |_| {});
        assert_eq!(first, second);
    }

    #[test]
    fn test_host_start_stop() {
        let (runtime, _recorder) = runtime(0);
        let mut host = EmbeddedHost::new(Arc::new(runtime));
        let config = BridgeConfig::default();

        let channel = host.start(&config).unwrap();
        assert!(host.start(&config).is_err());
        channel.send(&Command::initialize(tables(), 0));
        assert!(host.runtime().is_initialized());

        host.stop();
        assert!(!host.runtime().is_initialized());
        assert!(host.start(&config).is_ok());
    }
}
