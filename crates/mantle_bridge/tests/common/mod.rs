//! Host doubles shared by the integration tests.

#![allow(dead_code, missing_docs)]

use std::sync::Arc;

use mantle_bridge::protocol::{Address, Argument, EventSlot, FunctionTable, FunctionTables, LogLevel};
use mantle_bridge::{
    BridgeConfig, BridgeResult, DelegateHandle, EmbeddedHost, EmbeddedRuntime, HostCallbacks,
    HostServices, HostingError, ManagedChannel, Module, RuntimeHost, TickFunction, TickGraph,
    TickGroup, WorldDelegates, WorldEvent,
};
use parking_lot::Mutex;

/// Everything the doubles observed, in one place.
#[derive(Default)]
pub struct HostLog {
    pub registered: Mutex<Vec<(TickGroup, Arc<dyn TickFunction>)>>,
    pub registrations: Mutex<usize>,
    pub unregistrations: Mutex<usize>,
    pub subscriptions: Mutex<Vec<(DelegateHandle, WorldEvent)>>,
    pub unsubscriptions: Mutex<usize>,
    pub starts: Mutex<usize>,
    pub stops: Mutex<usize>,
    pub reports: Mutex<Vec<String>>,
    pub events: Mutex<Vec<(EventSlot, Argument)>>,
}

impl HostLog {
    pub fn reports(&self) -> Vec<String> {
        self.reports.lock().clone()
    }

    pub fn events(&self) -> Vec<EventSlot> {
        self.events.lock().iter().map(|(slot, _)| *slot).collect()
    }

    pub fn fatal_reports(&self) -> usize {
        self.reports.lock().iter().filter(|r| r.starts_with("fatal:")).count()
    }

    /// Runs every registered hook once, as the host does each frame.
    pub fn run_frame(&self, delta_time: f32) {
        let hooks: Vec<_> = self.registered.lock().iter().map(|(_, h)| h.clone()).collect();
        for hook in hooks {
            hook.execute_tick(
                delta_time,
                mantle_bridge::LevelTick::All,
                mantle_bridge::NamedThread(0),
                &mantle_bridge::CompletionEvent(0),
            );
        }
    }
}

pub struct Graph(pub Arc<HostLog>);

impl TickGraph for Graph {
    fn register(&mut self, group: TickGroup, function: Arc<dyn TickFunction>) -> BridgeResult<()> {
        *self.0.registrations.lock() += 1;
        self.0.registered.lock().push((group, function));
        Ok(())
    }

    fn unregister(&mut self, function: &Arc<dyn TickFunction>) {
        *self.0.unregistrations.lock() += 1;
        self.0
            .registered
            .lock()
            .retain(|(_, hook)| !Arc::ptr_eq(hook, function));
    }
}

pub struct Delegates {
    host: Arc<HostLog>,
    next: u64,
}

impl Delegates {
    pub fn new(host: Arc<HostLog>) -> Self {
        Self { host, next: 0 }
    }
}

impl WorldDelegates for Delegates {
    fn subscribe(&mut self, event: WorldEvent) -> DelegateHandle {
        self.next += 1;
        let handle = DelegateHandle(self.next);
        self.host.subscriptions.lock().push((handle, event));
        handle
    }

    fn unsubscribe(&mut self, handle: DelegateHandle) {
        *self.host.unsubscriptions.lock() += 1;
        self.host.subscriptions.lock().retain(|(h, _)| *h != handle);
    }
}

pub struct Callbacks(pub Arc<HostLog>);

impl HostCallbacks for Callbacks {
    fn host_error(&self, message: &str) {
        self.0.reports.lock().push(format!("fatal:{message}"));
    }

    fn exception(&self, message: &str) {
        self.0.reports.lock().push(format!("exception:{message}"));
    }

    fn log(&self, level: LogLevel, message: &str) {
        if level == LogLevel::Fatal {
            self.host_error(message);
        } else {
            self.0.reports.lock().push(format!("{level}:{message}"));
        }
    }
}

/// Counts start/stop around an embedded runtime.
pub struct CountingHost {
    host: Arc<HostLog>,
    inner: EmbeddedHost,
}

impl RuntimeHost for CountingHost {
    fn start(&mut self, config: &BridgeConfig) -> Result<Arc<dyn ManagedChannel>, HostingError> {
        *self.host.starts.lock() += 1;
        self.inner.start(config)
    }

    fn stop(&mut self) {
        *self.host.stops.lock() += 1;
        self.inner.stop();
    }
}

/// Host whose runtime never comes up.
pub struct BrokenHost;

impl RuntimeHost for BrokenHost {
    fn start(&mut self, _config: &BridgeConfig) -> Result<Arc<dyn ManagedChannel>, HostingError> {
        Err(HostingError::Startup("no runtime installed".into()))
    }

    fn stop(&mut self) {}
}

/// Two native functions, so checksum 2.
pub fn function_tables() -> FunctionTables {
    let mut tables = FunctionTables::new();
    let mut world = FunctionTable::new("World");
    world.push(Address::new(0x1000).unwrap()).unwrap();
    world.push(Address::new(0x1008).unwrap()).unwrap();
    tables.register(world).unwrap();
    tables
}

pub struct Harness {
    pub module: Module,
    pub runtime: Arc<EmbeddedRuntime>,
    pub host: Arc<HostLog>,
}

/// A module over an embedded runtime expecting `checksum`, with a handler
/// for every event slot in `handled`.
pub fn harness_with(checksum: i32, handled: &[EventSlot]) -> Harness {
    harness_configured(BridgeConfig::for_project("/opt/game"), checksum, handled)
}

/// As [`harness_with`], with an explicit configuration.
pub fn harness_configured(config: BridgeConfig, checksum: i32, handled: &[EventSlot]) -> Harness {
    let host = Arc::new(HostLog::default());
    let callbacks: Arc<dyn HostCallbacks> = Arc::new(Callbacks(host.clone()));
    let runtime = Arc::new(EmbeddedRuntime::new(checksum, callbacks.clone()));

    for &slot in handled {
        let host = host.clone();
        runtime.register(slot.name(), move |value| {
            host.events.lock().push((slot, *value));
        });
    }

    let services = HostServices {
        runtime: Box::new(CountingHost {
            host: host.clone(),
            inner: EmbeddedHost::new(runtime.clone()),
        }),
        ticks: Box::new(Graph(host.clone())),
        delegates: Box::new(Delegates::new(host.clone())),
        callbacks,
    };
    let module = Module::new(config, services, function_tables());

    Harness {
        module,
        runtime,
        host,
    }
}

/// A module whose runtime handles every event slot.
pub fn harness() -> Harness {
    harness_with(2, &EventSlot::ALL)
}
