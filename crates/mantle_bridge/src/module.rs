//! # Plugin Module
//!
//! Owns the runtime context and drives it through the host's lifecycle.
//!
//! ## Lifecycle
//!
//! ```text
//! startup ──► post-initialization ──► begin play ──► end play ──► cleanup ──► shutdown
//!  Idle        ticks Registered        Running        Idle         ticks Stopped  Stopped
//!                                      ticks Started  ticks Registered
//! ```
//!
//! Every teardown step checks what is actually live before undoing it, so
//! shutdown and cleanup can run in any order and any number of times.

use std::fmt;
use std::sync::Arc;

use mantle_protocol::{Argument, EventSlot, FunctionTables, ObjectRef};

use crate::callbacks::{self, HostCallbacks};
use crate::config::BridgeConfig;
use crate::context::{RuntimeContext, Status, WorldTickState};
use crate::error::{BridgeError, BridgeResult};
use crate::hosting::RuntimeHost;
use crate::tables::HostTables;
use crate::tick::{TickGraph, TickHooks};
use crate::world::{DelegateHandle, WorldDelegates, WorldEvent, WorldHandle};

/// Module load state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModuleState {
    /// Not started, or shut down.
    Unloaded,
    /// Runtime initialized and delegates subscribed.
    Started,
}

/// The host services a module talks to.
pub struct HostServices {
    /// Brings the managed runtime up and down.
    pub runtime: Box<dyn RuntimeHost>,
    /// Per-frame scheduler.
    pub ticks: Box<dyn TickGraph>,
    /// World notifications.
    pub delegates: Box<dyn WorldDelegates>,
    /// Where fatal errors, exceptions and managed logs go.
    pub callbacks: Arc<dyn HostCallbacks>,
}

/// The bridge plugin module.
pub struct Module {
    config: BridgeConfig,
    services: HostServices,
    context: Arc<RuntimeContext>,
    tables: HostTables,
    hooks: TickHooks,
    subscriptions: Vec<DelegateHandle>,
    hosting: bool,
    state: ModuleState,
}

impl Module {
    /// Creates an unloaded module.
    ///
    /// `functions` are the native tables exposed to the managed side; their
    /// slot count is the `Initialize` checksum.
    #[must_use]
    pub fn new(config: BridgeConfig, services: HostServices, functions: FunctionTables) -> Self {
        let context = Arc::new(RuntimeContext::new());
        let tables = HostTables::new(&context, functions);
        let hooks = TickHooks::new(&context, &config.tick_phases);
        Self {
            config,
            services,
            context,
            tables,
            hooks,
            subscriptions: Vec::new(),
            hosting: false,
            state: ModuleState::Unloaded,
        }
    }

    /// Shared runtime context.
    #[must_use]
    pub fn context(&self) -> &Arc<RuntimeContext> {
        &self.context
    }

    /// Current module state.
    #[must_use]
    pub fn state(&self) -> ModuleState {
        self.state
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Tables handed to the managed side.
    #[must_use]
    pub fn tables(&self) -> &HostTables {
        &self.tables
    }

    /// Starts the managed runtime and subscribes to world events.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::InvalidConfig`] if the configuration is unusable
    /// - [`BridgeError::Hosting`] if the runtime can't be started; also
    ///   reported as a fatal host error
    /// - [`BridgeError::InitializationRejected`] if the managed side refuses
    ///   the tables
    pub fn startup(&mut self) -> BridgeResult<()> {
        if self.state == ModuleState::Started {
            return Err(BridgeError::InvalidTransition {
                operation: "startup",
                state: self.state,
            });
        }
        self.config.validate()?;
        callbacks::install(self.services.callbacks.clone());

        let channel = match self.services.runtime.start(&self.config) {
            Ok(channel) => channel,
            Err(e) => {
                self.services.callbacks.host_error(&e.to_string());
                callbacks::release(&self.services.callbacks);
                return Err(e.into());
            }
        };
        self.hosting = true;
        self.context.attach(channel);

        let checksum = self.tables.checksum();
        if !self.context.initialize(self.tables.root_address(), checksum) {
            tracing::error!("managed runtime rejected initialization (checksum {})", checksum);
            self.context.detach();
            self.stop_hosting();
            callbacks::release(&self.services.callbacks);
            return Err(BridgeError::InitializationRejected { checksum });
        }
        self.context.set_status(Status::Idle);

        for event in [WorldEvent::PostInitialization, WorldEvent::Cleanup] {
            let handle = self.services.delegates.subscribe(event);
            self.subscriptions.push(handle);
        }

        self.state = ModuleState::Started;
        tracing::info!(
            "mantle module started (project {}, checksum {})",
            self.config.project_path.display(),
            checksum
        );
        Ok(())
    }

    /// Registers the tick hooks for a freshly initialized game world.
    ///
    /// If play has already begun the hooks start forwarding right away.
    /// Ignored for non-game worlds and while hooks are already registered.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::TickRegistration`] if the host refuses a hook.
    pub fn on_world_post_initialization(&mut self, world: WorldHandle) -> BridgeResult<()> {
        if self.state != ModuleState::Started || !world.kind.is_eligible() {
            return Ok(());
        }
        if self.context.world_tick_state() != WorldTickState::Stopped {
            tracing::debug!("world {} initialized while ticks are live, ignoring", world.id);
            return Ok(());
        }
        self.hooks.register(self.services.ticks.as_mut())?;
        // Play may already have begun on this world.
        let state = if self.context.status() == Status::Running {
            WorldTickState::Started
        } else {
            WorldTickState::Registered
        };
        self.context.set_world_tick_state(state);
        tracing::debug!("tick hooks registered for world {} ({:?})", world.id, state);
        Ok(())
    }

    /// Loads user assemblies and starts forwarding events.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::InvalidTransition`] before startup
    /// - [`BridgeError::AssembliesRejected`] if loading fails
    pub fn on_world_begin_play(&mut self, world: WorldHandle) -> BridgeResult<()> {
        if self.state != ModuleState::Started {
            return Err(BridgeError::InvalidTransition {
                operation: "begin play",
                state: self.state,
            });
        }
        if !world.kind.is_eligible() || self.context.status() == Status::Running {
            return Ok(());
        }
        if !self.context.load_assemblies() {
            return Err(BridgeError::AssembliesRejected);
        }
        let resolved = self.context.resolve_events();
        self.context.raise(EventSlot::OnWorldBegin, Argument::None);
        self.context.arm_post_begin(true);
        if self.context.world_tick_state() == WorldTickState::Registered {
            self.context.set_world_tick_state(WorldTickState::Started);
        }
        tracing::info!("world {} began play, {} event handlers", world.id, resolved);
        Ok(())
    }

    /// Stops forwarding events and unloads user assemblies.
    pub fn on_world_end_play(&mut self, world: WorldHandle) {
        if self.context.status() != Status::Running {
            return;
        }
        self.end_play();
        tracing::info!("world {} ended play", world.id);
    }

    /// Tears down tick hooks for a world that's going away.
    pub fn on_world_cleanup(&mut self, world: WorldHandle, session_ended: bool, cleanup_resources: bool) {
        if !world.kind.is_eligible() {
            return;
        }
        tracing::debug!(
            "world {} cleanup (session ended: {}, cleanup resources: {})",
            world.id,
            session_ended,
            cleanup_resources
        );
        if self.context.status() == Status::Running {
            self.end_play();
        }
        self.release_ticks();
    }

    /// Forwards an actor or component delegate notification.
    ///
    /// Returns true if a managed handler received it.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::DelegateMismatch`] if the object kind doesn't
    /// belong to the slot.
    pub fn dispatch_delegate(&self, slot: EventSlot, object: ObjectRef) -> BridgeResult<bool> {
        if slot.delegate_kind() != Some(object.kind()) {
            return Err(BridgeError::DelegateMismatch {
                slot,
                kind: object.kind(),
            });
        }
        Ok(self.context.raise(slot, Argument::Object(object)))
    }

    /// Unsubscribes, unregisters and unloads whatever is live.
    pub fn shutdown(&mut self) {
        if self.context.status() == Status::Running {
            self.end_play();
        }
        for handle in self.subscriptions.drain(..) {
            self.services.delegates.unsubscribe(handle);
        }
        self.release_ticks();
        self.context.detach();
        self.stop_hosting();
        self.context.set_status(Status::Stopped);

        if self.state == ModuleState::Started {
            callbacks::release(&self.services.callbacks);
            self.state = ModuleState::Unloaded;
            tracing::info!("mantle module shut down");
        }
    }

    fn end_play(&mut self) {
        self.context.raise(EventSlot::OnWorldEnd, Argument::None);
        self.context.arm_post_begin(false);
        self.context.clear_events();
        self.context.unload_assemblies();
        if self.context.world_tick_state() == WorldTickState::Started {
            self.context.set_world_tick_state(WorldTickState::Registered);
        }
    }

    fn release_ticks(&mut self) {
        let removed = self.hooks.unregister(self.services.ticks.as_mut());
        if removed > 0 {
            tracing::debug!("unregistered {} tick hooks", removed);
        }
        self.context.set_world_tick_state(WorldTickState::Stopped);
    }

    fn stop_hosting(&mut self) {
        if self.hosting {
            self.services.runtime.stop();
            self.hosting = false;
        }
    }
}

impl Drop for Module {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("state", &self.state)
            .field("context", &self.context)
            .field("hosting", &self.hosting)
            .finish_non_exhaustive()
    }
}
