//! # World Tick Hooks
//!
//! One scheduling unit per physics phase, registered with the host's
//! per-frame graph.
//!
//! ## Design
//!
//! The hooks must:
//! - Never block, on the completion handle or anything else
//! - Never reach the managed side unless the runtime is running and the world
//!   has started
//! - Be callable from any host worker thread

use std::fmt;
use std::sync::Arc;

use mantle_protocol::{Argument, EventSlot, TickPhase};

use crate::context::RuntimeContext;
use crate::error::BridgeResult;

/// Host scheduling group a hook runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TickGroup {
    /// Before physics simulation starts.
    PrePhysics,
    /// Concurrently with physics simulation.
    DuringPhysics,
    /// After physics simulation ends.
    EndPhysics,
    /// After all actor and component updates.
    PostUpdateWork,
}

impl TickGroup {
    /// Group a phase's hook is registered in.
    #[must_use]
    pub const fn for_phase(phase: TickPhase) -> Self {
        match phase {
            TickPhase::PrePhysics => Self::PrePhysics,
            TickPhase::DuringPhysics => Self::DuringPhysics,
            TickPhase::PostPhysics => Self::EndPhysics,
            TickPhase::PostUpdate => Self::PostUpdateWork,
        }
    }
}

/// Kind of frame the host is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum LevelTick {
    /// Only time advances.
    TimeOnly,
    /// Only viewports update.
    ViewportsOnly,
    /// Full update.
    #[default]
    All,
    /// Paused frame.
    PauseTick,
}

/// Host thread identifier, opaque to the bridge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct NamedThread(pub u32);

/// Host completion handle for the current tick. Never waited on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct CompletionEvent(pub u64);

/// A unit of per-frame work the host scheduler calls.
pub trait TickFunction: Send + Sync {
    /// Runs this frame's work.
    fn execute_tick(
        &self,
        delta_time: f32,
        tick_type: LevelTick,
        thread: NamedThread,
        completion: &CompletionEvent,
    );

    /// Name shown in host diagnostics.
    fn diagnostic_message(&self) -> String;
}

/// Host per-frame scheduler.
pub trait TickGraph: Send {
    /// Adds a tick function to a group.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::TickRegistration`](crate::BridgeError::TickRegistration)
    /// if the host refuses it.
    fn register(&mut self, group: TickGroup, function: Arc<dyn TickFunction>) -> BridgeResult<()>;

    /// Removes a previously registered tick function.
    fn unregister(&mut self, function: &Arc<dyn TickFunction>);
}

impl RuntimeContext {
    /// Forwards one phase tick to the managed side.
    ///
    /// No-op unless [`RuntimeContext::is_ticking`]. The first forwarded tick
    /// after begin play, whatever its phase, raises `OnWorldPostBegin` first.
    pub fn tick(&self, phase: TickPhase, delta_time: f32) {
        if !self.is_ticking() {
            return;
        }
        if self.take_post_begin() {
            self.raise(EventSlot::OnWorldPostBegin, Argument::None);
        }
        self.raise(phase.event(), Argument::Single(delta_time));
    }
}

/// Tick function forwarding one phase into the runtime context.
pub struct TickHook {
    phase: TickPhase,
    context: Arc<RuntimeContext>,
}

impl TickHook {
    /// Creates the hook for a phase.
    #[must_use]
    pub fn new(phase: TickPhase, context: Arc<RuntimeContext>) -> Self {
        Self { phase, context }
    }

    /// Phase this hook forwards.
    #[must_use]
    pub const fn phase(&self) -> TickPhase {
        self.phase
    }

    /// Scheduling group the hook belongs in.
    #[must_use]
    pub const fn group(&self) -> TickGroup {
        TickGroup::for_phase(self.phase)
    }
}

impl TickFunction for TickHook {
    fn execute_tick(
        &self,
        delta_time: f32,
        _tick_type: LevelTick,
        _thread: NamedThread,
        _completion: &CompletionEvent,
    ) {
        self.context.tick(self.phase, delta_time);
    }

    fn diagnostic_message(&self) -> String {
        format!("MantleTickHook[{}]", self.phase)
    }
}

impl fmt::Debug for TickHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickHook").field("phase", &self.phase).finish()
    }
}

/// The set of hooks owned by the module, plus which of them are registered.
pub(crate) struct TickHooks {
    hooks: Vec<(TickGroup, Arc<dyn TickFunction>)>,
    registered: Vec<Arc<dyn TickFunction>>,
}

impl TickHooks {
    /// Builds one hook per configured phase, in frame order.
    pub(crate) fn new(context: &Arc<RuntimeContext>, phases: &[TickPhase]) -> Self {
        let hooks = TickPhase::ALL
            .into_iter()
            .filter(|phase| phases.contains(phase))
            .map(|phase| {
                let hook: Arc<dyn TickFunction> = Arc::new(TickHook::new(phase, context.clone()));
                (TickGroup::for_phase(phase), hook)
            })
            .collect();
        Self {
            hooks,
            registered: Vec::new(),
        }
    }

    pub(crate) fn is_registered(&self) -> bool {
        !self.registered.is_empty()
    }

    /// Registers every hook. On failure the ones already registered are
    /// removed again.
    pub(crate) fn register(&mut self, graph: &mut dyn TickGraph) -> BridgeResult<()> {
        if self.is_registered() {
            return Ok(());
        }
        for (group, hook) in &self.hooks {
            if let Err(e) = graph.register(*group, hook.clone()) {
                self.unregister(graph);
                return Err(e);
            }
            self.registered.push(hook.clone());
        }
        Ok(())
    }

    /// Unregisters whatever is registered. Returns how many were removed.
    pub(crate) fn unregister(&mut self, graph: &mut dyn TickGraph) -> usize {
        let removed = self.registered.len();
        for hook in self.registered.drain(..) {
            graph.unregister(&hook);
        }
        removed
    }
}
