//! # Runtime Context
//!
//! The single live runtime instance of the process, shared between the module
//! and the tick hooks.
//!
//! ```text
//!            ┌──────────────────── RuntimeContext ───────────────────┐
//! Module ──► │ status        Stopped ─► Idle ◄─► Running             │
//!            │ world ticks   Stopped ─► Registered ◄─► Started       │
//! TickHook ► │ channel       Arc<dyn ManagedChannel> (serialized)    │
//!            │ events        [u64; 128] resolved handler addresses   │
//!            └───────────────────────────────────────────────────────┘
//! ```
//!
//! Status and tick state are atomics so the tick hooks can check them from
//! any worker thread without taking a lock.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use mantle_protocol::{Address, EventSlot, EVENT_CAPACITY};
use parking_lot::{ReentrantMutex, RwLock};

use crate::channel::ManagedChannel;

/// Process-wide runtime status.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// No runtime.
    Stopped = 0,
    /// Runtime initialized, user assemblies not loaded.
    Idle = 1,
    /// User assemblies loaded, events flow.
    Running = 2,
}

impl Status {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Idle,
            2 => Self::Running,
            _ => Self::Stopped,
        }
    }
}

/// Whether the tick hooks are attached to the active world.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorldTickState {
    /// Not attached.
    Stopped = 0,
    /// Attached, world not playing yet.
    Registered = 1,
    /// Attached and the world is playing.
    Started = 2,
}

impl WorldTickState {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Registered,
            2 => Self::Started,
            _ => Self::Stopped,
        }
    }
}

/// Resolved managed event handlers.
///
/// Boxed so the address handed to the managed side at `Initialize` stays
/// valid for the context's lifetime.
pub(crate) struct EventTable {
    slots: Box<[usize; EVENT_CAPACITY]>,
}

impl EventTable {
    fn new() -> Self {
        Self {
            slots: Box::new([0; EVENT_CAPACITY]),
        }
    }

    pub(crate) fn get(&self, slot: EventSlot) -> Option<Address> {
        Address::new(self.slots[slot.index()])
    }

    pub(crate) fn set(&mut self, slot: EventSlot, handler: Option<Address>) {
        self.slots[slot.index()] = Address::raw_or_null(handler);
    }

    pub(crate) fn clear(&mut self) {
        self.slots.fill(0);
    }

    fn address(&self) -> Option<Address> {
        Address::from_ptr(self.slots.as_ptr())
    }
}

/// Shared runtime state.
pub struct RuntimeContext {
    status: AtomicU8,
    world_tick_state: AtomicU8,
    post_begin_pending: AtomicBool,
    channel: RwLock<Option<Arc<dyn ManagedChannel>>>,
    /// Serializes channel access. Re-entrant so a managed handler can call
    /// back into a native function that dispatches again.
    pub(crate) dispatch: ReentrantMutex<()>,
    pub(crate) events: RwLock<EventTable>,
}

impl RuntimeContext {
    /// Creates a stopped context with no channel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: AtomicU8::new(Status::Stopped as u8),
            world_tick_state: AtomicU8::new(WorldTickState::Stopped as u8),
            post_begin_pending: AtomicBool::new(false),
            channel: RwLock::new(None),
            dispatch: ReentrantMutex::new(()),
            events: RwLock::new(EventTable::new()),
        }
    }

    /// Current runtime status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> Status {
        Status::from_u8(self.status.load(Ordering::Acquire))
    }

    pub(crate) fn set_status(&self, status: Status) {
        let previous = Status::from_u8(self.status.swap(status as u8, Ordering::AcqRel));
        if previous != status {
            tracing::debug!("runtime status {:?} -> {:?}", previous, status);
        }
    }

    /// Current world tick registration state.
    #[inline]
    #[must_use]
    pub fn world_tick_state(&self) -> WorldTickState {
        WorldTickState::from_u8(self.world_tick_state.load(Ordering::Acquire))
    }

    pub(crate) fn set_world_tick_state(&self, state: WorldTickState) {
        let previous =
            WorldTickState::from_u8(self.world_tick_state.swap(state as u8, Ordering::AcqRel));
        if previous != state {
            tracing::debug!("world tick state {:?} -> {:?}", previous, state);
        }
    }

    /// Returns true if events should reach the managed side this frame.
    #[inline]
    #[must_use]
    pub fn is_ticking(&self) -> bool {
        self.status() == Status::Running && self.world_tick_state() == WorldTickState::Started
    }

    pub(crate) fn arm_post_begin(&self, armed: bool) {
        self.post_begin_pending.store(armed, Ordering::Release);
    }

    /// Consumes the pending post-begin notification, true at most once per arm.
    pub(crate) fn take_post_begin(&self) -> bool {
        self.post_begin_pending.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn attach(&self, channel: Arc<dyn ManagedChannel>) {
        *self.channel.write() = Some(channel);
    }

    pub(crate) fn detach(&self) -> bool {
        self.channel.write().take().is_some()
    }

    pub(crate) fn channel(&self) -> Option<Arc<dyn ManagedChannel>> {
        self.channel.read().clone()
    }

    /// Returns true if a managed channel is attached.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.channel.read().is_some()
    }

    /// Handler resolved for an event slot.
    #[must_use]
    pub fn event(&self, slot: EventSlot) -> Option<Address> {
        self.events.read().get(slot)
    }

    /// Address of the event table, as handed to the managed side.
    #[must_use]
    pub fn events_address(&self) -> Option<Address> {
        self.events.read().address()
    }
}

impl Default for RuntimeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RuntimeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeContext")
            .field("status", &self.status())
            .field("world_tick_state", &self.world_tick_state())
            .field("attached", &self.is_attached())
            .finish_non_exhaustive()
    }
}
