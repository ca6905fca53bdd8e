//! # Event Slots and Tick Phases
//!
//! Managed handlers are resolved by name once user assemblies load and stored
//! in a fixed table indexed by [`EventSlot`]. The order below is the wire
//! order of that table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::argument::ObjectKind;

/// Capacity of the event table shared with the managed side.
pub const EVENT_CAPACITY: usize = 128;

/// A managed event handler slot.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventSlot {
    /// World began play.
    OnWorldBegin = 0,
    /// First frame after the world began play.
    OnWorldPostBegin = 1,
    /// Pre-physics tick.
    OnWorldPrePhysicsTick = 2,
    /// During-physics tick.
    OnWorldDuringPhysicsTick = 3,
    /// Post-physics tick.
    OnWorldPostPhysicsTick = 4,
    /// Post-update tick.
    OnWorldPostUpdateTick = 5,
    /// World ended play.
    OnWorldEnd = 6,
    /// Actor begin overlap.
    OnActorBeginOverlap = 7,
    /// Actor end overlap.
    OnActorEndOverlap = 8,
    /// Actor hit.
    OnActorHit = 9,
    /// Cursor entered an actor.
    OnActorBeginCursorOver = 10,
    /// Cursor left an actor.
    OnActorEndCursorOver = 11,
    /// Component begin overlap.
    OnComponentBeginOverlap = 12,
    /// Component end overlap.
    OnComponentEndOverlap = 13,
    /// Component hit.
    OnComponentHit = 14,
    /// Cursor entered a component.
    OnComponentBeginCursorOver = 15,
    /// Cursor left a component.
    OnComponentEndCursorOver = 16,
}

impl EventSlot {
    /// Every slot, in table order.
    pub const ALL: [Self; 17] = [
        Self::OnWorldBegin,
        Self::OnWorldPostBegin,
        Self::OnWorldPrePhysicsTick,
        Self::OnWorldDuringPhysicsTick,
        Self::OnWorldPostPhysicsTick,
        Self::OnWorldPostUpdateTick,
        Self::OnWorldEnd,
        Self::OnActorBeginOverlap,
        Self::OnActorEndOverlap,
        Self::OnActorHit,
        Self::OnActorBeginCursorOver,
        Self::OnActorEndCursorOver,
        Self::OnComponentBeginOverlap,
        Self::OnComponentEndOverlap,
        Self::OnComponentHit,
        Self::OnComponentBeginCursorOver,
        Self::OnComponentEndCursorOver,
    ];

    /// Index into the event table.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Name the managed handler is resolved by.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::OnWorldBegin => "OnWorldBegin",
            Self::OnWorldPostBegin => "OnWorldPostBegin",
            Self::OnWorldPrePhysicsTick => "OnWorldPrePhysicsTick",
            Self::OnWorldDuringPhysicsTick => "OnWorldDuringPhysicsTick",
            Self::OnWorldPostPhysicsTick => "OnWorldPostPhysicsTick",
            Self::OnWorldPostUpdateTick => "OnWorldPostUpdateTick",
            Self::OnWorldEnd => "OnWorldEnd",
            Self::OnActorBeginOverlap => "OnActorBeginOverlap",
            Self::OnActorEndOverlap => "OnActorEndOverlap",
            Self::OnActorHit => "OnActorHit",
            Self::OnActorBeginCursorOver => "OnActorBeginCursorOver",
            Self::OnActorEndCursorOver => "OnActorEndCursorOver",
            Self::OnComponentBeginOverlap => "OnComponentBeginOverlap",
            Self::OnComponentEndOverlap => "OnComponentEndOverlap",
            Self::OnComponentHit => "OnComponentHit",
            Self::OnComponentBeginCursorOver => "OnComponentBeginCursorOver",
            Self::OnComponentEndCursorOver => "OnComponentEndCursorOver",
        }
    }

    /// The delegate category this slot receives, `None` for world events.
    #[must_use]
    pub const fn delegate_kind(self) -> Option<ObjectKind> {
        match self {
            Self::OnActorBeginOverlap | Self::OnActorEndOverlap => {
                Some(ObjectKind::ActorOverlapDelegate)
            }
            Self::OnActorHit => Some(ObjectKind::ActorHitDelegate),
            Self::OnActorBeginCursorOver | Self::OnActorEndCursorOver => {
                Some(ObjectKind::ActorCursorDelegate)
            }
            Self::OnComponentBeginOverlap | Self::OnComponentEndOverlap => {
                Some(ObjectKind::ComponentOverlapDelegate)
            }
            Self::OnComponentHit => Some(ObjectKind::ComponentHitDelegate),
            Self::OnComponentBeginCursorOver | Self::OnComponentEndCursorOver => {
                Some(ObjectKind::ComponentCursorDelegate)
            }
            _ => None,
        }
    }
}

impl fmt::Display for EventSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One of the four per-frame physics phases the bridge ticks in.
///
/// The host runs them in declaration order every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TickPhase {
    /// Before physics simulation.
    PrePhysics,
    /// In parallel with physics simulation.
    DuringPhysics,
    /// After physics simulation.
    PostPhysics,
    /// After all updates, before rendering.
    PostUpdate,
}

impl TickPhase {
    /// All phases in frame order.
    pub const ALL: [Self; 4] = [
        Self::PrePhysics,
        Self::DuringPhysics,
        Self::PostPhysics,
        Self::PostUpdate,
    ];

    /// The event slot this phase forwards to.
    #[must_use]
    pub const fn event(self) -> EventSlot {
        match self {
            Self::PrePhysics => EventSlot::OnWorldPrePhysicsTick,
            Self::DuringPhysics => EventSlot::OnWorldDuringPhysicsTick,
            Self::PostPhysics => EventSlot::OnWorldPostPhysicsTick,
            Self::PostUpdate => EventSlot::OnWorldPostUpdateTick,
        }
    }

    /// Human readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PrePhysics => "PrePhysics",
            Self::DuringPhysics => "DuringPhysics",
            Self::PostPhysics => "PostPhysics",
            Self::PostUpdate => "PostUpdate",
        }
    }
}

impl fmt::Display for TickPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
