//! # Host World Delegates
//!
//! The bridge only ever needs two world notifications from the host: a world
//! finished initializing, and a world is being cleaned up.

/// Kind of world the host created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorldKind {
    /// Standalone game.
    Game,
    /// Editor play session.
    PlayInEditor,
    /// Editor world.
    Editor,
    /// Editor preview viewport.
    EditorPreview,
    /// In-game preview.
    GamePreview,
    /// Not a real world.
    Inactive,
}

impl WorldKind {
    /// Returns true if tick hooks attach to worlds of this kind.
    #[inline]
    #[must_use]
    pub const fn is_eligible(self) -> bool {
        matches!(self, Self::Game | Self::PlayInEditor)
    }
}

/// A host world as the bridge sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldHandle {
    /// Host-assigned id.
    pub id: u64,
    /// World kind.
    pub kind: WorldKind,
}

impl WorldHandle {
    /// Creates a handle.
    #[must_use]
    pub const fn new(id: u64, kind: WorldKind) -> Self {
        Self { id, kind }
    }
}

/// World notifications the module subscribes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorldEvent {
    /// A world finished initializing.
    PostInitialization,
    /// A world is being torn down.
    Cleanup,
}

/// Subscription token returned by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DelegateHandle(pub u64);

/// Host delegate system.
///
/// The host calls back into [`Module`](crate::Module) for each subscribed
/// event; the trait only manages the subscriptions.
pub trait WorldDelegates: Send {
    /// Subscribes to an event.
    fn subscribe(&mut self, event: WorldEvent) -> DelegateHandle;

    /// Drops a subscription.
    fn unsubscribe(&mut self, handle: DelegateHandle);
}
