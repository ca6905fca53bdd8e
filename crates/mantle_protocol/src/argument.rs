//! # Arguments and Object References
//!
//! The single value that can accompany an `Execute` command.
//!
//! An [`Argument`] is built from exactly one concrete value and the variant
//! *is* the tag. There is no setter that changes one without the other.

use std::fmt;
use std::num::NonZeroUsize;

/// A non-null opaque address on the other side of the boundary.
///
/// The bridge never dereferences these. They are handed back to whoever
/// produced them (the host event system, the managed runtime).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(NonZeroUsize);

impl Address {
    /// Wraps a raw address. Returns `None` for zero.
    #[inline]
    #[must_use]
    pub const fn new(raw: usize) -> Option<Self> {
        match NonZeroUsize::new(raw) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Wraps a raw pointer. Returns `None` for null.
    #[inline]
    #[must_use]
    pub fn from_ptr<T>(ptr: *const T) -> Option<Self> {
        Self::new(ptr as usize)
    }

    /// Returns the raw address.
    #[inline]
    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }

    /// Returns the address as an untyped pointer.
    #[inline]
    #[must_use]
    pub fn as_ptr<T>(self) -> *mut T {
        self.0.get() as *mut T
    }

    /// Raw value of an optional address, zero for `None`.
    #[inline]
    #[must_use]
    pub fn raw_or_null(address: Option<Self>) -> usize {
        address.map_or(0, Self::get)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{:X})", self.get())
    }
}

/// Delegate category an [`ObjectRef`] belongs to.
///
/// Discriminants are the wire values.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Actor begin/end overlap.
    ActorOverlapDelegate = 0,
    /// Actor hit.
    ActorHitDelegate = 1,
    /// Actor begin/end cursor over.
    ActorCursorDelegate = 2,
    /// Component begin/end overlap.
    ComponentOverlapDelegate = 3,
    /// Component hit.
    ComponentHitDelegate = 4,
    /// Component begin/end cursor over.
    ComponentCursorDelegate = 5,
}

impl ObjectKind {
    /// Decodes a wire discriminant.
    #[must_use]
    pub const fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::ActorOverlapDelegate),
            1 => Some(Self::ActorHitDelegate),
            2 => Some(Self::ActorCursorDelegate),
            3 => Some(Self::ComponentOverlapDelegate),
            4 => Some(Self::ComponentHitDelegate),
            5 => Some(Self::ComponentCursorDelegate),
            _ => None,
        }
    }
}

/// A tagged handle to a host delegate's parameter array.
///
/// The host owns the parameter array for the duration of the callback only.
/// Do not keep one of these past the dispatch that carried it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectRef {
    parameters: Address,
    kind: ObjectKind,
}

impl ObjectRef {
    /// Creates an object reference.
    #[inline]
    #[must_use]
    pub const fn new(parameters: Address, kind: ObjectKind) -> Self {
        Self { parameters, kind }
    }

    /// The parameter array address.
    #[inline]
    #[must_use]
    pub const fn parameters(&self) -> Address {
        self.parameters
    }

    /// The delegate category.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        self.kind
    }
}

/// Wire discriminant of an [`Argument`].
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArgumentKind {
    /// No value.
    None = 0,
    /// 32-bit float.
    Single = 1,
    /// 32-bit unsigned integer.
    Integer = 2,
    /// Non-null opaque pointer.
    Pointer = 3,
    /// Object reference.
    Object = 4,
}

impl ArgumentKind {
    /// Decodes a wire discriminant.
    #[must_use]
    pub const fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Single),
            2 => Some(Self::Integer),
            3 => Some(Self::Pointer),
            4 => Some(Self::Object),
            _ => None,
        }
    }
}

/// One value crossing the boundary alongside an `Execute` command.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Argument {
    /// Nothing. Also what a null pointer becomes.
    #[default]
    None,
    /// A float, usually a frame delta time.
    Single(f32),
    /// An unsigned integer.
    Integer(u32),
    /// A non-null opaque pointer.
    Pointer(Address),
    /// A delegate object reference.
    Object(ObjectRef),
}

impl Argument {
    /// Builds an argument from a raw pointer.
    ///
    /// A null pointer yields [`Argument::None`], so "is there a pointer" and
    /// "is this a pointer" are the same test downstream.
    #[inline]
    #[must_use]
    pub fn from_pointer<T>(ptr: *const T) -> Self {
        Address::from_ptr(ptr).map_or(Self::None, Self::Pointer)
    }

    /// Returns the wire discriminant for this value.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ArgumentKind {
        match self {
            Self::None => ArgumentKind::None,
            Self::Single(_) => ArgumentKind::Single,
            Self::Integer(_) => ArgumentKind::Integer,
            Self::Pointer(_) => ArgumentKind::Pointer,
            Self::Object(_) => ArgumentKind::Object,
        }
    }

    /// Returns true for [`Argument::None`].
    #[inline]
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl From<f32> for Argument {
    fn from(value: f32) -> Self {
        Self::Single(value)
    }
}

impl From<u32> for Argument {
    fn from(value: u32) -> Self {
        Self::Integer(value)
    }
}

impl From<Address> for Argument {
    fn from(value: Address) -> Self {
        Self::Pointer(value)
    }
}

impl From<Option<Address>> for Argument {
    fn from(value: Option<Address>) -> Self {
        value.map_or(Self::None, Self::Pointer)
    }
}

impl From<ObjectRef> for Argument {
    fn from(value: ObjectRef) -> Self {
        Self::Object(value)
    }
}
