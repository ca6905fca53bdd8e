//! # MANTLE Protocol
//!
//! The vocabulary spoken across the native/managed boundary.
//!
//! ## Two Layers
//!
//! ```text
//! ┌──────────────────────────────┐   encode    ┌──────────────────────────┐
//! │ Argument / ObjectRef /       │ ──────────► │ RawArgument (24 bytes)   │
//! │ Command  (Rust enums)        │             │ RawObject   (16 bytes)   │
//! │                              │ ◄────────── │ RawCommand  (40 bytes)   │
//! └──────────────────────────────┘   decode    └──────────────────────────┘
//! ```
//!
//! Everything above the line is a sum type: the tag and the payload are the
//! same value, so they cannot disagree. The overlapping-storage layout the
//! managed side expects exists only in [`wire`], and nothing else in the
//! workspace touches it.
//!
//! ## CRITICAL RULE
//!
//! Sizes and tag orderings in [`wire`] are shared with a separately compiled
//! managed assembly. Change them on both sides or not at all.

#![deny(missing_docs)]
#![deny(unsafe_code)]

#[cfg(not(target_pointer_width = "64"))]
compile_error!("the MANTLE wire contract assumes 64-bit pointers");

pub mod argument;
pub mod command;
pub mod error;
pub mod events;
pub mod log_level;
pub mod tables;
pub mod wire;

pub use argument::{Address, Argument, ArgumentKind, ObjectKind, ObjectRef};
pub use command::{Command, Verb};
pub use error::{ProtocolError, ProtocolResult};
pub use events::{EventSlot, TickPhase, EVENT_CAPACITY};
pub use log_level::LogLevel;
pub use tables::{FunctionTable, FunctionTables, FUNCTION_TABLE_CAPACITY, FUNCTION_TABLE_SLOTS};
pub use wire::{RawArgument, RawCommand, RawObject};
