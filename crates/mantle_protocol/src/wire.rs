//! # Wire Frames
//!
//! Byte-exact layouts shared with the managed side.
//!
//! ```text
//! RawObject (16)     │ parameters (8) │ kind i32 │ pad │
//!
//! RawArgument (24)   │ payload (16)                    │ kind i32 │ pad │
//!                      Single/Integer: bytes 0..4
//!                      Pointer:        bytes 0..8
//!                      Object:         RawObject, bytes 0..16
//!
//! RawCommand (40)    │ payload (32)                                   │ verb i32 │ pad │
//!                      Initialize: tables (8) │ checksum i32
//!                      Find:       name ptr (8) │ optional i32
//!                      Execute:    function (8) │ RawArgument (24)
//! ```
//!
//! Scalars are stored in native byte order, exactly as the overlapping C
//! layout would place them. Unused payload bytes are always zero, which is
//! what makes encode → decode → encode bit-for-bit stable.

use std::ffi::{c_char, CStr};

use bytemuck::{bytes_of, bytes_of_mut, Pod, Zeroable};

use crate::argument::{Address, Argument, ArgumentKind, ObjectKind, ObjectRef};
use crate::command::{Command, Verb};
use crate::error::{ProtocolError, ProtocolResult};

/// Raw object reference.
///
/// Size: 16 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct RawObject {
    /// Parameter array address.
    pub parameters: u64,
    /// [`ObjectKind`] discriminant.
    pub kind: i32,
    /// Padding.
    pub _pad: u32,
}

/// Raw argument.
///
/// Size: 24 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct RawArgument {
    /// Overlapping value storage.
    pub payload: [u64; 2],
    /// [`ArgumentKind`] discriminant.
    pub kind: i32,
    /// Padding.
    pub _pad: u32,
}

/// Raw command.
///
/// Size: 40 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct RawCommand {
    /// Overlapping verb payload storage.
    pub payload: [u64; 4],
    /// [`Verb`] discriminant.
    pub verb: i32,
    /// Padding.
    pub _pad: u32,
}

const _: () = assert!(std::mem::size_of::<RawObject>() == RawObject::SIZE);
const _: () = assert!(std::mem::size_of::<RawArgument>() == RawArgument::SIZE);
const _: () = assert!(std::mem::size_of::<RawCommand>() == RawCommand::SIZE);

fn write_i32(bytes: &mut [u8], offset: usize, value: i32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
}

fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    i32::from_ne_bytes(word)
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_ne_bytes(word)
}

fn address_bits(address: Address) -> u64 {
    address.get() as u64
}

fn address_from_bits(bits: u64, slot: &'static str) -> ProtocolResult<Address> {
    Address::new(bits as usize).ok_or(ProtocolError::NullPointer(slot))
}

impl RawObject {
    /// Size in bytes.
    pub const SIZE: usize = 16;

    /// Encodes an object reference.
    #[must_use]
    pub fn encode(object: &ObjectRef) -> Self {
        Self {
            parameters: address_bits(object.parameters()),
            kind: object.kind() as i32,
            _pad: 0,
        }
    }

    /// Decodes an object reference.
    ///
    /// # Errors
    ///
    /// Fails on an unknown kind or a null parameter array.
    pub fn decode(&self) -> ProtocolResult<ObjectRef> {
        let kind = ObjectKind::from_raw(self.kind).ok_or(ProtocolError::UnknownTag {
            field: "object",
            value: self.kind,
        })?;
        let parameters = address_from_bits(self.parameters, "object parameters")?;
        Ok(ObjectRef::new(parameters, kind))
    }
}

impl RawArgument {
    /// Size in bytes.
    pub const SIZE: usize = 24;

    /// Encodes an argument.
    #[must_use]
    pub fn encode(argument: &Argument) -> Self {
        let mut raw = Self::zeroed();
        raw.kind = argument.kind() as i32;
        match *argument {
            Argument::None => {}
            Argument::Single(value) => {
                bytes_of_mut(&mut raw.payload)[..4].copy_from_slice(&value.to_ne_bytes());
            }
            Argument::Integer(value) => {
                bytes_of_mut(&mut raw.payload)[..4].copy_from_slice(&value.to_ne_bytes());
            }
            Argument::Pointer(address) => raw.payload[0] = address_bits(address),
            Argument::Object(object) => {
                bytes_of_mut(&mut raw.payload).copy_from_slice(bytes_of(&RawObject::encode(&object)));
            }
        }
        raw
    }

    /// Decodes an argument.
    ///
    /// # Errors
    ///
    /// Fails on an unknown kind, or a null pointer under the pointer/object
    /// tags (the encoder never produces either).
    pub fn decode(&self) -> ProtocolResult<Argument> {
        let kind = ArgumentKind::from_raw(self.kind).ok_or(ProtocolError::UnknownTag {
            field: "argument",
            value: self.kind,
        })?;
        let bytes = bytes_of(&self.payload);
        Ok(match kind {
            ArgumentKind::None => Argument::None,
            ArgumentKind::Single => Argument::Single(f32::from_bits(read_u32(bytes, 0))),
            ArgumentKind::Integer => Argument::Integer(read_u32(bytes, 0)),
            ArgumentKind::Pointer => {
                Argument::Pointer(address_from_bits(self.payload[0], "argument pointer")?)
            }
            ArgumentKind::Object => {
                let object: RawObject = bytemuck::pod_read_unaligned(bytes);
                Argument::Object(object.decode()?)
            }
        })
    }
}

impl RawCommand {
    /// Size in bytes.
    pub const SIZE: usize = 40;

    /// Encodes a command.
    ///
    /// The `Find` name pointer is only valid while the borrowed name lives.
    #[must_use]
    pub fn encode(command: &Command<'_>) -> Self {
        let mut raw = Self::zeroed();
        raw.verb = command.verb() as i32;
        match *command {
            Command::Initialize { tables, checksum } => {
                raw.payload[0] = address_bits(tables);
                write_i32(bytes_of_mut(&mut raw.payload), 8, checksum);
            }
            Command::LoadAssemblies | Command::UnloadAssemblies => {}
            Command::Find { method, optional } => {
                raw.payload[0] = method.as_ptr() as usize as u64;
                write_i32(bytes_of_mut(&mut raw.payload), 8, i32::from(optional));
            }
            Command::Execute { function, value } => {
                raw.payload[0] = address_bits(function);
                let argument = RawArgument::encode(&value);
                bytes_of_mut(&mut raw.payload)[8..32].copy_from_slice(bytes_of(&argument));
            }
        }
        raw
    }

    /// Returns the verb without touching the payload.
    ///
    /// # Errors
    ///
    /// Fails on an unknown verb.
    pub fn verb(&self) -> ProtocolResult<Verb> {
        Verb::from_raw(self.verb).ok_or(ProtocolError::UnknownTag {
            field: "command",
            value: self.verb,
        })
    }

    /// Decodes a command.
    ///
    /// # Errors
    ///
    /// Fails on unknown tags or null pointers in non-nullable slots.
    ///
    /// # Safety
    ///
    /// For a `Find` frame the name pointer must reference a NUL-terminated
    /// string that stays valid and unmodified for `'a`. Frames of every other
    /// verb carry no pointer that is read.
    #[allow(unsafe_code)]
    pub unsafe fn decode<'a>(&self) -> ProtocolResult<Command<'a>> {
        let bytes = bytes_of(&self.payload);
        Ok(match self.verb()? {
            Verb::Initialize => Command::Initialize {
                tables: address_from_bits(self.payload[0], "initialize tables")?,
                checksum: read_i32(bytes, 8),
            },
            Verb::LoadAssemblies => Command::LoadAssemblies,
            Verb::UnloadAssemblies => Command::UnloadAssemblies,
            Verb::Find => {
                let name = address_from_bits(self.payload[0], "find method")?;
                // SAFETY: upheld by the caller, see the function contract.
                let method = unsafe { CStr::from_ptr(name.as_ptr::<c_char>()) };
                Command::Find {
                    method,
                    optional: read_i32(bytes, 8) != 0,
                }
            }
            Verb::Execute => {
                let argument: RawArgument = bytemuck::pod_read_unaligned(&bytes[8..32]);
                Command::Execute {
                    function: address_from_bits(self.payload[0], "execute function")?,
                    value: argument.decode()?,
                }
            }
        })
    }
}
