use serde::{Deserialize, Serialize};

use crate::codec::{CodecError, Nixbpe};
use crate::object::{HexSource, StreamError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Format {
    Format2 = 2,
    Format3 = 3,
    Format4 = 4,
}

impl Format {
    /// Encoded length in bytes.
    pub fn len(self) -> usize {
        self as usize
    }
}

/// From the n,i flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressingMode {
    Immediate = 0b01,
    Indirect = 0b10,
    Simple = 0b11,
}

impl TryFrom<u8> for AddressingMode {
    type Error = DecodeError;

    fn try_from(ni: u8) -> Result<Self, Self::Error> {
        match ni {
            0b01 => Ok(Self::Immediate),
            0b10 => Ok(Self::Indirect),
            0b11 => Ok(Self::Simple),
            _ => Err(DecodeError::ReservedAddressing { ni }),
        }
    }
}

/// From the b,p flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetMode {
    Absolute = 0b00,
    Pc = 0b01,
    Base = 0b10,
}

impl TryFrom<u8> for TargetMode {
    type Error = DecodeError;

    fn try_from(bp: u8) -> Result<Self, Self::Error> {
        match bp {
            0b00 => Ok(Self::Absolute),
            0b01 => Ok(Self::Pc),
            0b10 => Ok(Self::Base),
            _ => Err(DecodeError::ReservedTargetMode { bp }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoded {
    pub opcode: u8,
    pub mnemonic: String,
    pub format: Format,
    pub addressing: AddressingMode,
    pub target_mode: TargetMode,
    pub indexed: bool,
    pub flags: Nixbpe,
    /// Full instruction as uppercase hex, `2 * format` chars.
    pub object_code: String,
}

impl Decoded {
    /// Bytes consumed from the object stream.
    pub fn len(&self) -> usize {
        self.object_code.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.object_code.is_empty()
    }

    /// Everything after the 12-bit prefix: 3 hex digits of displacement for
    /// format 3, a 5 digit address for format 4, the second register nibble
    /// for format 2.
    pub fn address_field(&self) -> &str {
        &self.object_code[3..]
    }

    /// `(r1, r2)` nibbles of a format 2 instruction.
    pub fn registers(&self) -> Option<(u8, u8)> {
        if self.format != Format::Format2 {
            return None;
        }
        let mut it = self.object_code[2..].chars().filter_map(|c| c.to_digit(16));
        Some((it.next()? as u8, it.next()? as u8))
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown opcode {opcode:#04X}")]
    UnknownOpcode { opcode: u8 },
    #[error("reserved addressing mode n,i = {ni:02b}")]
    ReservedAddressing { ni: u8 },
    #[error("reserved target address mode b,p = {bp:02b}")]
    ReservedTargetMode { bp: u8 },
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

pub trait Decoder {
    /// Reads one instruction starting at the source's cursor.
    fn decode<S: HexSource>(&self, src: &mut S) -> Result<Decoded, DecodeError>;
}
