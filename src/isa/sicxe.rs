use crate::codec::{self, Nixbpe};
use crate::decoder::{AddressingMode, Decoded, DecodeError, Decoder, Format, TargetMode};
use crate::instructions::InstructionSet;
use crate::object::HexSource;

/// Hex chars needed to see opcode and every flag bit.
const PREFIX_CHARS: usize = 3;

/// SIC/XE decoder over a shared, read-only instruction table.
pub struct SicXeDecoder<'a> {
    set: &'a InstructionSet,
}

impl<'a> SicXeDecoder<'a> {
    pub fn new(set: &'a InstructionSet) -> Self {
        Self { set }
    }
}

impl Decoder for SicXeDecoder<'_> {
    fn decode<S: HexSource>(&self, src: &mut S) -> Result<Decoded, DecodeError> {
        let prefix = src.read_hex(PREFIX_CHARS)?;
        let b0 = codec::hex_pair_to_byte(&prefix[0..2])?;
        let b1 = codec::hex_pair_to_byte(&prefix[1..3])?;

        let opcode = codec::opcode(b0);
        let desc = self.set.lookup(opcode).ok_or(DecodeError::UnknownOpcode { opcode })?;

        let format = if desc.format2 {
            Format::Format2
        } else if codec::e(b1) == 1 {
            Format::Format4
        } else {
            Format::Format3
        };

        // Format 2 puts register numbers where the flag bits would be.
        let (addressing, target_mode, indexed, flags) = match format {
            Format::Format2 => (AddressingMode::Simple, TargetMode::Absolute, false, Nixbpe::empty()),
            _ => (
                AddressingMode::try_from(codec::ni(b0))?,
                TargetMode::try_from(codec::bp(b1))?,
                codec::x(b1) == 1,
                Nixbpe::from_prefix(b0, b1),
            ),
        };

        // remaining whole bytes plus the nibble that completes the prefix
        let rest = src.read_hex((format.len() - 2) * 2 + 1)?;
        let object_code = prefix + &rest;

        Ok(Decoded {
            opcode,
            mnemonic: desc.mnemonic.to_string(),
            format,
            addressing,
            target_mode,
            indexed,
            flags,
            object_code,
        })
    }
}
