//! Hex text <-> integer conversion and the SIC/XE flag bitfields.
//!
//! Object files carry every byte as two uppercase hex characters, so all of
//! the decoding work starts from text. The masks below operate on the two
//! overlapping "bytes" of a 12-bit instruction prefix: `b0` is hex chars 0..2
//! (opcode + n,i) and `b1` is hex chars 1..3 (low opcode nibble + x,b,p,e).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";

const OPCODE_MASK: u8 = 0xFC;
const NI_MASK: u8 = 0x03;
const X_MASK: u8 = 0x08;
const BP_MASK: u8 = 0x06;
const E_MASK: u8 = 0x01;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("invalid hex digit {0:?}")]
    InvalidDigit(char),
    #[error("expected {expected} hex digits, found {found}")]
    Width { expected: usize, found: usize },
}

pub fn hex_digit(c: char) -> Result<u8, CodecError> {
    let up = c.to_ascii_uppercase();
    HEX_CHARS
        .iter()
        .position(|&h| h as char == up)
        .map(|i| i as u8)
        .ok_or(CodecError::InvalidDigit(c))
}

/// Panics if `n > 15`.
pub fn hex_char(n: u8) -> char {
    HEX_CHARS[n as usize] as char
}

pub fn hex_pair_to_byte(pair: &str) -> Result<u8, CodecError> {
    let mut chars = pair.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(hi), Some(lo), None) => Ok((hex_digit(hi)? << 4) | hex_digit(lo)?),
        _ => Err(CodecError::Width { expected: 2, found: pair.chars().count() }),
    }
}

pub fn hex_to_unsigned(s: &str) -> Result<u32, CodecError> {
    let len = s.chars().count();
    if len == 0 || len > 8 {
        return Err(CodecError::Width { expected: 8, found: len });
    }
    s.chars().try_fold(0u32, |acc, c| Ok((acc << 4) | hex_digit(c)? as u32))
}

/// Reads `s` as a two's complement value `4 * s.len()` bits wide.
///
/// `"FFF"` is -1 and `"800"` is -2048, which is what a 12-bit displacement
/// field means in PC-relative addressing.
pub fn hex_to_signed(s: &str) -> Result<i32, CodecError> {
    let raw = hex_to_unsigned(s)?;
    let shift = 32 - 4 * s.chars().count() as u32;
    // shift == 0 for 8 digits; the shifts are no-ops then
    Ok(((raw << shift) as i32) >> shift)
}

pub fn to_hex(n: u32) -> String {
    format!("{n:X}")
}

pub fn byte_to_hex(b: u8) -> String {
    let mut s = String::with_capacity(2);
    s.push(hex_char(b >> 4));
    s.push(hex_char(b & 0x0F));
    s
}

pub fn opcode(b0: u8) -> u8 {
    b0 & OPCODE_MASK
}

pub fn ni(b0: u8) -> u8 {
    b0 & NI_MASK
}

pub fn x(b1: u8) -> u8 {
    (b1 & X_MASK) >> 3
}

pub fn bp(b1: u8) -> u8 {
    (b1 & BP_MASK) >> 1
}

pub fn e(b1: u8) -> u8 {
    b1 & E_MASK
}

bitflags! {
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nixbpe: u8 {
const N = 1 << 5;
const I = 1 << 4;
const X = 1 << 3;
const B = 1 << 2;
const P = 1 << 1;
const E = 1 << 0;
}
}

impl Nixbpe {
    pub fn from_prefix(b0: u8, b1: u8) -> Self {
        Self::from_bits_truncate((ni(b0) << 4) | (b1 & 0x0F))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_both_ways() {
        for n in 0..16u8 {
            assert_eq!(hex_digit(hex_char(n)).unwrap(), n);
        }
        assert_eq!(hex_digit('b').unwrap(), 11);
        assert_eq!(hex_digit('G'), Err(CodecError::InvalidDigit('G')));
    }

    #[test]
    fn pair_and_back() {
        assert_eq!(hex_pair_to_byte("4F").unwrap(), 0x4F);
        assert_eq!(byte_to_hex(0x4F), "4F");
        assert_eq!(byte_to_hex(0x05), "05");
        assert!(hex_pair_to_byte("4").is_err());
        assert!(hex_pair_to_byte("4F0").is_err());
    }

    #[test]
    fn sign_extension_by_width() {
        assert_eq!(hex_to_signed("FFF").unwrap(), -1);
        assert_eq!(hex_to_signed("7FF").unwrap(), 2047);
        assert_eq!(hex_to_signed("800").unwrap(), -2048);
        assert_eq!(hex_to_signed("FFFFF").unwrap(), -1);
        assert_eq!(hex_to_signed("0FFFF").unwrap(), 0xFFFF);
        assert_eq!(hex_to_signed("FFFFFFFF").unwrap(), -1);
        assert!(hex_to_signed("").is_err());
        assert!(hex_to_signed("123456789").is_err());
    }

    #[test]
    fn unsigned_round_trip_is_uppercase() {
        for s in ["1", "2A", "1077", "ABCDEF", "7fff"] {
            let n = hex_to_unsigned(s).unwrap();
            assert_eq!(to_hex(n), s.to_ascii_uppercase());
        }
    }

    #[test]
    fn flag_fields() {
        // ADD with n=i=0
        assert_eq!(opcode(0x18), 0x18);
        assert_eq!(ni(0x18), 0);
        // LDA #3 -> 01 0003 ; STL via PC -> 17 2
        assert_eq!(opcode(0x01), 0x00);
        assert_eq!(ni(0x01), 1);
        assert_eq!(ni(0x17), 3);
        assert_eq!(bp(0x72), 1);
        assert_eq!(bp(0x74), 2);
        assert_eq!(x(0x7C), 1);
        assert_eq!(e(0x71), 1);
        assert_eq!(e(0x70), 0);
    }

    #[test]
    fn nixbpe_from_prefix() {
        let f = Nixbpe::from_prefix(0x4B, 0xB1);
        assert_eq!(f, Nixbpe::N | Nixbpe::I | Nixbpe::E);
        let f = Nixbpe::from_prefix(0x03, 0x3C);
        assert_eq!(f, Nixbpe::N | Nixbpe::I | Nixbpe::X | Nixbpe::B);
    }
}
