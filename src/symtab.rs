//! Symbol and literal tables as written by the companion assembler.
//!
//! File layout:
//!
//! ```text
//! <header>
//! <header>
//! NAME   ADDRESS  FLAGS        one line per symbol
//! ...
//!                              blank separator
//! <header>
//! <header>
//! NAME   CONST  LENGTH  ADDRESS   named literal
//!        CONST  LENGTH  ADDRESS   anonymous literal
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec;
use crate::error::{Error, Result};

/// Name given to literals that were declared inline (`=C'EOF'`).
pub const LITERAL_MARKER: &str = "*";

const HEADER_LINES: usize = 2;
const SYMBOL_FIELDS: usize = 3;
const NAMED_LITERAL_FIELDS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolEntry {
    pub name: String,
    pub address: String,
    pub flags: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteralEntry {
    pub name: String,
    pub constant: String,
    /// Length of the constant's value in hex chars, written in decimal.
    pub length: String,
    pub address: String,
}

impl LiteralEntry {
    pub fn is_anonymous(&self) -> bool {
        self.name == LITERAL_MARKER
    }

    /// Bytes the literal occupies in the text record. `None` when the length
    /// field is not a number or covers less than one byte.
    pub fn byte_len(&self) -> Option<u32> {
        let hex_chars: u32 = self.length.parse().ok()?;
        Some(hex_chars / 2).filter(|&n| n > 0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolEntries {
    pub symbols: Vec<SymbolEntry>,
    pub literals: Vec<LiteralEntry>,
}

pub fn load_symbol_file(path: &Path) -> Result<SymbolEntries> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
    parse_symbol_file(&text)
}

pub fn parse_symbol_file(text: &str) -> Result<SymbolEntries> {
    let mut entries = SymbolEntries::default();
    let mut lines = text.lines().enumerate().skip(HEADER_LINES);

    for (idx, line) in lines.by_ref() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            break;
        }
        if tokens.len() < SYMBOL_FIELDS {
            return Err(Error::MalformedEntry { line: idx + 1, expected: SYMBOL_FIELDS, found: tokens.len() });
        }
        check_address(tokens[1])?;
        entries.symbols.push(SymbolEntry {
            name: tokens[0].to_string(),
            address: tokens[1].to_string(),
            flags: tokens[2].to_string(),
        });
    }

    for (idx, line) in lines.skip(HEADER_LINES) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let entry = match tokens.as_slice() {
            [] => continue,
            [constant, length, address] => LiteralEntry {
                name: LITERAL_MARKER.to_string(),
                constant: constant.to_string(),
                length: length.to_string(),
                address: address.to_string(),
            },
            [name, constant, length, address] => LiteralEntry {
                name: name.to_string(),
                constant: constant.to_string(),
                length: length.to_string(),
                address: address.to_string(),
            },
            other => {
                return Err(Error::MalformedEntry { line: idx + 1, expected: NAMED_LITERAL_FIELDS, found: other.len() });
            }
        };
        check_address(&entry.address)?;
        entries.literals.push(entry);
    }

    debug!(symbols = entries.symbols.len(), literals = entries.literals.len(), "parsed symbol file");
    Ok(entries)
}

fn check_address(address: &str) -> Result<u32> {
    codec::hex_to_unsigned(address).map_err(|source| Error::BadAddress { address: address.to_string(), source })
}

/// Address-keyed lookup over both tables. Later entries at an address
/// replace earlier ones.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: BTreeMap<u32, SymbolEntry>,
    literals: BTreeMap<u32, LiteralEntry>,
}

impl SymbolTable {
    pub fn new(entries: &SymbolEntries) -> Result<Self> {
        let mut table = Self::default();
        for s in &entries.symbols {
            table.symbols.insert(check_address(&s.address)?, s.clone());
        }
        for l in &entries.literals {
            table.literals.insert(check_address(&l.address)?, l.clone());
        }
        Ok(table)
    }

    pub fn symbol_at(&self, addr: u32) -> Option<&SymbolEntry> {
        self.symbols.get(&addr)
    }

    pub fn literal_at(&self, addr: u32) -> Option<&LiteralEntry> {
        self.literals.get(&addr)
    }

    /// Only literal-pool entries occupy bytes that must be skipped rather
    /// than decoded; plain symbols never make an address data.
    pub fn is_data_address(&self, addr: u32) -> bool {
        self.literals.contains_key(&addr)
    }

    /// Name to print for `addr`: a literal's constant text (anonymous) or
    /// name, otherwise a symbol name.
    pub fn resolve_label(&self, addr: u32) -> Option<&str> {
        if let Some(lit) = self.literals.get(&addr) {
            return Some(if lit.is_anonymous() { &lit.constant } else { &lit.name });
        }
        self.symbols.get(&addr).map(|s| s.name.as_str())
    }

    pub fn symbols(&self) -> impl Iterator<Item = (u32, &SymbolEntry)> {
        self.symbols.iter().map(|(&a, s)| (a, s))
    }

    pub fn literals(&self) -> impl Iterator<Item = (u32, &LiteralEntry)> {
        self.literals.iter().map(|(&a, l)| (a, l))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    const SYMS: &str = indoc! {"
        Symbol  Value   Flags:
        -----------------------
        FIRST   000000  R
        CLOOP   000006  R
        LENGTH  000033  R

        Name    Const    Length Address:
        ---------------------------------
                =C'EOF'  6      00002D
        OUT     X'05'    2      000030
    "};

    #[test]
    fn parses_both_blocks() {
        let e = parse_symbol_file(SYMS).unwrap();
        assert_eq!(e.symbols.len(), 3);
        assert_eq!(
            e.symbols[1],
            SymbolEntry { name: "CLOOP".into(), address: "000006".into(), flags: "R".into() }
        );
        assert_eq!(
            e.literals,
            vec![
                LiteralEntry {
                    name: "*".into(),
                    constant: "=C'EOF'".into(),
                    length: "6".into(),
                    address: "00002D".into(),
                },
                LiteralEntry {
                    name: "OUT".into(),
                    constant: "X'05'".into(),
                    length: "2".into(),
                    address: "000030".into(),
                },
            ]
        );
    }

    #[test]
    fn symbols_only_file() {
        let e = parse_symbol_file("hdr\n----\nA 000003 R\n").unwrap();
        assert_eq!(e.symbols.len(), 1);
        assert!(e.literals.is_empty());
    }

    #[test]
    fn short_symbol_line_is_fatal() {
        let err = parse_symbol_file("hdr\n----\nA 000003\n").unwrap_err();
        assert!(matches!(err, Error::MalformedEntry { line: 3, expected: 3, found: 2 }));
    }

    #[test]
    fn short_literal_line_is_fatal() {
        let err = parse_symbol_file("h\n-\nA 000003 R\n\nh\n-\n=X'05' 2\n").unwrap_err();
        assert!(matches!(err, Error::MalformedEntry { line: 7, found: 2, .. }));
    }

    #[test]
    fn long_literal_line_is_fatal() {
        let err = parse_symbol_file("h\n-\nA 000003 R\n\nh\n-\nOUT X'05' 2 000030 extra\n").unwrap_err();
        assert!(matches!(err, Error::MalformedEntry { line: 7, expected: 4, found: 5 }));
    }

    #[test]
    fn high_addresses_are_not_sign_extended() {
        let t = SymbolTable::new(&parse_symbol_file("h\n-\nTOP 8000 R\n\nh\n-\n=X'FF' 2 FFFFF0\n").unwrap()).unwrap();
        assert_eq!(t.resolve_label(0x8000), Some("TOP"));
        assert!(t.is_data_address(0xFFFFF0));
        assert_eq!(t.symbols().next().map(|(a, _)| a), Some(0x8000));
    }

    #[test]
    fn bad_address_is_fatal() {
        let err = parse_symbol_file("h\n-\nA 00Q003 R\n").unwrap_err();
        assert!(matches!(err, Error::BadAddress { .. }));
    }

    #[test]
    fn resolution_prefers_literals() {
        let t = SymbolTable::new(&parse_symbol_file(SYMS).unwrap()).unwrap();
        assert_eq!(t.resolve_label(0x06), Some("CLOOP"));
        assert_eq!(t.resolve_label(0x2D), Some("=C'EOF'"));
        assert_eq!(t.resolve_label(0x30), Some("OUT"));
        assert_eq!(t.resolve_label(0x07), None);
        assert!(t.is_data_address(0x2D));
        assert!(!t.is_data_address(0x06));
        assert_eq!(t.literal_at(0x2D).unwrap().byte_len(), Some(3));
    }

    #[test]
    fn literal_byte_len() {
        let mut l = LiteralEntry { name: "*".into(), constant: "X'F'".into(), length: "1".into(), address: "0".into() };
        assert_eq!(l.byte_len(), None);
        l.length = "x".into();
        assert_eq!(l.byte_len(), None);
        l.length = "8".into();
        assert_eq!(l.byte_len(), Some(4));
    }
}
