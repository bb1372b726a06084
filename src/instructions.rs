use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InstrDesc {
    pub opcode: u8,
    pub mnemonic: &'static str,
    /// Register-only two byte encoding; the e flag is not consulted for these.
    pub format2: bool,
}

const fn op(opcode: u8, mnemonic: &'static str) -> InstrDesc {
    InstrDesc { opcode, mnemonic, format2: false }
}

const fn rr(opcode: u8, mnemonic: &'static str) -> InstrDesc {
    InstrDesc { opcode, mnemonic, format2: true }
}

pub const TABLE: &[InstrDesc] = &[
    op(0x18, "ADD"),
    op(0x58, "ADDF"),
    rr(0x90, "ADDR"),
    op(0x40, "AND"),
    rr(0xB4, "CLEAR"),
    op(0x28, "COMP"),
    op(0x88, "COMPF"),
    rr(0xA0, "COMPR"),
    op(0x24, "DIV"),
    op(0x64, "DIVF"),
    rr(0x9C, "DIVR"),
    op(0xC4, "FIX"),
    op(0xC0, "FLOAT"),
    op(0xF4, "HIO"),
    op(0x3C, "J"),
    op(0x30, "JEQ"),
    op(0x34, "JGT"),
    op(0x38, "JLT"),
    op(0x48, "JSUB"),
    op(0x00, "LDA"),
    op(0x68, "LDB"),
    op(0x50, "LDCH"),
    op(0x70, "LDF"),
    op(0x08, "LDL"),
    op(0x6C, "LDS"),
    op(0x74, "LDT"),
    op(0x04, "LDX"),
    op(0xD0, "LPS"),
    op(0x20, "MUL"),
    op(0x60, "MULF"),
    rr(0x98, "MULR"),
    op(0xC8, "NORM"),
    op(0x44, "OR"),
    op(0xD8, "RD"),
    rr(0xAC, "RMO"),
    op(0x4C, "RSUB"),
    rr(0xA4, "SHIFTL"),
    rr(0xA8, "SHIFTR"),
    op(0xF0, "SIO"),
    op(0xEC, "SSK"),
    op(0x0C, "STA"),
    op(0x78, "STB"),
    op(0x54, "STCH"),
    op(0x80, "STF"),
    op(0xD4, "STI"),
    op(0x14, "STL"),
    op(0x7C, "STS"),
    op(0xE8, "STSW"),
    op(0x84, "STT"),
    op(0x10, "STX"),
    op(0x1C, "SUB"),
    op(0x5C, "SUBF"),
    rr(0x94, "SUBR"),
    rr(0xB0, "SVC"),
    op(0xE0, "TD"),
    op(0xF8, "TIO"),
    op(0x2C, "TIX"),
    rr(0xB8, "TIXR"),
    op(0xDC, "WD"),
];

/// Opcode-indexed view of [`TABLE`], built once and shared by the decoder.
#[derive(Debug, Clone)]
pub struct InstructionSet {
    by_opcode: BTreeMap<u8, InstrDesc>,
}

impl InstructionSet {
    pub fn new() -> Self {
        Self { by_opcode: TABLE.iter().map(|d| (d.opcode, *d)).collect() }
    }

    /// `opcode` must already be masked to its top six bits.
    pub fn lookup(&self, opcode: u8) -> Option<&InstrDesc> {
        self.by_opcode.get(&opcode)
    }

    pub fn len(&self) -> usize {
        self.by_opcode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_opcode.is_empty()
    }
}

impl Default for InstructionSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_complete_and_unique() {
        assert_eq!(TABLE.len(), 59);
        assert_eq!(InstructionSet::new().len(), 59);
        assert!(TABLE.iter().all(|d| d.opcode & 0x03 == 0));
    }

    #[test]
    fn format2_members() {
        let set = InstructionSet::new();
        let f2: Vec<_> = TABLE.iter().filter(|d| d.format2).map(|d| d.mnemonic).collect();
        assert_eq!(
            f2,
            ["ADDR", "CLEAR", "COMPR", "DIVR", "MULR", "RMO", "SHIFTL", "SHIFTR", "SUBR", "SVC", "TIXR"]
        );
        assert!(set.lookup(0x90).unwrap().format2);
        assert!(!set.lookup(0x58).unwrap().format2);
    }

    #[test]
    fn unknown_opcode_is_none() {
        let set = InstructionSet::new();
        assert_eq!(set.lookup(0x68).unwrap().mnemonic, "LDB");
        assert!(set.lookup(0xFC).is_none());
        assert!(set.lookup(0xE4).is_none());
    }
}
