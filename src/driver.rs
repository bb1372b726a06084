use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::decoder::{Decoded, DecodeError, Decoder};
use crate::disasm::{fmt_opcode, fmt_operand, target_address};
use crate::error::{Error, Result};
use crate::instructions::InstructionSet;
use crate::isa::sicxe::SicXeDecoder;
use crate::listing::{Listing, ListingLine, DEFAULT_COLUMN_WIDTH};
use crate::object::{HexSource, ObjectReader, TextSection};
use crate::symtab::{load_symbol_file, LiteralEntry, SymbolTable};

/// Instruction whose operand becomes the new base register value.
const BASE_LOAD: &str = "LDB";
const BYTE_DIRECTIVE: &str = "BYTE";
const LITERAL_DIRECTIVE: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisasmConfig {
    /// Print operand targets by label when the tables have one.
    pub symbolic_operands: bool,
    pub column_width: usize,
}

impl Default for DisasmConfig {
    fn default() -> Self {
        Self {
            symbolic_operands: false,
            column_width: DEFAULT_COLUMN_WIDTH,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Item<'a> {
    Instruction(&'a Decoded),
    /// A literal-pool entry and the bytes it occupied in the record.
    Literal(&'a LiteralEntry, &'a str),
}

/// Everything needed to print one listing line.
#[derive(Debug, Clone, Copy)]
pub struct DisassemblerState<'a> {
    pub loc: u32,
    pub item: Item<'a>,
    pub base: u32,
    pub table: &'a SymbolTable,
}

impl DisassemblerState<'_> {
    pub fn line(&self, cfg: &DisasmConfig) -> Result<ListingLine> {
        match self.item {
            Item::Instruction(d) => {
                let symbols = cfg.symbolic_operands.then_some(self.table);
                let operand = fmt_operand(d, self.loc, self.base, symbols)
                    .map_err(|e| Error::Decode { loc: self.loc, source: e.into() })?;
                Ok(ListingLine {
                    loc: Some(self.loc),
                    label: self.table.resolve_label(self.loc).unwrap_or_default().to_string(),
                    opcode: fmt_opcode(d),
                    operand,
                    object_code: d.object_code.clone(),
                })
            }
            Item::Literal(entry, bytes) => {
                let opcode = if entry.is_anonymous() { LITERAL_DIRECTIVE } else { BYTE_DIRECTIVE };
                Ok(ListingLine {
                    loc: Some(self.loc),
                    label: self.table.resolve_label(self.loc).unwrap_or_default().to_string(),
                    opcode: opcode.to_string(),
                    operand: entry.constant.clone(),
                    object_code: bytes.to_string(),
                })
            }
        }
    }
}

/// Result of one step inside a text record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub consumed: u32,
    pub lines: Vec<ListingLine>,
}

/// Walks text records, decoding instructions and skipping literal data,
/// while tracking the base register set by `LDB`.
pub struct Disassembler<'a, D: Decoder> {
    decoder: &'a D,
    table: &'a SymbolTable,
    cfg: DisasmConfig,
    base: u32,
}

impl<'a, D: Decoder> Disassembler<'a, D> {
    pub fn new(decoder: &'a D, table: &'a SymbolTable, cfg: DisasmConfig) -> Self {
        Self { decoder, table, cfg, base: 0 }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    /// Processes every remaining text record of `reader`.
    pub fn run(&mut self, reader: &mut ObjectReader, out: &mut Listing) -> Result<()> {
        while let Some(section) = reader.next_text_section()? {
            self.walk_section(reader, section, out)?;
        }
        Ok(())
    }

    /// Consumes exactly `section.len` bytes from `src`.
    pub fn walk_section<S: HexSource>(&mut self, src: &mut S, section: TextSection, out: &mut Listing) -> Result<()> {
        debug!(start = section.start, len = section.len, "text section");
        let (mut remaining, mut loc) = (section.len, section.start);
        while remaining > 0 {
            let step = self.step(src, loc)?;
            if step.consumed > remaining {
                return Err(Error::SectionOverrun { loc, remaining, consumed: step.consumed });
            }
            for line in step.lines {
                out.push(line);
            }
            remaining -= step.consumed;
            loc += step.consumed;
        }
        Ok(())
    }

    pub fn step<S: HexSource>(&mut self, src: &mut S, loc: u32) -> Result<Step> {
        match self.table.literal_at(loc) {
            Some(entry) => self.literal(src, loc, entry),
            None => self.instruction(src, loc),
        }
    }

    fn literal<S: HexSource>(&self, src: &mut S, loc: u32, entry: &LiteralEntry) -> Result<Step> {
        let n = entry.byte_len().ok_or_else(|| Error::BadLiteralLength {
            name: entry.name.clone(),
            loc,
            length: entry.length.clone(),
        })?;
        let bytes = src
            .read_bytes(n as usize)
            .map_err(|e| Error::Decode { loc, source: e.into() })?;
        trace!(loc, constant = %entry.constant, "literal");
        let state = DisassemblerState { loc, item: Item::Literal(entry, &bytes), base: self.base, table: self.table };
        Ok(Step { consumed: n, lines: vec![state.line(&self.cfg)?] })
    }

    fn instruction<S: HexSource>(&mut self, src: &mut S, loc: u32) -> Result<Step> {
        let d = self.decoder.decode(src).map_err(|source| Error::Decode { loc, source })?;
        trace!(loc, mnemonic = %d.mnemonic, object = %d.object_code, "decoded");
        let state = DisassemblerState { loc, item: Item::Instruction(&d), base: self.base, table: self.table };
        let mut lines = vec![state.line(&self.cfg)?];

        if d.mnemonic == BASE_LOAD {
            let ta = target_address(&d, loc, self.base)
                .map_err(|e| Error::Decode { loc, source: DecodeError::from(e) })?
                .unwrap_or(self.base);
            self.base = ta;
            debug!(loc, base = ta, "base register");
            let name = self.cfg.symbolic_operands.then(|| self.table.resolve_label(ta)).flatten();
            let operand = name.map(str::to_string).unwrap_or_else(|| format!("{ta:04X}"));
            lines.push(ListingLine::directive("BASE", operand));
        }

        Ok(Step { consumed: d.len() as u32, lines })
    }
}

/// Disassembles a whole object program.
pub fn disassemble(object: &str, table: &SymbolTable, cfg: DisasmConfig) -> Result<Listing> {
    let mut reader = ObjectReader::new(object);
    let header = reader.header().ok_or(Error::MissingHeader)??;
    let mut listing = Listing::new(header.name, header.start);
    listing.column_width = cfg.column_width;

    let set = InstructionSet::new();
    let decoder = SicXeDecoder::new(&set);
    Disassembler::new(&decoder, table, cfg).run(&mut reader, &mut listing)?;

    info!(program = %listing.program, lines = listing.lines.len(), "disassembled");
    Ok(listing)
}

/// Reads both input files and disassembles. I/O errors name the file.
pub fn disassemble_files(object: &Path, symbols: &Path, cfg: DisasmConfig) -> Result<Listing> {
    let text = std::fs::read_to_string(object).map_err(|source| Error::Io { path: object.to_path_buf(), source })?;
    let entries = load_symbol_file(symbols)?;
    let table = SymbolTable::new(&entries)?;
    disassemble(&text, &table, cfg)
}
