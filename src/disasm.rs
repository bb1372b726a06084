use crate::codec::{self, CodecError};
use crate::decoder::{AddressingMode, Decoded, Format, TargetMode};
use crate::symtab::SymbolTable;

/// SIC/XE register numbers as they appear in format 2 operands.
pub const REGISTERS: &[(u8, &str)] = &[
    (0, "A"),
    (1, "X"),
    (2, "L"),
    (3, "B"),
    (4, "S"),
    (5, "T"),
    (6, "F"),
    (8, "PC"),
    (9, "SW"),
];

pub fn register_name(n: u8) -> Option<&'static str> {
    REGISTERS.iter().find(|(r, _)| *r == n).map(|(_, name)| *name)
}

fn reg(n: u8) -> String {
    register_name(n).map(str::to_string).unwrap_or_else(|| n.to_string())
}

/// Effective address of a format 3/4 instruction at `loc`.
///
/// PC-relative displacements are signed and count from the following
/// instruction; base-relative displacements are unsigned offsets from `base`.
/// Format 2 has no target.
pub fn target_address(d: &Decoded, loc: u32, base: u32) -> Result<Option<u32>, CodecError> {
    if d.format == Format::Format2 {
        return Ok(None);
    }
    let field = d.address_field();
    let ta = match d.target_mode {
        TargetMode::Pc => {
            let next = loc.wrapping_add(d.len() as u32);
            next.wrapping_add_signed(codec::hex_to_signed(field)?)
        }
        TargetMode::Base => base.wrapping_add(codec::hex_to_unsigned(field)?),
        TargetMode::Absolute => codec::hex_to_unsigned(field)?,
    };
    Ok(Some(ta))
}

pub fn fmt_opcode(d: &Decoded) -> String {
    match d.format {
        Format::Format4 => format!("+{}", d.mnemonic),
        _ => d.mnemonic.clone(),
    }
}

/// Operand column for `d`. With `symbols` set, targets that have a label are
/// printed by name.
pub fn fmt_operand(d: &Decoded, loc: u32, base: u32, symbols: Option<&SymbolTable>) -> Result<String, CodecError> {
    if d.format == Format::Format2 {
        return Ok(fmt_registers(d));
    }
    if d.mnemonic == "RSUB" {
        return Ok(String::new());
    }
    let Some(ta) = target_address(d, loc, base)? else { return Ok(String::new()) };
    // #n with an absolute field is a constant, not an address
    let constant = d.addressing == AddressingMode::Immediate && d.target_mode == TargetMode::Absolute;
    let label = symbols.filter(|_| !constant).and_then(|t| t.resolve_label(ta));
    let addr = match (label, d.target_mode) {
        (Some(name), _) => name.to_string(),
        (None, TargetMode::Absolute) => d.address_field().to_string(),
        (None, _) => format!("{ta:04X}"),
    };
    let prefix = match d.addressing {
        AddressingMode::Immediate => "#",
        AddressingMode::Indirect => "@",
        AddressingMode::Simple => "",
    };
    let suffix = if d.indexed { ",X" } else { "" };
    Ok(format!("{prefix}{addr}{suffix}"))
}

fn fmt_registers(d: &Decoded) -> String {
    let Some((r1, r2)) = d.registers() else { return String::new() };
    match d.mnemonic.as_str() {
        "CLEAR" | "TIXR" => reg(r1),
        "SVC" => r1.to_string(),
        "SHIFTL" | "SHIFTR" => format!("{},{}", reg(r1), r2 + 1),
        _ => format!("{},{}", reg(r1), reg(r2)),
    }
}
