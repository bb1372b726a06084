use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sicxe_rs::decoder::Decoder;
use sicxe_rs::disasm::{fmt_opcode, fmt_operand, target_address};
use sicxe_rs::instructions::InstructionSet;
use sicxe_rs::isa::sicxe::SicXeDecoder;
use sicxe_rs::object::ObjectReader;

#[derive(Parser, Debug)]
#[command(author, version, about = "Decode a single SIC/XE instruction given as hex")]
struct Opts {
    /// Location counter of the instruction (hex)
    #[arg(long, default_value = "0")]
    loc: String,
    /// Base register value (hex)
    #[arg(long, default_value = "0")]
    base: String,
    /// Print the decoded fields as JSON
    #[arg(long)]
    json: bool,
    #[arg(value_name = "HEX")]
    word: String,
}

fn parse_hex(s: &str) -> Result<u32> {
    let s = s.trim();
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    Ok(u32::from_str_radix(digits, 16)?)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let loc = parse_hex(&opts.loc).context("--loc")?;
    let base = parse_hex(&opts.base).context("--base")?;

    let set = InstructionSet::new();
    let d = SicXeDecoder::new(&set).decode(&mut ObjectReader::new(opts.word.trim()))?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&d)?);
        return Ok(());
    }
    let ta = target_address(&d, loc, base)?;
    println!("{loc:04X}  {:<8}{:<12}{}", fmt_opcode(&d), fmt_operand(&d, loc, base, None)?, d.object_code);
    println!("  format {:?}, {:?}, {:?}, indexed={}", d.format, d.addressing, d.target_mode, d.indexed);
    if let Some(ta) = ta {
        println!("  target {ta:#06X}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_with_and_without_prefix() {
        assert_eq!(parse_hex("0x10").unwrap(), 0x10);
        assert_eq!(parse_hex("1A").unwrap(), 0x1A);
        assert!(parse_hex("zz").is_err());
    }
}
