use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use std::path::PathBuf;

use sicxe_rs::{disassemble_files, DisasmConfig, Listing};

const OUTPUT_FILE_NAME: &str = "out.lst";

#[derive(Parser, Debug)]
#[command(author, version, about = "SIC/XE object code disassembler", long_about = None)]
struct Cli {
    /// Object program (H/T/E records)
    #[arg(value_name = "OBJFILE")]
    object: PathBuf,
    /// Symbol and literal tables written by the assembler
    #[arg(value_name = "SYMFILE")]
    symbols: PathBuf,
    /// Listing destination
    #[arg(long, value_name = "FILE", default_value = OUTPUT_FILE_NAME)]
    out: PathBuf,
    /// Output format: text or json
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Show operand targets by label when one exists
    #[arg(long)]
    symbolic: bool,
    /// Width of each listing column
    #[arg(long, default_value_t = DisasmConfig::default().column_width)]
    column_width: usize,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat { Text, Json }

impl Cli {
    fn config(&self) -> DisasmConfig {
        DisasmConfig { symbolic_operands: self.symbolic, column_width: self.column_width }
    }
}

fn render(listing: &Listing, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => listing.to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(listing)?,
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let listing = disassemble_files(&cli.object, &cli.symbols, cli.config())?;
    let text = render(&listing, cli.format)?;
    std::fs::write(&cli.out, text).with_context(|| format!("Failed to write {}", cli.out.display()))?;
    tracing::info!(out = %cli.out.display(), "listing written");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_library() {
        let cli = Cli::parse_from(["disassembler", "prog.obj", "prog.sym"]);
        assert_eq!(cli.out, PathBuf::from("out.lst"));
        assert_eq!(cli.config(), DisasmConfig::default());
        assert!(matches!(cli.format, OutputFormat::Text));
    }

    #[test]
    fn flags_map_onto_config() {
        let cli = Cli::parse_from(["disassembler", "a", "b", "--symbolic", "--column-width", "12", "--format", "json"]);
        assert_eq!(cli.config(), DisasmConfig { symbolic_operands: true, column_width: 12 });
        assert!(matches!(cli.format, OutputFormat::Json));
    }

    #[test]
    fn missing_files_are_reported_by_name() {
        let err = disassemble_files("no_such.obj".as_ref(), "no_such.sym".as_ref(), DisasmConfig::default()).unwrap_err();
        assert!(err.to_string().contains("no_such.obj"));
    }

    #[test]
    fn json_render_has_lines() {
        let mut l = Listing::new("P", 0);
        l.push(sicxe_rs::ListingLine::directive("BASE", "0033"));
        let s = render(&l, OutputFormat::Json).unwrap();
        let v: serde_json::Value = serde_json::from_str(&s).unwrap();
        assert_eq!(v["program"], "P");
        assert_eq!(v["lines"][0]["opcode"], "BASE");
    }
}
