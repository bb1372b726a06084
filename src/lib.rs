pub mod codec;
pub mod decoder;
pub mod disasm;
pub mod driver;
pub mod error;
pub mod instructions;
pub mod listing;
pub mod object;
pub mod symtab;

pub mod isa {
    pub mod sicxe; // SIC/XE (format 2/3/4 encodings)
}

pub use driver::{disassemble, disassemble_files, DisasmConfig, Disassembler};
pub use error::{Error, Result};
pub use listing::{Listing, ListingLine};
pub use symtab::{SymbolEntries, SymbolTable};
