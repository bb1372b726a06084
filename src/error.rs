use std::path::PathBuf;

use crate::codec::CodecError;
use crate::decoder::DecodeError;
use crate::object::StreamError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to open file: {}", path.display())]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("line {line}: expected {expected} fields, found {found}")]
    MalformedEntry { line: usize, expected: usize, found: usize },
    #[error("bad address {address:?}: {source}")]
    BadAddress { address: String, #[source] source: CodecError },
    #[error("literal {name} at {loc:#06X} has unusable length {length:?}")]
    BadLiteralLength { name: String, loc: u32, length: String },
    #[error("object program has no header record")]
    MissingHeader,
    #[error("decode failed at {loc:#06X}: {source}")]
    Decode { loc: u32, #[source] source: DecodeError },
    #[error("text record ends mid item at {loc:#06X}: {remaining} bytes left, item needs {consumed}")]
    SectionOverrun { loc: u32, remaining: u32, consumed: u32 },
    #[error(transparent)]
    Stream(#[from] StreamError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
