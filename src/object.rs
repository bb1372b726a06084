use serde::{Deserialize, Serialize};

use crate::codec::{self, CodecError};

const HEADER_RECORD: u8 = b'H';
const TEXT_RECORD: u8 = b'T';
const ADDRESS_CHARS: usize = 6;
const COUNT_CHARS: usize = 2;
const NAME_CHARS: usize = 6;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("record ends early at offset {offset}")]
    Truncated { offset: usize },
    #[error("bad hex at offset {offset}: {source}")]
    Codec { offset: usize, #[source] source: CodecError },
}

/// Sequential source of hex characters. Implementors hand out exactly `n`
/// validated, uppercase hex chars or fail without a partial read being usable.
pub trait HexSource {
    fn read_hex(&mut self, n: usize) -> Result<String, StreamError>;

    fn read_bytes(&mut self, n: usize) -> Result<String, StreamError> {
        self.read_hex(n * 2)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub start: u32,
    pub length: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSection {
    pub start: u32,
    pub len: u32,
}

/// Cursor over the text of an object program.
#[derive(Debug, Clone)]
pub struct ObjectReader {
    text: Vec<u8>,
    pos: usize,
}

impl ObjectReader {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into().into_bytes(), pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0 || self.text[self.pos - 1] == b'\n'
    }

    fn skip_line(&mut self) {
        while let Some(&c) = self.text.get(self.pos) {
            self.pos += 1;
            if c == b'\n' {
                break;
            }
        }
    }

    /// Parses the `H` record: a 6-char program name followed by the start
    /// address and program length. Short records fall back to ending the
    /// name at the first digit. Does not move the cursor.
    pub fn header(&self) -> Option<Result<Header, StreamError>> {
        let mut offset = 0;
        for line in self.text.split(|&c| c == b'\n') {
            if line.first() == Some(&HEADER_RECORD) {
                return Some(parse_header(line, offset));
            }
            offset += line.len() + 1;
        }
        None
    }

    /// Skips ahead to the next `T` record and reads its start/count fields,
    /// leaving the cursor on the first byte of the record body.
    pub fn next_text_section(&mut self) -> Result<Option<TextSection>, StreamError> {
        loop {
            if self.is_eof() {
                return Ok(None);
            }
            if self.at_line_start() && self.text[self.pos] == TEXT_RECORD {
                self.pos += 1;
                let start = self.read_field(ADDRESS_CHARS)?;
                let len = self.read_field(COUNT_CHARS)?;
                return Ok(Some(TextSection { start, len }));
            }
            self.skip_line();
        }
    }

    fn read_field(&mut self, n: usize) -> Result<u32, StreamError> {
        let offset = self.pos;
        let s = self.read_hex(n)?;
        codec::hex_to_unsigned(&s).map_err(|source| StreamError::Codec { offset, source })
    }
}

impl HexSource for ObjectReader {
    fn read_hex(&mut self, n: usize) -> Result<String, StreamError> {
        let end = self.pos + n;
        let Some(chunk) = self.text.get(self.pos..end) else {
            return Err(StreamError::Truncated { offset: self.text.len() });
        };
        let mut out = String::with_capacity(n);
        for (i, &c) in chunk.iter().enumerate() {
            let offset = self.pos + i;
            if c == b'\n' || c == b'\r' {
                return Err(StreamError::Truncated { offset });
            }
            let d = codec::hex_digit(c as char).map_err(|source| StreamError::Codec { offset, source })?;
            out.push(codec::hex_char(d));
        }
        self.pos = end;
        Ok(out)
    }
}

fn parse_header(line: &[u8], offset: usize) -> Result<Header, StreamError> {
    let body = line.strip_suffix(b"\r").unwrap_or(line);
    let body = &body[1..];
    let name_end = if body.len() >= NAME_CHARS + 2 * ADDRESS_CHARS {
        NAME_CHARS
    } else {
        body.iter().position(u8::is_ascii_digit).unwrap_or(body.len())
    };
    let name = String::from_utf8_lossy(&body[..name_end]).trim().to_string();
    let mut rest = ObjectReader { text: body[name_end..].to_vec(), pos: 0 };
    let field = |r: &mut ObjectReader| -> Result<u32, StreamError> {
        if r.is_eof() {
            return Ok(0);
        }
        r.read_field(ADDRESS_CHARS).map_err(|e| match e {
            StreamError::Truncated { offset: o } => StreamError::Truncated { offset: offset + 1 + name_end + o },
            StreamError::Codec { offset: o, source } => StreamError::Codec { offset: offset + 1 + name_end + o, source },
        })
    };
    let start = field(&mut rest)?;
    let length = field(&mut rest)?;
    Ok(Header { name, start, length })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM: &str = "HCOPY  000000001077\nT0000000A0320104B1010364F0000\nM00000705\nT00001003454F46\nE000000\n";

    #[test]
    fn header_fields() {
        let r = ObjectReader::new(PROGRAM);
        let h = r.header().unwrap().unwrap();
        assert_eq!(h, Header { name: "COPY".into(), start: 0, length: 0x1077 });
        assert_eq!(r.position(), 0);
    }

    #[test]
    fn digits_in_program_name() {
        let r = ObjectReader::new("HPROG2 000100000003\nT00010003032010\n");
        let h = r.header().unwrap().unwrap();
        assert_eq!(h, Header { name: "PROG2".into(), start: 0x100, length: 3 });
    }

    #[test]
    fn short_header_ends_name_at_digit() {
        let h = ObjectReader::new("HP000010\n").header().unwrap().unwrap();
        assert_eq!(h, Header { name: "P".into(), start: 0x10, length: 0 });
    }

    #[test]
    fn missing_header() {
        let r = ObjectReader::new("T0000000B\n");
        assert!(r.header().is_none());
    }

    #[test]
    fn walks_text_records_and_skips_others() {
        let mut r = ObjectReader::new(PROGRAM);
        let s = r.next_text_section().unwrap().unwrap();
        assert_eq!(s, TextSection { start: 0, len: 0x0A });
        assert_eq!(r.read_bytes(3).unwrap(), "032010");
        // leftovers of a record are skipped with the rest of the line
        let s = r.next_text_section().unwrap().unwrap();
        assert_eq!(s, TextSection { start: 0x10, len: 3 });
        assert_eq!(r.read_bytes(3).unwrap(), "454F46");
        assert_eq!(r.next_text_section().unwrap(), None);
        assert!(r.is_eof());
    }

    #[test]
    fn read_stops_at_line_end() {
        let mut r = ObjectReader::new("T00000002AB\nT000002");
        r.next_text_section().unwrap();
        assert_eq!(r.read_hex(4), Err(StreamError::Truncated { offset: 11 }));
    }

    #[test]
    fn lowercase_is_normalized() {
        let mut r = ObjectReader::new("4f0000");
        assert_eq!(r.read_hex(3).unwrap(), "4F0");
        assert!(matches!(ObjectReader::new("4Z").read_hex(2), Err(StreamError::Codec { offset: 1, .. })));
    }
}
