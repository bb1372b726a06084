use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_COLUMN_WIDTH: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingLine {
    /// `None` for directive lines that have no location (BASE, END).
    pub loc: Option<u32>,
    pub label: String,
    pub opcode: String,
    pub operand: String,
    pub object_code: String,
}

impl ListingLine {
    pub fn directive(opcode: &str, operand: impl Into<String>) -> Self {
        Self {
            loc: None,
            label: String::new(),
            opcode: opcode.to_string(),
            operand: operand.into(),
            object_code: String::new(),
        }
    }

    pub fn render(&self, width: usize) -> String {
        let loc = self.loc.map(|l| format!("{l:04X}")).unwrap_or_default();
        let cols = [loc.as_str(), &self.label, &self.opcode, &self.operand, &self.object_code];
        let mut out = String::new();
        for c in cols {
            // at least one space between columns
            let w = width.max(c.chars().count() + 1);
            out.push_str(&format!("{c:<w$}"));
        }
        out.trim_end().to_string()
    }
}

/// Complete output: the START line, body lines and the END line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub program: String,
    pub start: u32,
    pub lines: Vec<ListingLine>,
    #[serde(skip)]
    pub column_width: usize,
}

impl Listing {
    pub fn new(program: impl Into<String>, start: u32) -> Self {
        Self { program: program.into(), start, lines: Vec::new(), column_width: DEFAULT_COLUMN_WIDTH }
    }

    pub fn push(&mut self, line: ListingLine) {
        self.lines.push(line);
    }

    fn start_line(&self) -> ListingLine {
        ListingLine {
            loc: Some(self.start),
            label: self.program.clone(),
            opcode: "START".into(),
            operand: "0".into(),
            object_code: String::new(),
        }
    }

    fn end_line(&self) -> ListingLine {
        ListingLine::directive("END", self.program.clone())
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let w = self.column_width;
        writeln!(f, "{}", self.start_line().render(w))?;
        for line in &self.lines {
            writeln!(f, "{}", line.render(w))?;
        }
        writeln!(f, "{}", self.end_line().render(w))
    }
}
