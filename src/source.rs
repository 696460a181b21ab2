use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;

use hcl_edit::Span;
use hcl_edit::structure::Body;

use crate::error::{LintError, Result};

/// A position inside a source file. `line` and `column` are 1-based, the
/// column counts characters, `byte` is the 0-based offset into the text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
    pub byte: usize,
}

impl Pos {
    /// Source order by `(line, column)`. Byte offsets are never compared.
    pub fn cmp_line_col(&self, other: &Pos) -> Ordering {
        (self.line, self.column).cmp(&(other.line, other.column))
    }
}

/// A span of text in a named file.
///
/// `SourceRange::default()` has an empty file name and zero positions. No real
/// range can look like that since lines start at 1, so it doubles as the
/// "not observed yet" marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SourceRange {
    pub filename: String,
    pub start: Pos,
    pub end: Pos,
}

impl SourceRange {
    pub fn is_null(&self) -> bool {
        self.filename.is_empty() && self.start.line == 0 && self.end.line == 0
    }

    /// Line-based union used by sections. Columns only follow the line that won.
    pub fn union_lines(&self, other: &SourceRange) -> SourceRange {
        if self.is_null() {
            return other.clone();
        }
        let mut merged = self.clone();
        if other.start.line < merged.start.line {
            merged.start = other.start;
        }
        if other.end.line > merged.end.line {
            merged.end = other.end;
        }
        merged
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{},{}-{},{}",
            self.filename, self.start.line, self.start.column, self.end.line, self.end.column
        )
    }
}

/// Byte offset to line/column lookup, built once per file.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { line_starts }
    }

    pub fn pos(&self, text: &str, byte: usize) -> Pos {
        let byte = floor_char_boundary(text, byte.min(text.len()));
        let line = self.line_starts.partition_point(|&start| start <= byte) - 1;
        let line_start = self.line_starts[line];
        let column = text[line_start..byte].chars().count() + 1;
        Pos {
            line: line + 1,
            column,
            byte,
        }
    }
}

fn floor_char_boundary(text: &str, mut byte: usize) -> usize {
    while byte > 0 && !text.is_char_boundary(byte) {
        byte -= 1;
    }
    byte
}

/// One configuration file: its text, its parse result and a line index.
///
/// A file that fails to parse is still kept so that rules looking only at
/// file names (or skipping broken files) can see it.
pub struct SourceFile {
    name: String,
    text: String,
    body: std::result::Result<Body, String>,
    index: LineIndex,
}

impl SourceFile {
    pub fn parse(name: impl Into<String>, text: impl Into<String>) -> Self {
        let name = name.into();
        let text = text.into();
        let body = hcl_edit::parser::parse_body(&text).map_err(|err| err.to_string());
        let index = LineIndex::new(&text);
        Self {
            name,
            text,
            body,
            index,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn body(&self) -> Result<&Body> {
        self.body.as_ref().map_err(|message| LintError::Parse {
            file: self.name.clone(),
            message: message.clone(),
        })
    }

    pub fn pos(&self, byte: usize) -> Pos {
        self.index.pos(&self.text, byte)
    }

    /// Range of a byte span with surrounding whitespace trimmed off.
    pub fn range(&self, span: Range<usize>) -> SourceRange {
        let end = span.end.min(self.text.len());
        let start = span.start.min(end);
        let raw = self.text.get(start..end).unwrap_or_default();
        let leading = raw.len() - raw.trim_start().len();
        let trimmed_end = start + raw.trim_end().len();
        let trimmed_start = (start + leading).min(trimmed_end);
        SourceRange {
            filename: self.name.clone(),
            start: self.pos(trimmed_start),
            end: self.pos(trimmed_end),
        }
    }

    /// Range of any parsed node. Nodes built by the parser always carry a span.
    pub fn range_of(&self, node: &impl Span) -> SourceRange {
        node.span()
            .map(|span| self.range(span))
            .unwrap_or_default()
    }

    pub fn slice(&self, range: &SourceRange) -> &str {
        self.text
            .get(range.start.byte..range.end.byte)
            .unwrap_or_default()
    }

    /// Source text of a parsed node.
    pub fn text_of(&self, node: &impl Span) -> &str {
        self.slice(&self.range_of(node))
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("name", &self.name)
            .field("parsed", &self.body.is_ok())
            .finish()
    }
}
