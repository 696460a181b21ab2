//! Canonical re-formatting of HCL snippets.
//!
//! Suggestions are assembled from slices of the original source, so their
//! indentation and spacing are whatever the author wrote. `format` rewrites
//! them into the layout `terraform fmt` produces for the constructs that
//! matter here:
//!
//! * two spaces of indentation per bracket-opening line,
//! * `key = value` with a single space around `=`,
//! * `=` aligned across runs of consecutive single-line attributes,
//! * heredoc bodies and block comment continuations left untouched,
//! * trailing whitespace removed.
//!
//! `hcl::format` is not used: it formats a parsed `hcl::Body`, which keeps no
//! comments and rewrites expressions and heredoc bodies in its own style.
//! Suggestions have to keep the author's text, so it is re-indented line by
//! line instead.

use std::sync::LazyLock;

use regex::Regex;

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?P<key>[A-Za-z_][A-Za-z0-9_-]*|"(?:[^"\\]|\\.)*")\s*=(?P<rest>.*)$"#).unwrap()
});

static HEREDOC_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<<-?([A-Za-z_][A-Za-z0-9_-]*)").unwrap());

const INDENT: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Code,
    Blank,
    /// Heredoc body, heredoc terminator or block comment continuation.
    Verbatim,
}

#[derive(Debug)]
struct Line<'a> {
    raw: &'a str,
    kind: LineKind,
    net_brackets: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Str,
    Interp(usize),
}

#[derive(Debug, Default)]
struct Scanner {
    modes: Vec<Mode>,
    in_block_comment: bool,
    heredocs: Vec<String>,
}

impl Scanner {
    /// Scans one code line, returning its net bracket count. Heredoc markers
    /// found on the line are queued for the following lines.
    fn scan(&mut self, line: &str) -> i32 {
        let bytes = line.as_bytes();
        let mut net = 0;
        let mut i = 0;
        while i < bytes.len() {
            let rest = &line[i..];
            if self.in_block_comment {
                if rest.starts_with("*/") {
                    self.in_block_comment = false;
                    i += 2;
                } else {
                    i += char_len(rest);
                }
                continue;
            }
            match self.modes.last().copied() {
                Some(Mode::Str) => {
                    if rest.starts_with('\\') {
                        i += 1 + char_len(&line[i + 1..]);
                    } else if rest.starts_with("$${") || rest.starts_with("%%{") {
                        i += 3;
                    } else if rest.starts_with("${") || rest.starts_with("%{") {
                        self.modes.push(Mode::Interp(0));
                        net += 1;
                        i += 2;
                    } else if rest.starts_with('"') {
                        self.modes.pop();
                        i += 1;
                    } else {
                        i += char_len(rest);
                    }
                }
                mode => {
                    if rest.starts_with('#') || rest.starts_with("//") {
                        break;
                    }
                    if rest.starts_with("/*") {
                        self.in_block_comment = true;
                        i += 2;
                        continue;
                    }
                    if mode.is_none() {
                        if let Some(caps) = HEREDOC_START.captures(rest) {
                            self.heredocs.push(caps[1].to_string());
                            i += caps[0].len();
                            continue;
                        }
                    }
                    match bytes[i] {
                        b'"' => self.modes.push(Mode::Str),
                        b'{' | b'[' | b'(' => {
                            net += 1;
                            if let Some(Mode::Interp(depth)) = self.modes.last_mut() {
                                if bytes[i] == b'{' {
                                    *depth += 1;
                                }
                            }
                        }
                        b'}' | b']' | b')' => {
                            net -= 1;
                            if let Some(Mode::Interp(depth)) = self.modes.last_mut() {
                                if bytes[i] == b'}' {
                                    if *depth == 0 {
                                        self.modes.pop();
                                    } else {
                                        *depth -= 1;
                                    }
                                }
                            }
                        }
                        _ => {}
                    }
                    i += char_len(rest);
                }
            }
        }
        net
    }
}

fn char_len(rest: &str) -> usize {
    rest.chars().next().map_or(1, char::len_utf8)
}

fn split_lines(text: &str) -> Vec<Line<'_>> {
    let mut scanner = Scanner::default();
    let mut pending_heredocs: Vec<String> = Vec::new();
    let mut lines = Vec::new();
    for raw in text.lines() {
        if let Some(terminator) = pending_heredocs.first() {
            if raw.trim() == terminator {
                pending_heredocs.remove(0);
            }
            lines.push(Line {
                raw,
                kind: LineKind::Verbatim,
                net_brackets: 0,
            });
            continue;
        }
        if scanner.in_block_comment {
            scanner.scan(raw);
            lines.push(Line {
                raw,
                kind: LineKind::Verbatim,
                net_brackets: 0,
            });
            continue;
        }
        if raw.trim().is_empty() {
            lines.push(Line {
                raw,
                kind: LineKind::Blank,
                net_brackets: 0,
            });
            continue;
        }
        let net_brackets = scanner.scan(raw);
        pending_heredocs.append(&mut scanner.heredocs);
        lines.push(Line {
            raw,
            kind: LineKind::Code,
            net_brackets,
        });
    }
    lines
}

/// Indentation depth of each line, following the bracket-counting rule of
/// `hclwrite`: a line opening brackets is indented at the current depth and
/// pushes one level; a line closing brackets pops before it is indented.
fn indent_levels(lines: &[Line<'_>]) -> Vec<usize> {
    let mut stack: Vec<i32> = Vec::new();
    let mut levels = Vec::with_capacity(lines.len());
    for line in lines {
        if line.kind != LineKind::Code {
            levels.push(stack.len());
            continue;
        }
        let net = line.net_brackets;
        if net > 0 {
            levels.push(stack.len());
            stack.push(net);
            continue;
        }
        let mut closed = -net;
        while closed > 0 {
            let Some(top) = stack.last_mut() else {
                break;
            };
            if closed >= *top {
                closed -= *top;
                stack.pop();
            } else {
                *top -= closed;
                closed = 0;
            }
        }
        levels.push(stack.len());
    }
    levels
}

struct Assignment<'a> {
    key: &'a str,
    value: &'a str,
}

fn parse_assignment(content: &str) -> Option<Assignment<'_>> {
    let caps = ASSIGNMENT.captures(content)?;
    let key = caps.name("key")?.as_str();
    let rest = caps.name("rest")?.as_str();
    if rest.starts_with('=') || rest.starts_with('>') {
        return None;
    }
    Some(Assignment {
        key,
        value: rest.trim(),
    })
}

fn write_assignment(out: &mut String, assignment: &Assignment<'_>, key_width: usize) {
    out.push_str(assignment.key);
    let padding = key_width.saturating_sub(assignment.key.chars().count());
    out.extend(std::iter::repeat_n(' ', padding));
    if assignment.value.is_empty() {
        out.push_str(" =");
    } else {
        out.push_str(" = ");
        out.push_str(assignment.value);
    }
}

/// Re-formats an HCL snippet. The result has no trailing whitespace.
pub fn format(text: &str) -> String {
    let lines = split_lines(text);
    let levels = indent_levels(&lines);

    let assignments: Vec<Option<Assignment<'_>>> = lines
        .iter()
        .map(|line| match line.kind {
            LineKind::Code => parse_assignment(line.raw.trim()),
            _ => None,
        })
        .collect();
    // Only attributes that fit on one line take part in alignment.
    let alignable: Vec<bool> = lines
        .iter()
        .zip(&assignments)
        .map(|(line, a)| a.is_some() && line.net_brackets == 0)
        .collect();

    // Width of the key column for every line taking part in an aligned run.
    let mut key_widths = vec![0; lines.len()];
    let mut run_start = 0;
    while run_start < lines.len() {
        if !alignable[run_start] {
            run_start += 1;
            continue;
        }
        let level = levels[run_start];
        let mut run_end = run_start;
        while run_end < lines.len() && alignable[run_end] && levels[run_end] == level {
            run_end += 1;
        }
        let width = assignments[run_start..run_end]
            .iter()
            .flatten()
            .map(|a| a.key.chars().count())
            .max()
            .unwrap_or(0);
        for w in &mut key_widths[run_start..run_end] {
            *w = width;
        }
        run_start = run_end;
    }

    let mut out = String::with_capacity(text.len());
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        match line.kind {
            LineKind::Blank => {}
            LineKind::Verbatim => out.push_str(line.raw.trim_end()),
            LineKind::Code => {
                for _ in 0..levels[i] {
                    out.push_str(INDENT);
                }
                match &assignments[i] {
                    Some(assignment) => write_assignment(&mut out, assignment, key_widths[i]),
                    None => out.push_str(line.raw.trim()),
                }
            }
        }
    }
    out.trim_end().to_string()
}
