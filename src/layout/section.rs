use std::cmp::Ordering;

use hcl_edit::structure::Attribute;

use super::block::LayoutBlock;
use crate::format::format;
use crate::source::{SourceFile, SourceRange};

/// The kind of a section decides how its members must be ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// `for_each`, `count`, `provider`: descending priority.
    HeadMeta,
    /// Ordinary attributes: by name.
    Attributes,
    /// Ordinary nested blocks: by sort field.
    NestedBlocks,
    /// `depends_on`, `lifecycle`: descending priority.
    TailMeta,
}

#[derive(Debug)]
pub enum ArgKind<'a> {
    /// Rendered from its source range.
    Attribute,
    Block(Box<LayoutBlock<'a>>),
}

/// One classified child of a block.
#[derive(Debug)]
pub struct Arg<'a> {
    pub sort_key: String,
    pub range: SourceRange,
    pub priority: i32,
    pub kind: ArgKind<'a>,
}

impl<'a> Arg<'a> {
    pub fn attribute(file: &SourceFile, attr: &Attribute, priority: i32) -> Self {
        Self {
            sort_key: attr.key.as_str().to_string(),
            range: file.range_of(attr),
            priority,
            kind: ArgKind::Attribute,
        }
    }

    pub fn block(block: LayoutBlock<'a>, priority: i32) -> Self {
        Self {
            sort_key: block.sort_field().to_string(),
            range: block.range().clone(),
            priority,
            kind: ArgKind::Block(Box::new(block)),
        }
    }

    /// Attributes are copied from the source, blocks are rendered canonically.
    pub fn render(&self, file: &SourceFile) -> String {
        match &self.kind {
            ArgKind::Attribute => file.slice(&self.range).to_string(),
            ArgKind::Block(block) => block.render(),
        }
    }
}

/// An ordered group of args with the line span they cover.
#[derive(Debug)]
pub struct Section<'a> {
    kind: SectionKind,
    args: Vec<Arg<'a>>,
    range: SourceRange,
}

impl<'a> Section<'a> {
    pub fn new(kind: SectionKind) -> Self {
        Self {
            kind,
            args: Vec::new(),
            range: SourceRange::default(),
        }
    }

    pub fn add(&mut self, arg: Arg<'a>) {
        self.range = self.range.union_lines(&arg.range);
        self.args.push(arg);
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn args(&self) -> &[Arg<'a>] {
        &self.args
    }

    /// `None` until the first arg is added.
    pub fn range(&self) -> Option<&SourceRange> {
        if self.range.is_null() {
            None
        } else {
            Some(&self.range)
        }
    }

    fn compare(&self, a: &Arg<'_>, b: &Arg<'_>) -> Ordering {
        match self.kind {
            SectionKind::HeadMeta | SectionKind::TailMeta => b.priority.cmp(&a.priority),
            SectionKind::Attributes | SectionKind::NestedBlocks => a.sort_key.cmp(&b.sort_key),
        }
    }

    fn source_order(&self) -> Vec<&Arg<'a>> {
        let mut args: Vec<&Arg<'a>> = self.args.iter().collect();
        args.sort_by(|a, b| a.range.start.cmp_line_col(&b.range.start));
        args
    }

    /// True when the declared order already is the canonical one.
    pub fn check_order(&self) -> bool {
        self.source_order()
            .windows(2)
            .all(|pair| self.compare(pair[0], pair[1]) != Ordering::Greater)
    }

    /// Members in canonical order. The sort is stable over source order, so
    /// members with equal keys keep their relative position.
    pub fn canonical(&self) -> Vec<&Arg<'a>> {
        let mut args = self.source_order();
        args.sort_by(|a, b| self.compare(a, b));
        args
    }

    /// Canonical members, one after the other, re-formatted. Empty when the
    /// section has no members.
    pub fn render(&self, file: &SourceFile) -> String {
        if self.is_empty() {
            return String::new();
        }
        let text = self
            .canonical()
            .into_iter()
            .map(|arg| arg.render(file))
            .collect::<Vec<_>>()
            .join("\n");
        format(&text)
    }
}
