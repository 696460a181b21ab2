use std::fmt;

use hcl_edit::structure::Block;

use super::classify::{BlockKey, inherits_parent_path};
use super::section::{Arg, ArgKind, Section, SectionKind};
use super::LayoutPolicy;
use crate::format::format;
use crate::source::{SourceFile, SourceRange};
use crate::utils::TerraformUtils;

/// A block whose children are out of canonical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Misplaced {
    /// Qualification path of the offending block, joined with dots.
    pub path: String,
    /// Definition range (type and labels) of the offending block.
    pub range: SourceRange,
    /// The block rewritten in canonical layout.
    pub suggestion: String,
}

/// A parsed block split into layout sections.
///
/// A root block (`resource`, `data`) has five sections in this canonical
/// sequence: head meta args, attributes, nested blocks, tail meta args and
/// tail meta blocks. Nested blocks have the first three only, meta arguments
/// other than the head ones being ordinary attributes there.
#[derive(Debug)]
pub struct LayoutBlock<'a> {
    file: &'a SourceFile,
    block: &'a Block,
    name: String,
    sort_field: String,
    path: Vec<String>,
    range: SourceRange,
    sections: Vec<Section<'a>>,
}

const HEAD_META: usize = 0;
const ATTRIBUTES: usize = 1;
const NESTED_BLOCKS: usize = 2;
const TAIL_META_ARGS: usize = 3;
const TAIL_META_BLOCKS: usize = 4;

impl<'a> LayoutBlock<'a> {
    /// Builds the tree of a top level block.
    pub fn root(file: &'a SourceFile, block: &'a Block, policy: LayoutPolicy) -> Self {
        let key = BlockKey::of(block);
        let mut path = vec![block.ident.value().as_str().to_string()];
        if let Some(label) = TerraformUtils::first_label(block) {
            path.push(label.to_string());
        }
        Self::build(file, block, key, path, policy, true)
    }

    fn build(
        file: &'a SourceFile,
        block: &'a Block,
        key: BlockKey,
        path: Vec<String>,
        policy: LayoutPolicy,
        is_root: bool,
    ) -> Self {
        let mut sections = vec![
            Section::new(SectionKind::HeadMeta),
            Section::new(SectionKind::Attributes),
            Section::new(SectionKind::NestedBlocks),
        ];
        if is_root {
            sections.push(Section::new(SectionKind::TailMeta));
            sections.push(Section::new(SectionKind::TailMeta));
        }

        let classifier = policy.classifier;
        for attr in TerraformUtils::attributes_by_lines(&block.body) {
            let name = attr.key.as_str();
            let target = if classifier.is_head_meta(name) {
                HEAD_META
            } else if is_root && classifier.is_tail_meta(name) {
                TAIL_META_ARGS
            } else {
                ATTRIBUTES
            };
            let priority = classifier.classify(name).priority();
            sections[target].add(Arg::attribute(file, attr, priority));
        }

        let ident = block.ident.value().as_str();
        for child in block.body.blocks() {
            let child_key = BlockKey::of(child);
            let child_path = if inherits_parent_path(ident, &child_key.name) {
                path.clone()
            } else {
                let mut p = path.clone();
                p.push(child_key.name.clone());
                p
            };
            let target = if is_root && classifier.is_tail_meta(&child_key.name) {
                TAIL_META_BLOCKS
            } else {
                NESTED_BLOCKS
            };
            let priority = classifier.classify(&child_key.name).priority();
            let nested = Self::build(file, child, child_key, child_path, policy, false);
            sections[target].add(Arg::block(nested, priority));
        }

        Self {
            file,
            block,
            name: key.name,
            sort_field: key.sort_field,
            path,
            range: file.range_of(block),
            sections,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sort_field(&self) -> &str {
        &self.sort_field
    }

    /// Names of the enclosing blocks down to this one, e.g.
    /// `["resource", "azurerm_kubernetes_cluster", "default_node_pool"]`.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn range(&self) -> &SourceRange {
        &self.range
    }

    pub fn def_range(&self) -> SourceRange {
        TerraformUtils::def_range(self.file, self.block)
    }

    /// All children, section by section, in insertion order.
    pub fn args(&self) -> impl Iterator<Item = &Arg<'a>> {
        self.sections.iter().flat_map(|s| s.args().iter())
    }

    pub fn nested_blocks(&self) -> impl Iterator<Item = &LayoutBlock<'a>> {
        self.args().filter_map(|arg| match &arg.kind {
            ArgKind::Block(block) => Some(block.as_ref()),
            ArgKind::Attribute => None,
        })
    }

    /// Every section is ordered, sections follow the canonical sequence
    /// without interleaving, and a blank line separates each pair of
    /// non-empty sections.
    pub fn check_order(&self) -> bool {
        let mut last_end: Option<usize> = None;
        for section in &self.sections {
            if !section.check_order() {
                return false;
            }
            let Some(range) = section.range() else {
                continue;
            };
            if let Some(end) = last_end {
                if range.start.line <= end {
                    return false;
                }
                if range.start.line - end < 2 {
                    return false;
                }
            }
            last_end = Some(range.end.line);
        }
        true
    }

    /// Finds the smallest blocks that are out of order.
    ///
    /// An unordered block is reported as a whole with its canonical rendering.
    /// An ordered block is clean itself and its nested blocks are checked.
    pub fn check_block(&self) -> Vec<Misplaced> {
        if !self.check_order() {
            return vec![Misplaced {
                path: self.path().join("."),
                range: self.def_range(),
                suggestion: self.render(),
            }];
        }
        self.nested_blocks()
            .flat_map(|nested| nested.check_block())
            .collect()
    }

    /// The block rewritten in canonical layout.
    pub fn render(&self) -> String {
        let body = self
            .sections
            .iter()
            .map(|section| section.render(self.file))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        let header = TerraformUtils::block_header(self.block);
        let text = if body.trim().is_empty() {
            format!("{header} {{}}")
        } else {
            format!("{header} {{\n{body}\n}}")
        };
        format(&text)
    }
}

impl fmt::Display for LayoutBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
