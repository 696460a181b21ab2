use hcl_edit::structure::Block;

use crate::utils::TerraformUtils;

/// Where an argument belongs inside a block, with its priority for meta args.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgClass {
    HeadMeta(i32),
    TailMeta(i32),
    Ordinary,
}

impl ArgClass {
    pub fn priority(&self) -> i32 {
        match self {
            ArgClass::HeadMeta(p) | ArgClass::TailMeta(p) => *p,
            ArgClass::Ordinary => 0,
        }
    }
}

/// Fixed name to priority tables for meta arguments. Higher priority sorts first.
#[derive(Debug)]
pub struct Classifier {
    head_meta: &'static [(&'static str, i32)],
    tail_meta: &'static [(&'static str, i32)],
}

impl Classifier {
    /// Meta arguments of Terraform `resource` and `data` blocks.
    pub const TERRAFORM: Classifier = Classifier::new(
        &[("for_each", 1), ("count", 1), ("provider", 0)],
        &[("lifecycle", 1), ("depends_on", 0)],
    );

    pub const fn new(
        head_meta: &'static [(&'static str, i32)],
        tail_meta: &'static [(&'static str, i32)],
    ) -> Self {
        Self {
            head_meta,
            tail_meta,
        }
    }

    pub fn classify(&self, name: &str) -> ArgClass {
        if let Some(p) = lookup(self.head_meta, name) {
            return ArgClass::HeadMeta(p);
        }
        if let Some(p) = lookup(self.tail_meta, name) {
            return ArgClass::TailMeta(p);
        }
        ArgClass::Ordinary
    }

    pub fn is_head_meta(&self, name: &str) -> bool {
        matches!(self.classify(name), ArgClass::HeadMeta(_))
    }

    pub fn is_tail_meta(&self, name: &str) -> bool {
        matches!(self.classify(name), ArgClass::TailMeta(_))
    }
}

fn lookup(table: &[(&str, i32)], name: &str) -> Option<i32> {
    table.iter().find(|(n, _)| *n == name).map(|(_, p)| *p)
}

/// Name and sort field of a nested block.
///
/// A `dynamic "x"` block is named after its first label so it classifies like
/// a literal `x` block; it sorts on all its labels joined together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockKey {
    pub name: String,
    pub sort_field: String,
}

impl BlockKey {
    pub fn of(block: &Block) -> Self {
        let ident = block.ident.value().as_str();
        if ident != "dynamic" {
            return Self {
                name: ident.to_string(),
                sort_field: ident.to_string(),
            };
        }
        let name = TerraformUtils::first_label(block).unwrap_or(ident).to_string();
        let sort_field = block
            .labels
            .iter()
            .map(TerraformUtils::label_str)
            .collect::<String>();
        Self { name, sort_field }
    }
}

/// `content` directly under `dynamic` is not a nesting level of its own.
pub fn inherits_parent_path(parent_ident: &str, child_name: &str) -> bool {
    parent_ident == "dynamic" && child_name == "content"
}
