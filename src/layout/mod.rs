//! Canonical layout of Terraform blocks.
//!
//! A block's children are split into sections (head meta arguments,
//! attributes, nested blocks, tail meta arguments). The block is in layout
//! when every section is internally ordered and the sections follow each
//! other in canonical sequence, separated by blank lines. Out of layout
//! blocks are rendered back in canonical form as a suggestion.

mod block;
mod classify;
mod section;

pub use block::LayoutBlock;
pub use classify::Classifier;

/// Classification tables used to build layouts.
#[derive(Debug, Clone, Copy)]
pub struct LayoutPolicy {
    pub classifier: &'static Classifier,
}

impl LayoutPolicy {
    pub const TERRAFORM: LayoutPolicy = LayoutPolicy {
        classifier: &Classifier::TERRAFORM,
    };
}

impl Default for LayoutPolicy {
    fn default() -> Self {
        Self::TERRAFORM
    }
}
