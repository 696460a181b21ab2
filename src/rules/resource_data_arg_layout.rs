use hcl_edit::structure::Body;
use tracing::debug;

use crate::error::{MultiError, Result};
use crate::layout::{LayoutBlock, LayoutPolicy};
use crate::rules::Rule;
use crate::runner::Runner;
use crate::source::SourceFile;
use crate::utils::TerraformUtils;

pub struct TerraformResourceDataArgLayoutRule;

impl Rule for TerraformResourceDataArgLayoutRule {
    fn name(&self) -> &'static str {
        "terraform_resource_data_arg_layout"
    }

    fn description(&self) -> &'static str {
        "Arguments of resource and data blocks should follow the canonical layout: meta arguments, attributes, nested blocks, then depends_on and lifecycle"
    }

    fn check_file(&self, runner: &dyn Runner, file: &SourceFile, body: &Body) -> Result<()> {
        let policy = LayoutPolicy::default();
        let mut errors = MultiError::new();
        for block in body.blocks() {
            if !matches!(TerraformUtils::block_type(block), "resource" | "data") {
                continue;
            }
            for misplaced in LayoutBlock::root(file, block, policy).check_block() {
                debug!(
                    file = file.name(),
                    path = %misplaced.path,
                    range = %misplaced.range,
                    "block out of layout"
                );
                errors.absorb(runner.emit_issue(
                    self,
                    format!(
                        "Arguments are expected to be arranged in following Layout:\n{}",
                        misplaced.suggestion
                    ),
                    misplaced.range,
                ));
            }
        }
        errors.into_result()
    }
}
