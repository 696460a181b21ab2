use hcl_edit::structure::Body;

use crate::error::Result;
use crate::rules::Rule;
use crate::runner::Runner;
use crate::source::SourceFile;
use crate::utils::TerraformUtils;

pub struct TerraformOutputSeparateRule;

impl Rule for TerraformOutputSeparateRule {
    fn name(&self) -> &'static str {
        "terraform_output_separate"
    }

    fn description(&self) -> &'static str {
        "Outputs should be declared in a file of their own"
    }

    fn check_file(&self, runner: &dyn Runner, file: &SourceFile, body: &Body) -> Result<()> {
        if body.get_blocks("output").next().is_none() {
            return Ok(());
        }
        match TerraformUtils::first_block_not_of(body, "output") {
            Some(other) => runner.emit_issue(
                self,
                "Putting outputs and other types of blocks in the same file is not recommended"
                    .to_string(),
                TerraformUtils::def_range(file, other),
            ),
            None => Ok(()),
        }
    }
}
