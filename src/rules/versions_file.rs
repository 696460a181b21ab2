use hcl_edit::structure::Body;
use tracing::debug;

use crate::error::{LintError, Result};
use crate::ignore::IgnoreFilter;
use crate::rules::Rule;
use crate::runner::Runner;
use crate::source::{SourceFile, SourceRange};
use crate::utils::TerraformUtils;

const VERSIONS_FILE: &str = "versions.tf";

pub struct TerraformVersionsFileRule;

impl Rule for TerraformVersionsFileRule {
    fn name(&self) -> &'static str {
        "terraform_versions_file"
    }

    fn description(&self) -> &'static str {
        "`versions.tf` should hold exactly one `terraform` block"
    }

    /// Only `versions.tf` is looked at, and only when the module has one.
    fn check_with(&self, runner: &dyn Runner, filter: &IgnoreFilter) -> Result<()> {
        let file = match runner.get_file(VERSIONS_FILE) {
            Ok(file) => file,
            Err(LintError::FileNotFound(_)) => return Ok(()),
            Err(err) => return Err(err),
        };
        if filter.is_ignored(file.name(), self.name()) {
            debug!(rule = self.name(), file = file.name(), "file ignored");
            return Ok(());
        }
        match file.body() {
            Ok(body) => self.check_file(runner, file, body),
            Err(err) => {
                debug!(rule = self.name(), "skipping file: {err}");
                Ok(())
            }
        }
    }

    fn check_file(&self, runner: &dyn Runner, _file: &SourceFile, body: &Body) -> Result<()> {
        let blocks: Vec<_> = body.blocks().collect();
        if let [block] = blocks.as_slice()
            && TerraformUtils::block_type(block) == "terraform"
        {
            return Ok(());
        }
        runner.emit_issue(
            self,
            "`versions.tf` should have and only have 1 `terraform` block".to_string(),
            SourceRange::default(),
        )
    }
}
