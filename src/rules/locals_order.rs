use hcl_edit::structure::{Block, Body};

use crate::error::{MultiError, Result};
use crate::format::format;
use crate::rules::Rule;
use crate::runner::Runner;
use crate::source::SourceFile;
use crate::utils::TerraformUtils;

pub struct TerraformLocalsOrderRule;

impl Rule for TerraformLocalsOrderRule {
    fn name(&self) -> &'static str {
        "terraform_locals_order"
    }

    fn description(&self) -> &'static str {
        "Recommends sorting the values of each locals block by name"
    }

    fn check_file(&self, runner: &dyn Runner, file: &SourceFile, body: &Body) -> Result<()> {
        let mut errors = MultiError::new();
        for block in body.get_blocks("locals") {
            errors.absorb(self.check_locals(runner, file, block));
        }
        errors.into_result()
    }
}

impl TerraformLocalsOrderRule {
    fn check_locals(&self, runner: &dyn Runner, file: &SourceFile, block: &Block) -> Result<()> {
        let mut attrs = TerraformUtils::attributes_by_lines(&block.body);
        if attrs.is_sorted_by(|a, b| a.key.as_str() <= b.key.as_str()) {
            return Ok(());
        }
        attrs.sort_by(|a, b| a.key.as_str().cmp(b.key.as_str()));
        let values = attrs
            .iter()
            .map(|attr| file.text_of(*attr))
            .collect::<Vec<_>>()
            .join("\n");
        let suggestion = format(&format!("locals {{\n{values}\n}}"));
        runner.emit_issue(
            self,
            format!("Recommended locals variable order:\n{suggestion}"),
            TerraformUtils::def_range(file, block),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_helper::{assert_issues, run_rule};

    #[test]
    fn unsorted_locals() {
        let content = r#"
locals {
  service_name = "forum"
  owner        = "Community Team"
  common_tags = {
    Service = "forum"
  }
}
"#;
        let issues = run_rule(&TerraformLocalsOrderRule, &[("locals.tf", content)]);
        assert_issues(
            &[(
                "terraform_locals_order",
                r#"Recommended locals variable order:
locals {
  common_tags = {
    Service = "forum"
  }
  owner        = "Community Team"
  service_name = "forum"
}"#,
            )],
            &issues,
        );
    }

    #[test]
    fn each_locals_block_is_checked() {
        let content = "locals {\n  a = 1\n  b = 2\n}\n\nlocals {\n  d = 1\n  c = 2\n}\n";
        let issues = run_rule(&TerraformLocalsOrderRule, &[("locals.tf", content)]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].range.start.line, 6);
    }
}
