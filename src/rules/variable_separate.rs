use hcl_edit::structure::Body;

use crate::error::Result;
use crate::rules::Rule;
use crate::runner::Runner;
use crate::source::SourceFile;
use crate::utils::TerraformUtils;

pub struct TerraformVariableSeparateRule;

impl Rule for TerraformVariableSeparateRule {
    fn name(&self) -> &'static str {
        "terraform_variable_separate"
    }

    fn description(&self) -> &'static str {
        "Variables should be declared in a file of their own"
    }

    fn check_file(&self, runner: &dyn Runner, file: &SourceFile, body: &Body) -> Result<()> {
        if body.get_blocks("variable").next().is_none() {
            return Ok(());
        }
        let Some(other) = TerraformUtils::first_block_not_of(body, "variable") else {
            return Ok(());
        };
        runner.emit_issue(
            self,
            "Putting variables and other types of blocks in the same file is not recommended"
                .to_string(),
            TerraformUtils::def_range(file, other),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_helper::{assert_issues, run_rule};

    #[test]
    fn mixed_file_is_reported_at_first_other_block() {
        let content = r#"
variable "a" {
  type = string
}

locals {
  b = 1
}

resource "x" "y" {}
"#;
        let issues = run_rule(&TerraformVariableSeparateRule, &[("main.tf", content)]);
        assert_issues(
            &[(
                "terraform_variable_separate",
                "Putting variables and other types of blocks in the same file is not recommended",
            )],
            &issues,
        );
        assert_eq!(issues[0].range.start.line, 6);
    }

    #[test]
    fn variables_only_or_none() {
        let issues = run_rule(
            &TerraformVariableSeparateRule,
            &[
                ("variables.tf", "variable \"a\" {}\nvariable \"b\" {}\n"),
                ("main.tf", "resource \"x\" \"y\" {}\n"),
            ],
        );
        assert!(issues.is_empty());
    }
}
