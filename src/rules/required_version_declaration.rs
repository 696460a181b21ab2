use hcl_edit::Span;
use hcl_edit::structure::{Block, Body};

use crate::error::{MultiError, Result};
use crate::rules::Rule;
use crate::runner::Runner;
use crate::source::SourceFile;
use crate::utils::TerraformUtils;

pub struct TerraformRequiredVersionDeclarationRule;

impl Rule for TerraformRequiredVersionDeclarationRule {
    fn name(&self) -> &'static str {
        "terraform_required_version_declaration"
    }

    fn description(&self) -> &'static str {
        "`required_version` should be the first argument of the terraform block"
    }

    fn check_file(&self, runner: &dyn Runner, file: &SourceFile, body: &Body) -> Result<()> {
        let mut errors = MultiError::new();
        for block in body.get_blocks("terraform") {
            errors.absorb(self.check_terraform(runner, file, block));
        }
        errors.into_result()
    }
}

impl TerraformRequiredVersionDeclarationRule {
    fn check_terraform(&self, runner: &dyn Runner, file: &SourceFile, block: &Block) -> Result<()> {
        let message =
            "The `required_version` field should be declared at the beginning of `terraform` block";
        let Some(version) = block.body.get_attribute("required_version") else {
            return runner.emit_issue(
                self,
                message.to_string(),
                TerraformUtils::def_range(file, block),
            );
        };

        let version_start = file.range_of(version).start;
        let starts = block
            .body
            .attributes()
            .filter(|attr| attr.key.as_str() != "required_version")
            .map(|attr| attr.span())
            .chain(block.body.blocks().map(|nested| nested.span()));
        for span in starts.flatten() {
            if file.range(span).start.cmp_line_col(&version_start).is_lt() {
                return runner.emit_issue(
                    self,
                    message.to_string(),
                    TerraformUtils::key_range(file, version),
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_helper::{assert_issues, run_rule};

    const RULE: &str = "terraform_required_version_declaration";
    const MESSAGE: &str =
        "The `required_version` field should be declared at the beginning of `terraform` block";

    fn check(content: &str) -> Vec<crate::runner::Issue> {
        run_rule(
            &TerraformRequiredVersionDeclarationRule,
            &[("terraform.tf", content)],
        )
    }

    #[test]
    fn declared_first() {
        let issues = check(
            r#"
terraform {
  required_version = "~> 0.12.29"
  required_providers {
    aws = ">= 2.7.0"
  }
  experiments = [example]
}"#,
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn missing_is_reported_on_block() {
        let issues = check(
            r#"
terraform {
  required_providers {
    aws = ">= 2.7.0"
  }
}"#,
        );
        assert_issues(&[(RULE, MESSAGE)], &issues);
        let range = &issues[0].range;
        assert_eq!((range.start.line, range.end.column), (2, 10));
    }

    #[test]
    fn declared_after_block_is_reported_on_key() {
        let issues = check(
            r#"
terraform {
  required_providers {
    aws = ">= 2.7.0"
  }
  required_version = "~> 0.12.29"
}"#,
        );
        assert_issues(&[(RULE, MESSAGE)], &issues);
        let range = &issues[0].range;
        assert_eq!((range.start.line, range.start.column), (6, 3));
    }

    #[test]
    fn declared_after_attribute_is_reported() {
        let issues = check(
            "terraform {\n  experiments = [example]\n  required_version = \"~> 1.0\"\n}\n",
        );
        assert_issues(&[(RULE, MESSAGE)], &issues);
    }
}
