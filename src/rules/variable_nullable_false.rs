use hcl_edit::structure::Body;

use crate::error::{MultiError, Result};
use crate::rules::Rule;
use crate::runner::Runner;
use crate::source::SourceFile;
use crate::utils::TerraformUtils;

pub struct TerraformVariableNullableFalseRule;

impl Rule for TerraformVariableNullableFalseRule {
    fn name(&self) -> &'static str {
        "terraform_variable_nullable_false"
    }

    fn description(&self) -> &'static str {
        "`nullable` only needs to be declared when it is set to false"
    }

    fn enabled(&self) -> bool {
        true
    }

    fn check_file(&self, runner: &dyn Runner, file: &SourceFile, body: &Body) -> Result<()> {
        let mut errors = MultiError::new();
        for block in body.get_blocks("variable") {
            let Some(nullable) = block.body.get_attribute("nullable") else {
                continue;
            };
            // Values that can't be evaluated are reported like `true`.
            if matches!(
                TerraformUtils::evaluate(file, nullable),
                Ok(hcl::Value::Bool(false))
            ) {
                continue;
            }
            errors.absorb(runner.emit_issue(
                self,
                "`nullable` is default to `true` so we don't need to declare it explicitly."
                    .to_string(),
                file.range_of(nullable),
            ));
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_helper::{assert_issues, run_rule};

    const MESSAGE: &str = "`nullable` is default to `true` so we don't need to declare it explicitly.";

    fn check(content: &str) -> Vec<crate::runner::Issue> {
        run_rule(&TerraformVariableNullableFalseRule, &[("variables.tf", content)])
    }

    #[test]
    fn nullable_true_is_redundant() {
        let issues = check(
            r#"
variable "nullable_true" {
  type     = string
  nullable = true
}

variable "nullable_unset" {
  type = string
}

variable "nullable_false" {
  type     = string
  nullable = false
}"#,
        );
        assert_issues(&[("terraform_variable_nullable_false", MESSAGE)], &issues);
        let range = &issues[0].range;
        assert_eq!((range.start.line, range.start.column), (4, 3));
        assert_eq!((range.end.line, range.end.column), (4, 18));
    }

    #[test]
    fn computed_false_is_not_reported() {
        let issues = check(
            "variable \"a\" {\n  nullable = !true\n}\n\nvariable \"b\" {\n  nullable = 1 > 2\n}\n",
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn computed_true_is_reported() {
        let issues = check("variable \"a\" {\n  nullable = !false\n}\n");
        assert_issues(&[("terraform_variable_nullable_false", MESSAGE)], &issues);
    }

    #[test]
    fn non_literal_value_is_reported() {
        let issues = check("variable \"a\" {\n  nullable = var.flag\n}\n");
        assert_eq!(issues.len(), 1);
    }
}
