use hcl_edit::structure::{Block, Body};

use crate::error::{MultiError, Result};
use crate::format::format;
use crate::rules::Rule;
use crate::runner::Runner;
use crate::source::SourceFile;
use crate::utils::TerraformUtils;

pub struct TerraformRequiredProvidersDeclarationRule;

impl Rule for TerraformRequiredProvidersDeclarationRule {
    fn name(&self) -> &'static str {
        "terraform_required_providers_declaration"
    }

    fn description(&self) -> &'static str {
        "The terraform block should declare required_providers, sorted by provider and by parameter"
    }

    fn check_file(&self, runner: &dyn Runner, file: &SourceFile, body: &Body) -> Result<()> {
        let mut errors = MultiError::new();
        for block in body.get_blocks("terraform") {
            errors.absorb(self.check_terraform(runner, file, block));
        }
        errors.into_result()
    }
}

impl TerraformRequiredProvidersDeclarationRule {
    fn check_terraform(&self, runner: &dyn Runner, file: &SourceFile, block: &Block) -> Result<()> {
        let mut errors = MultiError::new();
        let mut declared = false;
        for required in block.body.get_blocks("required_providers") {
            declared = true;
            errors.absorb(self.check_required_providers(runner, file, required));
        }
        if !declared {
            errors.absorb(runner.emit_issue(
                self,
                "The `required_providers` field should be declared in `terraform` block".to_string(),
                TerraformUtils::def_range(file, block),
            ));
        }
        errors.into_result()
    }

    /// Provider order is checked first. Parameters of each provider are only
    /// reported once the providers themselves are in order.
    fn check_required_providers(
        &self,
        runner: &dyn Runner,
        file: &SourceFile,
        required: &Block,
    ) -> Result<()> {
        let providers = TerraformUtils::attributes_by_lines(&required.body);
        let printed: Vec<(&str, String, bool)> = providers
            .iter()
            .map(|attr| {
                let (text, sorted) = TerraformUtils::print_sorted_attr_txt(file, attr);
                (attr.key.as_str(), text, sorted)
            })
            .collect();

        if !printed.is_sorted_by(|a, b| a.0 <= b.0) {
            let mut sorted = printed.iter().collect::<Vec<_>>();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            let entries = sorted
                .iter()
                .map(|(_, text, _)| text.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            let ident = TerraformUtils::block_type(required);
            let suggestion = if TerraformUtils::remove_space_and_line(&entries).is_empty() {
                format!("{ident} {{}}")
            } else {
                format!("{ident} {{\n{entries}\n}}")
            };
            return runner.emit_issue(
                self,
                format!(
                    "The arguments of `required_providers` are expected to be sorted as follows:\n{}",
                    format(&suggestion)
                ),
                TerraformUtils::def_range(file, required),
            );
        }

        let mut errors = MultiError::new();
        for (attr, (name, text, sorted)) in providers.iter().zip(&printed) {
            if *sorted {
                continue;
            }
            errors.absorb(runner.emit_issue(
                self,
                format!("Parameters of provider `{name}` are expected to be sorted as follows:\n{text}"),
                TerraformUtils::key_range(file, attr),
            ));
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_helper::{assert_issues, run_rule};

    const RULE: &str = "terraform_required_providers_declaration";

    fn check(content: &str) -> Vec<crate::runner::Issue> {
        run_rule(
            &TerraformRequiredProvidersDeclarationRule,
            &[("config.tf", content)],
        )
    }

    fn parameters_message(name: &str, source: &str, version: &str) -> String {
        format!(
            "Parameters of provider `{name}` are expected to be sorted as follows:\n{name} = {{\n  source  = \"{source}\"\n  version = \"{version}\"\n}}"
        )
    }

    #[test]
    fn sorted_declaration_passes() {
        let issues = check(
            r#"
terraform {
  required_version = "~> 0.12.29"
  required_providers {
    aws = {
      source  = "hashicorp/aws"
      version = ">= 2.7.0"
    }
    azurerm = {
      source  = "hashicorp/azurerm"
      version = "~> 3.0.2"
    }
  }
}"#,
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn missing_required_providers() {
        let issues = check("\nterraform {\n  required_version = \"~> 0.12.29\"\n}");
        assert_issues(
            &[(
                RULE,
                "The `required_providers` field should be declared in `terraform` block",
            )],
            &issues,
        );
        assert_eq!(issues[0].range.start.line, 2);
    }

    #[test]
    fn unsorted_providers_hide_parameter_issues() {
        let issues = check(
            r#"
terraform {
  required_version = "~> 0.12.29"
  required_providers {
    azurerm = {
      version = "~> 3.0.2"
      source  = "hashicorp/azurerm"
    }
    aws = {
      source = "hashicorp/aws"
      version = ">= 2.7.0"
    }
  }
}"#,
        );
        assert_issues(
            &[(
                RULE,
                r#"The arguments of `required_providers` are expected to be sorted as follows:
required_providers {
  aws = {
    source  = "hashicorp/aws"
    version = ">= 2.7.0"
  }
  azurerm = {
    source  = "hashicorp/azurerm"
    version = "~> 3.0.2"
  }
}"#,
            )],
            &issues,
        );
        assert_eq!(issues[0].range.start.line, 4);
    }

    #[test]
    fn unsorted_parameters_are_reported_per_provider() {
        let issues = check(
            "
terraform {
  required_version = \"~> 0.12.29\"
  required_providers {
    aws = {
      version = \">= 2.7.0\"
      source = \"hashicorp/aws\"
    }
    azurerm = {
      version = \"~> 3.0.2\"
      source  = \"hashicorp/azurerm\"
    }
\tb = {
      version = \"~> 3.0.2\"
      source  = \"hashicorp/azurerm\"
    }
  }
}",
        );
        let expected = [
            parameters_message("aws", "hashicorp/aws", ">= 2.7.0"),
            parameters_message("azurerm", "hashicorp/azurerm", "~> 3.0.2"),
            parameters_message("b", "hashicorp/azurerm", "~> 3.0.2"),
        ];
        let expected: Vec<(&str, &str)> = expected.iter().map(|m| (RULE, m.as_str())).collect();
        assert_issues(&expected, &issues);
        assert_eq!(issues[0].range.start.line, 5);
    }

    #[test]
    fn empty_and_trivial_providers_pass() {
        assert!(check("terraform {\n  required_providers {}\n}\n").is_empty());
        let issues = check(
            r#"
terraform {
  required_version = "~> 0.12.29"
  required_providers {
    aws = {}
    azurerm = "~> 3.0.2"
  }
}"#,
        );
        assert!(issues.is_empty());
    }
}
