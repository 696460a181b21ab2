use hcl_edit::Span;
use hcl_edit::expr::Expression;
use hcl_edit::structure::Body;
use hcl_edit::template::Element;

use crate::error::{MultiError, Result};
use crate::rules::Rule;
use crate::runner::Runner;
use crate::source::SourceFile;
use crate::utils::TerraformUtils;

pub struct TerraformHeredocUsageRule;

impl Rule for TerraformHeredocUsageRule {
    fn name(&self) -> &'static str {
        "terraform_heredoc_usage"
    }

    fn description(&self) -> &'static str {
        "Recommends jsonencode or yamlencode over HEREDOC holding JSON or YAML"
    }

    fn check_file(&self, runner: &dyn Runner, file: &SourceFile, body: &Body) -> Result<()> {
        let mut heredocs = Vec::new();
        for attr in TerraformUtils::all_attributes(body) {
            collect_heredocs(&attr.value, &mut heredocs);
        }

        let mut errors = MultiError::new();
        for heredoc in heredocs {
            let Some(message) = Self::recommendation(&heredoc_literal(heredoc)) else {
                continue;
            };
            let Some(span) = heredoc.span() else {
                continue;
            };
            // Only the line the heredoc starts on.
            let line_end = file
                .text()
                .get(span.start..)
                .and_then(|rest| rest.find('\n'))
                .map_or(span.end, |offset| span.start + offset);
            errors.absorb(runner.emit_issue(
                self,
                message.to_string(),
                file.range(span.start..line_end.min(span.end)),
            ));
        }
        errors.into_result()
    }
}

impl TerraformHeredocUsageRule {
    fn recommendation(literal: &str) -> Option<&'static str> {
        if literal.trim().is_empty() {
            return None;
        }
        if serde_json::from_str::<serde_json::Value>(literal).is_ok() {
            return Some(
                "for JSON, instead of HEREDOC, use a combination of a `local` and the `jsonencode` function",
            );
        }
        if serde_yaml::from_str::<serde_yaml::Mapping>(literal).is_ok() {
            return Some(
                "for YAML, instead of HEREDOC, use a combination of a `local` and the `yamlencode` function",
            );
        }
        None
    }
}

fn collect_heredocs<'e>(expr: &'e Expression, out: &mut Vec<&'e Expression>) {
    if matches!(expr, Expression::HeredocTemplate(_)) {
        out.push(expr);
    }
    for sub in TerraformUtils::sub_expressions(expr) {
        collect_heredocs(sub, out);
    }
}

/// Literal parts of a heredoc. Interpolations are left out.
fn heredoc_literal(expr: &Expression) -> String {
    let Expression::HeredocTemplate(heredoc) = expr else {
        return String::new();
    };
    heredoc
        .template
        .iter()
        .filter_map(|element| match element {
            Element::Literal(literal) => Some(literal.value().as_str()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_helper::{assert_issues, run_rule};

    const RULE: &str = "terraform_heredoc_usage";

    fn check(content: &str) -> Vec<crate::runner::Issue> {
        run_rule(&TerraformHeredocUsageRule, &[("config.tf", content)])
    }

    #[test]
    fn json_policy() {
        let issues = check(
            r#"
resource "aws_iam_policy" "policy" {
  name   = "test_policy"
  policy = <<EOF
{
  "Version": "2012-10-17",
  "Statement": [
    {
      "Action": ["ec2:Describe*"],
      "Effect": "Allow",
      "Resource": "*",
      "Condition": {"StringEquals": {"aws:RequestedRegion": "北京"}}
    }
  ]
}
EOF
}"#,
        );
        assert_issues(
            &[(
                RULE,
                "for JSON, instead of HEREDOC, use a combination of a `local` and the `jsonencode` function",
            )],
            &issues,
        );
        assert_eq!(issues[0].range.start.line, 4);
        assert_eq!(issues[0].range.end.line, 4);
    }

    #[test]
    fn yaml_workflow() {
        let issues = check(
            r#"
locals {
  workflow = <<-EOT
    name: CI
    on:
      push:
        branches: [main]
    jobs:
      build:
        runs-on: ubuntu-latest
        steps:
          - uses: actions/checkout@v4
    EOT
}"#,
        );
        assert_issues(
            &[(
                RULE,
                "for YAML, instead of HEREDOC, use a combination of a `local` and the `yamlencode` function",
            )],
            &issues,
        );
    }

    #[test]
    fn plain_text_passes() {
        for text in ["hello, world!", "tmp = \"test\"", "line1\n  line2", ""] {
            let content = format!("locals {{\n  value = <<EOT\n{text}\nEOT\n}}\n");
            assert!(check(&content).is_empty(), "{text:?}");
        }
    }

    #[test]
    fn heredoc_inside_function_call() {
        let issues = check("locals {\n  value = trimspace(<<EOT\n{\"a\": 1}\nEOT\n  )\n}\n");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].range.start.line, 2);
    }
}
