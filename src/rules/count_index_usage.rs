use hcl_edit::Span;
use hcl_edit::expr::{Expression, Traversal, TraversalOperator};
use hcl_edit::structure::Body;

use crate::error::{MultiError, Result};
use crate::rules::{Rule, Severity};
use crate::runner::Runner;
use crate::source::{SourceFile, SourceRange};
use crate::utils::TerraformUtils;

pub struct TerraformCountIndexUsageRule;

impl Rule for TerraformCountIndexUsageRule {
    fn name(&self) -> &'static str {
        "terraform_count_index_usage"
    }

    fn description(&self) -> &'static str {
        "Discourages `count.index` as a subscript or a function argument"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check_file(&self, runner: &dyn Runner, file: &SourceFile, body: &Body) -> Result<()> {
        let mut ranges = Vec::new();
        for attr in TerraformUtils::all_attributes(body) {
            collect(file, &attr.value, false, &mut ranges);
        }
        let mut errors = MultiError::new();
        for range in ranges {
            errors.absorb(runner.emit_issue(
                self,
                "`count.index` is not recommended to be used as the subscript of list/map or the argument of function call, use for_each instead".to_string(),
                range,
            ));
        }
        errors.into_result()
    }
}

/// Collects `count.index` references found below an index operator or a function call.
fn collect(file: &SourceFile, expr: &Expression, nested: bool, ranges: &mut Vec<SourceRange>) {
    match expr {
        Expression::Traversal(traversal) => {
            if nested && is_count_index(traversal) {
                let range = count_index_range(file, traversal);
                if !ranges.contains(&range) {
                    ranges.push(range);
                }
                return;
            }
            collect(file, &traversal.expr, nested, ranges);
            for op in &traversal.operators {
                if let TraversalOperator::Index(index) = op.value() {
                    collect(file, index, true, ranges);
                }
            }
        }
        Expression::FuncCall(call) => {
            for arg in call.args.iter() {
                collect(file, arg, true, ranges);
            }
        }
        other => {
            for sub in TerraformUtils::sub_expressions(other) {
                collect(file, sub, nested, ranges);
            }
        }
    }
}

fn is_count_index(traversal: &Traversal) -> bool {
    let Expression::Variable(root) = &traversal.expr else {
        return false;
    };
    if root.value().as_str() != "count" {
        return false;
    }
    matches!(
        traversal.operators.first().map(|op| op.value()),
        Some(TraversalOperator::GetAttr(attr)) if attr.value().as_str() == "index"
    )
}

fn count_index_range(file: &SourceFile, traversal: &Traversal) -> SourceRange {
    let start = traversal.expr.span().map(|span| span.start);
    let end = traversal
        .operators
        .first()
        .and_then(|op| op.span())
        .map(|span| span.end);
    match (start, end) {
        (Some(start), Some(end)) => file.range(start..end),
        _ => file.range_of(traversal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_helper::{assert_issues, run_rule};

    const RULE: &str = "terraform_count_index_usage";
    const MESSAGE: &str = "`count.index` is not recommended to be used as the subscript of list/map or the argument of function call, use for_each instead";

    fn check(content: &str) -> Vec<crate::runner::Issue> {
        run_rule(&TerraformCountIndexUsageRule, &[("config.tf", content)])
    }

    #[test]
    fn subscript_of_list() {
        let issues = check(
            r#"
resource "azurerm_resource_group" "rg" {
  count    = length(var.my_list)
  location = "eastus"
  name     = var.my_list[count.index]
}"#,
        );
        assert_issues(&[(RULE, MESSAGE)], &issues);
        let range = &issues[0].range;
        assert_eq!(range.start.line, 5);
        assert_eq!(range.start.column, 26);
        assert_eq!(range.end.column, 37);
    }

    #[test]
    fn function_argument_inside_template_subscript() {
        let issues = check(
            r#"
resource "azurerm_resource_group" "rg" {
  count    = 4
  location = "eastus"
  name     = local.a_map["${max(3, count.index)}"]
}"#,
        );
        assert_issues(&[(RULE, MESSAGE)], &issues);
    }

    #[test]
    fn deeply_nested_reference_is_reported_once() {
        let issues = check(
            r#"
resource "azurerm_resource_group" "rg" {
  count    = 4
  location = "eastus"
  name     = local.a_map[max(var.my_list[count.index], 3)*2 + local.set[0]]
}"#,
        );
        assert_issues(&[(RULE, MESSAGE)], &issues);
    }

    #[test]
    fn every_resource_is_checked() {
        let issues = check(
            r#"
resource "azurerm_resource_group" "rg" {
  count    = 4
  location = "eastus"
  name     = var.names[count.index]
}

resource "azurerm_virtual_network" "vnet" {
  count         = 4
  address_space = [cidrsubnet("10.0.0.0/8", 8, count.index)]
  tags = {
    name = upper(count.index)
  }
}"#,
        );
        assert_issues(&[(RULE, MESSAGE), (RULE, MESSAGE), (RULE, MESSAGE)], &issues);
    }

    #[test]
    fn plain_interpolation_and_constant_subscript_pass() {
        let issues = check(
            r#"
resource "azurerm_resource_group" "rg" {
  count    = 4
  location = "eastus"
  name     = "my resource ${count.index}"
  tags     = local.a_map["my_resource"]
}"#,
        );
        assert!(issues.is_empty());
    }
}
