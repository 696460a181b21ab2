use hcl_edit::expr::{Expression, TraversalOperator};
use hcl_edit::structure::{Block, Body};
use hcl_edit::{Decorated, Ident};

use crate::error::{MultiError, Result};
use crate::rules::{Rule, Severity};
use crate::runner::Runner;
use crate::source::SourceFile;
use crate::utils::TerraformUtils;

/// Meta arguments and provider-defined blocks whose names say nothing about
/// the variable assigned to them.
const BUILT_IN_PROPERTIES: [&str; 7] = [
    "depends_on",
    "count",
    "for_each",
    "provider",
    "lifecycle",
    "provisioner",
    "timeouts",
];

pub struct TerraformVarNameConventionRule;

impl Rule for TerraformVarNameConventionRule {
    fn name(&self) -> &'static str {
        "terraform_var_name_convention"
    }

    fn description(&self) -> &'static str {
        "A variable assigned to an argument should be named after the argument, optionally with a prefix"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check_file(&self, runner: &dyn Runner, file: &SourceFile, body: &Body) -> Result<()> {
        let mut errors = MultiError::new();
        for block in body.blocks() {
            if matches!(TerraformUtils::block_type(block), "resource" | "data") {
                errors.absorb(self.visit_block(runner, file, block));
            }
        }
        errors.into_result()
    }
}

/// A reference to a named value, e.g. `var.nested.location[0]`.
struct Reference<'a> {
    root: &'a Decorated<Ident>,
    /// Last attribute name along the traversal, empty when there is none.
    name: &'a str,
}

impl TerraformVarNameConventionRule {
    fn visit_block(&self, runner: &dyn Runner, file: &SourceFile, block: &Block) -> Result<()> {
        let mut errors = MultiError::new();
        for attr in block.body.attributes() {
            let property = attr.key.as_str();
            match &attr.value {
                Expression::Conditional(cond) => {
                    errors.absorb(self.validate(runner, file, &cond.true_expr, property));
                    errors.absorb(self.validate(runner, file, &cond.false_expr, property));
                }
                expr @ Expression::Traversal(_) => {
                    errors.absorb(self.validate(runner, file, expr, property));
                }
                _ => {}
            }
        }
        for nested in block.body.blocks() {
            if !BUILT_IN_PROPERTIES.contains(&TerraformUtils::block_type(nested)) {
                errors.absorb(self.visit_block(runner, file, nested));
            }
        }
        errors.into_result()
    }

    fn validate(
        &self,
        runner: &dyn Runner,
        file: &SourceFile,
        expr: &Expression,
        property: &str,
    ) -> Result<()> {
        if BUILT_IN_PROPERTIES.contains(&property) {
            return Ok(());
        }
        let mut references = Vec::new();
        collect_references(expr, &mut references);
        let [reference] = references.as_slice() else {
            return Ok(());
        };
        if reference.root.value().as_str() != "var" {
            return Ok(());
        }

        let mut errors = MultiError::new();
        let range = file.range_of(reference.root);
        if reference.name.is_empty() || property.is_empty() {
            errors.absorb(runner.emit_issue(
                self,
                "Variable or Property name is empty".to_string(),
                range.clone(),
            ));
        }
        if !reference.name.ends_with(property) {
            errors.absorb(runner.emit_issue(
                self,
                format!(
                    "Property:`{property}` Variable:`{}` is invalid, expected var name:${{prefix}}{property}",
                    reference.name
                ),
                range,
            ));
        }
        errors.into_result()
    }
}

fn collect_references<'a>(expr: &'a Expression, out: &mut Vec<Reference<'a>>) {
    match expr {
        Expression::Variable(root) => out.push(Reference { root, name: "" }),
        Expression::Traversal(traversal) => {
            if let Expression::Variable(root) = &traversal.expr {
                let name = traversal
                    .operators
                    .iter()
                    .rev()
                    .find_map(|op| match op.value() {
                        TraversalOperator::GetAttr(attr) => Some(attr.value().as_str()),
                        _ => None,
                    })
                    .unwrap_or_default();
                out.push(Reference { root, name });
            } else {
                collect_references(&traversal.expr, out);
            }
            for op in &traversal.operators {
                if let TraversalOperator::Index(index) = op.value() {
                    collect_references(index, out);
                }
            }
        }
        other => {
            for sub in TerraformUtils::sub_expressions(other) {
                collect_references(sub, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_helper::{assert_issues, run_rule};

    const RULE: &str = "terraform_var_name_convention";

    fn check(content: &str) -> Vec<crate::runner::Issue> {
        run_rule(&TerraformVarNameConventionRule, &[("config.tf", content)])
    }

    fn invalid(property: &str, variable: &str) -> String {
        format!(
            "Property:`{property}` Variable:`{variable}` is invalid, expected var name:${{prefix}}{property}"
        )
    }

    fn assert_invalid(expected: &[(&str, &str)], issues: &[crate::runner::Issue]) {
        let messages: Vec<String> = expected
            .iter()
            .map(|(property, variable)| invalid(property, variable))
            .collect();
        let expected: Vec<(&str, &str)> = messages.iter().map(|m| (RULE, m.as_str())).collect();
        assert_issues(&expected, issues);
    }

    #[test]
    fn suffixed_variable_names_are_invalid() {
        let issues = check(
            r#"
resource "azurerm_container_group" "example" {
  name      = var.name_cg
  location  = var.locations.location_cg

  container {
    cpu    = var.cpu_cg
    image  = "mcr.microsoft.com/azuredocs/aci-tutorial-sidecar"
    memory = "1.5"
    name   = "sidecar"
  }
}"#,
        );
        assert_invalid(
            &[("name", "name_cg"), ("location", "location_cg"), ("cpu", "cpu_cg")],
            &issues,
        );
        let range = &issues[0].range;
        assert_eq!((range.start.line, range.start.column), (3, 15));
        assert_eq!(range.end.column, 18);
    }

    #[test]
    fn only_conditional_results_are_validated() {
        let issues = check(
            r#"
resource "azurerm_resource_group" "test" {
  name = var.name_flag != "" ? var.name_true : var.name_false
}"#,
        );
        assert_invalid(&[("name", "name_true"), ("name", "name_false")], &issues);
    }

    #[test]
    fn partial_or_different_names_are_invalid() {
        let issues = check(
            r#"
resource "azurerm_resource_group" "test" {
  location = var.address
  tags     = var.tag
}"#,
        );
        assert_invalid(&[("location", "address"), ("tags", "tag")], &issues);
    }

    #[test]
    fn correct_and_excluded_cases() {
        let issues = check(
            r#"
resource "azurerm_resource_group" "test" {
  # A valid variable name is same as property name or property name with prefix
  name = var.resource_group_name
  location = var.location
  tags = var.test_tags
}

data "azurerm_var_validation" "test" {
  name = var.test_name
  location = var.nested.location
  list = var.test_list[2]
  region = var.nested_list[1].region

  address {
    street = var.test_street
  }

  ip_addresses = ["0.0.0.0", var.ip_addr_1]
  tags = {
    a = var.inner_type_map_test
  }
  string_template = "Test_${var.str_template_test}"
  sub_string = substr(var.sub_str_test, 0, 1)
  condition_prop = var.condition_flag != "" ? var.true_condition_prop : "Test_${false_prop}"

  depends_on = var.depends
  timeouts {
    read = var.timeout_read_1
  }
  lifecycle {
    ignore_changes = var.ignored_props
  }
}

module "not_checked" {
  name = var.anything
}"#,
        );
        assert!(issues.is_empty());
    }
}
