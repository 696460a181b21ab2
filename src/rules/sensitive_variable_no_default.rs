use hcl_edit::expr::Expression;
use hcl_edit::structure::{Block, Body};

use crate::error::{MultiError, Result};
use crate::rules::{Rule, Severity};
use crate::runner::Runner;
use crate::source::SourceFile;
use crate::utils::TerraformUtils;

pub struct TerraformSensitiveVariableNoDefaultRule;

impl Rule for TerraformSensitiveVariableNoDefaultRule {
    fn name(&self) -> &'static str {
        "terraform_sensitive_variable_no_default"
    }

    fn description(&self) -> &'static str {
        "Sensitive variables should not declare a default value"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check_file(&self, runner: &dyn Runner, file: &SourceFile, body: &Body) -> Result<()> {
        let mut errors = MultiError::new();
        for block in body.get_blocks("variable") {
            errors.absorb(self.check_variable(runner, file, block));
        }
        errors.into_result()
    }
}

impl TerraformSensitiveVariableNoDefaultRule {
    fn check_variable(&self, runner: &dyn Runner, file: &SourceFile, block: &Block) -> Result<()> {
        let Some(default) = block.body.get_attribute("default") else {
            return Ok(());
        };
        if is_empty_default(&default.value) {
            return Ok(());
        }
        // Anything but the boolean `true` counts as not sensitive.
        let sensitive = match block.body.get_attribute("sensitive") {
            Some(attr) => matches!(
                TerraformUtils::evaluate(file, attr)?,
                hcl::Value::Bool(true)
            ),
            None => false,
        };
        if !sensitive {
            return Ok(());
        }
        runner.emit_issue(
            self,
            format!(
                "Default value is not expected to be set for sensitive variable `{}`",
                TerraformUtils::first_label(block).unwrap_or_default()
            ),
            TerraformUtils::key_range(file, default),
        )
    }
}

fn is_empty_default(value: &Expression) -> bool {
    match value {
        Expression::Null(_) => true,
        Expression::Array(array) => array.is_empty(),
        Expression::Object(object) => object.is_empty(),
        _ => false,
    }
}
