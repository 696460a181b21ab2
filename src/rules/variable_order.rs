use hcl_edit::structure::{Block, Body};

use crate::error::Result;
use crate::format::format;
use crate::rules::Rule;
use crate::runner::Runner;
use crate::source::SourceFile;
use crate::utils::TerraformUtils;

pub struct TerraformVariableOrderRule;

impl Rule for TerraformVariableOrderRule {
    fn name(&self) -> &'static str {
        "terraform_variable_order"
    }

    fn description(&self) -> &'static str {
        "Recommends declaring variables with a default value first, each group sorted by name"
    }

    fn check_file(&self, runner: &dyn Runner, file: &SourceFile, body: &Body) -> Result<()> {
        let variables: Vec<&Block> = body.get_blocks("variable").collect();
        let Some(first) = variables.first() else {
            return Ok(());
        };

        // Variables with a default first, then by name. Stable for equal names.
        let key = |block: &Block| {
            (
                block.body.get_attribute("default").is_none(),
                TerraformUtils::first_label(block).unwrap_or_default().to_string(),
            )
        };
        let mut sorted = variables.clone();
        sorted.sort_by(|a, b| key(*a).cmp(&key(*b)));
        let in_order = variables
            .iter()
            .zip(&sorted)
            .all(|(a, b)| std::ptr::eq(*a, *b));
        if in_order {
            return Ok(());
        }

        let recommended = sorted
            .iter()
            .map(|block| file.text_of(*block))
            .collect::<Vec<_>>()
            .join("\n\n");
        runner.emit_issue(
            self,
            format!("Recommended variable order:\n{}", format(&recommended)),
            TerraformUtils::def_range(file, first),
        )
    }
}
