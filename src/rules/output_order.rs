use hcl_edit::structure::{Block, Body};

use crate::error::Result;
use crate::format::format;
use crate::rules::Rule;
use crate::runner::Runner;
use crate::source::SourceFile;
use crate::utils::TerraformUtils;

pub struct TerraformOutputOrderRule;

impl Rule for TerraformOutputOrderRule {
    fn name(&self) -> &'static str {
        "terraform_output_order"
    }

    fn description(&self) -> &'static str {
        "Recommends sorting outputs by name"
    }

    fn check_file(&self, runner: &dyn Runner, file: &SourceFile, body: &Body) -> Result<()> {
        let outputs: Vec<&Block> = body.get_blocks("output").collect();
        let name = |block: &Block| {
            TerraformUtils::first_label(block)
                .unwrap_or_default()
                .to_string()
        };
        if outputs.is_sorted_by(|a, b| name(*a) <= name(*b)) {
            return Ok(());
        }

        let mut sorted = outputs.clone();
        sorted.sort_by(|a, b| name(*a).cmp(&name(*b)));
        let recommended = sorted
            .iter()
            .map(|block| file.text_of(*block))
            .collect::<Vec<_>>()
            .join("\n\n");
        runner.emit_issue(
            self,
            format!("Recommended output order:\n{}", format(&recommended)),
            TerraformUtils::def_range(file, outputs[0]),
        )
    }
}
