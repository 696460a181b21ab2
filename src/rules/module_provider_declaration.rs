use hcl_edit::structure::{Block, Body};

use crate::error::{MultiError, Result};
use crate::rules::{Rule, Severity};
use crate::runner::Runner;
use crate::source::SourceFile;
use crate::utils::TerraformUtils;

pub struct TerraformModuleProviderDeclarationRule;

impl Rule for TerraformModuleProviderDeclarationRule {
    fn name(&self) -> &'static str {
        "terraform_module_provider_declaration"
    }

    fn description(&self) -> &'static str {
        "Provider blocks in a module should only declare `alias`"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check_file(&self, runner: &dyn Runner, file: &SourceFile, body: &Body) -> Result<()> {
        let mut errors = MultiError::new();
        for block in body.get_blocks("provider") {
            if only_alias(block) {
                continue;
            }
            errors.absorb(runner.emit_issue(
                self,
                "Provider block in terraform module is expected to have and only have `alias` declared"
                    .to_string(),
                TerraformUtils::def_range(file, block),
            ));
        }
        errors.into_result()
    }
}

fn only_alias(block: &Block) -> bool {
    let mut attrs = block.body.attributes();
    let single_alias = matches!(
        (attrs.next(), attrs.next()),
        (Some(attr), None) if attr.key.as_str() == "alias"
    );
    single_alias && block.body.blocks().next().is_none()
}
