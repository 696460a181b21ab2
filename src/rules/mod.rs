use hcl_edit::structure::Body;
use tracing::debug;

use crate::error::{MultiError, Result};
use crate::ignore::{self, IgnoreFilter};
use crate::project;
use crate::runner::Runner;
use crate::source::SourceFile;

pub mod count_index_usage;
pub mod heredoc_usage;
pub mod locals_order;
pub mod module_provider_declaration;
pub mod output_order;
pub mod output_separate;
pub mod required_providers_declaration;
pub mod required_version_declaration;
pub mod resource_data_arg_layout;
pub mod sensitive_variable_no_default;
pub mod var_name_convention;
pub mod variable_nullable_false;
pub mod variable_order;
pub mod variable_separate;
pub mod versions_file;

pub use count_index_usage::*;
pub use heredoc_usage::*;
pub use locals_order::*;
pub use module_provider_declaration::*;
pub use output_order::*;
pub use output_separate::*;
pub use required_providers_declaration::*;
pub use required_version_declaration::*;
pub use resource_data_arg_layout::*;
pub use sensitive_variable_no_default::*;
pub use var_name_convention::*;
pub use variable_nullable_false::*;
pub use variable_order::*;
pub use variable_separate::*;
pub use versions_file::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Notice,
}

impl Severity {
    /// Severity string understood by the Forseti host.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warn",
            Severity::Notice => "info",
        }
    }
}

/// A basic-ext rule.
///
/// Rules are stateless. `check_with` walks every file of the runner that is
/// parsed and not ignored for the rule, hands it to `check_file` and collects
/// the errors instead of stopping at the first one.
pub trait Rule: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn enabled(&self) -> bool {
        false
    }

    fn severity(&self) -> Severity {
        Severity::Notice
    }

    fn link(&self) -> String {
        project::reference_link(self.name())
    }

    /// Checks the runner's files against the installed ignore filter.
    fn check(&self, runner: &dyn Runner) -> Result<()> {
        self.check_with(runner, ignore::filter())
    }

    fn check_with(&self, runner: &dyn Runner, filter: &IgnoreFilter) -> Result<()> {
        let mut errors = MultiError::new();
        for file in runner.get_files()? {
            if filter.is_ignored(file.name(), self.name()) {
                debug!(rule = self.name(), file = file.name(), "file ignored");
                continue;
            }
            let body = match file.body() {
                Ok(body) => body,
                Err(err) => {
                    debug!(rule = self.name(), file = file.name(), "skipping file: {err}");
                    continue;
                }
            };
            errors.absorb(self.check_file(runner, file, body));
        }
        errors.into_result()
    }

    fn check_file(&self, runner: &dyn Runner, file: &SourceFile, body: &Body) -> Result<()>;
}

/// Every rule of the ruleset.
pub fn all() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(TerraformVariableOrderRule),
        Box::new(TerraformVariableSeparateRule),
        Box::new(TerraformOutputOrderRule),
        Box::new(TerraformOutputSeparateRule),
        Box::new(TerraformLocalsOrderRule),
        Box::new(TerraformResourceDataArgLayoutRule),
        Box::new(TerraformCountIndexUsageRule),
        Box::new(TerraformHeredocUsageRule),
        Box::new(TerraformSensitiveVariableNoDefaultRule),
        Box::new(TerraformVariableNullableFalseRule),
        Box::new(TerraformVersionsFileRule),
        Box::new(TerraformRequiredVersionDeclarationRule),
        Box::new(TerraformRequiredProvidersDeclarationRule),
        Box::new(TerraformModuleProviderDeclarationRule),
        Box::new(TerraformVarNameConventionRule),
    ]
}

/// Names of every rule, sorted.
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = all().iter().map(|rule| rule.name()).collect();
    names.sort_unstable();
    names
}
