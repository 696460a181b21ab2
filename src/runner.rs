use std::cell::RefCell;
use std::path::Path;

use crate::error::{LintError, Result};
use crate::rules::{Rule, Severity};
use crate::source::{SourceFile, SourceRange};

/// A finding reported by a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub rule: &'static str,
    pub severity: Severity,
    pub message: String,
    pub range: SourceRange,
}

/// What rules can ask of the host: the files of the module and a place to
/// report issues.
pub trait Runner {
    fn get_files(&self) -> Result<Vec<&SourceFile>>;

    /// Looks a file up by its path relative to the module, so
    /// `versions.tf` finds `/repo/versions.tf`.
    fn get_file(&self, name: &str) -> Result<&SourceFile>;

    fn emit_issue(&self, rule: &dyn Rule, message: String, range: SourceRange) -> Result<()>;
}

/// In-memory runner over a set of files, parsed once up front.
#[derive(Debug, Default)]
pub struct ModuleRunner {
    files: Vec<SourceFile>,
    issues: RefCell<Vec<Issue>>,
}

impl ModuleRunner {
    pub fn new<I, N, T>(files: I) -> Self
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<String>,
        T: Into<String>,
    {
        Self {
            files: files
                .into_iter()
                .map(|(name, text)| SourceFile::parse(name, text))
                .collect(),
            issues: RefCell::new(Vec::new()),
        }
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues.into_inner()
    }
}

impl Runner for ModuleRunner {
    fn get_files(&self) -> Result<Vec<&SourceFile>> {
        Ok(self.files.iter().collect())
    }

    fn get_file(&self, name: &str) -> Result<&SourceFile> {
        self.files
            .iter()
            .find(|file| Path::new(file.name()).ends_with(name))
            .ok_or_else(|| LintError::FileNotFound(name.to_string()))
    }

    fn emit_issue(&self, rule: &dyn Rule, message: String, range: SourceRange) -> Result<()> {
        let issue = Issue {
            rule: rule.name(),
            severity: rule.severity(),
            message,
            range,
        };
        let mut issues = self.issues.borrow_mut();
        if issues.contains(&issue) {
            return Err(LintError::EmitRejected {
                rule: issue.rule.to_string(),
                reason: format!("duplicate issue at {}", issue.range),
            });
        }
        tracing::debug!(rule = issue.rule, range = %issue.range, "issue emitted");
        issues.push(issue);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::TerraformVariableNullableFalseRule;

    #[test]
    fn files_are_looked_up_by_name() {
        let runner = ModuleRunner::new([("main.tf", "a = 1\n"), ("variables.tf", "")]);
        assert_eq!(runner.get_files().unwrap().len(), 2);
        assert_eq!(runner.get_file("main.tf").unwrap().text(), "a = 1\n");
        assert!(matches!(
            runner.get_file("missing.tf"),
            Err(LintError::FileNotFound(_))
        ));
    }

    #[test]
    fn files_are_looked_up_by_trailing_path() {
        let runner = ModuleRunner::new([("/repo/modules/versions.tf", "")]);
        assert!(runner.get_file("versions.tf").is_ok());
        assert!(runner.get_file("modules/versions.tf").is_ok());
        assert!(runner.get_file("ersions.tf").is_err());
    }

    #[test]
    fn duplicate_issue_is_rejected() {
        let runner = ModuleRunner::new([("main.tf", "a = 1\n")]);
        let rule = TerraformVariableNullableFalseRule;
        let range = runner.get_file("main.tf").unwrap().range(0..5);
        runner
            .emit_issue(&rule, "message".to_string(), range.clone())
            .unwrap();
        let err = runner
            .emit_issue(&rule, "message".to_string(), range)
            .unwrap_err();
        assert!(matches!(err, LintError::EmitRejected { .. }));
        assert_eq!(runner.into_issues().len(), 1);
    }
}
