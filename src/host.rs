//! Bridge between basic-ext rules and the Forseti ruleset protocol.
//!
//! Forseti hands a rule one file at a time, as a uri and its text. Each call
//! builds a one-file [`ModuleRunner`] named after the uri, runs the rule and
//! turns its issues into diagnostics.

use std::path::Path;

use forseti_sdk::core::{Diagnostic, Position, Range};
use forseti_sdk::ruleset::{Rule as ForsetiRule, RuleContext};
use tracing::warn;

use crate::error::Result;
use crate::rules::Rule;
use crate::runner::{Issue, ModuleRunner};
use crate::source::Pos;

pub struct HostRule(Box<dyn Rule>);

impl HostRule {
    pub fn new(rule: Box<dyn Rule>) -> Self {
        Self(rule)
    }

    /// Runs the rule over a single file.
    ///
    /// Issues found before an error are still returned with it, so callers can
    /// report both.
    pub fn run(&self, name: &str, text: &str) -> (Vec<Issue>, Result<()>) {
        let runner = ModuleRunner::new([(name, text)]);
        let outcome = self.0.check(&runner);
        (runner.into_issues(), outcome)
    }

    pub fn to_diagnostic(&self, issue: &Issue) -> Diagnostic {
        Diagnostic {
            rule_id: issue.rule.to_string(),
            message: issue.message.clone(),
            severity: issue.severity.as_str().to_string(),
            range: Range {
                start: position(issue.range.start),
                end: position(issue.range.end),
            },
            code: Some(issue.rule.to_uppercase()),
            suggest: None,
            docs_url: Some(self.0.link()),
        }
    }
}

/// File name for a document uri: the path relative to the working directory
/// when it lies below it, so ignore patterns read like tflint's.
pub fn file_name(uri: &str) -> String {
    let path = Path::new(uri.strip_prefix("file://").unwrap_or(uri));
    let relative = std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf));
    relative
        .as_deref()
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

/// 1-based `Pos` to the host's 0-based position. The null range maps to the
/// start of the file.
fn position(pos: Pos) -> Position {
    Position {
        line: pos.line.saturating_sub(1) as _,
        character: pos.column.saturating_sub(1) as _,
    }
}

impl ForsetiRule for HostRule {
    fn id(&self) -> &'static str {
        self.0.name()
    }

    fn description(&self) -> &'static str {
        self.0.description()
    }

    fn default_config(&self) -> serde_json::Value {
        if self.0.enabled() {
            serde_json::Value::String(self.0.severity().as_str().to_string())
        } else {
            serde_json::Value::String("off".to_string())
        }
    }

    fn check(&self, ctx: &mut RuleContext) {
        let name = file_name(ctx.uri);
        let (issues, outcome) = self.run(&name, ctx.text);
        if let Err(err) = outcome {
            warn!(rule = self.0.name(), file = %name, "check failed: {err}");
        }
        for issue in &issues {
            ctx.report(self.to_diagnostic(issue));
        }
    }
}
