//! Per-rule file suppression loaded from `.tflintignore.basic-ext`.
//!
//! ```hcl
//! ignore {
//!   patterns      = ["^modules/legacy/", "!^modules/legacy/keep\\.tf$"]
//!   include_rules = ["terraform_variable_order"]
//! }
//!
//! retain {
//!   patterns = ["main\\.tf$"]
//! }
//! ```
//!
//! A file is skipped by a rule when one of the rule's ignore patterns matches
//! its name and none of its retain patterns does. Inside an `ignore` block a
//! pattern starting with `!` is a retain pattern.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{info, warn};

use crate::error::{LintError, MultiError, Result};
use crate::rules;

pub const IGNORE_CONFIG_FILE: &str = ".tflintignore.basic-ext";

/// Overrides the location of the ignore config.
pub const IGNORE_CONFIG_ENV: &str = "BASIC_EXT_IGNORE_CONFIG";

static FILTER: OnceLock<IgnoreFilter> = OnceLock::new();

#[derive(Debug, Default)]
pub struct IgnoreFilter {
    ignores: HashMap<String, Vec<Regex>>,
    retains: HashMap<String, Vec<Regex>>,
}

impl IgnoreFilter {
    /// Loads the config at `path`. A missing file gives an empty filter.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|err| LintError::IgnoreConfig {
            path: display.clone(),
            message: err.to_string(),
        })?;
        Self::parse(&display, &text)
    }

    pub fn parse(path: &str, text: &str) -> Result<Self> {
        let config_error = |message: String| LintError::IgnoreConfig {
            path: path.to_string(),
            message,
        };
        let body = hcl::parse(text).map_err(|err| config_error(err.to_string()))?;
        if let Some(attr) = body.attributes().next() {
            return Err(config_error(format!(
                "unexpected attribute `{}`, only `ignore` and `retain` blocks are allowed",
                attr.key()
            )));
        }

        let known = rules::names();
        let mut filter = Self::default();
        let mut errors = MultiError::new();
        for block in body.blocks() {
            errors.absorb(filter.add_block(block, &known).map_err(&config_error));
        }
        errors.into_result()?;
        Ok(filter)
    }

    pub fn is_ignored(&self, file: &str, rule: &str) -> bool {
        let matches = |table: &HashMap<String, Vec<Regex>>| {
            table
                .get(rule)
                .is_some_and(|patterns| patterns.iter().any(|pattern| pattern.is_match(file)))
        };
        matches(&self.ignores) && !matches(&self.retains)
    }

    pub fn is_empty(&self) -> bool {
        self.ignores.is_empty() && self.retains.is_empty()
    }

    fn add_block(
        &mut self,
        block: &hcl::Block,
        known: &[&'static str],
    ) -> std::result::Result<(), String> {
        let kind = block.identifier();
        let is_ignore = match kind {
            "ignore" => true,
            "retain" => false,
            other => return Err(format!("block type `{other}` not supported")),
        };
        let attribute = |name: &str| {
            block
                .body()
                .attributes()
                .find(|attr| attr.key() == name)
                .map(|attr| attr.expr())
        };

        let patterns = attribute("patterns")
            .ok_or_else(|| format!("`patterns` field must be declared in block `{kind}`"))?;
        let mut ignore_patterns = Vec::new();
        let mut retain_patterns = Vec::new();
        for pattern in string_list(patterns)? {
            let (retain, source) = match pattern.strip_prefix('!') {
                Some(rest) if is_ignore => (true, rest),
                _ => (!is_ignore, pattern.as_str()),
            };
            let regex = Regex::new(source)
                .map_err(|err| format!("pattern `{source}` is not valid: {err}"))?;
            if retain {
                retain_patterns.push(regex);
            } else {
                ignore_patterns.push(regex);
            }
        }

        let include = attribute("include_rules");
        let exclude = attribute("exclude_rules");
        let selected: Vec<&'static str> = match (include, exclude) {
            (Some(_), Some(_)) => {
                return Err(format!(
                    "`include_rules` and `exclude_rules` can't be declared within the same block `{kind}`"
                ));
            }
            (None, None) => known.to_vec(),
            (Some(include), None) => {
                let listed = string_list(include)?;
                check_known(&listed, known)?;
                known
                    .iter()
                    .copied()
                    .filter(|rule| listed.iter().any(|name| name.as_str() == *rule))
                    .collect()
            }
            (None, Some(exclude)) => {
                let listed = string_list(exclude)?;
                check_known(&listed, known)?;
                known
                    .iter()
                    .copied()
                    .filter(|rule| !listed.iter().any(|name| name.as_str() == *rule))
                    .collect()
            }
        };

        for rule in selected {
            self.ignores
                .entry(rule.to_string())
                .or_default()
                .extend(ignore_patterns.iter().cloned());
            self.retains
                .entry(rule.to_string())
                .or_default()
                .extend(retain_patterns.iter().cloned());
        }
        Ok(())
    }
}

fn string_list(expr: &hcl::Expression) -> std::result::Result<Vec<String>, String> {
    let not_a_list = || "the expression is expected to be a string list".to_string();
    let hcl::Expression::Array(items) = expr else {
        return Err(not_a_list());
    };
    items
        .iter()
        .map(|item| match item {
            hcl::Expression::String(s) => Ok(s.clone()),
            _ => Err(not_a_list()),
        })
        .collect()
}

fn check_known(listed: &[String], known: &[&str]) -> std::result::Result<(), String> {
    match listed.iter().find(|name| !known.contains(&name.as_str())) {
        Some(unknown) => Err(format!("rule `{unknown}` doesn't exist")),
        None => Ok(()),
    }
}

/// Loads the ignore config and installs it for the rest of the process.
///
/// The path comes from `BASIC_EXT_IGNORE_CONFIG` or defaults to
/// `.tflintignore.basic-ext` in the working directory.
pub fn init() -> Result<()> {
    let path =
        std::env::var(IGNORE_CONFIG_ENV).unwrap_or_else(|_| IGNORE_CONFIG_FILE.to_string());
    let filter = IgnoreFilter::load(Path::new(&path))?;
    if !filter.is_empty() {
        info!(path = %path, "loaded ignore config");
    }
    if FILTER.set(filter).is_err() {
        warn!("ignore config already installed, keeping the first one");
    }
    Ok(())
}

/// The installed filter, or an empty one when `init` never ran.
pub fn filter() -> &'static IgnoreFilter {
    FILTER.get_or_init(IgnoreFilter::default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(text: &str) -> Result<IgnoreFilter> {
        IgnoreFilter::parse("test.ignore", text)
    }

    #[test]
    fn missing_file_is_an_empty_filter() {
        let temp = TempDir::new().unwrap();
        let filter = IgnoreFilter::load(&temp.path().join(IGNORE_CONFIG_FILE)).unwrap();
        assert!(filter.is_empty());
        assert!(!filter.is_ignored("main.tf", "terraform_variable_order"));
    }

    #[test]
    fn loads_from_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(IGNORE_CONFIG_FILE);
        std::fs::write(&path, "ignore {\n  patterns = [\"^generated/\"]\n}\n").unwrap();
        let filter = IgnoreFilter::load(&path).unwrap();
        assert!(filter.is_ignored("generated/main.tf", "terraform_output_order"));
        assert!(!filter.is_ignored("main.tf", "terraform_output_order"));
    }

    #[test]
    fn include_and_exclude_select_rules() {
        let filter = parse(
            r#"
ignore {
  patterns      = ["legacy"]
  include_rules = ["terraform_variable_order"]
}

ignore {
  patterns      = ["vendor"]
  exclude_rules = ["terraform_heredoc_usage"]
}
"#,
        )
        .unwrap();
        assert!(filter.is_ignored("legacy/a.tf", "terraform_variable_order"));
        assert!(!filter.is_ignored("legacy/a.tf", "terraform_output_order"));
        assert!(filter.is_ignored("vendor/a.tf", "terraform_output_order"));
        assert!(!filter.is_ignored("vendor/a.tf", "terraform_heredoc_usage"));
    }

    #[test]
    fn retain_wins_over_ignore() {
        let filter = parse(
            r#"
ignore {
  patterns = ["^modules/", "!^modules/keep\\.tf$"]
}

retain {
  patterns      = ["main\\.tf$"]
  include_rules = ["terraform_locals_order"]
}
"#,
        )
        .unwrap();
        assert!(filter.is_ignored("modules/a.tf", "terraform_locals_order"));
        assert!(!filter.is_ignored("modules/keep.tf", "terraform_locals_order"));
        assert!(!filter.is_ignored("modules/main.tf", "terraform_locals_order"));
        assert!(filter.is_ignored("modules/main.tf", "terraform_output_order"));
    }

    #[test]
    fn invalid_configs_are_errors() {
        let cases = [
            "skip {\n  patterns = [\"a\"]\n}\n",
            "ignore {\n  include_rules = [\"terraform_variable_order\"]\n}\n",
            "ignore {\n  patterns = [\"a\"]\n  include_rules = [\"terraform_variable_order\"]\n  exclude_rules = [\"terraform_output_order\"]\n}\n",
            "ignore {\n  patterns = [\"a\"]\n  include_rules = [\"no_such_rule\"]\n}\n",
            "ignore {\n  patterns = \"a\"\n}\n",
            "ignore {\n  patterns = [1]\n}\n",
            "ignore {\n  patterns = [\"(\"]\n}\n",
            "patterns = [\"a\"]\n",
            "ignore {",
        ];
        for text in cases {
            let err = parse(text).unwrap_err();
            assert!(matches!(err, LintError::IgnoreConfig { .. }), "{text}: {err}");
        }
    }

    #[test]
    fn every_bad_block_is_reported() {
        let err = parse("skip {\n  patterns = [\"a\"]\n}\n\nretain {}\n").unwrap_err();
        match err {
            LintError::Multiple(errors) => {
                assert!(errors.to_string().starts_with("2 errors occurred:"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
