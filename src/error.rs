//! Error types for the ruleset.
//!
//! Rules never stop at the first failure: per-file and per-block errors are
//! collected into a [`MultiError`] and handed back to the host as one error.
//! Parse failures are not errors for rules, the file is skipped instead.

use std::fmt;

use thiserror::Error;

/// Core error type for rule checks and ruleset setup.
#[derive(Debug, Error)]
pub enum LintError {
    /// A configuration file could not be parsed.
    #[error("Failed to parse {file}: {message}")]
    Parse { file: String, message: String },

    /// The runner has no file with this name.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// The runner refused an issue, e.g. an exact duplicate.
    #[error("Issue rejected for rule '{rule}': {reason}")]
    EmitRejected { rule: String, reason: String },

    /// An attribute expected to be statically known could not be evaluated.
    #[error("Failed to evaluate '{attribute}' in {file}: {message}")]
    Evaluation {
        file: String,
        attribute: String,
        message: String,
    },

    /// The ignore config file is unreadable or malformed.
    #[error("Invalid ignore config {path}: {message}")]
    IgnoreConfig { path: String, message: String },

    /// Several errors collected during one check.
    #[error(transparent)]
    Multiple(#[from] MultiError),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, LintError>;

/// Accumulates errors while a check keeps going.
#[derive(Debug, Default)]
pub struct MultiError {
    errors: Vec<LintError>,
}

impl MultiError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an error, flattening nested aggregates.
    pub fn push(&mut self, err: LintError) {
        match err {
            LintError::Multiple(inner) => self.errors.extend(inner.errors),
            other => self.errors.push(other),
        }
    }

    /// Records the error of `result`, if any.
    pub fn absorb<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.push(err);
                None
            }
        }
    }

    /// `Ok(())` when nothing was collected. A single error is returned as is.
    pub fn into_result(mut self) -> Result<()> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(LintError::Multiple(self)),
        }
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} errors occurred:", self.errors.len())?;
        for err in &self.errors {
            write!(f, "\n\t* {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collection_is_ok() {
        assert!(MultiError::new().into_result().is_ok());
    }

    #[test]
    fn single_error_is_unwrapped() {
        let mut errs = MultiError::new();
        errs.push(LintError::FileNotFound("a.tf".to_string()));
        let err = errs.into_result().unwrap_err();
        assert!(matches!(err, LintError::FileNotFound(name) if name == "a.tf"));
    }

    #[test]
    fn nested_aggregates_are_flattened() {
        let mut inner = MultiError::new();
        inner.push(LintError::FileNotFound("a.tf".to_string()));
        inner.push(LintError::FileNotFound("b.tf".to_string()));

        let mut outer = MultiError::new();
        outer.push(LintError::Multiple(inner));
        outer.push(LintError::FileNotFound("c.tf".to_string()));

        let message = outer.into_result().unwrap_err().to_string();
        assert!(message.starts_with("3 errors occurred:"));
        assert!(message.contains("File not found: c.tf"));
    }

    #[test]
    fn absorb_keeps_values() {
        let mut errs = MultiError::new();
        assert_eq!(errs.absorb(Ok(1)), Some(1));
        assert_eq!(
            errs.absorb::<i32>(Err(LintError::FileNotFound("x".to_string()))),
            None
        );
        assert!(matches!(errs.into_result(), Err(LintError::FileNotFound(_))));
    }

    #[test]
    fn parse_error_displays_file() {
        let err = LintError::Parse {
            file: "main.tf".to_string(),
            message: "unexpected token".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to parse main.tf: unexpected token");
    }
}
