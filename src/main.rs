use anyhow::Result;
use forseti_sdk::core::{FileContext, PreprocessingContext, RulesetCapabilities};
use forseti_sdk::ruleset::{Ruleset, RulesetOptions, RulesetServer};
use serde_json::json;
use std::collections::HashMap;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod error;
mod format;
mod host;
mod ignore;
mod layout;
mod project;
mod rules;
mod runner;
mod source;
mod utils;

use host::HostRule;

struct BasicExtRuleset;

impl RulesetOptions for BasicExtRuleset {
    fn create_ruleset(&self) -> Ruleset {
        create_basic_ext_ruleset()
    }

    fn get_capabilities(&self) -> RulesetCapabilities {
        RulesetCapabilities {
            ruleset_id: project::RULESET_ID.to_string(),
            version: project::VERSION.to_string(),
            file_patterns: vec!["*.tf".to_string()],
            max_file_size: Some(5 * 1024 * 1024),
            annotation_prefixes: vec!["#".to_string(), "//".to_string()],
            rules: vec![], // Will be populated by the server
            default_config: self.get_default_config(),
            config_settings: vec![],
        }
    }

    fn preprocess_files(&self, file_uris: &[String]) -> Result<PreprocessingContext> {
        let mut files = Vec::new();
        let mut global_context = HashMap::new();
        let mut versions_files = 0;

        for uri in file_uris {
            let mut context = HashMap::new();
            let path = uri.strip_prefix("file://").unwrap_or(uri);
            if let Ok(metadata) = std::fs::metadata(path) {
                context.insert("file_size".to_string(), json!(metadata.len()));
            }
            let file_name = std::path::Path::new(path)
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();
            if file_name == "versions.tf" {
                versions_files += 1;
            }
            context.insert("file_name".to_string(), json!(file_name));
            if path.contains("/.terraform/") {
                context.insert("terraform_generated".to_string(), json!(true));
            }

            files.push(FileContext {
                uri: uri.clone(),
                content: String::new(),
                language: infer_language(uri),
                context,
            });
        }

        global_context.insert("total_files".to_string(), json!(files.len()));
        global_context.insert("versions_files".to_string(), json!(versions_files));
        global_context.insert("ruleset_type".to_string(), json!(project::RULESET_ID));

        Ok(PreprocessingContext {
            ruleset_id: project::RULESET_ID.to_string(),
            files,
            global_context,
        })
    }
}

fn create_basic_ext_ruleset() -> Ruleset {
    rules::all()
        .into_iter()
        .fold(Ruleset::new(project::RULESET_ID), |ruleset, rule| {
            ruleset.with_rule(Box::new(HostRule::new(rule)))
        })
}

fn infer_language(uri: &str) -> Option<String> {
    let path = uri.strip_prefix("file://").unwrap_or(uri);
    match std::path::Path::new(path)
        .extension()
        .and_then(|s| s.to_str())
    {
        Some("tf") => Some("terraform".to_string()),
        _ => None,
    }
}

fn main() -> Result<()> {
    // stdout carries the protocol, logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("forseti_ruleset_basic_ext=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    ignore::init()?;
    info!(version = project::VERSION, rules = rules::all().len(), "starting basic-ext ruleset");

    let mut server = RulesetServer::new(Box::new(BasicExtRuleset));
    server.run_stdio()
}
