/// Ruleset version, stamped from the package manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const RULESET_ID: &str = "basic-ext";

/// Documentation URL of a rule, pinned to the released version.
pub fn reference_link(name: &str) -> String {
    format!(
        "https://github.com/forseti-linter/forseti-ruleset-basic-ext/blob/v{VERSION}/docs/rules/{name}.md"
    )
}
