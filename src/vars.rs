//! Stack input variables
//!
//! Declares the named inputs of a build and resolves each one from
//! explicit overrides, the process environment, or its declared default.

use anyhow::{bail, Result};
use std::collections::HashMap;

/// Prefix for input overrides taken from the process environment
/// (`GSTACK_VAR_PROJECT_ID`, `GSTACK_VAR_REGION`, ...).
pub const ENV_PREFIX: &str = "GSTACK_VAR_";

/// A declared input variable
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: &'static str,
    pub var_type: &'static str,
    pub description: &'static str,
    pub default: Option<&'static str>,
}

/// The inputs every build accepts. Order is the order they appear in the
/// emitted manifest.
pub fn declared_variables() -> Vec<Variable> {
    vec![
        Variable {
            name: "project_id",
            var_type: "string",
            description: "The id of the project",
            default: Some("digital-seat-441309-j5"),
        },
        Variable {
            name: "region",
            var_type: "string",
            description: "The region for resources",
            default: Some("europe-west3"),
        },
        Variable {
            name: "environment",
            var_type: "string",
            description: "Deployment environment, also used as the remote backend workspace name",
            default: None,
        },
    ]
}

/// Resolved input values for one build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackInputs {
    pub project_id: String,
    pub region: String,
    /// None when neither an override nor an env value was supplied;
    /// the backend selector decides what that means.
    pub environment: Option<String>,
}

/// Collect `GSTACK_VAR_*` overrides from the process environment.
/// Keys are lowercased so `GSTACK_VAR_PROJECT_ID` addresses `project_id`.
pub fn environment_overrides() -> HashMap<String, String> {
    std::env::vars()
        .filter_map(|(key, value)| {
            key.strip_prefix(ENV_PREFIX)
                .map(|name| (name.to_lowercase(), value))
        })
        .collect()
}

/// Resolve one variable: CLI override > environment > declared default.
fn resolve_variable(
    var: &Variable,
    cli: &HashMap<String, String>,
    env: &HashMap<String, String>,
) -> Option<String> {
    cli.get(var.name)
        .or_else(|| env.get(var.name))
        .cloned()
        .or_else(|| var.default.map(str::to_string))
}

/// Resolve all declared inputs.
///
/// Unknown CLI override names are a configuration error (they are always
/// explicit user input); stray `GSTACK_VAR_*` entries are ignored.
pub fn resolve(
    cli: &HashMap<String, String>,
    env: &HashMap<String, String>,
) -> Result<StackInputs> {
    let variables = declared_variables();

    for name in cli.keys() {
        if !variables.iter().any(|v| v.name == name.as_str()) {
            bail!("unknown input variable `{name}` (expected one of: project_id, region, environment)");
        }
    }

    let mut resolved: HashMap<&str, String> = HashMap::new();
    for var in &variables {
        if let Some(value) = resolve_variable(var, cli, env) {
            resolved.insert(var.name, value);
        }
    }

    // project_id and region carry defaults, so absence here means an
    // empty override was supplied on purpose.
    let project_id = match resolved.remove("project_id") {
        Some(v) if !v.is_empty() => v,
        _ => bail!("required variable `project_id` has no value and no default"),
    };
    let region = match resolved.remove("region") {
        Some(v) if !v.is_empty() => v,
        _ => bail!("required variable `region` has no value and no default"),
    };

    if !validate_project_id(&project_id) {
        bail!(
            "invalid project id `{project_id}`: must be 6-30 characters, lowercase letters, \
             digits and hyphens, starting with a letter and not ending with a hyphen"
        );
    }

    Ok(StackInputs {
        project_id,
        region,
        environment: resolved.remove("environment").filter(|v| !v.is_empty()),
    })
}

/// Validate a GCP project ID format
/// Project IDs must be 6-30 characters, lowercase letters, digits, and hyphens
/// Must start with a letter and cannot end with a hyphen
pub fn validate_project_id(project: &str) -> bool {
    if project.len() < 6 || project.len() > 30 {
        return false;
    }

    match project.chars().next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }

    if project.ends_with('-') {
        return false;
    }

    project
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn defaults_apply_when_nothing_supplied() {
        let inputs = resolve(&no_env(), &no_env()).unwrap();
        assert_eq!(inputs.project_id, "digital-seat-441309-j5");
        assert_eq!(inputs.region, "europe-west3");
        assert_eq!(inputs.environment, None);
    }

    #[test]
    fn cli_override_wins_over_env_and_default() {
        let cli = HashMap::from([("project_id".to_string(), "acme-project-1".to_string())]);
        let env = HashMap::from([("project_id".to_string(), "other-project".to_string())]);
        let inputs = resolve(&cli, &env).unwrap();
        assert_eq!(inputs.project_id, "acme-project-1");
    }

    #[test]
    fn env_override_wins_over_default() {
        let env = HashMap::from([
            ("region".to_string(), "us-central1".to_string()),
            ("environment".to_string(), "production".to_string()),
        ]);
        let inputs = resolve(&no_env(), &env).unwrap();
        assert_eq!(inputs.region, "us-central1");
        assert_eq!(inputs.environment.as_deref(), Some("production"));
    }

    #[test]
    fn unknown_cli_override_is_rejected() {
        let cli = HashMap::from([("projcet_id".to_string(), "typo-project".to_string())]);
        let err = resolve(&cli, &no_env()).unwrap_err();
        assert!(err.to_string().contains("projcet_id"));
    }

    #[test]
    fn stray_env_entries_are_ignored() {
        let env = HashMap::from([("something_else".to_string(), "value".to_string())]);
        assert!(resolve(&no_env(), &env).is_ok());
    }

    #[test]
    fn invalid_project_id_fails_before_any_lookup() {
        let cli = HashMap::from([("project_id".to_string(), "Bad_Project!".to_string())]);
        let err = resolve(&cli, &no_env()).unwrap_err();
        assert!(err.to_string().contains("invalid project id"));
    }

    #[test]
    fn empty_environment_counts_as_unset() {
        let cli = HashMap::from([("environment".to_string(), String::new())]);
        let inputs = resolve(&cli, &no_env()).unwrap();
        assert_eq!(inputs.environment, None);
    }

    #[test]
    fn test_validate_project_id() {
        assert!(validate_project_id("digital-seat-441309-j5"));
        assert!(validate_project_id("acme-1-project"));
        assert!(!validate_project_id("short"));
        assert!(!validate_project_id("1starts-with-digit"));
        assert!(!validate_project_id("ends-with-hyphen-"));
        assert!(!validate_project_id("Uppercase-project"));
    }

    #[test]
    fn environment_override_prefix_is_stripped_and_lowercased() {
        std::env::set_var("GSTACK_VAR_REGION", "europe-north1");
        let env = environment_overrides();
        std::env::remove_var("GSTACK_VAR_REGION");
        assert_eq!(env.get("region").map(String::as_str), Some("europe-north1"));
    }
}
