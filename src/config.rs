//! Build configuration
//!
//! Stack parameters that are data, not logic: name suffixes, CIDR
//! allowlists, node shapes, IAM principals, and the backend targets.
//! Defaults are embedded at compile time; a user-supplied JSON or YAML
//! file replaces them wholesale.

use crate::backend::BackendTargets;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// Embedded default configuration (compiled into the binary)
const DEFAULT_CONFIG: &str = include_str!("defaults.json");

/// Name suffixes appended to the canonical project name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    pub network_suffix: String,
    pub subnet_suffix: String,
    pub reserved_range_suffix: String,
    pub database_suffix: String,
    pub service_account_suffix: String,
    pub cluster_suffix: String,
}

/// Network layout parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub subnet_cidr: String,
    pub reserved_range_prefix_length: u8,
    pub private_google_access: bool,
}

/// A labelled CIDR allowed to reach the database over its public path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizedNetwork {
    pub label: String,
    pub cidr: String,
}

/// Database instance parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub engine_version: String,
    pub tier: String,
    pub deletion_protection: bool,
    pub authorized_networks: Vec<AuthorizedNetwork>,
}

/// Container cluster node shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub initial_node_count: u32,
    pub deletion_protection: bool,
    pub machine_type: String,
    pub disk_size_gb: u32,
}

/// IAM principals that are inputs to the build rather than products of it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IamConfig {
    /// Account id of the automation service account that applies the
    /// manifest; granted vpcaccess.admin and iam.serviceAccountUser.
    pub automation_account_id: String,
}

/// One allow block of a firewall rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirewallAllow {
    pub protocol: String,
    #[serde(default)]
    pub ports: Vec<String>,
}

/// A firewall rule, named verbatim (not derived from the project)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirewallRuleConfig {
    pub name: String,
    pub allow: Vec<FirewallAllow>,
    pub source_ranges: Vec<String>,
}

/// Firewall section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirewallConfig {
    pub rules: Vec<FirewallRuleConfig>,
}

/// Full build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    pub naming: NamingConfig,
    pub network: NetworkConfig,
    pub database: DatabaseConfig,
    pub cluster: ClusterConfig,
    pub iam: IamConfig,
    pub firewall: FirewallConfig,
    pub backend: BackendTargets,
}

static DEFAULTS: OnceLock<BuildConfig> = OnceLock::new();

/// Get the embedded default configuration (parsed on first access)
pub fn default_config() -> &'static BuildConfig {
    DEFAULTS.get_or_init(|| {
        serde_json::from_str(DEFAULT_CONFIG)
            .unwrap_or_else(|e| panic!("Failed to parse embedded default config: {}", e))
    })
}

impl BuildConfig {
    /// Load configuration: the embedded defaults, or the given file.
    /// The format is chosen by extension (`.yaml`/`.yml` for YAML,
    /// anything else is parsed as JSON).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(default_config().clone());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .with_context(|| format!("invalid YAML config in {}", path.display()))?,
            _ => serde_json::from_str(&content)
                .with_context(|| format!("invalid JSON config in {}", path.display()))?,
        };

        Ok(config)
    }
}
