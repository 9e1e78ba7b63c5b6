//! Remote state backend selection
//!
//! Maps the resolved `environment` input onto the remote workspace that
//! holds the provisioning state, or onto purely local state when no
//! environment is recognized.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// One selectable organization/workspace pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendTarget {
    pub organization: String,
    pub workspace: String,
}

/// The configured backend host and its per-environment targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendTargets {
    pub hostname: String,
    pub production: BackendTarget,
    pub development: BackendTarget,
}

/// Backend profile chosen for a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendProfile {
    /// No remote backend; state stays local
    Local,
    /// Remote workspace on the configured backend host
    Remote {
        hostname: String,
        organization: String,
        workspace: String,
    },
}

impl BackendProfile {
    fn remote(hostname: &str, target: &BackendTarget) -> Self {
        BackendProfile::Remote {
            hostname: hostname.to_string(),
            organization: target.organization.clone(),
            workspace: target.workspace.clone(),
        }
    }
}

/// Select the backend profile for the given environment value.
///
/// Exactly two environments are recognized; everything else falls back
/// to local state, or is rejected outright when `strict` is set.
pub fn select(
    environment: Option<&str>,
    targets: &BackendTargets,
    strict: bool,
) -> Result<BackendProfile> {
    match environment {
        Some("production") => Ok(BackendProfile::remote(&targets.hostname, &targets.production)),
        Some("development") => Ok(BackendProfile::remote(
            &targets.hostname,
            &targets.development,
        )),
        Some(other) if strict => bail!(
            "unrecognized environment `{other}` (expected \"production\" or \"development\")"
        ),
        Some(other) => {
            tracing::warn!("Unrecognized environment `{}`, using local state", other);
            Ok(BackendProfile::Local)
        }
        None if strict => {
            bail!("required variable `environment` has no value and no default")
        }
        None => Ok(BackendProfile::Local),
    }
}
