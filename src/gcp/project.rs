//! Project metadata lookup
//!
//! One read against the Resource Manager API per build. Everything
//! downstream names itself after the canonical project name, so a failed
//! or malformed lookup aborts the build before any resource exists.

use super::client::GcpClient;
use anyhow::{Context, Result};
use serde_json::Value;

/// Read-only descriptor of the target project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
    pub project_id: String,
    pub name: String,
    pub project_number: String,
}

fn string_field(value: &Value, field: &str) -> Result<String> {
    value
        .get(field)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .with_context(|| format!("project metadata missing `{field}`"))
}

fn parse_descriptor(value: &Value) -> Result<ProjectDescriptor> {
    Ok(ProjectDescriptor {
        project_id: string_field(value, "projectId")?,
        name: string_field(value, "name")?,
        project_number: string_field(value, "projectNumber")?,
    })
}

/// Fetch the descriptor of the given project. Not retried; the caller
/// treats any error as fatal.
pub async fn lookup_project(client: &GcpClient, project_id: &str) -> Result<ProjectDescriptor> {
    let url = client.project_url(project_id);
    let response = client
        .get(&url)
        .await
        .with_context(|| format!("failed to read metadata for project `{project_id}`"))?;

    parse_descriptor(&response)
}
