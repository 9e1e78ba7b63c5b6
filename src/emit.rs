//! Manifest emission
//!
//! Serializes a built stack to a Terraform-compatible JSON manifest and
//! reports the two deferred output handles. No business logic lives
//! here; the graph is already complete and validated.

use crate::backend::BackendProfile;
use crate::graph::builder::BuiltStack;
use crate::vars::{declared_variables, StackInputs};
use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use std::path::Path;

/// Provider source pinned in the emitted manifest
const GOOGLE_PROVIDER_SOURCE: &str = "hashicorp/google";
const GOOGLE_PROVIDER_VERSION: &str = ">= 6.0";

/// Render the manifest for a built stack.
pub fn render(
    stack: &BuiltStack,
    inputs: &StackInputs,
    backend: &BackendProfile,
) -> Result<Value> {
    let mut root = Map::new();

    let mut terraform = Map::new();
    terraform.insert(
        "required_providers".to_string(),
        json!({
            "google": {
                "source": GOOGLE_PROVIDER_SOURCE,
                "version": GOOGLE_PROVIDER_VERSION,
            }
        }),
    );
    if let BackendProfile::Remote {
        hostname,
        organization,
        workspace,
    } = backend
    {
        terraform.insert(
            "cloud".to_string(),
            json!({
                "hostname": hostname,
                "organization": organization,
                "workspaces": { "name": workspace },
            }),
        );
    }
    root.insert("terraform".to_string(), Value::Object(terraform));

    let mut variables = Map::new();
    for var in declared_variables() {
        let mut block = Map::new();
        block.insert("type".to_string(), json!(var.var_type));
        block.insert("description".to_string(), json!(var.description));
        if let Some(default) = var.default {
            block.insert("default".to_string(), json!(default));
        }
        variables.insert(var.name.to_string(), Value::Object(block));
    }
    root.insert("variable".to_string(), Value::Object(variables));

    root.insert(
        "provider".to_string(),
        json!({
            "google": {
                "project": inputs.project_id,
                "region": inputs.region,
            }
        }),
    );

    // Resources grouped by type, in build order within each group.
    let mut resources = Map::new();
    for node in stack.graph.build_order()? {
        let mut body = match &node.body {
            Value::Object(map) => map.clone(),
            other => {
                anyhow::bail!("resource `{}` has a non-object body: {}", node.address, other)
            }
        };
        if !node.depends_on.is_empty() {
            body.insert(
                "depends_on".to_string(),
                Value::Array(
                    node.depends_on
                        .iter()
                        .map(|d| json!(d.to_string()))
                        .collect(),
                ),
            );
        }

        if let Value::Object(group) = resources
            .entry(node.address.kind().to_string())
            .or_insert_with(|| Value::Object(Map::new()))
        {
            group.insert(node.address.name().to_string(), Value::Object(body));
        }
    }
    root.insert("resource".to_string(), Value::Object(resources));

    root.insert(
        "output".to_string(),
        json!({
            "database_private_ip": {
                "description": "Private address of the database instance",
                "value": stack.database.attr("private_ip_address"),
            },
            "cluster_id": {
                "description": "Identifier of the container cluster",
                "value": stack.cluster.attr("id"),
            },
        }),
    );

    Ok(Value::Object(root))
}

/// Write the manifest to the given file, or to stdout.
pub fn write_manifest(manifest: &Value, out: Option<&Path>) -> Result<()> {
    let rendered = format!("{}\n", serde_json::to_string_pretty(manifest)?);

    match out {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write manifest to {}", path.display()))?;
            tracing::info!("Manifest written to {}", path.display());
        }
        None => print!("{rendered}"),
    }

    Ok(())
}

/// Report the deferred output handles. Values are only known after the
/// provisioning engine applies the manifest, so the handles stand in.
pub fn report_outputs(stack: &BuiltStack) {
    eprintln!(
        "Cloud SQL private IP: {}",
        stack.database.attr("private_ip_address")
    );
    eprintln!("GKE cluster ID: {}", stack.cluster.attr("id"));
}
