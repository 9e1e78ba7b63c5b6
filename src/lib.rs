//! gstack - declarative GCP stack builder
//!
//! Resolves the stack inputs, selects a remote state backend, reads the
//! target project's metadata, wires every resource of the topology into
//! a dependency graph, and emits a Terraform-compatible JSON manifest.

pub mod backend;
pub mod config;
pub mod emit;
pub mod gcp;
pub mod graph;
pub mod vars;

/// Version injected at compile time via GSTACK_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("GSTACK_VERSION") {
    Some(v) => v,
    None => "dev",
};
