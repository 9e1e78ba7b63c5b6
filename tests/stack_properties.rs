//! Property-based tests using proptest
//!
//! These tests verify backend-selection totality and determinism, and
//! that stack construction is a pure function of its inputs.

use gstack::backend::{self, BackendProfile};
use gstack::config::default_config;
use gstack::emit;
use gstack::gcp::project::ProjectDescriptor;
use gstack::graph::builder::build;
use gstack::vars::StackInputs;
use proptest::prelude::*;

fn inputs_for(project_id: &str, region: &str, environment: Option<&str>) -> StackInputs {
    StackInputs {
        project_id: project_id.to_string(),
        region: region.to_string(),
        environment: environment.map(str::to_string),
    }
}

fn descriptor_for(project_id: &str, name: &str) -> ProjectDescriptor {
    ProjectDescriptor {
        project_id: project_id.to_string(),
        name: name.to_string(),
        project_number: "731045834302".to_string(),
    }
}

proptest! {
    /// Selection is total: every environment value maps to one of the
    /// three defined outcomes without panicking.
    #[test]
    fn backend_selection_is_total(environment in proptest::option::of(".*")) {
        let targets = &default_config().backend;
        let profile = backend::select(environment.as_deref(), targets, false).unwrap();
        match environment.as_deref() {
            Some("production") | Some("development") => {
                prop_assert!(matches!(profile, BackendProfile::Remote { .. }), "expected remote backend profile");
            }
            _ => prop_assert_eq!(profile, BackendProfile::Local),
        }
    }

    /// Selection is keyed only on the environment value
    #[test]
    fn backend_selection_is_deterministic(environment in proptest::option::of("[a-z]{0,12}")) {
        let targets = &default_config().backend;
        let first = backend::select(environment.as_deref(), targets, false).unwrap();
        let second = backend::select(environment.as_deref(), targets, false).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Resource names are pure functions of the canonical name and the
    /// configured suffixes
    #[test]
    fn resource_names_are_pure_functions(
        name in "[a-z][a-z0-9-]{4,20}",
        project_id in "[a-z][a-z0-9-]{5,24}",
    ) {
        let config = default_config();
        let inputs = inputs_for(&project_id, "europe-west3", None);
        let project = descriptor_for(&project_id, &name);

        let stack = build(&inputs, &project, config).unwrap();
        let network = &stack.graph.nodes()[0];
        prop_assert_eq!(network.body["name"].as_str().unwrap(), format!("{name}-vpc"));
    }

    /// Identical inputs produce byte-identical manifests
    #[test]
    fn manifests_are_reproducible(
        name in "[a-z][a-z0-9-]{4,20}",
        environment in proptest::option::of(prop_oneof!["production", "development", "staging"]),
    ) {
        let config = default_config();
        let inputs = inputs_for("acme-1-project", "europe-west3", environment.as_deref());
        let project = descriptor_for("acme-1-project", &name);

        let backend = backend::select(inputs.environment.as_deref(), &config.backend, false).unwrap();

        let first = emit::render(&build(&inputs, &project, config).unwrap(), &inputs, &backend).unwrap();
        let second = emit::render(&build(&inputs, &project, config).unwrap(), &inputs, &backend).unwrap();
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    /// The graph is always a DAG with references resolving backwards
    #[test]
    fn graph_is_always_a_valid_dag(
        name in "[a-z][a-z0-9-]{4,20}",
        region in "[a-z]+-[a-z]+[0-9]",
    ) {
        let config = default_config();
        let inputs = inputs_for("acme-1-project", &region, None);
        let project = descriptor_for("acme-1-project", &name);

        let stack = build(&inputs, &project, config).unwrap();
        stack.graph.validate().unwrap();
        let order = stack.graph.build_order().unwrap();
        prop_assert_eq!(order.len(), stack.graph.len());
    }
}
