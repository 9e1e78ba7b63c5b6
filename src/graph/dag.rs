//! Dependency graph over resource descriptors
//!
//! Every cross-reference must point at a node that is already in the
//! graph, so insertion order is itself a valid build order. The DAG
//! invariant is still checked mechanically: `validate` re-walks every
//! edge and `build_order` derives a topological order from scratch.

use anyhow::{bail, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

/// Address of a resource in the emitted manifest (`<type>.<name>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceAddress {
    kind: String,
    name: String,
}

impl ResourceAddress {
    pub fn new(kind: &str, name: &str) -> Self {
        Self {
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Deferred handle for an attribute of this resource. The value is
    /// only known after the provisioning engine applies the manifest, so
    /// the handle stands in for it everywhere downstream.
    pub fn attr(&self, attribute: &str) -> String {
        format!("${{{}.{}.{}}}", self.kind, self.name, attribute)
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind, self.name)
    }
}

/// One resource descriptor plus its explicit dependencies
#[derive(Debug, Clone)]
pub struct ResourceNode {
    pub address: ResourceAddress,
    pub body: Value,
    /// Dependencies stated by the builder; carried into the manifest.
    pub depends_on: Vec<ResourceAddress>,
    /// Addresses referenced through deferred handles in the body.
    pub references: Vec<ResourceAddress>,
}

impl ResourceNode {
    /// Union of explicit dependencies and embedded references.
    fn edges(&self) -> impl Iterator<Item = &ResourceAddress> {
        self.depends_on.iter().chain(self.references.iter())
    }
}

/// The resource DAG for one build
#[derive(Debug, Default)]
pub struct ResourceGraph {
    nodes: Vec<ResourceNode>,
    index: HashMap<ResourceAddress, usize>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource. Fails on a duplicate address and on any explicit
    /// dependency or embedded reference that is not in the graph yet.
    pub fn add<T: Serialize>(
        &mut self,
        kind: &str,
        name: &str,
        body: &T,
        depends_on: &[&ResourceAddress],
    ) -> Result<ResourceAddress> {
        let address = ResourceAddress::new(kind, name);
        if self.index.contains_key(&address) {
            bail!("duplicate resource `{address}`");
        }

        let body = serde_json::to_value(body)?;

        let mut references = Vec::new();
        scan_references(&body, &mut references);
        references.retain(|r| *r != address);
        references.dedup();

        for dep in depends_on {
            if !self.index.contains_key(dep) {
                bail!("resource `{address}` depends on `{dep}`, which has not been built yet");
            }
        }
        for reference in &references {
            if !self.index.contains_key(reference) {
                bail!("resource `{address}` references `{reference}`, which has not been built yet");
            }
        }

        self.index.insert(address.clone(), self.nodes.len());
        self.nodes.push(ResourceNode {
            address: address.clone(),
            body,
            depends_on: depends_on.iter().map(|d| (*d).clone()).collect(),
            references,
        });

        Ok(address)
    }

    pub fn nodes(&self) -> &[ResourceNode] {
        &self.nodes
    }

    pub fn get(&self, address: &ResourceAddress) -> Option<&ResourceNode> {
        self.index.get(address).map(|i| &self.nodes[*i])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check that every edge points at a node inserted strictly earlier.
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashSet<&ResourceAddress> = HashSet::new();
        for node in &self.nodes {
            for edge in node.edges() {
                if !seen.contains(edge) {
                    bail!(
                        "resource `{}` refers to `{}`, which is not built earlier",
                        node.address,
                        edge
                    );
                }
            }
            seen.insert(&node.address);
        }
        Ok(())
    }

    /// Derive a build order by topological sort (Kahn). Ties resolve in
    /// insertion order, so a graph built through `add` sorts to itself.
    pub fn build_order(&self) -> Result<Vec<&ResourceNode>> {
        let mut in_degree = vec![0usize; self.nodes.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];

        for (i, node) in self.nodes.iter().enumerate() {
            for edge in node.edges() {
                let Some(&dep) = self.index.get(edge) else {
                    bail!("resource `{}` refers to unknown `{}`", node.address, edge);
                };
                in_degree[i] += 1;
                dependents[dep].push(i);
            }
        }

        let mut ready: VecDeque<usize> = (0..self.nodes.len())
            .filter(|&i| in_degree[i] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(i) = ready.pop_front() {
            order.push(&self.nodes[i]);
            for &dependent in &dependents[i] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.push_back(dependent);
                }
            }
        }

        if order.len() != self.nodes.len() {
            let stuck: Vec<String> = self
                .nodes
                .iter()
                .enumerate()
                .filter(|(i, _)| in_degree[*i] > 0)
                .map(|(_, n)| n.address.to_string())
                .collect();
            bail!("dependency cycle among: {}", stuck.join(", "));
        }

        Ok(order)
    }

    #[cfg(test)]
    fn push_unchecked(&mut self, node: ResourceNode) {
        self.index.insert(node.address.clone(), self.nodes.len());
        self.nodes.push(node);
    }
}

/// Collect every `${<kind>.<name>.<attr>}` handle embedded in a value.
fn scan_references(value: &Value, found: &mut Vec<ResourceAddress>) {
    match value {
        Value::String(s) => {
            let mut rest = s.as_str();
            while let Some(start) = rest.find("${") {
                let tail = &rest[start + 2..];
                let Some(end) = tail.find('}') else { break };
                let parts: Vec<&str> = tail[..end].split('.').collect();
                if parts.len() >= 3 {
                    found.push(ResourceAddress::new(parts[0], parts[1]));
                }
                rest = &tail[end + 1..];
            }
        }
        Value::Array(items) => {
            for item in items {
                scan_references(item, found);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                scan_references(item, found);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn attr_renders_a_deferred_handle() {
        let address = ResourceAddress::new("google_compute_network", "vpc");
        assert_eq!(address.attr("id"), "${google_compute_network.vpc.id}");
    }

    #[test]
    fn duplicate_address_is_rejected() {
        let mut graph = ResourceGraph::new();
        graph
            .add("google_compute_network", "vpc", &json!({"name": "a"}), &[])
            .unwrap();
        let err = graph
            .add("google_compute_network", "vpc", &json!({"name": "b"}), &[])
            .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn forward_dependency_is_rejected() {
        let mut graph = ResourceGraph::new();
        let missing = ResourceAddress::new("google_compute_network", "vpc");
        let err = graph
            .add("google_compute_subnetwork", "subnet", &json!({}), &[&missing])
            .unwrap_err();
        assert!(err.to_string().contains("has not been built yet"));
    }

    #[test]
    fn embedded_handle_to_an_unbuilt_resource_is_rejected() {
        let mut graph = ResourceGraph::new();
        let body = json!({"network": "${google_compute_network.vpc.id}"});
        let err = graph
            .add("google_compute_subnetwork", "subnet", &body, &[])
            .unwrap_err();
        assert!(err.to_string().contains("references"));
    }

    #[test]
    fn embedded_handles_inside_longer_strings_are_found() {
        let mut found = Vec::new();
        scan_references(
            &json!({"path": "projects/p/global/networks/${google_compute_network.vpc.name}"}),
            &mut found,
        );
        assert_eq!(
            found,
            vec![ResourceAddress::new("google_compute_network", "vpc")]
        );
    }

    #[test]
    fn build_order_respects_dependencies() {
        let mut graph = ResourceGraph::new();
        let network = graph
            .add("google_compute_network", "vpc", &json!({"name": "n"}), &[])
            .unwrap();
        graph
            .add(
                "google_compute_subnetwork",
                "subnet",
                &json!({"network": network.attr("id")}),
                &[&network],
            )
            .unwrap();

        let order = graph.build_order().unwrap();
        assert_eq!(order[0].address, network);
        assert_eq!(order.len(), 2);

        graph.validate().unwrap();
    }

    #[test]
    fn cycle_is_detected() {
        let a = ResourceAddress::new("kind", "a");
        let b = ResourceAddress::new("kind", "b");

        let mut graph = ResourceGraph::new();
        graph.push_unchecked(ResourceNode {
            address: a.clone(),
            body: json!({}),
            depends_on: vec![b.clone()],
            references: Vec::new(),
        });
        graph.push_unchecked(ResourceNode {
            address: b,
            body: json!({}),
            depends_on: vec![a],
            references: Vec::new(),
        });

        let err = graph.build_order().unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }
}
