//! Typed resource bodies
//!
//! Each struct serializes to the provider schema of its resource type.
//! Fields holding a cross-reference carry a deferred attribute handle
//! produced by [`ResourceAddress::attr`](super::ResourceAddress::attr).

use serde::Serialize;

/// Service that the private-services peering connects to
pub const SERVICE_NETWORKING: &str = "servicenetworking.googleapis.com";

/// VPC network
#[derive(Debug, Clone, Serialize)]
pub struct ComputeNetwork {
    pub name: String,
    pub auto_create_subnetworks: bool,
}

impl ComputeNetwork {
    pub const KIND: &'static str = "google_compute_network";
}

/// Regional subnet inside a network
#[derive(Debug, Clone, Serialize)]
pub struct ComputeSubnetwork {
    pub name: String,
    pub ip_cidr_range: String,
    pub region: String,
    pub network: String,
    pub private_ip_google_access: bool,
}

impl ComputeSubnetwork {
    pub const KIND: &'static str = "google_compute_subnetwork";
}

/// Reserved internal range for private-services peering
#[derive(Debug, Clone, Serialize)]
pub struct ComputeGlobalAddress {
    pub name: String,
    pub purpose: String,
    pub address_type: String,
    pub prefix_length: u8,
    pub network: String,
}

impl ComputeGlobalAddress {
    pub const KIND: &'static str = "google_compute_global_address";

    pub const PURPOSE_VPC_PEERING: &'static str = "VPC_PEERING";
    pub const TYPE_INTERNAL: &'static str = "INTERNAL";
}

/// Peering between the network and a managed service producer
#[derive(Debug, Clone, Serialize)]
pub struct ServiceNetworkingConnection {
    pub network: String,
    pub service: String,
    pub reserved_peering_ranges: Vec<String>,
}

impl ServiceNetworkingConnection {
    pub const KIND: &'static str = "google_service_networking_connection";
}

/// Managed relational database instance
#[derive(Debug, Clone, Serialize)]
pub struct SqlDatabaseInstance {
    pub name: String,
    pub region: String,
    pub database_version: String,
    pub deletion_protection: bool,
    pub settings: SqlSettings,
}

impl SqlDatabaseInstance {
    pub const KIND: &'static str = "google_sql_database_instance";
}

#[derive(Debug, Clone, Serialize)]
pub struct SqlSettings {
    pub tier: String,
    pub ip_configuration: SqlIpConfiguration,
}

#[derive(Debug, Clone, Serialize)]
pub struct SqlIpConfiguration {
    pub ipv4_enabled: bool,
    /// Path of the network the instance gets its private address in
    pub private_network: String,
    pub authorized_networks: Vec<SqlAuthorizedNetwork>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SqlAuthorizedNetwork {
    pub name: String,
    pub value: String,
}

/// Service account for cluster nodes
#[derive(Debug, Clone, Serialize)]
pub struct ServiceAccount {
    pub account_id: String,
    pub display_name: String,
    pub project: String,
}

impl ServiceAccount {
    pub const KIND: &'static str = "google_service_account";
}

/// Project-level role grant
#[derive(Debug, Clone, Serialize)]
pub struct ProjectIamBinding {
    pub project: String,
    pub role: String,
    pub members: Vec<String>,
}

impl ProjectIamBinding {
    pub const KIND: &'static str = "google_project_iam_binding";
}

/// Managed container cluster
#[derive(Debug, Clone, Serialize)]
pub struct ContainerCluster {
    pub name: String,
    pub network: String,
    pub subnetwork: String,
    pub initial_node_count: u32,
    pub deletion_protection: bool,
    pub node_config: NodeConfig,
}

impl ContainerCluster {
    pub const KIND: &'static str = "google_container_cluster";
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeConfig {
    pub machine_type: String,
    pub disk_size_gb: u32,
    pub service_account: String,
}

/// Firewall rule on a network
#[derive(Debug, Clone, Serialize)]
pub struct ComputeFirewall {
    pub name: String,
    pub network: String,
    pub allow: Vec<FirewallAllowBlock>,
    pub source_ranges: Vec<String>,
}

impl ComputeFirewall {
    pub const KIND: &'static str = "google_compute_firewall";
}

#[derive(Debug, Clone, Serialize)]
pub struct FirewallAllowBlock {
    pub protocol: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn network_serializes_to_the_provider_schema() {
        let network = ComputeNetwork {
            name: "acme-1-vpc".to_string(),
            auto_create_subnetworks: false,
        };
        assert_eq!(
            serde_json::to_value(&network).unwrap(),
            json!({"name": "acme-1-vpc", "auto_create_subnetworks": false})
        );
    }

    #[test]
    fn firewall_allow_omits_empty_ports() {
        let allow = FirewallAllowBlock {
            protocol: "all".to_string(),
            ports: Vec::new(),
        };
        assert_eq!(serde_json::to_value(&allow).unwrap(), json!({"protocol": "all"}));
    }
}
