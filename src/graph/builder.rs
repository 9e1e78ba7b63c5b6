//! Stack topology
//!
//! Constructs every resource of the stack in a dependency-respecting
//! order, naming each one after the canonical project name plus a
//! configured suffix, and wiring cross-references through deferred
//! attribute handles. Pure: no network access, no side effects.

use super::resources::*;
use super::{ResourceAddress, ResourceGraph};
use crate::config::BuildConfig;
use crate::gcp::project::ProjectDescriptor;
use crate::vars::StackInputs;
use anyhow::Result;

pub const ROLE_CLOUDSQL_CLIENT: &str = "roles/cloudsql.client";
pub const ROLE_VPCACCESS_ADMIN: &str = "roles/vpcaccess.admin";
pub const ROLE_SERVICE_ACCOUNT_USER: &str = "roles/iam.serviceAccountUser";

/// A fully wired stack plus the addresses the emitter reports on
pub struct BuiltStack {
    pub graph: ResourceGraph,
    pub database: ResourceAddress,
    pub cluster: ResourceAddress,
}

/// Manifest-local name for a resource, derived from a display name
/// (`allow-vpn-access` -> `allow_vpn_access`).
fn local_name(name: &str) -> String {
    name.replace(['-', '.', '/'], "_")
}

/// Manifest-local name for a role binding; one binding per role, so a
/// second binding for the same role collides in the graph.
fn binding_name(role: &str) -> String {
    local_name(role.trim_start_matches("roles/"))
}

/// Construct the whole topology.
pub fn build(
    inputs: &StackInputs,
    project: &ProjectDescriptor,
    config: &BuildConfig,
) -> Result<BuiltStack> {
    let mut graph = ResourceGraph::new();
    let base = &project.name;
    let naming = &config.naming;

    let network = graph.add(
        ComputeNetwork::KIND,
        "vpc",
        &ComputeNetwork {
            name: format!("{base}{}", naming.network_suffix),
            auto_create_subnetworks: false,
        },
        &[],
    )?;

    let subnet = graph.add(
        ComputeSubnetwork::KIND,
        "subnet",
        &ComputeSubnetwork {
            name: format!("{base}{}", naming.subnet_suffix),
            ip_cidr_range: config.network.subnet_cidr.clone(),
            region: inputs.region.clone(),
            network: network.attr("id"),
            private_ip_google_access: config.network.private_google_access,
        },
        &[&network],
    )?;

    let reserved_range = graph.add(
        ComputeGlobalAddress::KIND,
        "reserved_range",
        &ComputeGlobalAddress {
            name: format!("{base}{}", naming.reserved_range_suffix),
            purpose: ComputeGlobalAddress::PURPOSE_VPC_PEERING.to_string(),
            address_type: ComputeGlobalAddress::TYPE_INTERNAL.to_string(),
            prefix_length: config.network.reserved_range_prefix_length,
            network: network.attr("id"),
        },
        &[&network],
    )?;

    let peering = graph.add(
        ServiceNetworkingConnection::KIND,
        "vpc_peering",
        &ServiceNetworkingConnection {
            network: network.attr("id"),
            service: SERVICE_NETWORKING.to_string(),
            reserved_peering_ranges: vec![reserved_range.attr("name")],
        },
        &[&network, &reserved_range],
    )?;

    // Private-address provisioning rides on the peering, which is not
    // visible from the instance's own fields; the edge must be explicit.
    let database = graph.add(
        SqlDatabaseInstance::KIND,
        "sql_instance",
        &SqlDatabaseInstance {
            name: format!("{base}{}", naming.database_suffix),
            region: inputs.region.clone(),
            database_version: config.database.engine_version.clone(),
            deletion_protection: config.database.deletion_protection,
            settings: SqlSettings {
                tier: config.database.tier.clone(),
                ip_configuration: SqlIpConfiguration {
                    ipv4_enabled: false,
                    private_network: format!(
                        "projects/{}/global/networks/{}",
                        inputs.project_id,
                        network.attr("name")
                    ),
                    authorized_networks: config
                        .database
                        .authorized_networks
                        .iter()
                        .map(|n| SqlAuthorizedNetwork {
                            name: n.label.clone(),
                            value: n.cidr.clone(),
                        })
                        .collect(),
                },
            },
        },
        &[&peering],
    )?;

    let service_account = graph.add(
        ServiceAccount::KIND,
        "gke_sa",
        &ServiceAccount {
            account_id: format!("{base}{}", naming.service_account_suffix),
            display_name: format!("{base} GKE Service Account"),
            project: inputs.project_id.clone(),
        },
        &[],
    )?;

    graph.add(
        ProjectIamBinding::KIND,
        &binding_name(ROLE_CLOUDSQL_CLIENT),
        &ProjectIamBinding {
            project: inputs.project_id.clone(),
            role: ROLE_CLOUDSQL_CLIENT.to_string(),
            members: vec![format!("serviceAccount:{}", service_account.attr("email"))],
        },
        &[&service_account],
    )?;

    let automation_member = format!(
        "serviceAccount:{}@{}.iam.gserviceaccount.com",
        config.iam.automation_account_id, inputs.project_id
    );
    for role in [ROLE_VPCACCESS_ADMIN, ROLE_SERVICE_ACCOUNT_USER] {
        graph.add(
            ProjectIamBinding::KIND,
            &binding_name(role),
            &ProjectIamBinding {
                project: inputs.project_id.clone(),
                role: role.to_string(),
                members: vec![automation_member.clone()],
            },
            &[],
        )?;
    }

    let cluster = graph.add(
        ContainerCluster::KIND,
        "gke_cluster",
        &ContainerCluster {
            name: format!("{base}{}", naming.cluster_suffix),
            network: network.attr("id"),
            subnetwork: subnet.attr("id"),
            initial_node_count: config.cluster.initial_node_count,
            deletion_protection: config.cluster.deletion_protection,
            node_config: NodeConfig {
                machine_type: config.cluster.machine_type.clone(),
                disk_size_gb: config.cluster.disk_size_gb,
                service_account: service_account.attr("email"),
            },
        },
        &[&network, &subnet, &service_account],
    )?;

    for rule in &config.firewall.rules {
        graph.add(
            ComputeFirewall::KIND,
            &local_name(&rule.name),
            &ComputeFirewall {
                name: rule.name.clone(),
                network: network.attr("id"),
                allow: rule
                    .allow
                    .iter()
                    .map(|a| FirewallAllowBlock {
                        protocol: a.protocol.clone(),
                        ports: a.ports.clone(),
                    })
                    .collect(),
                source_ranges: rule.source_ranges.clone(),
            },
            &[&network],
        )?;
    }

    Ok(BuiltStack {
        graph,
        database,
        cluster,
    })
}
