//! Resource graph
//!
//! Typed descriptors for every resource in the stack, the DAG that
//! orders their construction, and the builder that wires the topology.
//!
//! # Architecture
//!
//! - [`dag`] - Addresses, deferred attribute handles, and the DAG
//! - [`resources`] - Typed resource bodies serializing to the provider schema
//! - [`builder`] - Constructs the stack in a dependency-respecting order

pub mod builder;
mod dag;
pub mod resources;

pub use dag::{ResourceAddress, ResourceGraph, ResourceNode};
