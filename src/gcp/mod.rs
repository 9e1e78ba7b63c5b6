//! GCP access layer
//!
//! Authentication, HTTP plumbing, and the single project-metadata read
//! the build performs before constructing any resource.

pub mod auth;
pub mod client;
pub mod http;
pub mod project;
