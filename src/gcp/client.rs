//! GCP Client
//!
//! Bundles authentication and HTTP access to the Cloud Resource Manager
//! API. The endpoint is overridable so tests can point the client at a
//! mock server, and a fixed-token mode supports CI-issued tokens.

use super::auth::GcpCredentials;
use super::http::GcpHttpClient;
use anyhow::{Context, Result};
use serde_json::Value;
use url::Url;

/// Default Resource Manager API endpoint
pub const RESOURCE_MANAGER_ENDPOINT: &str = "https://cloudresourcemanager.googleapis.com/v1/";

#[derive(Clone)]
enum TokenSource {
    /// Application Default Credentials with caching
    Adc(GcpCredentials),
    /// A caller-supplied token (tests, CI)
    Fixed(String),
}

/// Client for the project-metadata read
#[derive(Clone)]
pub struct GcpClient {
    tokens: TokenSource,
    http: GcpHttpClient,
    endpoint: Url,
}

impl GcpClient {
    /// Create a client against the real Resource Manager API using
    /// Application Default Credentials.
    pub async fn new() -> Result<Self> {
        let credentials = GcpCredentials::new()
            .await
            .context("Failed to initialize GCP credentials")?;
        let endpoint =
            Url::parse(RESOURCE_MANAGER_ENDPOINT).context("invalid Resource Manager endpoint")?;

        Ok(Self {
            tokens: TokenSource::Adc(credentials),
            http: GcpHttpClient::new()?,
            endpoint: ensure_trailing_slash(endpoint),
        })
    }

    /// Create a client with a fixed bearer token against an arbitrary
    /// endpoint. Used by tests and by environments that mint their own
    /// access tokens.
    pub fn with_fixed_token(endpoint: Url, token: &str) -> Result<Self> {
        Ok(Self {
            tokens: TokenSource::Fixed(token.to_string()),
            http: GcpHttpClient::new()?,
            endpoint: ensure_trailing_slash(endpoint),
        })
    }

    async fn token(&self) -> Result<String> {
        match &self.tokens {
            TokenSource::Adc(credentials) => credentials.get_token().await,
            TokenSource::Fixed(token) => Ok(token.clone()),
        }
    }

    /// URL of the metadata document for one project
    pub fn project_url(&self, project_id: &str) -> String {
        format!("{}projects/{}", self.endpoint, project_id)
    }

    /// Make a GET request to a GCP API
    pub async fn get(&self, url: &str) -> Result<Value> {
        let token = self.token().await?;
        self.http.get(url, &token).await
    }
}

fn ensure_trailing_slash(mut endpoint: Url) -> Url {
    if !endpoint.path().ends_with('/') {
        let path = format!("{}/", endpoint.path());
        endpoint.set_path(&path);
    }
    endpoint
}

/// Format a GCP API error for display
pub fn format_gcp_error(error: &anyhow::Error) -> String {
    super::http::format_gcp_error(error)
}
