//! GCP Client
//!
//! Main client for interacting with GCP APIs, combining authentication
//! and HTTP functionality.

use super::auth::GcpCredentials;
use super::http::GcpHttpClient;
use anyhow::{Context, Result};
use serde_json::Value;

pub const DEFAULT_COMPUTE_ENDPOINT: &str = "https://compute.googleapis.com/compute/v1";
pub const DEFAULT_CONTAINER_ENDPOINT: &str = "https://container.googleapis.com/v1";

/// Base URLs of the APIs used by a scrape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub compute: String,
    pub container: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            compute: DEFAULT_COMPUTE_ENDPOINT.to_string(),
            container: DEFAULT_CONTAINER_ENDPOINT.to_string(),
        }
    }
}

/// Main GCP client
#[derive(Clone)]
pub struct GcpClient {
    pub credentials: GcpCredentials,
    pub http: GcpHttpClient,
    pub endpoints: Endpoints,
}

impl GcpClient {
    /// Create a new GCP client
    pub async fn new(endpoints: Endpoints) -> Result<Self> {
        let credentials = GcpCredentials::new()
            .await
            .context("Failed to initialize GCP credentials")?;

        Self::with_credentials(credentials, endpoints)
    }

    pub fn with_credentials(credentials: GcpCredentials, endpoints: Endpoints) -> Result<Self> {
        let http = GcpHttpClient::new()?;

        Ok(Self {
            credentials,
            http,
            endpoints,
        })
    }

    /// Get the current access token
    pub async fn get_token(&self) -> Result<String> {
        self.credentials.get_token().await
    }

    /// Make a GET request to a GCP API
    pub async fn get(&self, url: &str) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.get(url, &token).await
    }

    /// Make a POST request to a GCP API
    pub async fn post(&self, url: &str, body: Option<&Value>) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.post(url, &token, body).await
    }

    // =========================================================================
    // Compute Engine API helpers
    // =========================================================================

    /// Build Compute Engine project URL
    pub fn compute_project_url(&self, project: &str) -> String {
        format!(
            "{}/projects/{}",
            self.endpoints.compute.trim_end_matches('/'),
            project
        )
    }

    /// Build Compute Engine API URL
    pub fn compute_url(&self, project: &str, path: &str) -> String {
        format!("{}/{}", self.compute_project_url(project), path)
    }

    /// Build zonal Compute Engine API URL
    pub fn compute_zonal_url(&self, project: &str, zone: &str, resource: &str) -> String {
        self.compute_url(project, &format!("zones/{}/{}", zone, resource))
    }

    /// Build regional Compute Engine API URL
    pub fn compute_region_url(&self, project: &str, region: &str) -> String {
        self.compute_url(project, &format!("regions/{}", region))
    }

    // =========================================================================
    // GKE API helpers
    // =========================================================================

    /// Build GKE API URL from a fully-qualified resource path
    pub fn container_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.endpoints.container.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Append a page token to `url` when there is one
pub fn with_page_token(url: &str, page_token: Option<&str>) -> String {
    match page_token {
        Some(token) => {
            let separator = if url.contains('?') { '&' } else { '?' };
            format!("{}{}pageToken={}", url, separator, urlencoding::encode(token))
        },
        None => url.to_string(),
    }
}

/// Format a GCP API error for display
pub fn format_gcp_error(error: &anyhow::Error) -> String {
    super::http::format_gcp_error(error)
}
