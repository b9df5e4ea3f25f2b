//! Configuration Management
//!
//! Loads the scrape configuration from a JSON file and merges CLI overrides.

use crate::error::{Result, ScrapeError};
use crate::gcp::client::{Endpoints, DEFAULT_COMPUTE_ENDPOINT, DEFAULT_CONTAINER_ENDPOINT};
use crate::inventory::ScrapeTarget;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub gcp: GcpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct GlobalConfig {
    /// File receiving JSON log lines
    #[serde(default)]
    pub log_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct GcpConfig {
    #[serde(default)]
    pub project_id: String,
    /// Informational only
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub region_name: String,
    #[serde(default)]
    pub gke_cluster_name: String,
    #[serde(default)]
    pub compute_endpoint: Option<String>,
    #[serde(default)]
    pub container_endpoint: Option<String>,
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gke-inventory").join("config.json"))
    }

    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing default file yields the defaults; an explicit path must exist.
    /// A file that does not parse is always an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !explicit && !path.exists() {
            tracing::debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            ScrapeError::Configuration(format!("unable to read {}: {}", path.display(), e))
        })?;

        Self::parse(&content).map_err(|e| match e {
            ScrapeError::Configuration(msg) => {
                ScrapeError::Configuration(format!("{}: {}", path.display(), msg))
            },
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| ScrapeError::Configuration(format!("unable to decode config: {}", e)))
    }

    /// Override file values with non-empty CLI values
    pub fn apply_overrides(
        &mut self,
        project: Option<&str>,
        region: Option<&str>,
        cluster: Option<&str>,
    ) {
        if let Some(project) = non_empty(project) {
            self.gcp.project_id = project.to_string();
        }
        if let Some(region) = non_empty(region) {
            self.gcp.region_name = region.to_string();
        }
        if let Some(cluster) = non_empty(cluster) {
            self.gcp.gke_cluster_name = cluster.to_string();
        }
    }

    /// Get effective project (CLI > config > gcloud default)
    pub fn effective_project(&self) -> String {
        if !self.gcp.project_id.is_empty() {
            return self.gcp.project_id.clone();
        }
        crate::gcp::auth::get_default_project().unwrap_or_default()
    }

    /// Validate mandatory parameters
    pub fn target(&self) -> Result<ScrapeTarget> {
        let project_id = self.effective_project();

        if project_id.is_empty() {
            return Err(ScrapeError::Configuration(
                "--project is empty. it should be specified as target gcp project name".to_string(),
            ));
        }
        if self.gcp.region_name.is_empty() {
            return Err(ScrapeError::Configuration(
                "--region is empty. it should be specified as target region name".to_string(),
            ));
        }
        if self.gcp.gke_cluster_name.is_empty() {
            return Err(ScrapeError::Configuration(
                "--cluster-name is empty. it should be specified as target gke cluster name"
                    .to_string(),
            ));
        }

        Ok(ScrapeTarget {
            project_id,
            region: self.gcp.region_name.clone(),
            cluster: self.gcp.gke_cluster_name.clone(),
        })
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            compute: self
                .gcp
                .compute_endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_COMPUTE_ENDPOINT.to_string()),
            container: self
                .gcp
                .container_endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_CONTAINER_ENDPOINT.to_string()),
        }
    }

    /// Get the log file path (config > temp dir)
    pub fn log_path(&self) -> PathBuf {
        self.global
            .log_path
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("gke-inventory.log"))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
