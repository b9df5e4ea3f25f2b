//! Zone Resolver
//!
//! Resolves a region to the zones it contains.

use super::api::{InventoryApi, ProjectRecord};
use crate::error::{Result, ScrapeError};
use url::Url;

/// Base used to resolve relative zone references such as `projects/p/zones/z`
const REFERENCE_BASE: &str = "https://compute.googleapis.com/";

/// A zone of a region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Short name, e.g. `asia-northeast1-a`
    pub name: String,
    /// Canonical reference, e.g. `https://www.googleapis.com/compute/v1/projects/p/zones/asia-northeast1-a`
    pub reference: String,
}

impl Zone {
    /// Build a zone from its canonical reference.
    ///
    /// A reference that cannot be parsed yields an empty name rather than an error.
    pub fn from_reference(reference: &str) -> Self {
        Self {
            name: zone_name(reference),
            reference: reference.to_string(),
        }
    }
}

/// Final path segment of a zone reference, or an empty string
pub fn zone_name(reference: &str) -> String {
    let Ok(url) = Url::parse(REFERENCE_BASE).and_then(|base| base.join(reference)) else {
        return String::new();
    };

    url.path()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// A region and its zones
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub name: String,
    pub zones: Vec<Zone>,
}

impl Region {
    pub fn zone_names(&self) -> Vec<&str> {
        self.zones.iter().map(|z| z.name.as_str()).collect()
    }
}

/// Confirm `project` exists before any regional lookup
pub async fn resolve_project(api: &dyn InventoryApi, project: &str) -> Result<ProjectRecord> {
    let record = api
        .get_project(project)
        .await
        .map_err(|e| ScrapeError::lookup("unable to get gcp project", e))?;

    tracing::debug!("Project {} (id {})", record.name, record.id);
    Ok(record)
}

/// Look up `region` in `project` and derive its zones
pub async fn resolve_region(api: &dyn InventoryApi, project: &str, region: &str) -> Result<Region> {
    let record = api
        .get_region(project, region)
        .await
        .map_err(|e| ScrapeError::lookup("unable to get region", e))?;

    let zones: Vec<Zone> = record
        .zones
        .iter()
        .map(|reference| Zone::from_reference(reference))
        .collect();

    for zone in zones.iter().filter(|z| z.name.is_empty()) {
        tracing::warn!("Could not derive a zone name from {:?}", zone.reference);
    }

    tracing::debug!("Region {} has {} zones", region, zones.len());

    Ok(Region {
        name: if record.name.is_empty() {
            region.to_string()
        } else {
            record.name
        },
        zones,
    })
}
