//! Cluster Resolver
//!
//! Looks up a GKE cluster and parses the instance-group references of its
//! node pools into [`NodeGroup`] descriptors.

use super::api::InventoryApi;
use crate::error::{Result, ScrapeError};
use regex::Regex;
use std::sync::LazyLock;

static NODE_GROUP_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*/projects/([^/]+)/zones/([^/]+)/instanceGroupManagers/([^/]+)")
        .expect("node-group reference pattern is valid")
});

/// A cluster and the node-group references it owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterTopology {
    pub name: String,
    pub location: String,
    pub node_group_references: Vec<String>,
}

/// A managed instance group backing a node pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeGroup {
    pub project: String,
    pub zone: String,
    pub name: String,
    pub nodes: Vec<Node>,
}

/// A member of a node group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub status: String,
}

/// Parse `https://.../projects/{project}/zones/{zone}/instanceGroupManagers/{name}`
pub fn parse_node_group_reference(reference: &str) -> Result<NodeGroup> {
    let captures = NODE_GROUP_REFERENCE
        .captures(reference)
        .ok_or_else(|| ScrapeError::MalformedReference(reference.to_string()))?;

    Ok(NodeGroup {
        project: captures[1].to_string(),
        zone: captures[2].to_string(),
        name: captures[3].to_string(),
        nodes: Vec::new(),
    })
}

/// Fully-qualified cluster path used for the lookup
pub fn cluster_path(project: &str, location: &str, cluster: &str) -> String {
    format!("projects/{project}/locations/{location}/clusters/{cluster}")
}

impl ClusterTopology {
    /// Parse every node-group reference. The first malformed one aborts.
    pub fn node_groups(&self) -> Result<Vec<NodeGroup>> {
        self.node_group_references
            .iter()
            .map(|reference| parse_node_group_reference(reference))
            .collect()
    }
}

/// Look up `cluster` in `project`/`location`
pub async fn resolve_cluster(
    api: &dyn InventoryApi,
    project: &str,
    location: &str,
    cluster: &str,
) -> Result<ClusterTopology> {
    let path = cluster_path(project, location, cluster);

    let record = api
        .get_cluster(&path)
        .await
        .map_err(|e| ScrapeError::lookup("unable to obtain gke cluster", e))?
        .ok_or_else(|| ScrapeError::NotFound(format!("cluster {path}")))?;

    tracing::debug!(
        "Cluster {} owns {} instance groups",
        record.name,
        record.instance_group_urls.len()
    );

    Ok(ClusterTopology {
        name: record.name,
        location: if record.location.is_empty() {
            location.to_string()
        } else {
            record.location
        },
        node_group_references: record.instance_group_urls,
    })
}
