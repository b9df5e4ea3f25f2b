//! Report Builder
//!
//! The report is the only machine-readable output of a scrape. It is built
//! once, after every phase succeeded.

use super::scrape::Inventory;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const STATUS_OK: u16 = 200;

/// JSON report printed at the end of a scrape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub code: u16,
    pub nodes: Vec<OutputNode>,
    /// Always empty: failures never produce a report
    pub error: String,
}

/// One cluster node correlated with its compute instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputNode {
    pub name: String,
    pub ip: String,
    pub cluster: String,
    pub region: String,
    pub zone: String,
}

impl Report {
    pub fn success(nodes: Vec<OutputNode>) -> Self {
        Self {
            code: STATUS_OK,
            nodes,
            error: String::new(),
        }
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

/// Merges compute instances and cluster nodes into report rows
pub trait NodeCorrelator: Send + Sync {
    fn correlate(&self, inventory: &Inventory) -> Vec<OutputNode>;
}

/// Emits no rows. The correlation key between instances and nodes is not
/// settled, so nothing is assumed by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCorrelation;

impl NodeCorrelator for NoCorrelation {
    fn correlate(&self, _inventory: &Inventory) -> Vec<OutputNode> {
        Vec::new()
    }
}

/// Joins a cluster node to the compute instance of the same name in the
/// same zone. Nodes without a matching instance are left out.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstanceNameCorrelator;

impl NodeCorrelator for InstanceNameCorrelator {
    fn correlate(&self, inventory: &Inventory) -> Vec<OutputNode> {
        let by_name: HashMap<(&str, &str), _> = inventory
            .instances
            .iter()
            .map(|i| ((i.zone.as_str(), i.name.as_str()), i))
            .collect();

        inventory
            .node_groups
            .iter()
            .flat_map(|group| group.nodes.iter().map(move |node| (group, node)))
            .filter_map(|(group, node)| {
                let instance = by_name.get(&(group.zone.as_str(), node.name.as_str()))?;
                Some(OutputNode {
                    name: node.name.clone(),
                    ip: instance.internal_ip.clone().unwrap_or_default(),
                    cluster: inventory.cluster.name.clone(),
                    region: inventory.region.name.clone(),
                    zone: group.zone.clone(),
                })
            })
            .collect()
    }
}

/// Build the final report from a complete inventory
pub fn build(inventory: &Inventory, correlator: &dyn NodeCorrelator) -> Report {
    Report::success(correlator.correlate(inventory))
}
