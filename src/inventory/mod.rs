//! Concurrent resource enumeration
//!
//! This module holds the scrape core: it fans out paginated list calls
//! against an [`InventoryApi`] and joins their results into one report.
//!
//! # Module Structure
//!
//! - [`api`] - Fetch capability trait and API-agnostic records
//! - [`fanout`] - Task-per-item spawning over a shared cancellable scope
//! - [`zones`] - Zone Resolver
//! - [`instances`] - Instance Enumerator (one task per zone)
//! - [`cluster`] - Cluster Resolver and node-group reference parsing
//! - [`nodes`] - Node Enumerator (one task per node group)
//! - [`scrape`] - Scrape Orchestrator
//! - [`report`] - Report Builder and node correlation
//!
//! # Example
//!
//! ```ignore
//! use gke_inventory::inventory::{Scraper, ScrapeTarget};
//! use tokio_util::sync::CancellationToken;
//!
//! async fn example(api: std::sync::Arc<dyn gke_inventory::inventory::InventoryApi>) -> gke_inventory::Result<()> {
//!     let target = ScrapeTarget {
//!         project_id: "my-project".into(),
//!         region: "asia-northeast1".into(),
//!         cluster: "prod".into(),
//!     };
//!     let report = Scraper::new(api, target).run(&CancellationToken::new()).await?;
//!     println!("{}", report.to_json(false).unwrap_or_default());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cluster;
pub mod fanout;
pub mod instances;
pub mod nodes;
pub mod report;
pub mod scrape;
pub mod zones;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{
    collect_pages, ClusterRecord, ComputeInstance, GroupMember, InventoryApi, Page, ProjectRecord,
    RegionRecord, StateFilter,
};
pub use cluster::{parse_node_group_reference, ClusterTopology, Node, NodeGroup};
pub use instances::InstanceEnumerator;
pub use nodes::NodeEnumerator;
pub use report::{InstanceNameCorrelator, NoCorrelation, NodeCorrelator, OutputNode, Report};
pub use scrape::{Inventory, ScrapeTarget, Scraper};
pub use zones::{resolve_project, resolve_region, zone_name, Region, Zone};
