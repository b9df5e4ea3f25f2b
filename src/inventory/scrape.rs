//! Scrape Orchestrator
//!
//! Runs the topology phase ({zones → instances} ‖ {cluster}) under one
//! cancellable scope, then the node phase, then builds the report.

use super::api::{ComputeInstance, InventoryApi};
use super::cluster::{resolve_cluster, ClusterTopology, NodeGroup};
use super::instances::InstanceEnumerator;
use super::nodes::NodeEnumerator;
use super::report::{self, NodeCorrelator, Report};
use super::zones::{resolve_project, resolve_region, Region};
use crate::error::{Result, ScrapeError};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Validated scrape parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeTarget {
    pub project_id: String,
    pub region: String,
    pub cluster: String,
}

/// Everything a successful scrape collected
#[derive(Debug, Clone)]
pub struct Inventory {
    pub region: Region,
    pub instances: Vec<ComputeInstance>,
    pub cluster: ClusterTopology,
    pub node_groups: Vec<NodeGroup>,
}

/// Elapsed-time telemetry for one scrape
struct Stanza {
    id: Uuid,
    started: Instant,
}

impl Stanza {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started: Instant::now(),
        }
    }

    fn elapsed(&self) -> String {
        format!("{:?}", round_micros(self.started.elapsed()))
    }

    fn processing(&self, step: &str) {
        tracing::info!(
            id = %self.id,
            status = "processing",
            elapsed = %self.elapsed(),
            "{}",
            step
        );
    }
}

/// Round to the nearest microsecond, halves away from zero
fn round_micros(elapsed: Duration) -> Duration {
    let micros = (elapsed.as_nanos() + 500) / 1_000;
    Duration::from_micros(u64::try_from(micros).unwrap_or(u64::MAX))
}

pub struct Scraper {
    api: Arc<dyn InventoryApi>,
    target: ScrapeTarget,
    correlator: Box<dyn NodeCorrelator>,
}

impl Scraper {
    pub fn new(api: Arc<dyn InventoryApi>, target: ScrapeTarget) -> Self {
        Self {
            api,
            target,
            correlator: Box::new(report::NoCorrelation),
        }
    }

    pub fn with_correlator(mut self, correlator: Box<dyn NodeCorrelator>) -> Self {
        self.correlator = correlator;
        self
    }

    /// Scrape and build the report. Any failure aborts without a report.
    pub async fn run(&self, scope: &CancellationToken) -> Result<Report> {
        let stanza = Stanza::new();
        tracing::info!(
            id = %stanza.id,
            status = "start",
            started_at = %chrono::Utc::now().to_rfc3339(),
            project = %self.target.project_id,
            region = %self.target.region,
            cluster = %self.target.cluster,
            "Scraping Starts"
        );

        let inventory = self.collect(scope, &stanza).await?;
        let report = report::build(&inventory, self.correlator.as_ref());

        tracing::info!(
            id = %stanza.id,
            status = "end",
            total_elapsed_time = %stanza.elapsed(),
            instances = inventory.instances.len(),
            node_groups = inventory.node_groups.len(),
            "Scraping Complete"
        );

        Ok(report)
    }

    /// Run both phases and return the collected inventory
    pub async fn inventory(&self, scope: &CancellationToken) -> Result<Inventory> {
        self.collect(scope, &Stanza::new()).await
    }

    async fn collect(&self, scope: &CancellationToken, stanza: &Stanza) -> Result<Inventory> {
        let scope = scope.child_token();

        // both phases are awaited to completion, a failure only stops the
        // sibling's work that has not started yet
        let topology = futures::future::join(
            cancel_on_error(&scope, self.compute_topology(&scope, stanza)),
            cancel_on_error(&scope, self.cluster_topology(&scope, stanza)),
        )
        .await;

        let ((region, instances), (cluster, groups)) = match topology {
            (Ok(compute), Ok(cluster)) => (compute, cluster),
            (Err(first), Err(second)) if first.is_cancelled() => return Err(second),
            (Err(e), _) | (_, Err(e)) => return Err(e),
        };

        stanza.processing("list instances in each instance-group");
        let node_groups = NodeEnumerator::new(self.api.clone())
            .enumerate(groups, &scope)
            .await
            .map_err(|e| e.context("node phase"))?;

        Ok(Inventory {
            region,
            instances,
            cluster,
            node_groups,
        })
    }

    async fn compute_topology(
        &self,
        scope: &CancellationToken,
        stanza: &Stanza,
    ) -> Result<(Region, Vec<ComputeInstance>)> {
        if scope.is_cancelled() {
            return Err(ScrapeError::Cancelled("obtain region and zones".to_string()));
        }

        stanza.processing("obtain gcp project");
        resolve_project(self.api.as_ref(), &self.target.project_id).await?;

        stanza.processing("obtain region and zones");
        let region = resolve_region(self.api.as_ref(), &self.target.project_id, &self.target.region)
            .await?;

        stanza.processing("list instances in each zone");
        let instances = InstanceEnumerator::new(self.api.clone(), &self.target.project_id)
            .enumerate(&region, scope)
            .await?;

        Ok((region, instances))
    }

    async fn cluster_topology(
        &self,
        scope: &CancellationToken,
        stanza: &Stanza,
    ) -> Result<(ClusterTopology, Vec<NodeGroup>)> {
        if scope.is_cancelled() {
            return Err(ScrapeError::Cancelled("obtain GKE cluster".to_string()));
        }

        stanza.processing("obtain GKE cluster");
        let cluster = resolve_cluster(
            self.api.as_ref(),
            &self.target.project_id,
            &self.target.region,
            &self.target.cluster,
        )
        .await?;

        stanza.processing("list instance-groups in the GKE cluster");
        let groups = cluster.node_groups()?;

        Ok((cluster, groups))
    }
}

/// Cancel `scope` when `work` fails so the sibling phase stops early
async fn cancel_on_error<T>(
    scope: &CancellationToken,
    work: impl Future<Output = Result<T>>,
) -> Result<T> {
    let result = work.await;
    if result.is_err() {
        scope.cancel();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::inventory::report::InstanceNameCorrelator;
    use crate::inventory::testing::{group_url, FakeInventory, PROJECT};

    fn target() -> ScrapeTarget {
        ScrapeTarget {
            project_id: PROJECT.to_string(),
            region: "test-region".to_string(),
            cluster: "my-cluster".to_string(),
        }
    }

    #[tokio::test]
    async fn test_full_scrape() {
        let api = Arc::new(
            FakeInventory::new()
                .with_zone("a", 2)
                .with_zone("b", 3)
                .with_cluster("my-cluster", vec![group_url("a", "g1"), group_url("b", "g2")])
                .with_group("a", "g1", 2)
                .with_group("b", "g2", 1),
        );
        let scraper = Scraper::new(api.clone(), target());

        let inventory = scraper.inventory(&CancellationToken::new()).await.unwrap();

        assert_eq!(inventory.region.zone_names(), vec!["a", "b"]);
        assert_eq!(inventory.instances.len(), 5);
        assert_eq!(inventory.cluster.name, "my-cluster");
        assert_eq!(inventory.node_groups.len(), 2);
        assert_eq!(inventory.node_groups[0].nodes.len(), 2);
        assert_eq!(inventory.node_groups[1].nodes.len(), 1);
    }

    #[tokio::test]
    async fn test_report_on_success() {
        let api = Arc::new(
            FakeInventory::new()
                .with_zone("a", 1)
                .with_cluster("my-cluster", vec![]),
        );
        let scraper = Scraper::new(api, target());

        let report = scraper.run(&CancellationToken::new()).await.unwrap();

        assert_eq!(report, Report::success(vec![]));
    }

    #[tokio::test]
    async fn test_report_with_correlation() {
        let api = Arc::new(
            FakeInventory::new()
                .with_zone("a", 0)
                .with_cluster("my-cluster", vec![group_url("a", "g1")])
                .with_group("a", "g1", 1),
        );
        let scraper =
            Scraper::new(api, target()).with_correlator(Box::new(InstanceNameCorrelator));

        let report = scraper.run(&CancellationToken::new()).await.unwrap();

        // the fake's group members have no matching compute instance
        assert!(report.nodes.is_empty());
        assert_eq!(report.code, 200);
    }

    #[tokio::test]
    async fn test_zone_failure_skips_node_phase() {
        let api = Arc::new(
            FakeInventory::new()
                .failing_zone("a")
                .with_zone("b", 3)
                .with_cluster("my-cluster", vec![group_url("a", "g1")])
                .with_group("a", "g1", 2),
        );
        let scraper = Scraper::new(api.clone(), target());

        let err = scraper.run(&CancellationToken::new()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::PageFetch);
        assert!(!api.calls().iter().any(|c| c.starts_with("list_group_members")));
    }

    #[tokio::test]
    async fn test_malformed_reference_aborts() {
        let api = Arc::new(
            FakeInventory::new()
                .with_zone("a", 1)
                .with_cluster("my-cluster", vec!["not-a-group".to_string()]),
        );
        let scraper = Scraper::new(api.clone(), target());

        let err = scraper.run(&CancellationToken::new()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MalformedReference);
        assert!(!api.calls().iter().any(|c| c.starts_with("list_group_members")));
    }

    #[tokio::test]
    async fn test_missing_cluster_aborts() {
        let api = Arc::new(FakeInventory::new().with_zone("a", 1));
        let scraper = Scraper::new(api, target());

        let err = scraper.run(&CancellationToken::new()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_region_failure_aborts() {
        let api = Arc::new(
            FakeInventory::new()
                .failing_region()
                .with_cluster("my-cluster", vec![]),
        );
        let scraper = Scraper::new(api, target());

        let err = scraper.run(&CancellationToken::new()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Lookup);
    }

    #[tokio::test]
    async fn test_cancelled_scope_makes_no_calls() {
        let api = Arc::new(FakeInventory::new().with_zone("a", 1));
        let scraper = Scraper::new(api.clone(), target());
        let scope = CancellationToken::new();
        scope.cancel();

        let err = scraper.run(&scope).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_project_aborts_before_listing() {
        let api = Arc::new(
            FakeInventory::new()
                .failing_project()
                .with_zone("a", 1)
                .with_cluster("my-cluster", vec![]),
        );
        let scraper = Scraper::new(api.clone(), target());

        let err = scraper.run(&CancellationToken::new()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert!(err.to_string().starts_with("unable to get gcp project"));
        assert!(!api.calls().iter().any(|c| c.starts_with("get_region")));
        assert!(!api.calls().iter().any(|c| c.starts_with("list_instances")));
    }

    #[tokio::test]
    async fn test_cluster_failure_cancels_unstarted_zones() {
        let api = Arc::new(
            FakeInventory::new()
                .with_zone("a", 2)
                .with_zone("b", 3)
                .failing_cluster(),
        );
        let scraper = Scraper::new(api.clone(), target());

        // current-thread runtime: zone tasks only start once both phases
        // have yielded, by then the cluster lookup has cancelled the scope
        let err = scraper.run(&CancellationToken::new()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert!(err.to_string().contains("unable to obtain gke cluster"));
        assert!(api.called("get_region:test-region"));
        assert!(!api.calls().iter().any(|c| c.starts_with("list_instances")));
    }

    #[test]
    fn test_round_micros() {
        assert_eq!(
            round_micros(Duration::from_nanos(1_234_567)),
            Duration::from_micros(1_235)
        );
        assert_eq!(
            round_micros(Duration::from_nanos(1_234_499)),
            Duration::from_micros(1_234)
        );
        assert_eq!(round_micros(Duration::from_nanos(500)), Duration::from_micros(1));
    }
}
