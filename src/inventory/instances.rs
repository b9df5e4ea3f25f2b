//! Instance Enumerator
//!
//! Lists compute instances of every zone of a region, one task per zone.

use super::api::{collect_pages, ComputeInstance, InventoryApi};
use super::fanout::{self, TaskOutcome};
use super::zones::{Region, Zone};
use crate::error::{Result, ScrapeError};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct InstanceEnumerator {
    api: Arc<dyn InventoryApi>,
    project: String,
}

impl InstanceEnumerator {
    pub fn new(api: Arc<dyn InventoryApi>, project: &str) -> Self {
        Self {
            api,
            project: project.to_string(),
        }
    }

    /// List every instance in every zone of `region`.
    ///
    /// The zone tasks share a child of `scope`: the first failing zone
    /// cancels it, and cancelling `scope` itself reaches them as well.
    pub async fn enumerate(
        &self,
        region: &Region,
        scope: &CancellationToken,
    ) -> Result<Vec<ComputeInstance>> {
        let scope = scope.child_token();
        let outcomes = self.outcomes(&region.zones, &scope).await;
        let instances = fanout::merge(outcomes)?;

        tracing::debug!(
            "Listed {} instances across {} zones of {}",
            instances.len(),
            region.zones.len(),
            region.name
        );

        Ok(instances)
    }

    /// Per-zone outcomes, in completion order
    pub async fn outcomes(
        &self,
        zones: &[Zone],
        scope: &CancellationToken,
    ) -> Vec<TaskOutcome<Vec<ComputeInstance>>> {
        fanout::spawn_all(
            scope,
            zones.iter().map(|z| z.name.clone()),
            |zone| format!("get instance in the zone({zone})"),
            |zone| list_zone(self.api.clone(), self.project.clone(), zone),
        )
        .await
    }
}

async fn list_zone(
    api: Arc<dyn InventoryApi>,
    project: String,
    zone: String,
) -> Result<Vec<ComputeInstance>> {
    collect_pages(|page_token| {
        let api = api.clone();
        let project = project.clone();
        let zone = zone.clone();
        async move {
            api.list_instances(&project, &zone, page_token.as_deref())
                .await
        }
    })
    .await
    .map_err(|e| ScrapeError::page_fetch("unable to obtain compute instances", e))
    .map_err(|e| e.context(format!("zone {zone}")))
}
