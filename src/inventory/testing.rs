//! In-memory [`InventoryApi`] for unit tests

use super::api::{
    ClusterRecord, ComputeInstance, GroupMember, InventoryApi, Page, ProjectRecord, RegionRecord,
    StateFilter,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio::sync::Notify;

pub const PROJECT: &str = "test-project";

pub fn zone_url(zone: &str) -> String {
    format!("https://www.googleapis.com/compute/v1/projects/{PROJECT}/zones/{zone}")
}

pub fn group_url(zone: &str, group: &str) -> String {
    format!(
        "https://www.googleapis.com/compute/v1/projects/{PROJECT}/zones/{zone}/instanceGroupManagers/{group}"
    )
}

#[derive(Default)]
pub struct FakeInventory {
    project_fails: bool,
    region_fails: bool,
    zones: Vec<(String, Vec<Vec<ComputeInstance>>)>,
    failing_zones: HashSet<String>,
    held_zones: HashSet<String>,
    cluster: Option<ClusterRecord>,
    cluster_fails: bool,
    groups: HashMap<String, Vec<Vec<GroupMember>>>,
    failing_groups: HashSet<String>,
    held_groups: HashSet<String>,
    calls: Mutex<Vec<String>>,
    entered: Notify,
    release: Notify,
}

impl FakeInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zone serving `count` instances in a single page
    pub fn with_zone(self, zone: &str, count: usize) -> Self {
        self.with_zone_pages(zone, &[count])
    }

    pub fn with_zone_pages(mut self, zone: &str, page_sizes: &[usize]) -> Self {
        let mut next = 0;
        let pages = page_sizes
            .iter()
            .map(|size| {
                let page = (next..next + size)
                    .map(|i| ComputeInstance {
                        name: format!("{zone}-vm-{i}"),
                        zone: zone.to_string(),
                        status: "RUNNING".to_string(),
                        internal_ip: Some(format!("10.0.0.{i}")),
                        external_ip: None,
                    })
                    .collect();
                next += size;
                page
            })
            .collect();
        self.zones.push((zone.to_string(), pages));
        self
    }

    pub fn failing_zone(mut self, zone: &str) -> Self {
        self.zones.push((zone.to_string(), vec![]));
        self.failing_zones.insert(zone.to_string());
        self
    }

    /// Listing `zone` blocks until [`FakeInventory::release`] is called
    pub fn holding_zone(mut self, zone: &str) -> Self {
        self.held_zones.insert(zone.to_string());
        self
    }

    pub fn failing_project(mut self) -> Self {
        self.project_fails = true;
        self
    }

    pub fn failing_region(mut self) -> Self {
        self.region_fails = true;
        self
    }

    pub fn with_cluster(mut self, name: &str, instance_group_urls: Vec<String>) -> Self {
        self.cluster = Some(ClusterRecord {
            name: name.to_string(),
            location: "test-region".to_string(),
            instance_group_urls,
        });
        self
    }

    pub fn failing_cluster(mut self) -> Self {
        self.cluster_fails = true;
        self
    }

    /// Node group serving `count` members, paged by two
    pub fn with_group(mut self, zone: &str, group: &str, count: usize) -> Self {
        let members: Vec<GroupMember> = (0..count)
            .map(|i| GroupMember {
                instance: format!("{}/instances/{group}-node-{i}", zone_url(zone)),
                status: if i % 2 == 0 { "RUNNING" } else { "STOPPING" }.to_string(),
            })
            .collect();
        let pages = members.chunks(2).map(|c| c.to_vec()).collect();
        self.groups.insert(group.to_string(), pages);
        self
    }

    /// Listing the first page of `group` blocks until [`FakeInventory::release`] is called
    pub fn holding_group(mut self, group: &str) -> Self {
        self.held_groups.insert(group.to_string());
        self
    }

    pub fn failing_group(mut self, group: &str) -> Self {
        self.failing_groups.insert(group.to_string());
        self
    }

    /// Recorded calls, e.g. `list_instances:a`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, call: &str) -> bool {
        self.calls().iter().any(|c| c == call)
    }

    /// Wait until a held listing is in flight
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn page<T: Clone>(pages: &[Vec<T>], page_token: Option<&str>) -> Page<T> {
        let index: usize = page_token
            .and_then(|t| t.strip_prefix("page-"))
            .and_then(|n| n.parse().ok())
            .unwrap_or(0);
        Page {
            items: pages.get(index).cloned().unwrap_or_default(),
            next_page_token: (index + 1 < pages.len()).then(|| format!("page-{}", index + 1)),
        }
    }
}

#[async_trait]
impl InventoryApi for FakeInventory {
    async fn get_project(&self, project: &str) -> anyhow::Result<ProjectRecord> {
        self.record(format!("get_project:{project}"));
        if self.project_fails {
            return Err(anyhow::anyhow!("API request failed: 404 Not Found"));
        }
        Ok(ProjectRecord {
            name: project.to_string(),
            id: "123456789012".to_string(),
        })
    }

    async fn get_region(&self, _project: &str, region: &str) -> anyhow::Result<RegionRecord> {
        self.record(format!("get_region:{region}"));
        if self.region_fails {
            return Err(anyhow::anyhow!("API request failed: 404 Not Found"));
        }
        Ok(RegionRecord {
            name: region.to_string(),
            zones: self.zones.iter().map(|(z, _)| zone_url(z)).collect(),
        })
    }

    async fn list_instances(
        &self,
        _project: &str,
        zone: &str,
        page_token: Option<&str>,
    ) -> anyhow::Result<Page<ComputeInstance>> {
        self.record(format!("list_instances:{zone}"));
        if self.held_zones.contains(zone) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        if self.failing_zones.contains(zone) {
            self.release.notify_one();
            return Err(anyhow::anyhow!("API request failed: 500 Internal Server Error"));
        }
        let pages = self
            .zones
            .iter()
            .find(|(z, _)| z == zone)
            .map(|(_, pages)| pages.as_slice())
            .unwrap_or_default();
        Ok(Self::page(pages, page_token))
    }

    async fn get_cluster(&self, path: &str) -> anyhow::Result<Option<ClusterRecord>> {
        self.record(format!("get_cluster:{path}"));
        if self.cluster_fails {
            return Err(anyhow::anyhow!("API request failed: 403 Forbidden"));
        }
        Ok(self.cluster.clone())
    }

    async fn list_group_members(
        &self,
        _project: &str,
        _zone: &str,
        group: &str,
        filter: StateFilter,
        page_token: Option<&str>,
    ) -> anyhow::Result<Page<GroupMember>> {
        self.record(format!("list_group_members:{group}:{}", filter.as_str()));
        if page_token.is_none() && self.held_groups.contains(group) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        if self.failing_groups.contains(group) {
            return Err(anyhow::anyhow!("API request failed: 500 Internal Server Error"));
        }
        let pages = self.groups.get(group).map(Vec::as_slice).unwrap_or_default();
        Ok(Self::page(pages, page_token))
    }
}
