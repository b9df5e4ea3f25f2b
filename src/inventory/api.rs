//! Fetch capability consumed by the enumeration core
//!
//! The core never talks to a concrete client. Everything it needs from the
//! remote inventory is expressed by [`InventoryApi`], which keeps the
//! enumerators testable against an in-memory fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Project as returned by a project lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectRecord {
    pub name: String,
    /// Numeric project id
    pub id: String,
}

/// Region as returned by a region lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionRecord {
    pub name: String,
    /// Canonical zone references, usually full resource URLs
    pub zones: Vec<String>,
}

/// Cluster as returned by a cluster lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterRecord {
    pub name: String,
    pub location: String,
    pub instance_group_urls: Vec<String>,
}

/// Compute instance, decoupled from the REST representation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeInstance {
    pub name: String,
    pub zone: String,
    pub status: String,
    pub internal_ip: Option<String>,
    pub external_ip: Option<String>,
}

/// Member of a node group as returned by a member listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupMember {
    /// Instance reference, usually a full resource URL
    pub instance: String,
    pub status: String,
}

/// Instance-state filter for node-group member listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateFilter {
    #[default]
    All,
    Running,
}

impl StateFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateFilter::All => "ALL",
            StateFilter::Running => "RUNNING",
        }
    }
}

/// One page of a paginated listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page_token: None,
        }
    }
}

/// Remote inventory operations used by a scrape.
///
/// Transport failures are reported as `anyhow::Error`; the enumerators turn
/// them into typed scrape errors with the operation's context.
#[async_trait]
pub trait InventoryApi: Send + Sync {
    async fn get_project(&self, project: &str) -> anyhow::Result<ProjectRecord>;

    async fn get_region(&self, project: &str, region: &str) -> anyhow::Result<RegionRecord>;

    async fn list_instances(
        &self,
        project: &str,
        zone: &str,
        page_token: Option<&str>,
    ) -> anyhow::Result<Page<ComputeInstance>>;

    /// Look up a cluster by its fully-qualified path. `Ok(None)` when absent.
    async fn get_cluster(&self, path: &str) -> anyhow::Result<Option<ClusterRecord>>;

    async fn list_group_members(
        &self,
        project: &str,
        zone: &str,
        group: &str,
        filter: StateFilter,
        page_token: Option<&str>,
    ) -> anyhow::Result<Page<GroupMember>>;
}

/// Consume pages until the continuation token runs out
pub async fn collect_pages<T, F, Fut>(mut fetch: F) -> anyhow::Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = anyhow::Result<Page<T>>>,
{
    let mut all_items = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = fetch(page_token.take()).await?;
        all_items.extend(page.items);

        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }

    Ok(all_items)
}
