//! Node Enumerator
//!
//! Lists the members of every node group, one task per group.

use super::api::{collect_pages, GroupMember, InventoryApi, StateFilter};
use super::cluster::{Node, NodeGroup};
use super::fanout::{self, TaskOutcome};
use crate::error::{Result, ScrapeError};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct NodeEnumerator {
    api: Arc<dyn InventoryApi>,
    filter: StateFilter,
}

impl NodeEnumerator {
    pub fn new(api: Arc<dyn InventoryApi>) -> Self {
        Self {
            api,
            filter: StateFilter::All,
        }
    }

    pub fn with_filter(mut self, filter: StateFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Populate the `nodes` of every group.
    ///
    /// Groups come back in input order. The first failing group cancels the
    /// remaining ones that have not started yet.
    pub async fn enumerate(
        &self,
        groups: Vec<NodeGroup>,
        scope: &CancellationToken,
    ) -> Result<Vec<NodeGroup>> {
        if groups.is_empty() {
            return Ok(groups);
        }

        let scope = scope.child_token();
        let outcomes = self.outcomes(groups, &scope).await;
        let groups = fanout::merge(outcomes)?;

        tracing::debug!(
            "Listed {} nodes across {} instance groups",
            groups.iter().map(|g| g.nodes.len()).sum::<usize>(),
            groups.len()
        );

        Ok(groups)
    }

    /// Per-group outcomes, in completion order
    pub async fn outcomes(
        &self,
        groups: Vec<NodeGroup>,
        scope: &CancellationToken,
    ) -> Vec<TaskOutcome<Vec<NodeGroup>>> {
        fanout::spawn_all(
            scope,
            groups,
            |group| format!("get instance in instance-group({})", group.name),
            |group| list_group(self.api.clone(), self.filter, group),
        )
        .await
    }
}

async fn list_group(
    api: Arc<dyn InventoryApi>,
    filter: StateFilter,
    mut group: NodeGroup,
) -> Result<Vec<NodeGroup>> {
    let members = collect_pages(|page_token| {
        let api = api.clone();
        let (project, zone, name) = (group.project.clone(), group.zone.clone(), group.name.clone());
        async move {
            api.list_group_members(&project, &zone, &name, filter, page_token.as_deref())
                .await
        }
    })
    .await
    .map_err(|e| {
        ScrapeError::page_fetch(
            format!("InstanceGroups.ListInstances({}) got error", group.name),
            e,
        )
    })?;

    group.nodes.extend(members.iter().map(Node::from));
    Ok(vec![group])
}

impl From<&GroupMember> for Node {
    fn from(member: &GroupMember) -> Self {
        Self {
            name: member
                .instance
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string(),
            status: member.status.clone(),
        }
    }
}
