//! Inventory API over the Compute Engine and GKE REST APIs

use super::client::{with_page_token, GcpClient};
use super::http::api_status;
use crate::inventory::api::{
    ClusterRecord, ComputeInstance, GroupMember, InventoryApi, Page, ProjectRecord, RegionRecord,
    StateFilter,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

fn str_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn next_page_token(response: &Value) -> Option<String> {
    response
        .get("nextPageToken")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn items(response: &Value) -> &[Value] {
    response
        .get("items")
        .and_then(|v| v.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Extract short name from GCP resource URL
fn short_name(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

impl From<&Value> for ComputeInstance {
    fn from(value: &Value) -> Self {
        let nic = value
            .get("networkInterfaces")
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first());

        Self {
            name: str_field(value, "name"),
            zone: short_name(&str_field(value, "zone")).to_string(),
            status: str_field(value, "status"),
            internal_ip: nic
                .and_then(|n| n.get("networkIP"))
                .and_then(|v| v.as_str())
                .map(String::from),
            external_ip: nic
                .and_then(|n| n.get("accessConfigs"))
                .and_then(|v| v.as_array())
                .and_then(|arr| arr.iter().find_map(|c| c.get("natIP")?.as_str()))
                .map(String::from),
        }
    }
}

impl From<&Value> for GroupMember {
    fn from(value: &Value) -> Self {
        Self {
            instance: str_field(value, "instance"),
            status: str_field(value, "status"),
        }
    }
}

impl From<&Value> for ClusterRecord {
    fn from(value: &Value) -> Self {
        let mut instance_group_urls = str_list(value.get("instanceGroupUrls"));

        // Newer clusters only list instance groups per node pool
        if instance_group_urls.is_empty() {
            instance_group_urls = value
                .get("nodePools")
                .and_then(|v| v.as_array())
                .map(|pools| {
                    pools
                        .iter()
                        .flat_map(|pool| str_list(pool.get("instanceGroupUrls")))
                        .collect()
                })
                .unwrap_or_default();
        }

        Self {
            name: str_field(value, "name"),
            location: str_field(value, "location"),
            instance_group_urls,
        }
    }
}

#[async_trait]
impl InventoryApi for GcpClient {
    async fn get_project(&self, project: &str) -> Result<ProjectRecord> {
        let url = self.compute_project_url(project);
        let response = self
            .get(&url)
            .await
            .with_context(|| format!("Failed to get project {}", project))?;

        Ok(ProjectRecord {
            name: str_field(&response, "name"),
            id: str_field(&response, "id"),
        })
    }

    async fn get_region(&self, project: &str, region: &str) -> Result<RegionRecord> {
        let url = self.compute_region_url(project, region);
        let response = self
            .get(&url)
            .await
            .with_context(|| format!("Failed to get region {}", region))?;

        Ok(RegionRecord {
            name: str_field(&response, "name"),
            zones: str_list(response.get("zones")),
        })
    }

    async fn list_instances(
        &self,
        project: &str,
        zone: &str,
        page_token: Option<&str>,
    ) -> Result<Page<ComputeInstance>> {
        let url = with_page_token(&self.compute_zonal_url(project, zone, "instances"), page_token);
        let response = self
            .get(&url)
            .await
            .with_context(|| format!("Failed to list instances in {}", zone))?;

        Ok(Page {
            items: items(&response).iter().map(ComputeInstance::from).collect(),
            next_page_token: next_page_token(&response),
        })
    }

    async fn get_cluster(&self, path: &str) -> Result<Option<ClusterRecord>> {
        let url = self.container_url(path);
        match self.get(&url).await {
            Ok(Value::Null) => Ok(None),
            Ok(response) => Ok(Some(ClusterRecord::from(&response))),
            Err(e) if api_status(&e) == Some(StatusCode::NOT_FOUND) => Ok(None),
            Err(e) => Err(e.context(format!("Failed to get cluster {}", path))),
        }
    }

    async fn list_group_members(
        &self,
        project: &str,
        zone: &str,
        group: &str,
        filter: StateFilter,
        page_token: Option<&str>,
    ) -> Result<Page<GroupMember>> {
        let url = with_page_token(
            &self.compute_zonal_url(project, zone, &format!("instanceGroups/{}/listInstances", group)),
            page_token,
        );
        let body = json!({ "instanceState": filter.as_str() });
        let response = self
            .post(&url, Some(&body))
            .await
            .with_context(|| format!("Failed to list members of {}", group))?;

        Ok(Page {
            items: items(&response).iter().map(GroupMember::from).collect(),
            next_page_token: next_page_token(&response),
        })
    }
}
