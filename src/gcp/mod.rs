//! GCP API interaction module
//!
//! This module provides the REST side of a scrape: authentication, the HTTP
//! client, and the [`InventoryApi`](crate::inventory::InventoryApi)
//! implementation backed by the Compute Engine and GKE APIs.
//!
//! # Module Structure
//!
//! - [`auth`] - GCP authentication using Application Default Credentials
//! - [`client`] - Main GCP client for making API requests
//! - [`http`] - HTTP utilities for REST API calls
//! - [`inventory`] - Region, instance, cluster and instance-group listings
//!
//! # Example
//!
//! ```ignore
//! use gke_inventory::gcp::client::{Endpoints, GcpClient};
//! use gke_inventory::inventory::InventoryApi;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = GcpClient::new(Endpoints::default()).await?;
//!     let region = client.get_region("my-project", "asia-northeast1").await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod inventory;
