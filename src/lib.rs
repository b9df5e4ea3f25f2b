//! Scrape Compute Engine instances and GKE node pools of one region into a
//! single JSON report.

pub mod config;
pub mod error;
pub mod gcp;
pub mod inventory;

pub use error::{ErrorKind, Result, ScrapeError};

/// Version injected at compile time via GKE_INVENTORY_VERSION env var (set by CI/CD),
/// or the crate version for local builds.
pub const VERSION: &str = match option_env!("GKE_INVENTORY_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};
