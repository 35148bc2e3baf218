//! Read-only capabilities the usage aggregator consumes.
//!
//! Each source wraps a platform service (package catalog, usage stats,
//! network stats, activity event log). Any call may block on I/O.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{AppCategory, IconHandle, TimeRange, TrafficBytes, TransportKind};

/// Failure of a single source call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("Usage access permission not granted")]
    PermissionDenied,

    #[error("Package not found: {0}")]
    NotFound(String),

    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Source call timed out after {0} ms")]
    Timeout(u64),
}

/// Display metadata for an installed package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppMetadata {
    pub display_name: String,
    #[serde(default)]
    pub icon: IconHandle,
    #[serde(default)]
    pub category: AppCategory,
}

/// Aggregate foreground activity of one package within a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForegroundUsage {
    pub foreground_ms: u64,
    pub last_used_ms: i64,
}

/// Resolves package identifiers against the installed-app catalog.
#[async_trait]
pub trait AppCatalog: Send + Sync {
    /// Numeric identity used for network accounting.
    async fn uid_for(&self, package_id: &str) -> Result<u32, SourceError>;

    async fn resolve(&self, package_id: &str) -> Result<AppMetadata, SourceError>;
}

/// Per-package foreground time for a range.
#[async_trait]
pub trait ForegroundTimeSource: Send + Sync {
    async fn foreground_usage(
        &self,
        range: TimeRange,
    ) -> Result<HashMap<String, ForegroundUsage>, SourceError>;
}

/// Per-package, per-transport byte counters.
#[async_trait]
pub trait NetworkAccountingSource: Send + Sync {
    async fn traffic(
        &self,
        uid: u32,
        range: TimeRange,
        transport: TransportKind,
    ) -> Result<TrafficBytes, SourceError>;
}

/// Count of came-to-foreground transitions per package.
///
/// Backed by the platform event log, which has limited retention; counts are
/// best effort and only refreshed on the next full pass.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn launch_counts(&self, range: TimeRange) -> Result<HashMap<String, u32>, SourceError>;
}

/// The four capabilities one pass pulls from.
#[derive(Clone, Copy)]
pub struct UsageSources<'a> {
    pub catalog: &'a dyn AppCatalog,
    pub foreground: &'a dyn ForegroundTimeSource,
    pub network: &'a dyn NetworkAccountingSource,
    pub events: &'a dyn EventSource,
}

impl<'a> UsageSources<'a> {
    /// Borrow a single value that provides every capability.
    pub fn from_provider<P>(provider: &'a P) -> Self
    where
        P: AppCatalog + ForegroundTimeSource + NetworkAccountingSource + EventSource,
    {
        Self {
            catalog: provider,
            foreground: provider,
            network: provider,
            events: provider,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_display() {
        assert_eq!(
            SourceError::PermissionDenied.to_string(),
            "Usage access permission not granted"
        );
        assert_eq!(
            SourceError::NotFound("com.a".to_string()).to_string(),
            "Package not found: com.a"
        );
        assert_eq!(
            SourceError::Timeout(250).to_string(),
            "Source call timed out after 250 ms"
        );
    }

    #[test]
    fn test_app_metadata_defaults_category() {
        let metadata: AppMetadata =
            serde_json::from_str(r#"{"display_name": "Maps"}"#).unwrap();
        assert_eq!(metadata.category, AppCategory::undefined());
        assert_eq!(metadata.icon, IconHandle::default());
    }
}
