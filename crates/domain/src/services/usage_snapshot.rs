//! In-memory usage sources backed by an exported device snapshot.
//!
//! A snapshot holds raw platform data (installed apps, foreground intervals,
//! network buckets, activity events) and answers every source capability by
//! filtering that data to the requested range.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::usage_sources::{
    AppCatalog, AppMetadata, EventSource, ForegroundTimeSource, ForegroundUsage,
    NetworkAccountingSource, SourceError,
};
use crate::models::{AppCategory, IconHandle, TimeRange, TrafficBytes, TransportKind};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to read snapshot {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

/// An installed application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotApp {
    pub package_id: String,
    pub uid: u32,
    pub display_name: String,
    #[serde(default)]
    pub icon: IconHandle,
    #[serde(default = "default_category_code")]
    pub category_code: i32,
}

/// A span during which the package was in the foreground.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForegroundInterval {
    pub package_id: String,
    pub start_ms: i64,
    pub end_ms: i64,
}

/// A network accounting bucket for one uid and transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkBucket {
    pub uid: u32,
    pub transport: TransportKind,
    pub start_ms: i64,
    pub end_ms: i64,
    #[serde(default)]
    pub sent: u64,
    #[serde(default)]
    pub received: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityEventKind {
    Resumed,
    Paused,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub package_id: String,
    pub timestamp_ms: i64,
    pub kind: ActivityEventKind,
}

/// Raw usage data exported from a device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// When false every foreground query fails with `PermissionDenied`.
    #[serde(default = "default_true")]
    pub usage_access_granted: bool,
    #[serde(default)]
    pub apps: Vec<SnapshotApp>,
    #[serde(default)]
    pub foreground: Vec<ForegroundInterval>,
    #[serde(default)]
    pub network: Vec<NetworkBucket>,
    #[serde(default)]
    pub events: Vec<ActivityEvent>,
}

fn default_true() -> bool {
    true
}

fn default_category_code() -> i32 {
    AppCategory::UNDEFINED_ID
}

impl Default for UsageSnapshot {
    fn default() -> Self {
        Self {
            usage_access_granted: true,
            apps: Vec::new(),
            foreground: Vec::new(),
            network: Vec::new(),
            events: Vec::new(),
        }
    }
}

impl UsageSnapshot {
    pub fn from_json_str(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SnapshotError::Read {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_json_str(&contents)
    }

    fn app(&self, package_id: &str) -> Result<&SnapshotApp, SourceError> {
        self.apps
            .iter()
            .find(|app| app.package_id == package_id)
            .ok_or_else(|| SourceError::NotFound(package_id.to_string()))
    }
}

/// Length of the overlap between `[start, end)` and the range, and the
/// clipped end.
fn overlap(range: &TimeRange, start_ms: i64, end_ms: i64) -> Option<(u64, i64)> {
    let clipped_start = start_ms.max(range.start_ms);
    let clipped_end = end_ms.min(range.end_ms);
    if clipped_end > clipped_start {
        Some(((clipped_end - clipped_start) as u64, clipped_end))
    } else {
        None
    }
}

#[async_trait]
impl AppCatalog for UsageSnapshot {
    async fn uid_for(&self, package_id: &str) -> Result<u32, SourceError> {
        self.app(package_id).map(|app| app.uid)
    }

    async fn resolve(&self, package_id: &str) -> Result<AppMetadata, SourceError> {
        let app = self.app(package_id)?;
        Ok(AppMetadata {
            display_name: app.display_name.clone(),
            icon: app.icon.clone(),
            category: AppCategory::from_code(app.category_code),
        })
    }
}

#[async_trait]
impl ForegroundTimeSource for UsageSnapshot {
    async fn foreground_usage(
        &self,
        range: TimeRange,
    ) -> Result<HashMap<String, ForegroundUsage>, SourceError> {
        if !self.usage_access_granted {
            return Err(SourceError::PermissionDenied);
        }

        let mut usage: HashMap<String, ForegroundUsage> = HashMap::new();
        for interval in &self.foreground {
            let Some((millis, clipped_end)) = overlap(&range, interval.start_ms, interval.end_ms)
            else {
                continue;
            };
            let entry = usage
                .entry(interval.package_id.clone())
                .or_insert(ForegroundUsage {
                    foreground_ms: 0,
                    last_used_ms: clipped_end,
                });
            entry.foreground_ms = entry.foreground_ms.saturating_add(millis);
            entry.last_used_ms = entry.last_used_ms.max(clipped_end);
        }
        Ok(usage)
    }
}

#[async_trait]
impl NetworkAccountingSource for UsageSnapshot {
    async fn traffic(
        &self,
        uid: u32,
        range: TimeRange,
        transport: TransportKind,
    ) -> Result<TrafficBytes, SourceError> {
        Ok(self
            .network
            .iter()
            .filter(|bucket| bucket.uid == uid && bucket.transport == transport)
            .filter(|bucket| bucket.start_ms < range.end_ms && bucket.end_ms > range.start_ms)
            .fold(TrafficBytes::default(), |acc, bucket| {
                acc.saturating_add(TrafficBytes::new(bucket.sent, bucket.received))
            }))
    }
}

#[async_trait]
impl EventSource for UsageSnapshot {
    async fn launch_counts(&self, range: TimeRange) -> Result<HashMap<String, u32>, SourceError> {
        let mut counts: HashMap<String, u32> = HashMap::new();
        for event in &self.events {
            if event.kind == ActivityEventKind::Resumed && range.contains(event.timestamp_ms) {
                *counts.entry(event.package_id.clone()).or_default() += 1;
            }
        }
        Ok(counts)
    }
}
