//! Where the server gets its usage data.
//!
//! A file-backed source re-reads the snapshot on every load so each pass
//! pulls fresh inputs. A static source serves a fixed snapshot.

use std::path::PathBuf;
use std::sync::Arc;

use domain::services::{SnapshotError, UsageSnapshot};
use tracing::debug;

#[derive(Debug, Clone)]
pub enum SnapshotSource {
    File(PathBuf),
    Static(Arc<UsageSnapshot>),
}

impl SnapshotSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        SnapshotSource::File(path.into())
    }

    pub fn fixed(snapshot: UsageSnapshot) -> Self {
        SnapshotSource::Static(Arc::new(snapshot))
    }

    pub async fn load(&self) -> Result<Arc<UsageSnapshot>, SnapshotError> {
        match self {
            SnapshotSource::File(path) => {
                let snapshot = UsageSnapshot::from_file(path).await?;
                debug!(
                    path = %path.display(),
                    apps = snapshot.apps.len(),
                    intervals = snapshot.foreground.len(),
                    "Loaded usage snapshot"
                );
                Ok(Arc::new(snapshot))
            }
            SnapshotSource::Static(snapshot) => Ok(snapshot.clone()),
        }
    }

    /// Human-readable origin for health output.
    pub fn describe(&self) -> String {
        match self {
            SnapshotSource::File(path) => path.display().to_string(),
            SnapshotSource::Static(_) => "static".to_string(),
        }
    }
}
