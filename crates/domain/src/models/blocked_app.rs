//! Blocked application list.
//!
//! Packages the user excluded from the usage view. Exclusion only filters
//! what is shown; it never changes the totals of a pass.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::app_usage::UsageRecord;

#[derive(Debug, Error)]
pub enum BlockedAppsError {
    #[error("Invalid package identifier '{package_id}': {message}")]
    InvalidPackageId { package_id: String, message: String },
}

/// Result of toggling a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Blocked,
    Unblocked,
}

/// Set of blocked package identifiers, kept sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockedApps {
    packages: BTreeSet<String>,
}

impl BlockedApps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block the package if it is not blocked, otherwise unblock it.
    pub fn toggle(&mut self, package_id: &str) -> Result<ToggleOutcome, BlockedAppsError> {
        check_package_id(package_id)?;
        if self.packages.remove(package_id) {
            Ok(ToggleOutcome::Unblocked)
        } else {
            self.packages.insert(package_id.to_string());
            Ok(ToggleOutcome::Blocked)
        }
    }

    /// Returns `true` if the package was newly blocked.
    pub fn block(&mut self, package_id: &str) -> Result<bool, BlockedAppsError> {
        check_package_id(package_id)?;
        Ok(self.packages.insert(package_id.to_string()))
    }

    /// Returns `true` if the package was blocked before.
    pub fn unblock(&mut self, package_id: &str) -> bool {
        self.packages.remove(package_id)
    }

    pub fn is_blocked(&self, package_id: &str) -> bool {
        self.packages.contains(package_id)
    }

    pub fn list(&self) -> Vec<String> {
        self.packages.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Drop records of blocked packages, preserving order.
    pub fn filter_records(&self, records: &[UsageRecord]) -> Vec<UsageRecord> {
        records
            .iter()
            .filter(|record| !self.is_blocked(&record.package_id))
            .cloned()
            .collect()
    }
}

fn check_package_id(package_id: &str) -> Result<(), BlockedAppsError> {
    shared::validation::validate_package_id(package_id).map_err(|err| {
        BlockedAppsError::InvalidPackageId {
            package_id: package_id.to_string(),
            message: err
                .message
                .map(|m| m.to_string())
                .unwrap_or_else(|| err.code.to_string()),
        }
    })
}
