//! Domain models for App Usage.

pub mod app_usage;
pub mod blocked_app;

pub use app_usage::{
    AggregateTotals, AppCategory, DataAvailability, IconHandle, NetworkUsage, TimeRange,
    TrafficBytes, TransportKind, UsageRecord, UsageReport,
};
pub use blocked_app::{BlockedApps, BlockedAppsError, ToggleOutcome};
