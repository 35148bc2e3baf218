//! Domain services for App Usage.
//!
//! Services contain business logic that operates on domain models.

pub mod category_breakdown;
pub mod usage_aggregation;
pub mod usage_refresh;
pub mod usage_snapshot;
pub mod usage_sources;

pub use category_breakdown::{category_breakdown, records_in_categories, CategoryUsageItem};

pub use usage_aggregation::{
    usage_percentage, AggregationError, AggregatorConfig, NetworkAttribution, UsageAggregator,
    DEFAULT_SOURCE_TIMEOUT,
};

pub use usage_refresh::{RefreshError, UsageRefresher};

pub use usage_snapshot::{SnapshotError, UsageSnapshot};

pub use usage_sources::{
    AppCatalog, AppMetadata, EventSource, ForegroundTimeSource, ForegroundUsage,
    NetworkAccountingSource, SourceError, UsageSources,
};
