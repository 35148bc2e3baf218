//! App usage domain models.
//!
//! Per-application usage records produced by one aggregation pass, the
//! pass-scoped running totals, and the time range a pass covers.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::services::usage_aggregation::AggregationError;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Half-open `[start_ms, end_ms)` interval in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start_ms: i64, end_ms: i64) -> Result<Self, AggregationError> {
        if start_ms > end_ms {
            return Err(AggregationError::InvalidRange {
                start: start_ms,
                end: end_ms,
            });
        }
        Ok(Self { start_ms, end_ms })
    }

    /// The `days` days ending at `now`.
    pub fn last_days(now: DateTime<Utc>, days: u32) -> Self {
        let end_ms = now.timestamp_millis();
        let start_ms = end_ms.saturating_sub(i64::from(days) * MILLIS_PER_DAY);
        Self { start_ms, end_ms }
    }

    /// A single calendar day in UTC, from midnight to the next midnight.
    pub fn for_day(date: NaiveDate) -> Self {
        let start = date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
        let end = date
            .checked_add_days(Days::new(1))
            .and_then(|next| next.and_hms_opt(0, 0, 0))
            .map(|next| next.and_utc())
            .unwrap_or(start);
        Self {
            start_ms: start.timestamp_millis(),
            end_ms: end.timestamp_millis(),
        }
    }

    pub fn contains(&self, timestamp_ms: i64) -> bool {
        timestamp_ms >= self.start_ms && timestamp_ms < self.end_ms
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms).max(0) as u64
    }
}

/// Network data path, accounted separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Wifi,
    Mobile,
}

impl TransportKind {
    pub const ALL: [TransportKind; 2] = [TransportKind::Wifi, TransportKind::Mobile];
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Wifi => write!(f, "wifi"),
            TransportKind::Mobile => write!(f, "mobile"),
        }
    }
}

/// Sent/received byte counters for one transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficBytes {
    pub sent: u64,
    pub received: u64,
}

impl TrafficBytes {
    pub fn new(sent: u64, received: u64) -> Self {
        Self { sent, received }
    }

    pub fn saturating_add(self, other: TrafficBytes) -> Self {
        Self {
            sent: self.sent.saturating_add(other.sent),
            received: self.received.saturating_add(other.received),
        }
    }
}

/// Per-application network counters across both transports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkUsage {
    pub wifi_sent: u64,
    pub wifi_received: u64,
    pub mobile_sent: u64,
    pub mobile_received: u64,
}

impl NetworkUsage {
    /// Add one transport's counters.
    pub fn add(&mut self, kind: TransportKind, bytes: TrafficBytes) {
        match kind {
            TransportKind::Wifi => {
                self.wifi_sent = self.wifi_sent.saturating_add(bytes.sent);
                self.wifi_received = self.wifi_received.saturating_add(bytes.received);
            }
            TransportKind::Mobile => {
                self.mobile_sent = self.mobile_sent.saturating_add(bytes.sent);
                self.mobile_received = self.mobile_received.saturating_add(bytes.received);
            }
        }
    }

    pub fn transport(&self, kind: TransportKind) -> TrafficBytes {
        match kind {
            TransportKind::Wifi => TrafficBytes::new(self.wifi_sent, self.wifi_received),
            TransportKind::Mobile => TrafficBytes::new(self.mobile_sent, self.mobile_received),
        }
    }

    pub fn total(&self) -> u64 {
        self.wifi_sent
            .saturating_add(self.wifi_received)
            .saturating_add(self.mobile_sent)
            .saturating_add(self.mobile_received)
    }
}

/// Platform-assigned application category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppCategory {
    pub id: i32,
    pub label: String,
}

impl AppCategory {
    pub const UNDEFINED_ID: i32 = -1;
    pub const UNDEFINED_LABEL: &'static str = "Undefined";

    /// Map a platform category code to its label. Unknown codes keep their id
    /// but are labelled "Undefined".
    pub fn from_code(code: i32) -> Self {
        let label = match code {
            0 => "Game",
            1 => "Audio",
            2 => "Video",
            3 => "Image",
            4 => "Social",
            5 => "News",
            6 => "Maps",
            7 => "Productivity",
            8 => "Accessibility",
            _ => Self::UNDEFINED_LABEL,
        };
        Self {
            id: code,
            label: label.to_string(),
        }
    }

    pub fn undefined() -> Self {
        Self::from_code(Self::UNDEFINED_ID)
    }
}

impl Default for AppCategory {
    fn default() -> Self {
        Self::undefined()
    }
}

/// Opaque image reference. Never interpreted by the aggregator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IconHandle(pub String);

/// Usage of one application within a pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Package name (e.g., com.example.app)
    pub package_id: String,
    /// Display name of the app
    pub display_name: String,
    pub icon: IconHandle,
    /// Foreground time in milliseconds, always > 0
    pub foreground_ms: u64,
    /// Share of the pass total, 0-100, truncated
    pub usage_percentage: u8,
    /// Most recent foreground activity, epoch milliseconds
    pub last_used_ms: i64,
    /// Activity-resume transitions observed in range (best effort)
    pub launch_count: u32,
    pub network: NetworkUsage,
    pub category: AppCategory,
}

impl UsageRecord {
    pub fn usage_duration(&self) -> String {
        shared::format::format_duration_breakdown(self.foreground_ms)
    }

    pub fn last_used(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.last_used_ms)
    }
}

/// Running totals for one pass. Freshly zeroed per pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateTotals {
    pub total_foreground_ms: u64,
    pub total_wifi_sent: u64,
    pub total_wifi_received: u64,
    pub total_mobile_sent: u64,
    pub total_mobile_received: u64,
}

impl AggregateTotals {
    pub fn add_network(&mut self, kind: TransportKind, bytes: TrafficBytes) {
        match kind {
            TransportKind::Wifi => {
                self.total_wifi_sent = self.total_wifi_sent.saturating_add(bytes.sent);
                self.total_wifi_received = self.total_wifi_received.saturating_add(bytes.received);
            }
            TransportKind::Mobile => {
                self.total_mobile_sent = self.total_mobile_sent.saturating_add(bytes.sent);
                self.total_mobile_received =
                    self.total_mobile_received.saturating_add(bytes.received);
            }
        }
    }

    pub fn total_network(&self) -> u64 {
        self.total_wifi_sent
            .saturating_add(self.total_wifi_received)
            .saturating_add(self.total_mobile_sent)
            .saturating_add(self.total_mobile_received)
    }
}

/// Whether the foreground source could be queried at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DataAvailability {
    Available,
    /// Usage access is missing or the source failed; the caller should prompt
    /// the user to grant the permission.
    Unavailable { reason: String },
}

/// Output of one aggregation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    pub range: TimeRange,
    pub records: Vec<UsageRecord>,
    pub totals: AggregateTotals,
    pub availability: DataAvailability,
    /// Packages dropped because they could not be resolved
    pub skipped_packages: u32,
    pub generated_at: DateTime<Utc>,
}

impl UsageReport {
    pub fn empty(range: TimeRange) -> Self {
        Self {
            range,
            records: Vec::new(),
            totals: AggregateTotals::default(),
            availability: DataAvailability::Available,
            skipped_packages: 0,
            generated_at: Utc::now(),
        }
    }

    pub fn unavailable(range: TimeRange, reason: impl Into<String>) -> Self {
        Self {
            availability: DataAvailability::Unavailable {
                reason: reason.into(),
            },
            ..Self::empty(range)
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.availability, DataAvailability::Available)
    }
}
