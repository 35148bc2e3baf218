//! Usage aggregation pass.
//!
//! Joins foreground time with catalog metadata, network counters and launch
//! counts into a ranked list of [`UsageRecord`]s plus pass totals.
//!
//! Failure policy:
//! - an invalid range is rejected before any source is queried
//! - a failing foreground source yields an empty, unavailable report
//! - every per-package failure is logged and absorbed

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::usage_sources::{ForegroundUsage, SourceError, UsageSources};
use crate::models::{
    AggregateTotals, DataAvailability, NetworkUsage, TimeRange, TransportKind, UsageRecord,
    UsageReport,
};

/// Default per-call timeout for source queries.
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("Invalid time range: start ({start}) is after end ({end})")]
    InvalidRange { start: i64, end: i64 },

    #[error("Foreground usage source unavailable: {0}")]
    SourceUnavailable(#[source] SourceError),

    #[error("Failed to resolve package '{package_id}': {source}")]
    PackageResolutionFailed {
        package_id: String,
        #[source]
        source: SourceError,
    },

    #[error("Network query failed for '{package_id}' over {transport}: {source}")]
    NetworkQueryFailed {
        package_id: String,
        transport: TransportKind,
        #[source]
        source: SourceError,
    },
}

/// Which packages contribute to the pass network totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkAttribution {
    /// Every package whose traffic was queried, including packages later
    /// dropped because catalog resolution failed.
    #[default]
    AllQueried,
    /// Only packages that produced a record.
    ResolvedOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorConfig {
    pub source_timeout: Duration,
    pub network_attribution: NetworkAttribution,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
            network_attribution: NetworkAttribution::default(),
        }
    }
}

/// Stateless between passes; every call builds its own totals.
#[derive(Debug, Clone, Default)]
pub struct UsageAggregator {
    config: AggregatorConfig,
}

impl UsageAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Run one pass over `range`.
    ///
    /// Only `InvalidRange` is returned as an error. An unreachable foreground
    /// source produces `Ok` with [`DataAvailability::Unavailable`].
    pub async fn aggregate(
        &self,
        range: TimeRange,
        sources: UsageSources<'_>,
    ) -> Result<UsageReport, AggregationError> {
        if range.start_ms > range.end_ms {
            return Err(AggregationError::InvalidRange {
                start: range.start_ms,
                end: range.end_ms,
            });
        }

        let started = Instant::now();

        let foreground = match self
            .call(sources.foreground.foreground_usage(range))
            .await
        {
            Ok(usage) => usage,
            Err(source) => {
                let err = AggregationError::SourceUnavailable(source);
                warn!(
                    start_ms = range.start_ms,
                    end_ms = range.end_ms,
                    error = %err,
                    "Usage data unavailable"
                );
                return Ok(UsageReport::unavailable(range, err.to_string()));
            }
        };

        let mut retained: Vec<(String, ForegroundUsage)> = foreground
            .into_iter()
            .filter(|(_, usage)| usage.foreground_ms > 0)
            .collect();

        if retained.is_empty() {
            info!(
                start_ms = range.start_ms,
                end_ms = range.end_ms,
                "No foreground usage recorded in range"
            );
            return Ok(UsageReport::empty(range));
        }

        // Exact sum; the reported total saturates but percentages never do.
        let exact_total_ms: u128 = retained
            .iter()
            .map(|(_, usage)| u128::from(usage.foreground_ms))
            .sum();
        let total_foreground_ms = u64::try_from(exact_total_ms).unwrap_or(u64::MAX);

        let launch_counts: HashMap<String, u32> =
            match self.call(sources.events.launch_counts(range)).await {
                Ok(counts) => counts,
                Err(err) => {
                    warn!(error = %err, "Launch counts unavailable, defaulting to zero");
                    HashMap::new()
                }
            };

        retained.sort_by(|(a_id, a), (b_id, b)| {
            b.foreground_ms
                .cmp(&a.foreground_ms)
                .then_with(|| a_id.cmp(b_id))
        });

        let mut totals = AggregateTotals {
            total_foreground_ms,
            ..AggregateTotals::default()
        };
        let mut records = Vec::with_capacity(retained.len());
        let mut skipped_packages = 0u32;

        for (package_id, usage) in retained {
            let uid_result = self.call(sources.catalog.uid_for(&package_id)).await;
            let uid = match uid_result {
                Ok(uid) => uid,
                Err(source) => {
                    log_skipped(AggregationError::PackageResolutionFailed {
                        package_id,
                        source,
                    });
                    skipped_packages += 1;
                    continue;
                }
            };

            let network = self.query_network(&package_id, uid, range, &sources).await;
            if self.config.network_attribution == NetworkAttribution::AllQueried {
                add_network_totals(&mut totals, &network);
            }

            let resolved = self.call(sources.catalog.resolve(&package_id)).await;
            let metadata = match resolved {
                Ok(metadata) => metadata,
                Err(source) => {
                    log_skipped(AggregationError::PackageResolutionFailed {
                        package_id,
                        source,
                    });
                    skipped_packages += 1;
                    continue;
                }
            };

            if self.config.network_attribution == NetworkAttribution::ResolvedOnly {
                add_network_totals(&mut totals, &network);
            }

            let launch_count = launch_counts.get(&package_id).copied().unwrap_or(0);

            records.push(UsageRecord {
                usage_percentage: usage_percentage(usage.foreground_ms, exact_total_ms),
                package_id,
                display_name: metadata.display_name,
                icon: metadata.icon,
                foreground_ms: usage.foreground_ms,
                last_used_ms: usage.last_used_ms,
                launch_count,
                network,
                category: metadata.category,
            });
        }

        info!(
            start_ms = range.start_ms,
            end_ms = range.end_ms,
            records = records.len(),
            skipped = skipped_packages,
            total_foreground_ms = totals.total_foreground_ms,
            total_network_bytes = totals.total_network(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Aggregation pass completed"
        );

        Ok(UsageReport {
            range,
            records,
            totals,
            availability: DataAvailability::Available,
            skipped_packages,
            generated_at: Utc::now(),
        })
    }

    /// One call per transport; a failed transport counts as zero.
    async fn query_network(
        &self,
        package_id: &str,
        uid: u32,
        range: TimeRange,
        sources: &UsageSources<'_>,
    ) -> NetworkUsage {
        let mut network = NetworkUsage::default();
        for transport in TransportKind::ALL {
            match self
                .call(sources.network.traffic(uid, range, transport))
                .await
            {
                Ok(bytes) => network.add(transport, bytes),
                Err(source) => {
                    let err = AggregationError::NetworkQueryFailed {
                        package_id: package_id.to_string(),
                        transport,
                        source,
                    };
                    warn!(uid = uid, error = %err, "Network accounting failed, counting zero");
                }
            }
        }
        network
    }

    async fn call<T, F>(&self, fut: F) -> Result<T, SourceError>
    where
        F: Future<Output = Result<T, SourceError>>,
    {
        match tokio::time::timeout(self.config.source_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(
                self.config.source_timeout.as_millis() as u64,
            )),
        }
    }
}

/// `foreground_ms * 100 / total`, truncated. Zero when `total` is zero.
pub fn usage_percentage(foreground_ms: u64, total_foreground_ms: u128) -> u8 {
    if total_foreground_ms == 0 {
        return 0;
    }
    let pct = u128::from(foreground_ms) * 100 / total_foreground_ms;
    pct.min(100) as u8
}

fn add_network_totals(totals: &mut AggregateTotals, network: &NetworkUsage) {
    for transport in TransportKind::ALL {
        totals.add_network(transport, network.transport(transport));
    }
}

fn log_skipped(err: AggregationError) {
    match &err {
        AggregationError::PackageResolutionFailed {
            source: SourceError::NotFound(_),
            ..
        } => debug!(error = %err, "Skipping uninstalled package"),
        _ => warn!(error = %err, "Skipping package"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppCategory, IconHandle, TrafficBytes};
    use crate::services::usage_sources::{
        AppCatalog, AppMetadata, EventSource, ForegroundTimeSource, NetworkAccountingSource,
    };
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Test double with per-capability failure switches.
    #[derive(Default)]
    struct FakeSources {
        foreground: HashMap<String, ForegroundUsage>,
        foreground_error: Option<SourceError>,
        /// uid == index in this list + 10_000
        installed: Vec<String>,
        unresolvable: HashSet<String>,
        traffic: HashMap<(u32, TransportKind), TrafficBytes>,
        failing_traffic: HashSet<(u32, TransportKind)>,
        slow_traffic: Option<Duration>,
        slow_foreground: Option<Duration>,
        launches: HashMap<String, u32>,
        events_fail: bool,
        slow_events: Option<Duration>,
        calls: AtomicUsize,
    }

    impl FakeSources {
        fn with_usage(entries: &[(&str, u64)]) -> Self {
            let mut fake = Self::default();
            for (i, (package, millis)) in entries.iter().enumerate() {
                fake.foreground.insert(
                    package.to_string(),
                    ForegroundUsage {
                        foreground_ms: *millis,
                        last_used_ms: 1_000 + i as i64,
                    },
                );
                fake.installed.push(package.to_string());
            }
            fake
        }

        fn uid(&self, package: &str) -> u32 {
            let index = self.installed.iter().position(|p| p == package).unwrap();
            10_000 + index as u32
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AppCatalog for FakeSources {
        async fn uid_for(&self, package_id: &str) -> Result<u32, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.installed
                .iter()
                .position(|p| p == package_id)
                .map(|index| 10_000 + index as u32)
                .ok_or_else(|| SourceError::NotFound(package_id.to_string()))
        }

        async fn resolve(&self, package_id: &str) -> Result<AppMetadata, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.unresolvable.contains(package_id) {
                return Err(SourceError::NotFound(package_id.to_string()));
            }
            Ok(AppMetadata {
                display_name: package_id.to_uppercase(),
                icon: IconHandle(format!("icon://{}", package_id)),
                category: AppCategory::from_code(7),
            })
        }
    }

    #[async_trait]
    impl ForegroundTimeSource for FakeSources {
        async fn foreground_usage(
            &self,
            _range: TimeRange,
        ) -> Result<HashMap<String, ForegroundUsage>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.slow_foreground {
                tokio::time::sleep(delay).await;
            }
            match &self.foreground_error {
                Some(err) => Err(err.clone()),
                None => Ok(self.foreground.clone()),
            }
        }
    }

    #[async_trait]
    impl NetworkAccountingSource for FakeSources {
        async fn traffic(
            &self,
            uid: u32,
            _range: TimeRange,
            transport: TransportKind,
        ) -> Result<TrafficBytes, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.slow_traffic {
                tokio::time::sleep(delay).await;
            }
            if self.failing_traffic.contains(&(uid, transport)) {
                return Err(SourceError::Unavailable("netstats".to_string()));
            }
            Ok(self
                .traffic
                .get(&(uid, transport))
                .copied()
                .unwrap_or_default())
        }
    }

    #[async_trait]
    impl EventSource for FakeSources {
        async fn launch_counts(
            &self,
            _range: TimeRange,
        ) -> Result<HashMap<String, u32>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.slow_events {
                tokio::time::sleep(delay).await;
            }
            if self.events_fail {
                return Err(SourceError::Unavailable("event log".to_string()));
            }
            Ok(self.launches.clone())
        }
    }

    fn range() -> TimeRange {
        TimeRange::new(0, 86_400_000).unwrap()
    }

    async fn run(fake: &FakeSources) -> UsageReport {
        UsageAggregator::default()
            .aggregate(range(), UsageSources::from_provider(fake))
            .await
            .unwrap()
    }

    fn ids(report: &UsageReport) -> Vec<&str> {
        report
            .records
            .iter()
            .map(|r| r.package_id.as_str())
            .collect()
    }

    #[tokio::test]
    async fn test_orders_by_duration_and_computes_percentages() {
        let fake = FakeSources::with_usage(&[
            ("com.c", 1_800_000),
            ("com.a", 3_600_000),
            ("com.b", 1_800_000),
        ]);
        let report = run(&fake).await;

        assert!(report.is_available());
        assert_eq!(report.totals.total_foreground_ms, 7_200_000);
        assert_eq!(ids(&report), vec!["com.a", "com.b", "com.c"]);
        let percentages: Vec<u8> = report.records.iter().map(|r| r.usage_percentage).collect();
        assert_eq!(percentages, vec![50, 25, 25]);
    }

    #[tokio::test]
    async fn test_record_fields_joined_from_sources() {
        let mut fake = FakeSources::with_usage(&[("com.mail", 60_000)]);
        let uid = fake.uid("com.mail");
        fake.traffic
            .insert((uid, TransportKind::Wifi), TrafficBytes::new(10, 20));
        fake.traffic
            .insert((uid, TransportKind::Mobile), TrafficBytes::new(3, 4));
        fake.launches.insert("com.mail".to_string(), 6);

        let report = run(&fake).await;
        let record = &report.records[0];

        assert_eq!(record.display_name, "COM.MAIL");
        assert_eq!(record.icon, IconHandle("icon://com.mail".to_string()));
        assert_eq!(record.category.label, "Productivity");
        assert_eq!(record.usage_percentage, 100);
        assert_eq!(record.last_used_ms, 1_000);
        assert_eq!(record.launch_count, 6);
        assert_eq!(
            record.network,
            NetworkUsage {
                wifi_sent: 10,
                wifi_received: 20,
                mobile_sent: 3,
                mobile_received: 4,
            }
        );
        assert_eq!(report.totals.total_wifi_sent, 10);
        assert_eq!(report.totals.total_mobile_received, 4);
    }

    #[tokio::test]
    async fn test_percentages_never_exceed_one_hundred() {
        let fake = FakeSources::with_usage(&[("com.a", 1), ("com.b", 1), ("com.c", 1)]);
        let report = run(&fake).await;

        let sum: u32 = report
            .records
            .iter()
            .map(|r| u32::from(r.usage_percentage))
            .sum();
        assert_eq!(sum, 99);
    }

    #[tokio::test]
    async fn test_zero_duration_entries_dropped() {
        let fake = FakeSources::with_usage(&[("com.a", 500), ("com.idle", 0)]);
        let report = run(&fake).await;

        assert_eq!(ids(&report), vec!["com.a"]);
        assert!(report.records.iter().all(|r| r.foreground_ms > 0));
        assert_eq!(report.totals.total_foreground_ms, 500);
    }

    #[tokio::test]
    async fn test_no_usage_is_available_and_empty() {
        let fake = FakeSources::default();
        let report = run(&fake).await;

        assert!(report.is_available());
        assert!(report.records.is_empty());
        assert_eq!(report.totals, AggregateTotals::default());
    }

    #[tokio::test]
    async fn test_foreground_failure_marks_unavailable() {
        let mut fake = FakeSources::with_usage(&[("com.a", 500)]);
        fake.foreground_error = Some(SourceError::PermissionDenied);
        let report = run(&fake).await;

        assert!(!report.is_available());
        assert!(report.records.is_empty());
        assert_eq!(report.totals, AggregateTotals::default());
        match report.availability {
            DataAvailability::Unavailable { reason } => {
                assert!(reason.contains("permission"));
            }
            DataAvailability::Available => panic!("expected unavailable"),
        }
    }

    #[tokio::test]
    async fn test_unresolved_package_still_counts_network_totals() {
        let mut fake = FakeSources::with_usage(&[("com.a", 2_000), ("com.gone", 1_000)]);
        let uid = fake.uid("com.gone");
        fake.traffic
            .insert((uid, TransportKind::Wifi), TrafficBytes::new(700, 800));
        fake.unresolvable.insert("com.gone".to_string());

        let report = run(&fake).await;

        assert_eq!(ids(&report), vec!["com.a"]);
        assert_eq!(report.skipped_packages, 1);
        assert_eq!(report.totals.total_wifi_sent, 700);
        assert_eq!(report.totals.total_wifi_received, 800);
        // Percentages stay relative to every retained package.
        assert_eq!(report.records[0].usage_percentage, 66);
    }

    #[tokio::test]
    async fn test_resolved_only_attribution_excludes_skipped_packages() {
        let mut fake = FakeSources::with_usage(&[("com.a", 2_000), ("com.gone", 1_000)]);
        let uid_a = fake.uid("com.a");
        let uid_gone = fake.uid("com.gone");
        fake.traffic
            .insert((uid_a, TransportKind::Mobile), TrafficBytes::new(5, 6));
        fake.traffic
            .insert((uid_gone, TransportKind::Wifi), TrafficBytes::new(700, 800));
        fake.unresolvable.insert("com.gone".to_string());

        let aggregator = UsageAggregator::new(AggregatorConfig {
            network_attribution: NetworkAttribution::ResolvedOnly,
            ..AggregatorConfig::default()
        });
        let report = aggregator
            .aggregate(range(), UsageSources::from_provider(&fake))
            .await
            .unwrap();

        assert_eq!(report.totals.total_wifi_sent, 0);
        assert_eq!(report.totals.total_mobile_sent, 5);
        assert_eq!(report.totals.total_mobile_received, 6);
    }

    #[tokio::test]
    async fn test_package_without_uid_skipped_without_network_query() {
        let mut fake = FakeSources::with_usage(&[("com.a", 2_000)]);
        fake.foreground.insert(
            "com.uninstalled".to_string(),
            ForegroundUsage {
                foreground_ms: 9_000,
                last_used_ms: 5,
            },
        );

        let report = run(&fake).await;

        assert_eq!(ids(&report), vec!["com.a"]);
        assert_eq!(report.skipped_packages, 1);
        // foreground + events + (uid) for uninstalled + (uid, 2 traffic, resolve) for com.a
        assert_eq!(fake.calls(), 7);
    }

    #[tokio::test]
    async fn test_network_failure_zeroes_only_that_transport() {
        let mut fake = FakeSources::with_usage(&[("com.a", 2_000)]);
        let uid = fake.uid("com.a");
        fake.traffic
            .insert((uid, TransportKind::Wifi), TrafficBytes::new(10, 10));
        fake.traffic
            .insert((uid, TransportKind::Mobile), TrafficBytes::new(20, 20));
        fake.failing_traffic.insert((uid, TransportKind::Wifi));

        let report = run(&fake).await;
        let network = report.records[0].network;

        assert_eq!(network.transport(TransportKind::Wifi), TrafficBytes::default());
        assert_eq!(
            network.transport(TransportKind::Mobile),
            TrafficBytes::new(20, 20)
        );
        assert_eq!(report.totals.total_network(), 40);
    }

    #[tokio::test]
    async fn test_event_failure_defaults_launch_counts() {
        let mut fake = FakeSources::with_usage(&[("com.a", 2_000)]);
        fake.launches.insert("com.a".to_string(), 4);
        fake.events_fail = true;

        let report = run(&fake).await;

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].launch_count, 0);
    }

    #[tokio::test]
    async fn test_invalid_range_rejected_before_any_call() {
        let fake = FakeSources::with_usage(&[("com.a", 2_000)]);
        let inverted = TimeRange {
            start_ms: 1000,
            end_ms: 500,
        };

        let err = UsageAggregator::default()
            .aggregate(inverted, UsageSources::from_provider(&fake))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AggregationError::InvalidRange {
                start: 1000,
                end: 500
            }
        ));
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn test_slow_network_call_times_out_as_zero() {
        let mut fake = FakeSources::with_usage(&[("com.a", 2_000)]);
        let uid = fake.uid("com.a");
        fake.traffic
            .insert((uid, TransportKind::Wifi), TrafficBytes::new(10, 10));
        fake.slow_traffic = Some(Duration::from_millis(500));

        let aggregator = UsageAggregator::new(AggregatorConfig {
            source_timeout: Duration::from_millis(20),
            ..AggregatorConfig::default()
        });
        let report = aggregator
            .aggregate(range(), UsageSources::from_provider(&fake))
            .await
            .unwrap();

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].network, NetworkUsage::default());
        assert_eq!(report.totals.total_network(), 0);
    }

    fn impatient() -> UsageAggregator {
        UsageAggregator::new(AggregatorConfig {
            source_timeout: Duration::from_millis(20),
            ..AggregatorConfig::default()
        })
    }

    #[tokio::test]
    async fn test_slow_foreground_source_marks_unavailable() {
        let mut fake = FakeSources::with_usage(&[("com.a", 2_000)]);
        fake.slow_foreground = Some(Duration::from_millis(300));

        let report = impatient()
            .aggregate(range(), UsageSources::from_provider(&fake))
            .await
            .unwrap();

        assert!(!report.is_available());
        assert!(report.records.is_empty());
        assert_eq!(report.totals, AggregateTotals::default());
        match report.availability {
            DataAvailability::Unavailable { reason } => {
                assert!(reason.contains("timed out after 20 ms"));
            }
            DataAvailability::Available => panic!("expected unavailable"),
        }
        // Nothing else is queried once the foreground source fails
        assert_eq!(fake.calls(), 1);
    }

    #[tokio::test]
    async fn test_slow_event_source_defaults_launch_counts() {
        let mut fake = FakeSources::with_usage(&[("com.a", 2_000), ("com.b", 1_000)]);
        fake.launches.insert("com.a".to_string(), 4);
        fake.slow_events = Some(Duration::from_millis(300));

        let report = impatient()
            .aggregate(range(), UsageSources::from_provider(&fake))
            .await
            .unwrap();

        assert!(report.is_available());
        assert_eq!(ids(&report), vec!["com.a", "com.b"]);
        assert!(report.records.iter().all(|r| r.launch_count == 0));
        assert_eq!(report.totals.total_foreground_ms, 3_000);
    }

    #[tokio::test]
    async fn test_huge_durations_keep_percentages_within_bounds() {
        let near_max = u64::MAX / 2;
        let fake =
            FakeSources::with_usage(&[("com.a", near_max), ("com.b", near_max), ("com.c", near_max)]);
        let report = run(&fake).await;

        let percentages: Vec<u8> = report.records.iter().map(|r| r.usage_percentage).collect();
        assert_eq!(percentages, vec![33, 33, 33]);
        assert!(percentages.iter().map(|p| u32::from(*p)).sum::<u32>() <= 100);
        assert_eq!(report.totals.total_foreground_ms, u64::MAX);
    }

    #[tokio::test]
    async fn test_totals_are_fresh_per_pass() {
        let mut fake = FakeSources::with_usage(&[("com.a", 2_000)]);
        let uid = fake.uid("com.a");
        fake.traffic
            .insert((uid, TransportKind::Wifi), TrafficBytes::new(10, 10));

        let aggregator = UsageAggregator::default();
        let first = aggregator
            .aggregate(range(), UsageSources::from_provider(&fake))
            .await
            .unwrap();
        let second = aggregator
            .aggregate(range(), UsageSources::from_provider(&fake))
            .await
            .unwrap();

        assert_eq!(first.totals, second.totals);
        assert_eq!(first.records, second.records);
        assert_eq!(second.totals.total_wifi_sent, 10);
    }

    #[test]
    fn test_usage_percentage_truncates() {
        assert_eq!(usage_percentage(1, 3), 33);
        assert_eq!(usage_percentage(2, 3), 66);
        assert_eq!(usage_percentage(3, 3), 100);
        assert_eq!(usage_percentage(5, 0), 0);
        assert_eq!(usage_percentage(u64::MAX, u128::from(u64::MAX)), 100);
    }

    #[test]
    fn test_aggregation_error_display() {
        let err = AggregationError::InvalidRange {
            start: 1000,
            end: 500,
        };
        assert_eq!(
            err.to_string(),
            "Invalid time range: start (1000) is after end (500)"
        );

        let err = AggregationError::NetworkQueryFailed {
            package_id: "com.a".to_string(),
            transport: TransportKind::Mobile,
            source: SourceError::Timeout(20),
        };
        assert!(err.to_string().contains("over mobile"));
    }
}
