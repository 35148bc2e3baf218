//! App usage route handlers.
//!
//! Every request for a range runs one aggregation pass through the shared
//! refresher, so the latest completed pass is also what `/latest` serves.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::{record_aggregation_pass, PassOutcome};
use domain::models::{
    AggregateTotals, AppCategory, BlockedApps, IconHandle, TimeRange, TransportKind, UsageRecord,
    UsageReport,
};
use domain::services::{
    category_breakdown, records_in_categories, CategoryUsageItem, RefreshError, UsageSources,
};
use shared::format::{format_bytes, format_duration_breakdown};
use shared::validation::{validate_range_days, validate_time_range};

/// Prompt shown when the usage-access permission is missing.
pub const USAGE_ACCESS_PROMPT: &str = "Apps Usage May Not Be Enabled. Please Enable It";

/// Query parameters for `GET /api/v1/app-usage`.
///
/// Range precedence: `from`/`to`, then `date`, then `days`, then the
/// configured default number of days.
#[derive(Debug, Default, Deserialize)]
pub struct AppUsageQuery {
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub date: Option<NaiveDate>,
    pub days: Option<u32>,
    #[serde(default)]
    pub exclude_blocked: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct LatestQuery {
    #[serde(default)]
    pub exclude_blocked: bool,
}

/// Query parameters for `GET /api/v1/app-usage/categories`.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub date: Option<NaiveDate>,
    pub days: Option<u32>,
    /// Comma-separated category labels; empty keeps every category
    pub categories: Option<String>,
    #[serde(default)]
    pub exclude_blocked: bool,
}

#[derive(Debug, Serialize)]
pub struct UsagePeriod {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl From<TimeRange> for UsagePeriod {
    fn from(range: TimeRange) -> Self {
        Self {
            start_ms: range.start_ms,
            end_ms: range.end_ms,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TrafficView {
    pub sent: u64,
    pub received: u64,
    pub sent_formatted: String,
    pub received_formatted: String,
}

impl TrafficView {
    fn new(sent: u64, received: u64) -> Self {
        Self {
            sent,
            received,
            sent_formatted: format_bytes(sent),
            received_formatted: format_bytes(received),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TotalsView {
    pub foreground_ms: u64,
    pub usage_duration: String,
    pub wifi: TrafficView,
    pub mobile: TrafficView,
    pub total_network: u64,
    pub total_network_formatted: String,
}

impl From<&AggregateTotals> for TotalsView {
    fn from(totals: &AggregateTotals) -> Self {
        Self {
            foreground_ms: totals.total_foreground_ms,
            usage_duration: format_duration_breakdown(totals.total_foreground_ms),
            wifi: TrafficView::new(totals.total_wifi_sent, totals.total_wifi_received),
            mobile: TrafficView::new(totals.total_mobile_sent, totals.total_mobile_received),
            total_network: totals.total_network(),
            total_network_formatted: format_bytes(totals.total_network()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AppUsageView {
    pub package_id: String,
    pub display_name: String,
    pub icon: IconHandle,
    pub category: AppCategory,
    pub foreground_ms: u64,
    pub usage_duration: String,
    pub usage_percentage: u8,
    pub last_used_ms: i64,
    /// RFC 3339, absent if the timestamp is out of range
    pub last_used: Option<String>,
    pub launch_count: u32,
    pub wifi: TrafficView,
    pub mobile: TrafficView,
    pub network_total: u64,
    pub network_total_formatted: String,
    pub blocked: bool,
}

impl AppUsageView {
    fn new(record: &UsageRecord, blocked: &BlockedApps) -> Self {
        let wifi = record.network.transport(TransportKind::Wifi);
        let mobile = record.network.transport(TransportKind::Mobile);
        Self {
            package_id: record.package_id.clone(),
            display_name: record.display_name.clone(),
            icon: record.icon.clone(),
            category: record.category.clone(),
            foreground_ms: record.foreground_ms,
            usage_duration: record.usage_duration(),
            usage_percentage: record.usage_percentage,
            last_used_ms: record.last_used_ms,
            last_used: record.last_used().map(|at| at.to_rfc3339()),
            launch_count: record.launch_count,
            wifi: TrafficView::new(wifi.sent, wifi.received),
            mobile: TrafficView::new(mobile.sent, mobile.received),
            network_total: record.network.total(),
            network_total_formatted: format_bytes(record.network.total()),
            blocked: blocked.is_blocked(&record.package_id),
        }
    }
}

/// Response body for a usage report.
#[derive(Debug, Serialize)]
pub struct AppUsageResponse {
    pub data_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub period: UsagePeriod,
    pub totals: TotalsView,
    pub apps: Vec<AppUsageView>,
    pub skipped_packages: u32,
    pub generated_at: DateTime<Utc>,
}

impl AppUsageResponse {
    /// Build the view of a report. Totals always cover the whole pass, even
    /// when blocked apps are hidden from the list.
    pub fn from_report(report: &UsageReport, blocked: &BlockedApps, exclude_blocked: bool) -> Self {
        let apps = visible_records(&report.records, blocked, exclude_blocked)
            .into_iter()
            .map(|record| AppUsageView::new(record, blocked))
            .collect();

        Self {
            data_available: report.is_available(),
            message: (!report.is_available()).then(|| USAGE_ACCESS_PROMPT.to_string()),
            period: report.range.into(),
            totals: (&report.totals).into(),
            apps,
            skipped_packages: report.skipped_packages,
            generated_at: report.generated_at,
        }
    }
}

/// Response body for the per-category breakdown.
#[derive(Debug, Serialize)]
pub struct CategoryBreakdownResponse {
    pub data_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub period: UsagePeriod,
    pub categories: Vec<CategoryUsageItem>,
    pub apps: Vec<AppUsageView>,
}

fn visible_records<'a>(
    records: &'a [UsageRecord],
    blocked: &BlockedApps,
    exclude_blocked: bool,
) -> Vec<&'a UsageRecord> {
    records
        .iter()
        .filter(|record| !exclude_blocked || !blocked.is_blocked(&record.package_id))
        .collect()
}

/// Pick the pass range from request parameters.
pub fn resolve_range(
    from: Option<i64>,
    to: Option<i64>,
    date: Option<NaiveDate>,
    days: Option<u32>,
    default_days: u32,
    now: DateTime<Utc>,
) -> Result<TimeRange, ApiError> {
    match (from, to) {
        (Some(from), Some(to)) => {
            validate_time_range(from, to)?;
            Ok(TimeRange::new(from, to)?)
        }
        (Some(_), None) | (None, Some(_)) => Err(ApiError::Validation(
            "Both from and to must be provided".to_string(),
        )),
        (None, None) => {
            if let Some(date) = date {
                return Ok(TimeRange::for_day(date));
            }
            let days = days.unwrap_or(default_days);
            validate_range_days(days)?;
            Ok(TimeRange::last_days(now, days))
        }
    }
}

/// Split a comma-separated category list into labels.
pub fn parse_categories(raw: Option<&str>) -> HashSet<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Run one pass over the current snapshot and record its outcome.
async fn run_pass(state: &AppState, range: TimeRange) -> Result<Arc<UsageReport>, ApiError> {
    let snapshot = state.snapshots.load().await?;
    let started = Instant::now();
    let result = state
        .refresher
        .refresh(range, UsageSources::from_provider(snapshot.as_ref()))
        .await;
    let elapsed = started.elapsed().as_secs_f64();

    match result {
        Ok(report) => {
            let outcome = if report.is_available() {
                PassOutcome::Available
            } else {
                PassOutcome::Unavailable
            };
            record_aggregation_pass(outcome, report.skipped_packages, elapsed);
            Ok(report)
        }
        Err(err) => {
            let outcome = match err {
                RefreshError::Superseded { .. } => PassOutcome::Superseded,
                RefreshError::Aggregation(_) => PassOutcome::Rejected,
            };
            record_aggregation_pass(outcome, 0, elapsed);
            Err(err.into())
        }
    }
}

/// Aggregate usage for a range.
///
/// GET /api/v1/app-usage
pub async fn get_app_usage(
    State(state): State<AppState>,
    Query(query): Query<AppUsageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let range = resolve_range(
        query.from,
        query.to,
        query.date,
        query.days,
        state.config.aggregation.default_range_days,
        Utc::now(),
    )?;

    let report = run_pass(&state, range).await?;
    let blocked = state.blocked.read().await;
    let response = AppUsageResponse::from_report(&report, &blocked, query.exclude_blocked);

    info!(
        start_ms = range.start_ms,
        end_ms = range.end_ms,
        apps = response.apps.len(),
        data_available = response.data_available,
        "Served app usage report"
    );

    Ok((StatusCode::OK, Json(response)))
}

/// Most recently published report.
///
/// GET /api/v1/app-usage/latest
pub async fn get_latest_app_usage(
    State(state): State<AppState>,
    Query(query): Query<LatestQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .refresher
        .latest()
        .await
        .ok_or_else(|| ApiError::NotFound("No usage report has been generated yet".to_string()))?;

    let blocked = state.blocked.read().await;
    Ok(Json(AppUsageResponse::from_report(
        &report,
        &blocked,
        query.exclude_blocked,
    )))
}

/// Usage grouped by category, optionally limited to some categories.
///
/// GET /api/v1/app-usage/categories
pub async fn get_category_breakdown(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let range = resolve_range(
        query.from,
        query.to,
        query.date,
        query.days,
        state.config.aggregation.default_range_days,
        Utc::now(),
    )?;
    let filter = parse_categories(query.categories.as_deref());

    let report = run_pass(&state, range).await?;
    let blocked = state.blocked.read().await;

    let visible = if query.exclude_blocked {
        blocked.filter_records(&report.records)
    } else {
        report.records.clone()
    };
    let categories = category_breakdown(&visible, &filter);
    let apps = records_in_categories(&visible, &filter)
        .into_iter()
        .map(|record| AppUsageView::new(record, &blocked))
        .collect();

    Ok(Json(CategoryBreakdownResponse {
        data_available: report.is_available(),
        message: (!report.is_available()).then(|| USAGE_ACCESS_PROMPT.to_string()),
        period: report.range.into(),
        categories,
        apps,
    }))
}
