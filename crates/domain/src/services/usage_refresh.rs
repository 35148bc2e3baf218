//! Refresh coordination across aggregation passes.
//!
//! Each refresh is numbered. Starting a refresh cancels the one in flight,
//! and a finished pass replaces the published report only if no newer pass
//! has published already. Readers always see a whole report.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::usage_aggregation::{AggregationError, UsageAggregator};
use super::usage_sources::UsageSources;
use crate::models::{TimeRange, UsageReport};

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("Refresh {generation} was superseded by a newer refresh")]
    Superseded { generation: u64 },

    #[error(transparent)]
    Aggregation(#[from] AggregationError),
}

#[derive(Debug)]
struct Published {
    generation: u64,
    report: Arc<UsageReport>,
}

#[derive(Debug)]
pub struct UsageRefresher {
    aggregator: UsageAggregator,
    generation: AtomicU64,
    in_flight: Mutex<Option<(u64, CancellationToken)>>,
    published: RwLock<Option<Published>>,
}

impl UsageRefresher {
    pub fn new(aggregator: UsageAggregator) -> Self {
        Self {
            aggregator,
            generation: AtomicU64::new(0),
            in_flight: Mutex::new(None),
            published: RwLock::new(None),
        }
    }

    pub fn aggregator(&self) -> &UsageAggregator {
        &self.aggregator
    }

    /// Run a pass and publish its report.
    pub async fn refresh(
        &self,
        range: TimeRange,
        sources: UsageSources<'_>,
    ) -> Result<Arc<UsageReport>, RefreshError> {
        // A rejected range must not supersede the pass in flight.
        if range.start_ms > range.end_ms {
            return Err(AggregationError::InvalidRange {
                start: range.start_ms,
                end: range.end_ms,
            }
            .into());
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();

        {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            if let Some((previous, previous_token)) = in_flight.replace((generation, token.clone()))
            {
                debug!(previous, generation, "Cancelling superseded refresh");
                previous_token.cancel();
            }
        }

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            result = self.aggregator.aggregate(range, sources) => Some(result),
        };

        self.clear_in_flight(generation);

        let report = match outcome {
            Some(result) => Arc::new(result?),
            None => return Err(RefreshError::Superseded { generation }),
        };

        self.publish(generation, report.clone()).await;
        Ok(report)
    }

    /// Last published report, if any pass has completed.
    pub async fn latest(&self) -> Option<Arc<UsageReport>> {
        self.published
            .read()
            .await
            .as_ref()
            .map(|published| published.report.clone())
    }

    pub async fn published_generation(&self) -> Option<u64> {
        self.published
            .read()
            .await
            .as_ref()
            .map(|published| published.generation)
    }

    async fn publish(&self, generation: u64, report: Arc<UsageReport>) -> bool {
        let mut published = self.published.write().await;
        if let Some(current) = published.as_ref() {
            if current.generation > generation {
                debug!(
                    generation,
                    published = current.generation,
                    "Discarding stale report"
                );
                return false;
            }
        }

        info!(
            generation,
            records = report.records.len(),
            available = report.is_available(),
            "Published usage report"
        );
        *published = Some(Published { generation, report });
        true
    }

    fn clear_in_flight(&self, generation: u64) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if matches!(in_flight.as_ref(), Some((current, _)) if *current == generation) {
            *in_flight = None;
        }
    }
}
