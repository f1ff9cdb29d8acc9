//! Bounded-concurrency resolution of many stores.
//!
//! Results come back in input order. Stores whose POI tier failed with a
//! transient error can be re-resolved in later rounds after an exponential
//! back-off with jitter, so a temporary Overpass outage does not pin them to
//! a lower tier.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use storegeo_core::{AppConfig, Resolution, SourceTier, StoreQuery};

use crate::resolver::{PoiTierStatus, ResolutionReport, TieredResolver};
use crate::source::{AddressGeocoder, PoiSource};

const MAX_RETRY_DELAY_MS: u64 = 600_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub max_concurrent: usize,
    /// Extra rounds for stores whose POI tier was unavailable.
    pub retry_rounds: u32,
    /// Base delay before the first retry round; doubles each round.
    pub retry_backoff_base_ms: u64,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_concurrent: 1,
            retry_rounds: 0,
            retry_backoff_base_ms: 30_000,
        }
    }
}

impl From<&AppConfig> for BatchOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_concurrent: config.max_concurrent_stores.max(1),
            retry_rounds: config.poi_retry_rounds,
            retry_backoff_base_ms: config.poi_retry_backoff_base_secs.saturating_mul(1000),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub id: String,
    pub report: ResolutionReport,
    /// Number of times the store was resolved (1 + retry rounds it took part in).
    pub attempts: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub poi: usize,
    pub scraper: usize,
    pub geocoded: usize,
    pub unresolved: usize,
    pub poi_unavailable: usize,
}

impl BatchSummary {
    #[must_use]
    pub fn from_outcomes(outcomes: &[BatchOutcome]) -> Self {
        let mut summary = Self {
            total: outcomes.len(),
            ..Self::default()
        };
        for outcome in outcomes {
            match &outcome.report.resolution {
                Resolution::Resolved(location) => match location.source {
                    SourceTier::Poi => summary.poi += 1,
                    SourceTier::Scraper => summary.scraper += 1,
                    SourceTier::Geocoded => summary.geocoded += 1,
                },
                Resolution::Unresolved { .. } => summary.unresolved += 1,
            }
            if matches!(outcome.report.poi_status, PoiTierStatus::Unavailable { .. }) {
                summary.poi_unavailable += 1;
            }
        }
        summary
    }
}

fn should_retry(report: &ResolutionReport) -> bool {
    matches!(
        report.poi_status,
        PoiTierStatus::Unavailable {
            transient: true,
            ..
        }
    )
}

/// Delay before retry round `round` (1-based): `base * 2^(round-1)`, capped,
/// with ±25 % jitter.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn retry_delay_ms(base_ms: u64, round: u32) -> u64 {
    let computed = base_ms.saturating_mul(1u64 << round.saturating_sub(1).min(20));
    let capped = computed.min(MAX_RETRY_DELAY_MS);
    (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64
}

async fn resolve_indices<P, G>(
    resolver: &TieredResolver<P, G>,
    items: &[(String, StoreQuery)],
    indices: &[usize],
    max_concurrent: usize,
) -> Vec<(usize, ResolutionReport)>
where
    P: PoiSource,
    G: AddressGeocoder,
{
    stream::iter(indices.iter().copied())
        .map(|index| {
            let query = &items[index].1;
            async move { (index, resolver.resolve_with_report(query).await) }
        })
        .buffer_unordered(max_concurrent.max(1))
        .collect()
        .await
}

/// Resolves every `(id, query)` pair.
///
/// No store can fail the batch; each ends with a `Resolution`. Outcomes are
/// returned in the order of `items`.
pub async fn resolve_batch<P, G>(
    resolver: &TieredResolver<P, G>,
    items: &[(String, StoreQuery)],
    options: &BatchOptions,
) -> (Vec<BatchOutcome>, BatchSummary)
where
    P: PoiSource,
    G: AddressGeocoder,
{
    let mut reports: Vec<Option<ResolutionReport>> = vec![None; items.len()];
    let mut attempts = vec![0u32; items.len()];
    let mut pending: Vec<usize> = (0..items.len()).collect();
    let mut round = 0u32;

    loop {
        for (index, report) in
            resolve_indices(resolver, items, &pending, options.max_concurrent).await
        {
            attempts[index] += 1;
            reports[index] = Some(report);
        }

        pending.retain(|&index| reports[index].as_ref().is_some_and(should_retry));
        if pending.is_empty() || round >= options.retry_rounds {
            break;
        }

        round += 1;
        let delay_ms = retry_delay_ms(options.retry_backoff_base_ms, round);
        tracing::warn!(
            round,
            retry_rounds = options.retry_rounds,
            stores = pending.len(),
            delay_ms,
            "POI tier unavailable, retrying after back-off"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    let outcomes: Vec<BatchOutcome> = items
        .iter()
        .zip(reports)
        .zip(attempts)
        .filter_map(|(((id, _), report), attempts)| {
            report.map(|report| BatchOutcome {
                id: id.clone(),
                report,
                attempts,
            })
        })
        .collect();
    let summary = BatchSummary::from_outcomes(&outcomes);

    tracing::info!(
        total = summary.total,
        poi = summary.poi,
        scraper = summary.scraper,
        geocoded = summary.geocoded,
        unresolved = summary.unresolved,
        poi_unavailable = summary.poi_unavailable,
        "batch resolved"
    );

    (outcomes, summary)
}
