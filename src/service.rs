//! Fetch-then-aggregate for a selection.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::aggregator::StatsAggregator;
use crate::error::FetchError;
use crate::fetcher::StatsSource;
use crate::models::DisplayStats;
use crate::selection::Selection;

/// Loads and aggregates the statistics `selection` asks for.
///
/// Both country series are requested concurrently. When both fail, the
/// totals error is the one reported.
pub async fn load_display_stats(
    source: &dyn StatsSource,
    selection: &Selection,
    now: DateTime<Utc>,
) -> Result<DisplayStats, FetchError> {
    let stats = match selection {
        Selection::Country(slug) => {
            let (totals, day_one) =
                tokio::join!(source.country_totals(slug), source.country_series(slug));
            let totals = totals?;
            let day_one = day_one?;
            if totals.is_empty() || day_one.is_empty() {
                return Err(FetchError::Empty);
            }
            StatsAggregator::country(&totals, &day_one, now)
        }
        Selection::Worldwide => {
            let snapshot = source.worldwide().await?;
            StatsAggregator::worldwide(&snapshot, now)
        }
    };

    info!(selection = %selection, rows = stats.details.len(), "Aggregated statistics");
    Ok(stats)
}

/// Like [`load_display_stats`], logging failures.
pub async fn try_load_display_stats(
    source: &dyn StatsSource,
    selection: &Selection,
    now: DateTime<Utc>,
) -> Result<DisplayStats, FetchError> {
    load_display_stats(source, selection, now)
        .await
        .inspect_err(|err| warn!(selection = %selection, "Could not load statistics: {err}"))
}
