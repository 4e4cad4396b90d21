//! Turns raw API series into [`DisplayStats`].
//!
//! Both entry points are pure: the same input and `now` always give the same
//! output.

use chrono::{DateTime, Utc};
use itertools::Itertools;
use tracing::warn;

use crate::models::{
    CountryTotal, DisplayDetailRow, DisplayStats, MetricStats, PerMetric, RawCountryStatPoint,
    WorldwideSnapshot,
};

/// Shortest series the country aggregation can work with: the duplicated
/// "today" entry plus two usable days.
pub const MIN_SERIES_LEN: usize = 3;

/// Number of countries listed in the worldwide detail rows.
pub const TOP_COUNTRIES: usize = 3;

pub const WORLDWIDE_TITLE: &str = "Worldwide";

const DETAIL_DATE_FORMAT: &str = "%d.%m.%Y";

pub struct StatsAggregator;

impl StatsAggregator {
    /// Aggregates a country's `totals` and `day_one` series, both oldest first.
    ///
    /// The API repeats today's figures as yesterday's, so the final entry of
    /// each series is ignored. Only country-level points (empty province) of
    /// `day_one` are used. Too-short input yields [`DisplayStats::empty`].
    ///
    /// Detail rows are one per adjacent pair of usable days, so the oldest
    /// usable day is only a baseline and gets no row of its own.
    pub fn country(
        totals: &[RawCountryStatPoint],
        day_one: &[RawCountryStatPoint],
        now: DateTime<Utc>,
    ) -> DisplayStats {
        let day_one: Vec<&RawCountryStatPoint> =
            day_one.iter().filter(|p| p.province.is_empty()).collect();

        if totals.len() < MIN_SERIES_LEN || day_one.len() < MIN_SERIES_LEN {
            warn!(
                totals = totals.len(),
                day_one = day_one.len(),
                "Series too short to aggregate, returning empty stats"
            );
            return DisplayStats::empty(now);
        }

        let current = &totals[totals.len() - 2];
        let usable = &day_one[..day_one.len() - 1];
        let last = usable[usable.len() - 1];
        let previous = usable[usable.len() - 2];

        let per_metric = PerMetric {
            confirmed: MetricStats::new(
                current.confirmed,
                last.confirmed.saturating_sub(previous.confirmed),
            ),
            active: MetricStats::new(current.active, last.active.saturating_sub(previous.active)),
            recovered: MetricStats::new(
                current.recovered,
                last.recovered.saturating_sub(previous.recovered),
            ),
            deaths: MetricStats::new(current.deaths, last.deaths.saturating_sub(previous.deaths)),
        };

        let mut details: Vec<DisplayDetailRow> = usable
            .iter()
            .tuple_windows()
            .map(|(prev, cur)| daily_delta(prev, cur))
            .collect();
        details.reverse();

        DisplayStats {
            title: current.country.clone(),
            per_metric,
            details,
            last_updated: now,
        }
    }

    /// Aggregates the global snapshot; details are the top countries by
    /// confirmed cases.
    pub fn worldwide(snapshot: &WorldwideSnapshot, now: DateTime<Utc>) -> DisplayStats {
        let global = &snapshot.global;
        let per_metric = PerMetric {
            confirmed: MetricStats::new(global.total_confirmed, global.new_confirmed),
            active: MetricStats::new(
                global.total_confirmed.saturating_sub(global.total_recovered),
                global.new_confirmed.saturating_sub(global.new_recovered),
            ),
            recovered: MetricStats::new(global.total_recovered, global.new_recovered),
            deaths: MetricStats::new(global.total_deaths, global.new_deaths),
        };

        // sorted_by is stable, ties keep input order
        let details = snapshot
            .countries
            .iter()
            .sorted_by(|a, b| b.total_confirmed.cmp(&a.total_confirmed))
            .take(TOP_COUNTRIES)
            .map(country_totals)
            .collect();

        DisplayStats {
            title: WORLDWIDE_TITLE.to_string(),
            per_metric,
            details,
            last_updated: now,
        }
    }
}

fn daily_delta(prev: &RawCountryStatPoint, cur: &RawCountryStatPoint) -> DisplayDetailRow {
    DisplayDetailRow {
        label: cur.date.format(DETAIL_DATE_FORMAT).to_string(),
        confirmed: cur.confirmed.saturating_sub(prev.confirmed),
        recovered: cur.recovered.saturating_sub(prev.recovered),
        deaths: cur.deaths.saturating_sub(prev.deaths),
        active: cur.active.saturating_sub(prev.active),
    }
}

fn country_totals(total: &CountryTotal) -> DisplayDetailRow {
    DisplayDetailRow {
        label: total.country.clone(),
        confirmed: total.total_confirmed,
        recovered: total.total_recovered,
        deaths: total.total_deaths,
        active: total.total_confirmed.saturating_sub(total.total_recovered),
    }
}
