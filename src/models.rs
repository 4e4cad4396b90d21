//! Data models: covid19api wire structures and the view-ready display model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One day's cumulative counts for a country or one of its provinces.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct RawCountryStatPoint {
    pub date: DateTime<Utc>,
    pub country: String,
    #[serde(default)]
    pub province: String,
    pub confirmed: i64,
    pub active: i64,
    pub recovered: i64,
    pub deaths: i64,
}

/// Global rollup of the `/summary` endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct GlobalTotals {
    pub total_confirmed: i64,
    pub new_confirmed: i64,
    pub total_recovered: i64,
    pub new_recovered: i64,
    pub total_deaths: i64,
    pub new_deaths: i64,
}

/// Cumulative totals of a single country inside a [`WorldwideSnapshot`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CountryTotal {
    pub country: String,
    #[serde(default)]
    pub slug: String,
    pub total_confirmed: i64,
    pub total_recovered: i64,
    pub total_deaths: i64,
}

/// Point-in-time global statistics plus per-country totals.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct WorldwideSnapshot {
    pub global: GlobalTotals,
    #[serde(default)]
    pub countries: Vec<CountryTotal>,
}

/// Entry of the `/countries` endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CountryListing {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Slug")]
    pub slug: String,
    #[serde(rename = "ISO2", default)]
    pub iso2: String,
}

/// The four tracked metrics.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Confirmed,
    Active,
    Recovered,
    Deaths,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Confirmed,
        Metric::Active,
        Metric::Recovered,
        Metric::Deaths,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Metric::Confirmed => "Confirmed",
            Metric::Active => "Active",
            Metric::Recovered => "Recovered",
            Metric::Deaths => "Deaths",
        }
    }
}

/// Current total and latest delta of one metric.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricStats {
    pub total: i64,
    pub delta: i64,
}

impl MetricStats {
    pub fn new(total: i64, delta: i64) -> Self {
        Self { total, delta }
    }
}

/// Per-metric statistics. One field per metric, so all four are always present.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerMetric {
    pub confirmed: MetricStats,
    pub active: MetricStats,
    pub recovered: MetricStats,
    pub deaths: MetricStats,
}

impl PerMetric {
    pub fn get(&self, metric: Metric) -> MetricStats {
        match metric {
            Metric::Confirmed => self.confirmed,
            Metric::Active => self.active,
            Metric::Recovered => self.recovered,
            Metric::Deaths => self.deaths,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, MetricStats)> + '_ {
        Metric::ALL.into_iter().map(|m| (m, self.get(m)))
    }
}

/// One row of the detail table: a day's delta or a country's totals.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct DisplayDetailRow {
    pub label: String,
    pub confirmed: i64,
    pub recovered: i64,
    pub deaths: i64,
    pub active: i64,
}

/// View-ready statistics for one selection.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct DisplayStats {
    pub title: String,
    pub per_metric: PerMetric,
    pub details: Vec<DisplayDetailRow>,
    pub last_updated: DateTime<Utc>,
}

impl DisplayStats {
    /// Model shown when there is nothing to aggregate.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            last_updated: now,
            ..Self::default()
        }
    }

    /// Metric cards in display order, flattened for templates.
    pub fn cards(&self) -> Vec<MetricCard> {
        self.per_metric
            .iter()
            .map(|(metric, stats)| MetricCard {
                metric,
                label: metric.label(),
                total: stats.total,
                delta: stats.delta,
            })
            .collect()
    }
}

/// A metric's figures with its label, as the dashboard renders them.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct MetricCard {
    pub metric: Metric,
    pub label: &'static str,
    pub total: i64,
    pub delta: i64,
}
