//! Access to the covid19api statistics endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{CovidStatsError, FetchError};
use crate::models::{CountryListing, RawCountryStatPoint, WorldwideSnapshot};

pub const USER_AGENT: &str = concat!("covid-stats/", env!("CARGO_PKG_VERSION"));

/// Source of raw statistics.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Daily country-level series since the first recorded case.
    async fn country_series(&self, slug: &str) -> Result<Vec<RawCountryStatPoint>, FetchError>;

    /// Daily cumulative totals for a country.
    async fn country_totals(&self, slug: &str) -> Result<Vec<RawCountryStatPoint>, FetchError>;

    async fn worldwide(&self) -> Result<WorldwideSnapshot, FetchError>;

    async fn countries(&self) -> Result<Vec<CountryListing>, FetchError>;
}

/// [`StatsSource`] backed by the covid19api REST API.
#[derive(Debug, Clone)]
pub struct HttpStatsSource {
    client: Client,
    base_url: String,
}

impl HttpStatsSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CovidStatsError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("Fetching {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!("Request to {} failed: {}", url, e);
            FetchError::from(e)
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            warn!("{} returned {}", url, status);
            return Err(FetchError::Empty);
        }
        if !status.is_success() {
            warn!("{} returned {}", url, status);
            return Err(FetchError::General);
        }

        response.json::<T>().await.map_err(|e| {
            warn!("Invalid payload from {}: {}", url, e);
            FetchError::from(e)
        })
    }

    async fn get_series(&self, path: &str) -> Result<Vec<RawCountryStatPoint>, FetchError> {
        let series: Vec<RawCountryStatPoint> = self.get_json(path).await?;
        non_empty(series)
    }
}

#[async_trait]
impl StatsSource for HttpStatsSource {
    async fn country_series(&self, slug: &str) -> Result<Vec<RawCountryStatPoint>, FetchError> {
        self.get_series(&format!("dayone/country/{slug}")).await
    }

    async fn country_totals(&self, slug: &str) -> Result<Vec<RawCountryStatPoint>, FetchError> {
        self.get_series(&format!("total/country/{slug}")).await
    }

    async fn worldwide(&self) -> Result<WorldwideSnapshot, FetchError> {
        self.get_json("summary").await
    }

    async fn countries(&self) -> Result<Vec<CountryListing>, FetchError> {
        let countries: Vec<CountryListing> = self.get_json("countries").await?;
        non_empty(countries)
    }
}

fn non_empty<T>(items: Vec<T>) -> Result<Vec<T>, FetchError> {
    if items.is_empty() {
        Err(FetchError::Empty)
    } else {
        Ok(items)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;

    /// Canned responses, one per endpoint.
    #[derive(Debug, Clone)]
    pub struct FakeStatsSource {
        pub series: Result<Vec<RawCountryStatPoint>, FetchError>,
        pub totals: Result<Vec<RawCountryStatPoint>, FetchError>,
        pub worldwide: Result<WorldwideSnapshot, FetchError>,
        pub countries: Result<Vec<CountryListing>, FetchError>,
    }

    impl FakeStatsSource {
        pub fn failing(err: FetchError) -> Self {
            Self {
                series: Err(err),
                totals: Err(err),
                worldwide: Err(err),
                countries: Err(err),
            }
        }
    }

    #[async_trait]
    impl StatsSource for FakeStatsSource {
        async fn country_series(&self, _slug: &str) -> Result<Vec<RawCountryStatPoint>, FetchError> {
            self.series.clone()
        }

        async fn country_totals(&self, _slug: &str) -> Result<Vec<RawCountryStatPoint>, FetchError> {
            self.totals.clone()
        }

        async fn worldwide(&self) -> Result<WorldwideSnapshot, FetchError> {
            self.worldwide.clone()
        }

        async fn countries(&self) -> Result<Vec<CountryListing>, FetchError> {
            self.countries.clone()
        }
    }
}
