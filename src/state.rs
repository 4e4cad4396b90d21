use std::env;
use std::sync::Arc;
use std::time::Duration;

use tera::Tera;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::FetchError;
use crate::fetcher::StatsSource;
use crate::models::CountryListing;
use crate::preferences::PreferenceStore;
use crate::selection::{Selection, DEFAULT_COUNTRY};

/// Application configuration from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the HTTP server to.
    pub bind_address: String,
    /// Cron expression for the country list refresh.
    pub refresh_cron: String,
    /// Base URL of the statistics API.
    pub api_url: String,
    /// File the last selection is persisted to.
    pub preferences_path: String,
    /// Country shown until a selection has been saved.
    pub default_country: String,
    pub template_glob: String,
    pub request_timeout: Duration,
}

impl Config {
    /// Creates Config from environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8201".into()),
            refresh_cron: env::var("REFRESH_CRON").unwrap_or_else(|_| "0 0 */6 * * *".into()),
            api_url: env::var("COVID_API_URL")
                .unwrap_or_else(|_| "https://api.covid19api.com".into()),
            preferences_path: env::var("PREFERENCES_PATH")
                .unwrap_or_else(|_| "data/preferences.json".into()),
            default_country: env::var("DEFAULT_COUNTRY")
                .unwrap_or_else(|_| DEFAULT_COUNTRY.into()),
            template_glob: env::var("TEMPLATE_GLOB")
                .unwrap_or_else(|_| "templates/**/*.html".into()),
            request_timeout: Duration::from_secs(
                env::var("REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(15),
            ),
        }
    }

    pub fn default_selection(&self) -> Selection {
        Selection::country(&self.default_country)
    }
}

/// Shared application state passed to all request handlers.
pub struct AppState {
    /// Template engine for rendering HTML pages.
    pub tera: Tera,
    pub source: Arc<dyn StatsSource>,
    pub preferences: Arc<dyn PreferenceStore>,
    /// Selection used when nothing has been persisted.
    pub default_selection: Selection,
    /// Country list for the selection page, refreshed on a schedule.
    pub countries: RwLock<Vec<CountryListing>>,
}

impl AppState {
    pub fn new(
        tera: Tera,
        source: Arc<dyn StatsSource>,
        preferences: Arc<dyn PreferenceStore>,
        default_selection: Selection,
    ) -> Self {
        Self {
            tera,
            source,
            preferences,
            default_selection,
            countries: RwLock::new(Vec::new()),
        }
    }

    /// Replaces the cached country list. On failure the old list is kept.
    pub async fn refresh_countries(&self) -> Result<usize, FetchError> {
        let mut countries = match self.source.countries().await {
            Ok(countries) => countries,
            Err(err) => {
                warn!("Country list refresh failed: {err}");
                return Err(err);
            }
        };
        countries.sort_by(|a, b| a.country.cmp(&b.country));

        let count = countries.len();
        *self.countries.write().await = countries;
        info!("Country list refreshed with {} entries", count);
        Ok(count)
    }
}
