mod aggregator;
mod app;
mod error;
mod fetcher;
mod handlers;
mod models;
mod preferences;
mod selection;
mod service;
mod state;

use std::sync::Arc;

use anyhow::Context as _;
use tera::Tera;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::fetcher::HttpStatsSource;
use crate::preferences::JsonFilePreferenceStore;
use crate::state::{AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("covid_stats=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env();
    info!(?config, "Starting covid-stats");

    let tera = Tera::new(&config.template_glob).context("parsing templates")?;
    let source = HttpStatsSource::new(&config.api_url, config.request_timeout)?;
    let preferences = JsonFilePreferenceStore::new(&config.preferences_path);
    info!("Persisting selection to {}", preferences.path().display());

    let state = Arc::new(AppState::new(
        tera,
        Arc::new(source),
        Arc::new(preferences),
        config.default_selection(),
    ));

    if let Err(e) = state.refresh_countries().await {
        warn!("Starting without a country list: {}", e);
    }

    let scheduler = JobScheduler::new().await?;
    let job_state = state.clone();
    scheduler
        .add(Job::new_async(config.refresh_cron.as_str(), move |_uuid, _lock| {
            let state = job_state.clone();
            Box::pin(async move {
                // failures are logged inside, the old list stays
                let _ = state.refresh_countries().await;
            })
        })?)
        .await?;
    scheduler.start().await?;
    info!("Country list refresh scheduled: {}", config.refresh_cron);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("binding {}", config.bind_address))?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app::router(state)).await?;

    Ok(())
}
