use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Redirect, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tera::Context;
use tracing::error;

use crate::error::FetchError;
use crate::selection::{slug, PreferenceCodec, PreferenceRecord, Selection, WORLDWIDE_USECASE};
use crate::service::try_load_display_stats;
use crate::state::AppState;

/// Longest country name shown on the selection page before truncation.
const MAX_NAME_CHARS: usize = 32;

/// Query parameters for the country selection page.
#[derive(Debug, Deserialize)]
pub struct CountryQuery {
    #[serde(default, deserialize_with = "empty_string_as_none_str")]
    pub q: Option<String>,
}

/// Query parameters for the stats API.
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    /// Use case to load instead of the saved one.
    #[serde(default, deserialize_with = "empty_string_as_none_str")]
    pub usecase: Option<String>,
}

#[derive(Debug, Serialize)]
struct CountryEntry {
    name: String,
    slug: String,
}

#[derive(Debug, Serialize)]
struct SelectionResponse {
    selection: Selection,
    record: Option<PreferenceRecord>,
}

fn empty_string_as_none_str<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => Ok(Some(s)),
    }
}

fn render_template(
    tera: &tera::Tera,
    template: &str,
    context: &Context,
) -> Result<Html<String>, (StatusCode, &'static str)> {
    tera.render(template, context).map(Html).map_err(|e| {
        error!("Template render error for '{}': {}", template, e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Render error")
    })
}

fn render_fetch_error(tera: &tera::Tera, err: FetchError, selection: &Selection) -> Response {
    let mut context = Context::new();
    context.insert("error", &err);
    context.insert("message", &err.to_string());
    context.insert("retryable", &err.is_retryable());
    context.insert("selection", selection.usecase());

    match render_template(tera, "error.html", &context) {
        Ok(html) => (err.status_code(), html).into_response(),
        Err(e) => e.into_response(),
    }
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}

/// Selection from a user-supplied use case; names are slugified.
fn selection_from_input(usecase: &str) -> Selection {
    Selection::from_usecase(&slug(usecase.trim()))
}

async fn saved_record(state: &AppState) -> Option<PreferenceRecord> {
    state.preferences.load().await.unwrap_or_else(|e| {
        error!("Could not load preferences: {}", e);
        None
    })
}

async fn active_selection(state: &AppState) -> Selection {
    let record = saved_record(state).await;
    PreferenceCodec::decode_or(record.as_ref(), &state.default_selection)
}

/// GET / - Dashboard for the saved selection.
pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    let selection = active_selection(&state).await;
    let stats = match try_load_display_stats(state.source.as_ref(), &selection, Utc::now()).await {
        Ok(stats) => stats,
        Err(err) => return render_fetch_error(&state.tera, err, &selection),
    };

    let record = PreferenceCodec::encode(&selection, &stats);
    if let Err(e) = state.preferences.save(&record).await {
        error!("Could not persist selection '{}': {}", selection, e);
    }

    let mut context = Context::new();
    context.insert("stats", &stats);
    context.insert("cards", &stats.cards());
    context.insert("selection", selection.usecase());
    context.insert("is_worldwide", &(selection == Selection::Worldwide));
    context.insert(
        "last_updated",
        &stats.last_updated.format("%d.%m.%Y %H:%M UTC").to_string(),
    );

    render_template(&state.tera, "dashboard.html", &context).into_response()
}

/// GET /countries - Country selection page.
pub async fn countries_list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CountryQuery>,
) -> impl IntoResponse {
    let search = query.q.as_ref().map(|q| q.trim().to_lowercase());

    let data_guard = state.countries.read().await;
    let countries: Vec<CountryEntry> = data_guard
        .iter()
        .filter(|c| {
            search.as_ref().is_none_or(|q| {
                c.country.to_lowercase().contains(q) || c.slug.contains(q.as_str())
            })
        })
        .map(|c| CountryEntry {
            name: truncate_chars(&c.country, MAX_NAME_CHARS),
            slug: c.slug.clone(),
        })
        .collect();
    let total_countries = data_guard.len();
    drop(data_guard);

    let selection = active_selection(&state).await;

    let mut context = Context::new();
    context.insert("countries", &countries);
    context.insert("total_countries", &total_countries);
    context.insert("q", &query.q);
    context.insert("selected", selection.usecase());
    context.insert("worldwide", WORLDWIDE_USECASE);

    render_template(&state.tera, "countries.html", &context)
}

/// GET /select/{usecase} - Persist a selection and go back to the dashboard.
pub async fn select(
    State(state): State<Arc<AppState>>,
    Path(usecase): Path<String>,
) -> Result<Redirect, (StatusCode, &'static str)> {
    let selection = selection_from_input(&usecase);
    let record = PreferenceRecord::new(selection.usecase(), Vec::new());

    state.preferences.save(&record).await.map_err(|e| {
        error!("Could not persist selection '{}': {}", selection, e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Could not save selection")
    })?;

    Ok(Redirect::to("/"))
}

/// GET /api/stats - Display statistics as JSON.
pub async fn api_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Response {
    let selection = match query.usecase.as_deref() {
        Some(usecase) => selection_from_input(usecase),
        None => active_selection(&state).await,
    };

    match try_load_display_stats(state.source.as_ref(), &selection, Utc::now()).await {
        Ok(stats) => Json(stats).into_response(),
        Err(err) => (
            err.status_code(),
            Json(serde_json::json!({ "error": err })),
        )
            .into_response(),
    }
}

/// GET /api/selection - The active selection and its saved record.
pub async fn api_selection(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let record = saved_record(&state).await;
    let selection = PreferenceCodec::decode_or(record.as_ref(), &state.default_selection);
    Json(SelectionResponse { selection, record })
}

#[cfg(test)]
mod tests {
    use super::*;

    mod truncate_chars_tests {
        use super::*;

        #[test]
        fn test_short_string_unchanged() {
            assert_eq!(truncate_chars("Croatia", 10), "Croatia");
        }

        #[test]
        fn test_exact_length_unchanged() {
            assert_eq!(truncate_chars("Chad", 4), "Chad");
        }

        #[test]
        fn test_long_string_truncated() {
            assert_eq!(
                truncate_chars("Saint Vincent and the Grenadines", 13),
                "Saint Vincent..."
            );
        }

        #[test]
        fn test_multibyte_characters() {
            assert_eq!(truncate_chars("Curaçao Côte", 7), "Curaçao...");
        }
    }

    mod route_tests {
        use super::*;
        use crate::aggregator::fixtures::{day_one_series, totals_series, worldwide_snapshot};
        use crate::app::router;
        use crate::fetcher::fake::FakeStatsSource;
        use crate::models::{CountryListing, DisplayStats};
        use crate::preferences::memory::MemoryPreferenceStore;
        use axum::body::Body;
        use axum::http::{header, Request};
        use http_body_util::BodyExt;
        use tera::Tera;
        use tower::ServiceExt;

        fn templates() -> Tera {
            Tera::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*.html")).unwrap()
        }

        fn healthy() -> FakeStatsSource {
            FakeStatsSource {
                series: Ok(day_one_series()),
                totals: Ok(totals_series()),
                worldwide: Ok(worldwide_snapshot()),
                countries: Ok(vec![
                    CountryListing {
                        country: "Croatia".to_string(),
                        slug: "croatia".to_string(),
                        iso2: "HR".to_string(),
                    },
                    CountryListing {
                        country: "Germany".to_string(),
                        slug: "germany".to_string(),
                        iso2: "DE".to_string(),
                    },
                ]),
            }
        }

        fn app_state(source: FakeStatsSource, store: Arc<MemoryPreferenceStore>) -> Arc<AppState> {
            Arc::new(AppState::new(
                templates(),
                Arc::new(source),
                store,
                Selection::default(),
            ))
        }

        async fn get(state: Arc<AppState>, uri: &str) -> (StatusCode, Response) {
            let response = router(state)
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            (response.status(), response)
        }

        async fn body_string(response: Response) -> String {
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            String::from_utf8(bytes.to_vec()).unwrap()
        }

        #[tokio::test]
        async fn test_dashboard_renders_and_persists_selection() {
            let store = Arc::new(MemoryPreferenceStore::default());
            let (status, response) = get(app_state(healthy(), store.clone()), "/").await;

            assert_eq!(status, StatusCode::OK);
            let html = body_string(response).await;
            assert!(html.contains("Croatia"));
            assert!(html.contains("280164"));

            let saved = store.current().await.unwrap();
            assert_eq!(saved.usecase, "croatia");
            assert_eq!(saved.details, ["Croatia"]);
        }

        #[tokio::test]
        async fn test_dashboard_worldwide_saves_top_countries() {
            let store = Arc::new(MemoryPreferenceStore::with_record(PreferenceRecord::new(
                "worldwide",
                vec![],
            )));
            let (status, _) = get(app_state(healthy(), store.clone()), "/").await;

            assert_eq!(status, StatusCode::OK);
            let saved = store.current().await.unwrap();
            assert_eq!(saved.usecase, "worldwide");
            assert_eq!(saved.details, ["United States of America", "India", "Brazil"]);
        }

        #[tokio::test]
        async fn test_dashboard_fetch_error_page() {
            let store = Arc::new(MemoryPreferenceStore::default());
            let source = FakeStatsSource::failing(FetchError::NoInternet);
            let (status, response) = get(app_state(source, store.clone()), "/").await;

            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
            assert!(body_string(response).await.contains("Try again"));
            assert_eq!(store.current().await, None);
        }

        #[tokio::test]
        async fn test_dashboard_empty_state_page() {
            let store = Arc::new(MemoryPreferenceStore::default());
            let source = FakeStatsSource::failing(FetchError::Empty);
            let (status, response) = get(app_state(source, store), "/").await;

            assert_eq!(status, StatusCode::NOT_FOUND);
            assert!(body_string(response).await.contains("Choose another country"));
        }

        #[tokio::test]
        async fn test_api_stats_for_usecase() {
            let store = Arc::new(MemoryPreferenceStore::default());
            let (status, response) =
                get(app_state(healthy(), store.clone()), "/api/stats?usecase=worldwide").await;

            assert_eq!(status, StatusCode::OK);
            let stats: DisplayStats = serde_json::from_str(&body_string(response).await).unwrap();
            assert_eq!(stats.title, "Worldwide");
            assert_eq!(stats.per_metric.confirmed.total, 131_539_636);
            assert_eq!(stats.details.len(), 3);
            assert_eq!(store.current().await, None);
        }

        #[tokio::test]
        async fn test_api_stats_error_kind() {
            let store = Arc::new(MemoryPreferenceStore::default());
            let source = FakeStatsSource::failing(FetchError::General);
            let (status, response) = get(app_state(source, store), "/api/stats").await;

            assert_eq!(status, StatusCode::BAD_GATEWAY);
            let body: serde_json::Value =
                serde_json::from_str(&body_string(response).await).unwrap();
            assert_eq!(body, serde_json::json!({"error": "general"}));
        }

        #[tokio::test]
        async fn test_select_persists_and_redirects() {
            let store = Arc::new(MemoryPreferenceStore::default());
            let state = app_state(healthy(), store.clone());
            let (status, response) = get(state.clone(), "/select/Bosnia%20and%20Herzegovina").await;

            assert_eq!(status, StatusCode::SEE_OTHER);
            assert_eq!(response.headers()[header::LOCATION], "/");
            assert_eq!(
                store.current().await.unwrap().usecase,
                "bosnia-and-herzegovina"
            );

            let (_, response) = get(state, "/api/selection").await;
            let body: serde_json::Value =
                serde_json::from_str(&body_string(response).await).unwrap();
            assert_eq!(body["selection"]["slug"], "bosnia-and-herzegovina");
            assert_eq!(body["record"]["usecase"], "bosnia-and-herzegovina");
        }

        #[tokio::test]
        async fn test_api_selection_defaults_without_record() {
            let store = Arc::new(MemoryPreferenceStore::default());
            let (_, response) = get(app_state(healthy(), store), "/api/selection").await;
            let body: serde_json::Value =
                serde_json::from_str(&body_string(response).await).unwrap();
            assert_eq!(body["selection"], serde_json::json!({"kind": "country", "slug": "croatia"}));
            assert!(body["record"].is_null());
        }

        #[tokio::test]
        async fn test_countries_page_filters() {
            let store = Arc::new(MemoryPreferenceStore::default());
            let state = app_state(healthy(), store);
            state.refresh_countries().await.unwrap();

            let (status, response) = get(state, "/countries?q=germ").await;
            assert_eq!(status, StatusCode::OK);
            let html = body_string(response).await;
            assert!(html.contains("/select/germany"));
            assert!(!html.contains("/select/croatia"));
            assert!(html.contains("/select/worldwide"));
        }
    }
}
