//! Error types for the covid-stats service.
//!
//! Two families live here. `FetchError` is the small closed set a data fetch
//! can end in, and it is what the pages and the JSON API report to users.
//! `CovidStatsError` covers infrastructure failures (disk, JSON, client setup)
//! that never reach a user as a fetch outcome.

use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Outcome of a failed statistics fetch.
///
/// # Rust Concepts
/// - `Copy` because the variants carry no payload; handlers pass it by value
/// - `#[serde(rename_all = "camelCase")]` gives `"noInternet"` on the wire
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FetchError {
    /// Unspecified failure: bad status, undecodable body and the like.
    #[error("statistics could not be loaded")]
    General,

    /// The upstream API could not be reached.
    #[error("no connection to the statistics API")]
    NoInternet,

    /// The API answered, but with no data for the request.
    #[error("no statistics available")]
    Empty,
}

impl FetchError {
    /// HTTP status a handler answers with for this outcome.
    pub fn status_code(self) -> StatusCode {
        match self {
            FetchError::General => StatusCode::BAD_GATEWAY,
            FetchError::NoInternet => StatusCode::SERVICE_UNAVAILABLE,
            FetchError::Empty => StatusCode::NOT_FOUND,
        }
    }

    /// Whether the page should offer a retry instead of an empty state.
    pub fn is_retryable(self) -> bool {
        !matches!(self, FetchError::Empty)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            FetchError::NoInternet
        } else {
            FetchError::General
        }
    }
}

/// Infrastructure errors.
///
/// `#[from]` lets `?` convert the underlying errors automatically.
#[derive(Debug, Error)]
pub enum CovidStatsError {
    /// Error reading or writing files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing or producing JSON.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}
