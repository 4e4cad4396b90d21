//! Persistence of the last viewed selection.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, error};

use crate::error::CovidStatsError;
use crate::selection::PreferenceRecord;

/// Key-value persistence for the selection record.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn save(&self, record: &PreferenceRecord) -> Result<(), CovidStatsError>;

    /// `Ok(None)` when nothing has been saved yet.
    async fn load(&self) -> Result<Option<PreferenceRecord>, CovidStatsError>;
}

/// Stores the record as pretty JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFilePreferenceStore {
    path: PathBuf,
}

impl JsonFilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PreferenceStore for JsonFilePreferenceStore {
    async fn save(&self, record: &PreferenceRecord) -> Result<(), CovidStatsError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let payload = serde_json::to_vec_pretty(record)?;
        fs::write(&self.path, payload).await?;
        debug!(path = %self.path.display(), usecase = %record.usecase, "Saved selection");
        Ok(())
    }

    async fn load(&self) -> Result<Option<PreferenceRecord>, CovidStatsError> {
        match fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(record) => Ok(Some(record)),
                Err(err) => {
                    error!(path = %self.path.display(), "Ignoring unreadable preferences: {err}");
                    Ok(None)
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
