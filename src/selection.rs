//! The user's statistics scope and its persisted form.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::DisplayStats;

/// Use-case string persisted for the worldwide selection.
pub const WORLDWIDE_USECASE: &str = "worldwide";

/// Country shown before anything has been selected.
pub const DEFAULT_COUNTRY: &str = "croatia";

/// Lower-cases `name` and replaces spaces with hyphens.
pub fn slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Which statistics the user is looking at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "slug", rename_all = "lowercase")]
pub enum Selection {
    /// A single country, identified by its slug.
    Country(String),
    Worldwide,
}

impl Selection {
    /// Country selection for a display name or slug; the name is slugified.
    pub fn country(name: &str) -> Self {
        Selection::Country(slug(name))
    }

    /// Parses a use-case string as found in URLs and persisted records.
    ///
    /// The value is taken verbatim: nothing checks it against known countries.
    pub fn from_usecase(usecase: &str) -> Self {
        if usecase == WORLDWIDE_USECASE {
            Selection::Worldwide
        } else {
            Selection::Country(usecase.to_string())
        }
    }

    pub fn usecase(&self) -> &str {
        match self {
            Selection::Country(slug) => slug,
            Selection::Worldwide => WORLDWIDE_USECASE,
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Country(DEFAULT_COUNTRY.to_string())
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.usecase())
    }
}

/// Persisted form of a [`Selection`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceRecord {
    pub usecase: String,
    #[serde(default)]
    pub details: Vec<String>,
}

impl PreferenceRecord {
    pub fn new(usecase: impl Into<String>, details: Vec<String>) -> Self {
        Self {
            usecase: usecase.into(),
            details,
        }
    }
}

pub struct PreferenceCodec;

impl PreferenceCodec {
    /// Builds the record to persist after `display` was shown for `selection`.
    ///
    /// Worldwide records list the detail row labels; country records carry
    /// the country's display name. The country value is stored as held, so
    /// decoding the record gives back `selection`.
    pub fn encode(selection: &Selection, display: &DisplayStats) -> PreferenceRecord {
        match selection {
            Selection::Worldwide => PreferenceRecord::new(
                WORLDWIDE_USECASE,
                display.details.iter().map(|row| row.label.clone()).collect(),
            ),
            Selection::Country(name) => {
                let label = if display.title.is_empty() {
                    name.clone()
                } else {
                    display.title.clone()
                };
                PreferenceRecord::new(name.clone(), vec![label])
            }
        }
    }

    pub fn decode(record: &PreferenceRecord) -> Selection {
        Selection::from_usecase(&record.usecase)
    }

    /// Decodes `record`, falling back to `default` when nothing was saved.
    pub fn decode_or(record: Option<&PreferenceRecord>, default: &Selection) -> Selection {
        record.map_or_else(|| default.clone(), Self::decode)
    }
}
