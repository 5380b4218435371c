//! Ingestion records used as the dedup key of a collection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry per successfully ingested source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionRecord {
    /// Source path as given to the pipeline
    pub url: String,
    /// File name without extension
    pub title: String,
    /// When the record was written; absent in logs written by older tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingested_at: Option<DateTime<Utc>>,
}

impl IngestionRecord {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            ingested_at: Some(Utc::now()),
        }
    }
}

/// Field/value pairs for a containment check.
///
/// A record matches when ANY provided pair matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordMatch {
    pub url: Option<String>,
    pub title: Option<String>,
}

impl RecordMatch {
    /// Match on source path
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            title: None,
        }
    }

    /// Match on title
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            url: None,
            title: Some(title.into()),
        }
    }

    /// Also match on title
    pub fn or_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn matches(&self, record: &IngestionRecord) -> bool {
        self.url.as_deref().is_some_and(|url| url == record.url)
            || self.title.as_deref().is_some_and(|title| title == record.title)
    }
}
