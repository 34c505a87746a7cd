//! Country metadata feed abstraction.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// A fetch from one of the external feeds failed before any processing.
#[derive(Debug, Clone, Error)]
#[error("{source_id} unavailable: {reason}")]
pub struct SourceError {
    pub source_id: &'static str,
    pub reason: String,
}

impl SourceError {
    pub fn new(source_id: &'static str, reason: impl Into<String>) -> Self {
        SourceError {
            source_id,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCurrency {
    #[serde(default)]
    pub code: Option<String>,
}

/// One country entry as the metadata feed returns it. Missing fields
/// deserialize to `None` rather than failing the batch.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCountry {
    pub name: String,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub population: Option<u64>,
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(default)]
    pub currencies: Vec<RawCurrency>,
}

#[async_trait]
pub trait CountrySource: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<RawCountry>, SourceError>;
}
