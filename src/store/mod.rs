pub mod disk;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

/// A persisted country row, keyed by `name`. Optional fields serialize as
/// explicit nulls so consumers always see the full shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryRecord {
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: Option<u64>,
    pub flag_url: Option<String>,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: Option<f64>,
    pub last_refreshed_at: DateTime<Utc>,
}

/// Enrichment output, everything except the refresh timestamp. The store
/// stamps `last_refreshed_at` on upsert; callers never supply it.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedCountry {
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: Option<u64>,
    pub flag_url: Option<String>,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: Option<f64>,
}

impl EnrichedCountry {
    pub fn into_record(self, refreshed_at: DateTime<Utc>) -> CountryRecord {
        CountryRecord {
            name: self.name,
            capital: self.capital,
            region: self.region,
            population: self.population,
            flag_url: self.flag_url,
            currency_code: self.currency_code,
            exchange_rate: self.exchange_rate,
            estimated_gdp: self.estimated_gdp,
            last_refreshed_at: refreshed_at,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(#[from] fjall::Error),
    #[error("record encoding error: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait CountryStore: Send + Sync {
    /// Insert or overwrite the row named by `record.name`, stamping the
    /// refresh timestamp. Overwrites replace every field, nothing is merged.
    async fn upsert(&self, record: EnrichedCountry) -> Result<(), StoreError>;

    async fn get(&self, name: &str) -> Result<Option<CountryRecord>, StoreError>;

    /// Removes the named row; returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    async fn all(&self) -> Result<Vec<CountryRecord>, StoreError>;

    /// Rows ordered by `estimated_gdp` descending; rows without a GDP sort last.
    async fn top_by_gdp(&self, limit: usize) -> Result<Vec<CountryRecord>, StoreError>;

    /// Timestamp of the most recently written row, if any.
    async fn last_refreshed(&self) -> Result<Option<DateTime<Utc>>, StoreError>;
}

/// Descending by estimated GDP with `None` last. Shared by both backends so
/// the summary sees the same order either way.
pub(crate) fn gdp_descending(a: &CountryRecord, b: &CountryRecord) -> Ordering {
    match (a.estimated_gdp, b.estimated_gdp) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
