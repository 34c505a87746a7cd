//! Exchange-rate feed abstraction.

use crate::country_source::SourceError;
use async_trait::async_trait;
use std::collections::HashMap;

/// Currency code to exchange rate, scoped to a single refresh.
pub type RateTable = HashMap<String, f64>;

#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_table(&self) -> Result<RateTable, SourceError>;
}
