use crate::store::{CountryRecord, CountryStore, EnrichedCountry, StoreError, gdp_descending};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory store backed by a HashMap. Used in tests and for ephemeral runs.
pub struct MemoryStore {
    inner: Mutex<HashMap<String, CountryRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CountryStore for MemoryStore {
    async fn upsert(&self, record: EnrichedCountry) -> Result<(), StoreError> {
        let record = record.into_record(Utc::now());
        let mut rows = self.inner.lock().await;
        debug!(name = %record.name, "Store UPSERT");
        rows.insert(record.name.clone(), record);
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<CountryRecord>, StoreError> {
        let rows = self.inner.lock().await;
        Ok(rows.get(name).cloned())
    }

    async fn delete(&self, name: &str) -> Result<bool, StoreError> {
        let mut rows = self.inner.lock().await;
        Ok(rows.remove(name).is_some())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let rows = self.inner.lock().await;
        Ok(rows.len() as u64)
    }

    async fn all(&self) -> Result<Vec<CountryRecord>, StoreError> {
        let rows = self.inner.lock().await;
        Ok(rows.values().cloned().collect())
    }

    async fn top_by_gdp(&self, limit: usize) -> Result<Vec<CountryRecord>, StoreError> {
        let mut records = self.all().await?;
        records.sort_by(gdp_descending);
        records.truncate(limit);
        Ok(records)
    }

    async fn last_refreshed(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let rows = self.inner.lock().await;
        Ok(rows.values().map(|r| r.last_refreshed_at).max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enriched(name: &str, gdp: Option<f64>) -> EnrichedCountry {
        EnrichedCountry {
            name: name.to_string(),
            capital: None,
            region: None,
            population: None,
            flag_url: None,
            currency_code: None,
            exchange_rate: None,
            estimated_gdp: gdp,
        }
    }

    #[tokio::test]
    async fn test_upsert_get_delete() {
        let store = MemoryStore::new();

        store.upsert(enriched("Testland", Some(5.0))).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.get("Testland").await.unwrap().is_some());

        assert!(store.delete("Testland").await.unwrap());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_top_by_gdp_order() {
        let store = MemoryStore::new();
        store.upsert(enriched("A", Some(1.0))).await.unwrap();
        store.upsert(enriched("B", Some(3.0))).await.unwrap();
        store.upsert(enriched("C", None)).await.unwrap();

        let top = store.top_by_gdp(5).await.unwrap();
        let names: Vec<&str> = top.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }
}
