use crate::store::{CountryRecord, CountryStore, EnrichedCountry, StoreError, gdp_descending};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use std::path::Path;
use tracing::debug;

/// Country rows persisted in a fjall partition, one JSON value per name.
pub struct FjallStore {
    _keyspace: Keyspace,
    partition: PartitionHandle,
}

impl FjallStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path)?;

        let keyspace = fjall::Config::new(path).open()?;
        let partition = keyspace.open_partition("countries", PartitionCreateOptions::default())?;

        Ok(Self {
            _keyspace: keyspace,
            partition,
        })
    }

    fn scan(&self) -> Result<Vec<CountryRecord>, StoreError> {
        let mut records = Vec::new();
        for item in self.partition.iter() {
            let (_, value) = item?;
            let record: CountryRecord = serde_json::from_slice(&value)?;
            records.push(record);
        }
        Ok(records)
    }
}

#[async_trait]
impl CountryStore for FjallStore {
    async fn upsert(&self, record: EnrichedCountry) -> Result<(), StoreError> {
        let record = record.into_record(Utc::now());
        self.partition
            .insert(record.name.as_bytes(), serde_json::to_vec(&record)?)?;
        debug!(name = %record.name, "Store UPSERT");
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<CountryRecord>, StoreError> {
        match self.partition.get(name.as_bytes())? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, name: &str) -> Result<bool, StoreError> {
        let existed = self.partition.get(name.as_bytes())?.is_some();
        if existed {
            self.partition.remove(name.as_bytes())?;
            debug!(name, "Store DELETE");
        }
        Ok(existed)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let mut count = 0u64;
        for item in self.partition.iter() {
            item?;
            count += 1;
        }
        Ok(count)
    }

    async fn all(&self) -> Result<Vec<CountryRecord>, StoreError> {
        self.scan()
    }

    async fn top_by_gdp(&self, limit: usize) -> Result<Vec<CountryRecord>, StoreError> {
        let mut records = self.scan()?;
        records.sort_by(gdp_descending);
        records.truncate(limit);
        Ok(records)
    }

    async fn last_refreshed(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self.scan()?.iter().map(|r| r.last_refreshed_at).max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn enriched(name: &str, gdp: Option<f64>) -> EnrichedCountry {
        EnrichedCountry {
            name: name.to_string(),
            capital: None,
            region: None,
            population: Some(100),
            flag_url: None,
            currency_code: None,
            exchange_rate: None,
            estimated_gdp: gdp,
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let dir = tempdir().unwrap();
        let store = FjallStore::open(dir.path()).unwrap();

        store.upsert(enriched("Testland", Some(1.0))).await.unwrap();

        let record = store.get("Testland").await.unwrap().unwrap();
        assert_eq!(record.name, "Testland");
        assert_eq!(record.estimated_gdp, Some(1.0));
        assert!(store.get("Missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_overwrites_in_place() {
        let dir = tempdir().unwrap();
        let store = FjallStore::open(dir.path()).unwrap();

        store.upsert(enriched("Testland", Some(1.0))).await.unwrap();
        let first = store.get("Testland").await.unwrap().unwrap();

        store.upsert(enriched("Testland", Some(2.0))).await.unwrap();
        let second = store.get("Testland").await.unwrap().unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(second.estimated_gdp, Some(2.0));
        assert!(second.last_refreshed_at >= first.last_refreshed_at);
    }

    #[tokio::test]
    async fn test_top_by_gdp_sorts_nulls_last() {
        let dir = tempdir().unwrap();
        let store = FjallStore::open(dir.path()).unwrap();

        store.upsert(enriched("Low", Some(10.0))).await.unwrap();
        store.upsert(enriched("High", Some(99.0))).await.unwrap();
        store.upsert(enriched("Unknown", None)).await.unwrap();

        let top = store.top_by_gdp(5).await.unwrap();
        let names: Vec<&str> = top.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["High", "Low", "Unknown"]);

        let top2 = store.top_by_gdp(2).await.unwrap();
        assert_eq!(top2.len(), 2);
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = tempdir().unwrap();
        let store = FjallStore::open(dir.path()).unwrap();

        store.upsert(enriched("Testland", None)).await.unwrap();
        assert!(store.delete("Testland").await.unwrap());
        assert!(!store.delete("Testland").await.unwrap());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_last_refreshed_empty() {
        let dir = tempdir().unwrap();
        let store = FjallStore::open(dir.path()).unwrap();

        assert!(store.last_refreshed().await.unwrap().is_none());
    }
}
