use crate::country_source::{CountrySource, RawCountry, SourceError};
use async_trait::async_trait;
use tracing::{debug, error};

pub const SOURCE_ID: &str = "restcountries.com";

const FIELDS: &str = "name,capital,region,population,flag,currencies";

pub struct RestCountriesSource {
    base_url: String,
    client: reqwest::Client,
}

impl RestCountriesSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CountrySource for RestCountriesSource {
    async fn fetch_all(&self) -> Result<Vec<RawCountry>, SourceError> {
        let url = format!("{}/v2/all?fields={}", self.base_url, FIELDS);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::new(SOURCE_ID, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::new(
                SOURCE_ID,
                format!("unexpected status {status}"),
            ));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| SourceError::new(SOURCE_ID, e.to_string()))?;

        let countries: Vec<RawCountry> = match serde_json::from_str(&response_text) {
            Ok(data) => data,
            Err(e) => {
                error!(
                    error = ?e,
                    response = %response_text,
                    "Failed to parse country metadata response"
                );
                return Err(SourceError::new(SOURCE_ID, e.to_string()));
            }
        };

        debug!(count = countries.len(), "Fetched country metadata");
        Ok(countries)
    }
}
