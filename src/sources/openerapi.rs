use crate::country_source::SourceError;
use crate::rate_source::{RateSource, RateTable};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error};

pub const SOURCE_ID: &str = "open.er-api.com";

#[derive(Debug, Deserialize)]
struct ErApiResponse {
    rates: RateTable,
}

/// Fetches USD-anchored exchange rates from open.er-api.com.
pub struct OpenErApiSource {
    base_url: String,
    client: reqwest::Client,
}

impl OpenErApiSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl RateSource for OpenErApiSource {
    async fn fetch_table(&self) -> Result<RateTable, SourceError> {
        let url = format!("{}/v6/latest/USD", self.base_url);
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

        let parsed: ErApiResponse = match serde_json::from_str(&response_text) {
            Ok(data) => data,
            Err(e) => {
                error!(
                    error = ?e,
                    response = %response_text,
                    "Failed to parse exchange rate response"
                );
                return Err(SourceError::new(SOURCE_ID, e.to_string()));
            }
        };

        debug!(count = parsed.rates.len(), "Fetched exchange rates");
        Ok(parsed.rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    async fn create_mock_server(status: u16, mock_response: &str) -> wiremock::MockServer {
        let mock_server = wiremock::MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v6/latest/USD"))
            .respond_with(ResponseTemplate::new(status).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    const MOCK_JSON: &str = r#"{
        "result": "success",
        "base_code": "USD",
        "rates": {"USD": 1.0, "TST": 10.0, "NGN": 1600.23}
    }"#;

    #[tokio::test]
    async fn test_fetch_table() {
        let mock_server = create_mock_server(200, MOCK_JSON).await;
        let source = OpenErApiSource::new(&mock_server.uri());

        let table = source.fetch_table().await.unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.get("TST"), Some(&10.0));
        assert_eq!(table.get("NGN"), Some(&1600.23));
        assert!(!table.contains_key("ZZZ"));
    }

    #[tokio::test]
    async fn test_fetch_table_server_error() {
        let mock_server = create_mock_server(503, "down").await;
        let source = OpenErApiSource::new(&mock_server.uri());

        let err = source.fetch_table().await.unwrap_err();
        assert_eq!(err.source_id, SOURCE_ID);
        assert!(err.reason.contains("503"));
    }
}
