pub mod config;
pub mod country_source;
pub mod enrich;
pub mod log;
pub mod rate_source;
pub mod refresh;
pub mod render;
pub mod server;
pub mod sources;
pub mod store;

use crate::enrich::UniformMultiplier;
use crate::server::AppState;
use crate::sources::{openerapi::OpenErApiSource, restcountries::RestCountriesSource};
use crate::store::disk::FjallStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

pub async fn run(config_path: Option<&str>) -> Result<()> {
    info!("Country Exchange service starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let data_dir = config.data_dir()?;
    let store = FjallStore::open(&data_dir)
        .with_context(|| format!("Failed to open store at {}", data_dir.display()))?;

    let countries_base_url = config
        .sources
        .countries
        .as_ref()
        .map_or("https://restcountries.com", |s| &s.base_url);
    let rates_base_url = config
        .sources
        .rates
        .as_ref()
        .map_or("https://open.er-api.com", |s| &s.base_url);

    let state = AppState {
        store: Arc::new(store),
        countries: Arc::new(RestCountriesSource::new(countries_base_url)),
        rates: Arc::new(OpenErApiSource::new(rates_base_url)),
        multiplier: Arc::new(UniformMultiplier),
        image_path: config.image_path()?,
    };

    let app = server::router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.server.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.server.port))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
