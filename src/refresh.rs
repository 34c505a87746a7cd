//! The refresh pipeline: fetch both feeds, enrich, upsert, render.

use crate::country_source::{CountrySource, SourceError};
use crate::enrich::{MultiplierSource, enrich};
use crate::rate_source::RateSource;
use crate::render::{self, RenderError};
use crate::store::{CountryStore, EnrichedCountry, StoreError};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("store unavailable: {0}")]
    Store(#[from] StoreError),
}

/// Outcome of a successful refresh. The render result rides along for
/// logging; a failed render never fails the refresh.
#[derive(Debug)]
pub struct RefreshOutcome {
    pub countries_processed: usize,
    pub render: Result<(), RenderError>,
}

/// Runs one full refresh: Fetching -> Enriching -> Writing -> Rendering.
///
/// Both fetches run before anything is written, so a failed feed leaves the
/// store untouched. A store failure mid-batch aborts the refresh but keeps
/// the rows already written. Rendering is best-effort.
pub async fn refresh(
    countries: &dyn CountrySource,
    rates: &dyn RateSource,
    store: &dyn CountryStore,
    multiplier: &dyn MultiplierSource,
    image_path: &Path,
) -> Result<RefreshOutcome, RefreshError> {
    info!("Fetching country metadata and exchange rates...");
    let (countries_result, rates_result) =
        futures::future::join(countries.fetch_all(), rates.fetch_table()).await;
    let raw_countries = countries_result?;
    let rate_table = rates_result?;
    debug!(
        countries = raw_countries.len(),
        rates = rate_table.len(),
        "Fetched both feeds"
    );

    // Enrichment is pure and never aborts the batch; malformed entries
    // degrade to nulls. Later duplicates win through upsert order.
    let enriched: Vec<EnrichedCountry> = raw_countries
        .iter()
        .map(|raw| enrich(raw, &rate_table, multiplier))
        .collect();
    let countries_processed = enriched.len();

    for record in enriched {
        store.upsert(record).await?;
    }
    info!(countries = countries_processed, "Store refresh complete");

    let render = render::write_summary(store, image_path).await;
    if let Err(e) = &render {
        warn!(error = %e, "Summary image generation failed; refresh itself succeeded");
    }

    Ok(RefreshOutcome {
        countries_processed,
        render,
    })
}
