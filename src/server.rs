//! HTTP surface over the refresh pipeline and the store.

use crate::country_source::CountrySource;
use crate::enrich::MultiplierSource;
use crate::rate_source::RateSource;
use crate::refresh::{self, RefreshError};
use crate::store::CountryStore;
use axum::{
    Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;

/// Everything the handlers need, injected at construction. No globals.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CountryStore>,
    pub countries: Arc<dyn CountrySource>,
    pub rates: Arc<dyn RateSource>,
    pub multiplier: Arc<dyn MultiplierSource>,
    pub image_path: PathBuf,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/status", get(status))
        .route("/countries", get(list_countries))
        .route("/countries/refresh", post(refresh_countries))
        // Literal route, takes precedence over the :name capture below.
        .route("/countries/image", get(summary_image))
        .route("/countries/:name", get(get_country).delete(delete_country))
        .with_state(state)
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}

async fn root() -> &'static str {
    "Welcome to the Country Exchange API!"
}

async fn refresh_countries(State(state): State<AppState>) -> Response {
    let result = refresh::refresh(
        state.countries.as_ref(),
        state.rates.as_ref(),
        state.store.as_ref(),
        state.multiplier.as_ref(),
        &state.image_path,
    )
    .await;

    match result {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({
                "message": "Countries refreshed successfully",
                "countries_processed": outcome.countries_processed,
            })),
        )
            .into_response(),
        Err(RefreshError::Source(e)) => {
            error!(source = e.source_id, reason = %e.reason, "Refresh aborted, feed unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": "External data source unavailable",
                    "details": format!("Could not fetch data from {}", e.source_id),
                })),
            )
                .into_response()
        }
        Err(RefreshError::Store(e)) => {
            error!(error = %e, "Refresh aborted, store unavailable");
            internal_error()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListParams {
    region: Option<String>,
    currency: Option<String>,
    sort: Option<String>,
}

async fn list_countries(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    let mut records = match state.store.all().await {
        Ok(records) => records,
        Err(e) => {
            error!(error = %e, "Failed to list countries");
            return internal_error();
        }
    };

    if let Some(region) = &params.region {
        records.retain(|r| r.region.as_deref() == Some(region.as_str()));
    }
    if let Some(currency) = &params.currency {
        records.retain(|r| r.currency_code.as_deref() == Some(currency.as_str()));
    }
    if params.sort.as_deref() == Some("gdp_desc") {
        records.sort_by(crate::store::gdp_descending);
    }

    Json(records).into_response()
}

async fn get_country(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.store.get(&name).await {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Country not found" })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, name, "Failed to read country");
            internal_error()
        }
    }
}

async fn delete_country(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.store.delete(&name).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Country not found" })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, name, "Failed to delete country");
            internal_error()
        }
    }
}

async fn status(State(state): State<AppState>) -> Response {
    let total = match state.store.count().await {
        Ok(total) => total,
        Err(e) => {
            error!(error = %e, "Failed to read status");
            return internal_error();
        }
    };
    let last_refreshed_at = match state.store.last_refreshed().await {
        Ok(ts) => ts,
        Err(e) => {
            error!(error = %e, "Failed to read status");
            return internal_error();
        }
    };

    Json(json!({
        "total_countries": total,
        "last_refreshed_at": last_refreshed_at,
    }))
    .into_response()
}

async fn summary_image(State(state): State<AppState>) -> Response {
    match tokio::fs::read(&state.image_path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Summary image not found" })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to serve summary image");
            internal_error()
        }
    }
}
