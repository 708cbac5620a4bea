use crate::cache::{cache_key, ResponseCache};
use crate::config::Config;
use crate::errors::AppError;
use crate::field_mapper::ToUpstreamForm;
use crate::models::*;
use crate::normalizer;
use crate::validation::{parse_body, Validate};
use crate::ygl_client::YglClient;
use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, Uri},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Normalized responses of the three search endpoints.
    pub cache: ResponseCache,
    /// Client for the YGL API.
    pub ygl: YglClient,
}

impl AppState {
    /// Builds the state from configuration: a fresh cache and a YGL client.
    pub fn new(config: Config) -> Result<Self, AppError> {
        let cache = ResponseCache::new(config.cache_ttl());
        let ygl = YglClient::new(config.ygl_base_url.clone())?;
        Ok(Self { config, cache, ygl })
    }
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "ok": true })))
}

/// POST /api/rentals/search
pub async fn search_rentals(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    proxy::<RentalSearchBody>(&state, Endpoint::RentalSearch, &body).await
}

/// POST /api/agents/search
pub async fn search_agents(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    proxy::<AgentSearchBody>(&state, Endpoint::AgentSearch, &body).await
}

/// POST /api/landlords/search
pub async fn search_landlords(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    proxy::<LandlordSearchBody>(&state, Endpoint::LandlordSearch, &body).await
}

/// POST /api/leads
///
/// Creates a lead in YGL. Never cached: identical submissions each reach YGL.
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    proxy::<LeadBody>(&state, Endpoint::LeadCreate, &body).await
}

/// Fallback for every path without a route or static file.
pub async fn not_found(method: Method, uri: Uri) -> AppError {
    AppError::NotFound(format!("Route {} {} not found", method, uri.path()))
}

/// The pipeline shared by all four endpoints:
/// validate, check the cache, map fields, call YGL, normalize, store.
async fn proxy<B>(state: &AppState, endpoint: Endpoint, body: &[u8]) -> Result<Json<Value>, AppError>
where
    B: DeserializeOwned + Validate,
    B::Output: Serialize + ToUpstreamForm,
{
    let request = parse_body::<B>(body)?.validate()?;

    let key = if endpoint.is_cacheable() {
        Some(cache_key(endpoint.path(), &request)?)
    } else {
        None
    };

    if let Some(ref key) = key {
        if let Some(data) = state.cache.lookup(key).await {
            tracing::debug!("Cache HIT for {}", endpoint.path());
            return Ok(Json(json!({
                "success": true,
                "data": data,
                "cached": true,
            })));
        }
        tracing::debug!("Cache MISS for {}", endpoint.path());
    }

    let form = request.to_form(&state.config.ygl_api_key);
    let response = state.ygl.post_form(endpoint, &form).await?;
    let data = normalizer::normalize(response.content_type.as_deref(), &response.body);

    if let Some(key) = key {
        state.cache.store_default(key, data.clone()).await;
    }

    Ok(Json(json!({
        "success": true,
        "data": data,
    })))
}
