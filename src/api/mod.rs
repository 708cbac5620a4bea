//! HTTP surface: routes, static files, CORS and the JSON 404 fallback.

use crate::config::Config;
use crate::errors::AppError;
use crate::handlers::{self, AppState};
use axum::{
    handler::HandlerWithoutStateExt,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

/// Per-IP budget for `/api`: 60 requests per minute.
pub const RATE_LIMIT_PER_MINUTE: u32 = 60;

/// Routes served under `/api`. Rate limiting is layered on by the caller.
///
/// Any other method on these paths gets the same JSON 404 as an unknown path.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/rentals/search",
            post(handlers::search_rentals).fallback(handlers::not_found),
        )
        .route(
            "/agents/search",
            post(handlers::search_agents).fallback(handlers::not_found),
        )
        .route(
            "/landlords/search",
            post(handlers::search_landlords).fallback(handlers::not_found),
        )
        .route(
            "/leads",
            post(handlers::create_lead).fallback(handlers::not_found),
        )
}

/// Applies the per-IP rate limit to `routes`.
///
/// A client gets a burst of 60 requests, refilled one per second. The client IP
/// comes from `X-Forwarded-For` / `X-Real-IP` / `Forwarded`, else the peer address.
/// Must be called inside a tokio runtime.
pub fn rate_limited(routes: Router<Arc<AppState>>) -> Result<Router<Arc<AppState>>, AppError> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(1)
            .burst_size(RATE_LIMIT_PER_MINUTE)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| AppError::Internal("Invalid rate limit configuration".to_string()))?,
    );

    // Forget idle IPs so the limiter doesn't grow without bound.
    let governor_limiter = governor_conf.limiter().clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            governor_limiter.retain_recent();
        }
    });

    Ok(routes.layer(GovernorLayer {
        config: governor_conf,
    }))
}

/// Assembles the full application around an `/api` router.
pub fn build_app(state: Arc<AppState>, api: Router<Arc<AppState>>) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(handlers::not_found.into_service());

    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .fallback_service(static_files)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Configured origins, or the request's own origin when none are configured.
pub fn cors_layer(config: &Config) -> CorsLayer {
    let allow_origin = if config.allowed_origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
