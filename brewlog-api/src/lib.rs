//! brewlog-api library - HTTP Route Layer
//!
//! Maps the CRUD surface for madurador and lote records onto the record
//! store gateway, plus the health probe and the front-end routes.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use brewlog_common::{Lote, Madurador, RecordStore};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

pub mod api;
pub mod error;

pub use crate::error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Record store gateway (immutable config + connection pool)
    pub store: Arc<RecordStore>,
}

impl AppState {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::record_routes::<Madurador>())
        .merge(api::record_routes::<Lote>())
        .merge(api::frontend_routes())
        .merge(api::health_routes())
        .with_state(state)
}

/// CORS for the configured front-end origins
///
/// Origins that are not valid header values are skipped with a warning.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
