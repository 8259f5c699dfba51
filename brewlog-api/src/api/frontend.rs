//! Routes used by the front end
//!
//! - GET  /api/records  plain list of maduradores (no envelope)
//! - POST /add          madurador creation from form or JSON

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use brewlog_common::wire::document_to_wire;
use brewlog_common::Madurador;
use serde_json::Value;
use tracing::warn;

use crate::api::records::create;
use crate::AppState;

/// GET /api/records
///
/// Any failure yields an empty list so the listing page keeps rendering when
/// the store is degraded. The failure is logged, not returned.
pub async fn list_records(State(state): State<AppState>) -> Json<Vec<Value>> {
    match state.store.records::<Madurador>().find_all().await {
        Ok(docs) => Json(docs.iter().map(document_to_wire).collect()),
        Err(e) => {
            warn!("api/records returning empty list: {}", e);
            Json(Vec::new())
        }
    }
}

pub fn frontend_routes() -> Router<AppState> {
    Router::new()
        .route("/api/records", get(list_records))
        .route("/add", post(create::<Madurador>))
}
