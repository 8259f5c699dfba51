//! CRUD routes, one set per record kind
//!
//! For a kind named `<k>` (`madurador`, `lote`):
//! - POST /create_<k>          normalize → create → `{"data": {"_id"}}`
//! - POST /update_<k>_by_id    id + partial normalize → merge update
//! - POST /delete_<k>_by_id    id → delete
//! - GET  /find_all_<k>        `{"data": [...]}`
//! - GET  /find_<k>_by_id      `{"data": {...} | null}`
//!
//! Each path also answers with a trailing slash.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use brewlog_common::wire::{document_to_wire, optional_document_to_wire};
use brewlog_common::RecordKind;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::api::input::Input;
use crate::error::ApiResult;
use crate::AppState;

/// `{"data": ...}` response envelope
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Json<Self> {
        Json(Self { data })
    }
}

#[derive(Debug, Serialize)]
pub struct Created {
    #[serde(rename = "_id")]
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct Updated {
    #[serde(rename = "_id")]
    pub id: String,
    pub matched: bool,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    #[serde(rename = "_id")]
    pub id: String,
    pub deleted: bool,
}

/// POST /create_<k>
pub async fn create<K: RecordKind>(
    State(state): State<AppState>,
    Input(input): Input,
) -> ApiResult<Json<Envelope<Created>>> {
    let record = K::from_input(&input)?;
    let id = state.store.records::<K>().create(record).await?;
    info!("Created {} {}", K::NAME, id);
    Ok(Envelope::new(Created { id: id.to_hex() }))
}

/// POST /update_<k>_by_id
pub async fn update_by_id<K: RecordKind>(
    State(state): State<AppState>,
    input: Input,
) -> ApiResult<Json<Envelope<Updated>>> {
    let id = input.id()?;
    let patch = K::patch_from_input(&input.0)?;
    let outcome = state.store.records::<K>().update_by_id(&id, patch).await?;
    info!("Update {} {}: matched={}", K::NAME, id, outcome.is_found());
    Ok(Envelope::new(Updated {
        id,
        matched: outcome.is_found(),
    }))
}

/// POST /delete_<k>_by_id
pub async fn delete_by_id<K: RecordKind>(
    State(state): State<AppState>,
    input: Input,
) -> ApiResult<Json<Envelope<Deleted>>> {
    let id = input.id()?;
    let outcome = state.store.records::<K>().delete_by_id(&id).await?;
    info!("Delete {} {}: deleted={}", K::NAME, id, outcome.is_found());
    Ok(Envelope::new(Deleted {
        id,
        deleted: outcome.is_found(),
    }))
}

/// GET /find_all_<k>
pub async fn find_all<K: RecordKind>(
    State(state): State<AppState>,
) -> ApiResult<Json<Envelope<Vec<Value>>>> {
    let docs = state.store.records::<K>().find_all().await?;
    Ok(Envelope::new(docs.iter().map(document_to_wire).collect()))
}

/// GET /find_<k>_by_id
pub async fn find_by_id<K: RecordKind>(
    State(state): State<AppState>,
    input: Input,
) -> ApiResult<Json<Envelope<Value>>> {
    let id = input.id()?;
    let found = state.store.records::<K>().find_by_id(&id).await?.found();
    Ok(Envelope::new(optional_document_to_wire(found.as_ref())))
}

/// Build the CRUD routes for `K`
pub fn record_routes<K: RecordKind>() -> Router<AppState> {
    let name = K::NAME;
    let routes = [
        (format!("/create_{}", name), post(create::<K>)),
        (format!("/update_{}_by_id", name), post(update_by_id::<K>)),
        (format!("/delete_{}_by_id", name), post(delete_by_id::<K>)),
        (format!("/find_all_{}", name), get(find_all::<K>)),
        (format!("/find_{}_by_id", name), get(find_by_id::<K>)),
    ];

    routes
        .into_iter()
        .fold(Router::new(), |router, (path, method)| {
            router
                .route(&format!("{}/", path), method.clone())
                .route(&path, method)
        })
}
