//! brewlog-ui library - server-rendered front end
//!
//! Lists madurador records and submits new ones. Every operation goes to
//! brewlog-api over HTTP; this service keeps no state of its own.

use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, info, warn};

const INDEX_HTML: &str = include_str!("../ui/index.html");

const LIST_TIMEOUT: Duration = Duration::from_secs(3);
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(5);

/// UI error type
#[derive(Debug, Error)]
pub enum UiError {
    /// Backend unreachable or answered with an error status (502)
    #[error("Backend request failed: {0}")]
    Backend(#[from] reqwest::Error),
}

impl IntoResponse for UiError {
    fn into_response(self) -> Response {
        error!("{}", self);
        let page = format!(
            "<!DOCTYPE html><html><body><p class=\"error\">{}</p><p><a href=\"/\">Volver</a></p></body></html>",
            escape_html(&self.to_string())
        );
        (StatusCode::BAD_GATEWAY, Html(page)).into_response()
    }
}

/// HTTP client for brewlog-api
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// GET api/records
    pub async fn records(&self) -> Result<Vec<Value>, UiError> {
        let records: Vec<Value> = self
            .http
            .get(self.url("api/records"))
            .timeout(LIST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(records)
    }

    /// POST a form-encoded body
    pub async fn submit(&self, path: &str, form: &[(&str, &str)]) -> Result<(), UiError> {
        self.http
            .post(self.url(path))
            .timeout(SUBMIT_TIMEOUT)
            .form(form)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct UiState {
    pub backend: BackendClient,
}

#[derive(Debug, Deserialize)]
pub struct AddForm {
    pub litros: String,
    pub estado: String,
    #[serde(default)]
    pub notas: String,
    pub lote: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub id: String,
}

/// GET /
///
/// A backend failure still renders the page, with an empty list and the error.
pub async fn index(State(state): State<UiState>) -> Html<String> {
    let (records, error) = match state.backend.records().await {
        Ok(records) => (records, None),
        Err(e) => {
            warn!("Listing records failed: {}", e);
            (Vec::new(), Some(e.to_string()))
        }
    };
    Html(render_index(state.backend.base_url(), &records, error.as_deref()))
}

/// POST /add
pub async fn add(
    State(state): State<UiState>,
    Form(form): Form<AddForm>,
) -> Result<Redirect, UiError> {
    state
        .backend
        .submit(
            "add",
            &[
                ("litros", form.litros.as_str()),
                ("estado", form.estado.as_str()),
                ("notas", form.notas.as_str()),
                ("lote", form.lote.as_str()),
            ],
        )
        .await?;
    info!("Submitted madurador ({} litros)", form.litros);
    Ok(Redirect::to("/"))
}

/// POST /delete
pub async fn delete(
    State(state): State<UiState>,
    Form(form): Form<DeleteForm>,
) -> Result<Redirect, UiError> {
    state
        .backend
        .submit("delete_madurador_by_id/", &[("id", form.id.as_str())])
        .await?;
    info!("Deleted madurador {}", form.id);
    Ok(Redirect::to("/"))
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "module": "brewlog-ui",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Build application router
pub fn build_router(state: UiState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/add", post(add))
        .route("/delete", post(delete))
        .route("/health", get(health_check))
        .with_state(state)
}

pub fn render_index(backend_url: &str, records: &[Value], error: Option<&str>) -> String {
    let rows = if records.is_empty() {
        "<tr><td colspan=\"6\" class=\"empty\">No hay registros disponibles</td></tr>".to_string()
    } else {
        records.iter().map(render_row).collect::<Vec<_>>().join("\n")
    };
    let error = error
        .map(|e| format!("<div class=\"error\">{}</div>", escape_html(e)))
        .unwrap_or_default();

    let backend_url = escape_html(backend_url);
    fill_template(
        INDEX_HTML,
        &[
            ("BACKEND_URL", backend_url.as_str()),
            ("ERROR", error.as_str()),
            ("ROWS", rows.as_str()),
        ],
    )
}

/// Substitute `{{KEY}}` placeholders in one pass; inserted values are not rescanned
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let hit = after.find("}}").and_then(|end| {
            let key = &after[..end];
            values.iter().find(|(k, _)| *k == key).map(|(_, v)| (end, *v))
        });
        match hit {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn render_row(record: &Value) -> String {
    let id = display(&record["_id"]);
    let lote = match &record["lote"] {
        Value::Object(lote) => lote.get("_id").map(display).unwrap_or_default(),
        other => display(other),
    };
    format!(
        "<tr><td><code>{id}</code></td><td>{}</td><td>{}</td><td>{}</td><td><code>{}</code></td>\
         <td><form method=\"post\" action=\"/delete\"><input type=\"hidden\" name=\"id\" value=\"{id}\">\
         <button type=\"submit\">Eliminar</button></form></td></tr>",
        escape_html(&display(&record["litros"])),
        escape_html(&display(&record["estado"])),
        escape_html(&display(&record["notas"])),
        escape_html(&lote),
        id = escape_html(&id),
    )
}

/// Plain text for a JSON value; strings without quotes, null as empty
fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
