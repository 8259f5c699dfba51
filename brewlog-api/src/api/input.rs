//! Request input extraction
//!
//! Collects fields from the query string and from the body. Form-encoded and
//! JSON bodies are both accepted; body fields override query fields with the
//! same name. Other content types contribute no fields.

use axum::{
    async_trait,
    extract::{FromRequest, Query, Request},
    http::header,
    Form, Json,
};
use brewlog_common::normalize::{coerce_text, RawInput};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Untyped request fields
#[derive(Debug, Clone)]
pub struct Input(pub RawInput);

impl Input {
    /// The `id` field addressing one document
    pub fn id(&self) -> Result<String, ApiError> {
        let raw = self.0.required("id")?;
        Ok(coerce_text("id", raw)?)
    }
}

#[async_trait]
impl<S> FromRequest<S> for Input
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(req.uri())
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        let mut input = RawInput::from_pairs(pairs);

        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") {
            let Json(body) = Json::<Map<String, Value>>::from_request(req, state).await?;
            input.merge(RawInput::from_json(body));
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state).await?;
            input.merge(RawInput::from_pairs(pairs));
        }

        Ok(Input(input))
    }
}
