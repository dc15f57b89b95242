//! HTTP-facing errors.
//!
//! Negotiation and resolution failures surface as 400/404 with a short
//! `{"detail": ...}` body. Catalog refresh failures never reach this type;
//! they are logged by the refresher.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::negotiate::NegotiationError;
use crate::resolver::ResolveError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unsupported media type")]
    UnsupportedMediaType,

    #[error("Building block id not found")]
    RecordNotFound(String),

    /// The record exists but lacks the requested representation.
    #[error("{0}")]
    RepresentationNotFound(String),

    /// The resolved URL cannot be sent as a `Location` header.
    #[error("Building block target URL is not valid")]
    InvalidTarget(String),

    /// Fetching a proxied document failed.
    #[error("Could not retrieve {url}")]
    Upstream {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UnsupportedMediaType => StatusCode::BAD_REQUEST,
            ApiError::RecordNotFound(_) | ApiError::RepresentationNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::InvalidTarget(_) | ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<NegotiationError> for ApiError {
    fn from(e: NegotiationError) -> Self {
        match e {
            NegotiationError::UnsupportedMediaType => ApiError::UnsupportedMediaType,
        }
    }
}

impl From<ResolveError> for ApiError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::NotFound { .. } => ApiError::RepresentationNotFound(e.to_string()),
            ResolveError::UnsupportedMediaType(_) => ApiError::UnsupportedMediaType,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Upstream { url, source } => {
                tracing::warn!(url = %url, error = %source, "Upstream fetch failed while proxying")
            }
            ApiError::InvalidTarget(url) => {
                tracing::warn!(url = %url, "Resolved URL is not a valid Location header")
            }
            ApiError::UnsupportedMediaType => tracing::debug!("Unsupported media type requested"),
            ApiError::RecordNotFound(id) => tracing::debug!(id = %id, "Unknown building block"),
            ApiError::RepresentationNotFound(detail) => tracing::debug!(detail = %detail, "Not found"),
        }
        (
            status,
            Json(ErrorResponse {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}
