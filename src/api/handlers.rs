//! Route handlers.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AppState, SERVICE_NAME};
use crate::config::SchemaDelivery;
use crate::error::ApiError;
use crate::negotiate::negotiate;

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServiceInfo {
    pub name: &'static str,
    pub accepted_mediatypes: Vec<String>,
    pub building_blocks: usize,
    pub last_refresh: Option<DateTime<Utc>>,
}

/// GET /
pub async fn index(State(state): State<AppState>) -> Json<ServiceInfo> {
    let snapshot = state.store.snapshot();
    Json(ServiceInfo {
        name: SERVICE_NAME,
        accepted_mediatypes: state
            .resolver
            .media_types()
            .names()
            .map(str::to_string)
            .collect(),
        building_blocks: snapshot.len(),
        last_refresh: snapshot.fetched_at(),
    })
}

/// GET /list
pub async fn list(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.store.list_ids())
}

#[derive(Debug, Deserialize)]
pub struct BblockQuery {
    #[serde(rename = "_mediatype")]
    pub mediatype: Option<String>,
}

/// GET /bb/:id
pub async fn view_bblock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<BblockQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let record = state
        .store
        .get(&id)
        .ok_or_else(|| ApiError::RecordNotFound(id.clone()))?;

    let accept = match headers.get(header::ACCEPT) {
        Some(value) => Some(value.to_str().map_err(|_| ApiError::UnsupportedMediaType)?),
        None => None,
    };

    let media_type = negotiate(
        state.resolver.media_types(),
        query.mediatype.as_deref(),
        accept,
    )?;
    let target = state.resolver.locate(&record, &media_type.name)?;
    tracing::debug!(id = %id, media_type = %media_type.name, url = %target.url, "Resolved building block");

    match (state.schema_delivery, target.content_type) {
        (SchemaDelivery::Proxy, Some(content_type)) => {
            proxy(&state.client, &target.url, content_type).await
        }
        _ => redirect(&target.url),
    }
}

/// 307 to `url`. Catalog URLs are untrusted, so an unusable header value is
/// an error response rather than a panic.
fn redirect(url: &str) -> Result<Response, ApiError> {
    let location =
        HeaderValue::try_from(url).map_err(|_| ApiError::InvalidTarget(url.to_string()))?;
    Ok((StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response())
}

async fn proxy(
    client: &reqwest::Client,
    url: &str,
    content_type: String,
) -> Result<Response, ApiError> {
    let upstream = |source| ApiError::Upstream {
        url: url.to_string(),
        source,
    };
    let body = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(upstream)?
        .bytes()
        .await
        .map_err(upstream)?;

    Ok(([(header::CONTENT_TYPE, content_type)], body).into_response())
}
