//! HTTP-level tests for the lookup service.
//!
//! Drive the axum router in-process against a pre-published catalog snapshot.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use mockito::Server;
use tower::ServiceExt;
use url::Url;

use bblocks_api::api::{build_router, AppState};
use bblocks_api::catalog::refresher::parse_catalog;
use bblocks_api::catalog::{CatalogSnapshot, CatalogStore};
use bblocks_api::config::{DocsStrategy, SchemaDelivery};
use bblocks_api::media_type::{MediaTypeTable, Profile};
use bblocks_api::resolver::Resolver;

const CATALOG: &str = r#"[
    {
        "itemIdentifier": "ogc.bblock.example",
        "ldContext": "https://x/ctx.jsonld"
    },
    {
        "itemIdentifier": "ogc.geo.features.feature",
        "name": "Feature",
        "schema": {
            "application/json": "https://example.org/bblocks/build/feature/schema.json",
            "application/yaml": "https://example.org/bblocks/build/feature/schema.yaml"
        },
        "documentation": {
            "slate": {"url": "https://example.org/bblocks/doc/feature/"},
            "markdown": {"url": "https://example.org/bblocks/doc/feature/index.md"},
            "json-full": {"url": "https://example.org/bblocks/doc/feature/index.json"}
        }
    },
    {
        "itemIdentifier": "ogc.geo.common.point",
        "schema": ["point/schema.json", "point/schema.yaml"]
    }
]"#;

// ── Test app builder ───────────────────────────────────────────

fn store() -> Arc<CatalogStore> {
    let records = parse_catalog(CATALOG.as_bytes()).expect("test catalog parses");
    Arc::new(CatalogStore::with_snapshot(CatalogSnapshot::from_records(
        records,
        Utc::now(),
    )))
}

fn build_app(root_path: &str, delivery: SchemaDelivery) -> axum::Router {
    let resolver = Resolver::new(
        MediaTypeTable::for_profile(Profile::Current),
        DocsStrategy::Explicit,
        Url::parse("https://example.org/bblocks/").unwrap(),
    );
    let state = AppState::new(store(), resolver, reqwest::Client::new(), delivery);
    build_router(state, root_path)
}

fn app() -> axum::Router {
    build_app("", SchemaDelivery::Redirect)
}

async fn get(app: axum::Router, uri: &str, accept: Option<&str>) -> axum::response::Response {
    let mut req = Request::builder().uri(uri);
    if let Some(accept) = accept {
        req = req.header(header::ACCEPT, accept);
    }
    app.oneshot(req.body(Body::empty()).unwrap()).await.unwrap()
}

// ── Helpers to read responses ──────────────────────────────────

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(resp: &axum::response::Response) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .unwrap()
}

// ── Tests ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_index_lists_media_types() {
    let resp = get(app(), "/", None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["name"], "bblocks-api");
    assert_eq!(
        body["accepted-mediatypes"],
        serde_json::json!([
            "text/html",
            "text/markdown",
            "application/ld+json",
            "application/schema+json",
            "application/schema+yaml",
            "application/json"
        ])
    );
    assert_eq!(body["building-blocks"], 3);
    assert!(body["last-refresh"].is_string());
}

#[tokio::test]
async fn test_list_is_sorted() {
    let resp = get(app(), "/list", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        serde_json::json!([
            "ogc.bblock.example",
            "ogc.geo.common.point",
            "ogc.geo.features.feature"
        ])
    );
}

#[tokio::test]
async fn test_ld_context_redirect() {
    let resp = get(
        app(),
        "/bb/ogc.bblock.example?_mediatype=application/ld%2Bjson",
        None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "https://x/ctx.jsonld");
}

#[tokio::test]
async fn test_missing_schema_is_404() {
    let resp = get(
        app(),
        "/bb/ogc.bblock.example?_mediatype=application/schema%2Bjson",
        None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(resp).await["detail"],
        "Schema for type application/json not found"
    );
}

#[tokio::test]
async fn test_unknown_record_is_404_for_any_media_type() {
    for query in ["", "?_mediatype=bogus", "?_mediatype=application/ld%2Bjson"] {
        let resp = get(app(), &format!("/bb/does.not.exist{query}"), Some("image/png")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "query {query:?}");
    }
}

#[tokio::test]
async fn test_unsupported_override_is_400() {
    let resp = get(
        app(),
        "/bb/ogc.geo.features.feature?_mediatype=text/plain",
        Some("text/html"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["detail"], "Unsupported media type");
}

#[tokio::test]
async fn test_no_acceptable_type_is_400() {
    let resp = get(app(), "/bb/ogc.geo.features.feature", Some("image/png")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_default_is_html_documentation() {
    let resp = get(app(), "/bb/ogc.geo.features.feature", None).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "https://example.org/bblocks/doc/feature/");
}

#[tokio::test]
async fn test_accept_header_negotiation() {
    let resp = get(
        app(),
        "/bb/ogc.geo.features.feature",
        Some("application/json;q=0.9,text/html;q=0.1"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&resp),
        "https://example.org/bblocks/doc/feature/index.json"
    );

    let resp = get(
        app(),
        "/bb/ogc.geo.features.feature",
        Some("application/schema+yaml"),
    )
    .await;
    assert_eq!(
        location(&resp),
        "https://example.org/bblocks/build/feature/schema.yaml"
    );
}

#[tokio::test]
async fn test_override_beats_accept() {
    let resp = get(
        app(),
        "/bb/ogc.geo.features.feature?_mediatype=text/markdown",
        Some("application/json"),
    )
    .await;
    assert_eq!(
        location(&resp),
        "https://example.org/bblocks/doc/feature/index.md"
    );
}

#[tokio::test]
async fn test_relative_schema_resolved_against_register() {
    let resp = get(
        app(),
        "/bb/ogc.geo.common.point",
        Some("application/schema+json"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&resp),
        "https://example.org/bblocks/point/schema.json"
    );
}

#[tokio::test]
async fn test_missing_documentation_is_404() {
    let resp = get(app(), "/bb/ogc.geo.common.point", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(resp).await["detail"],
        "Documentation for type text/html not found"
    );
}

fn app_with_catalog(catalog: &str) -> axum::Router {
    let store = Arc::new(CatalogStore::with_snapshot(CatalogSnapshot::from_records(
        parse_catalog(catalog.as_bytes()).unwrap(),
        Utc::now(),
    )));
    let resolver = Resolver::new(
        MediaTypeTable::for_profile(Profile::Current),
        DocsStrategy::Explicit,
        Url::parse("https://example.org/bblocks/").unwrap(),
    );
    build_router(
        AppState::new(store, resolver, reqwest::Client::new(), SchemaDelivery::Redirect),
        "",
    )
}

#[tokio::test]
async fn test_control_characters_in_catalog_url_are_stripped() {
    let app = app_with_catalog(
        r#"[{"itemIdentifier":"ogc.z","ldContext":"https://x/ctx\n.jsonld"}]"#,
    );
    let resp = get(app, "/bb/ogc.z?_mediatype=application/ld%2Bjson", None).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "https://x/ctx.jsonld");
}

#[tokio::test]
async fn test_blank_catalog_urls_are_404() {
    let app = app_with_catalog(
        r#"[{"itemIdentifier":"ogc.y","documentation":{"slate":{"url":""}},"schema":{"json":""}}]"#,
    );

    let resp = get(app.clone(), "/bb/ogc.y", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = get(app, "/bb/ogc.y?_mediatype=application/schema%2Bjson", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(resp).await["detail"],
        "Schema for type application/json not found"
    );
}

#[tokio::test]
async fn test_root_path_prefix() {
    let resp = get(build_app("/api", SchemaDelivery::Redirect), "/api/list", None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = get(build_app("/api", SchemaDelivery::Redirect), "/list", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_schema_proxy() {
    let mut upstream = Server::new_async().await;
    let mock = upstream
        .mock("GET", "/schemas/thing.yaml")
        .with_status(200)
        .with_body("type: object\n")
        .create_async()
        .await;

    let catalog = format!(
        r#"[{{"itemIdentifier": "ogc.thing", "schema": ["{}/schemas/thing.yaml"]}}]"#,
        upstream.url()
    );
    let store = Arc::new(CatalogStore::with_snapshot(CatalogSnapshot::from_records(
        parse_catalog(catalog.as_bytes()).unwrap(),
        Utc::now(),
    )));
    let resolver = Resolver::new(
        MediaTypeTable::for_profile(Profile::Current),
        DocsStrategy::Explicit,
        Url::parse("https://example.org/bblocks/").unwrap(),
    );
    let app = build_router(
        AppState::new(store, resolver, reqwest::Client::new(), SchemaDelivery::Proxy),
        "",
    );

    let resp = get(app.clone(), "/bb/ogc.thing", Some("application/schema+yaml")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/yaml"
    );
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"type: object\n");
    mock.assert_async().await;

    // Only schemas are proxied; a missing one is still a plain 404.
    let resp = get(app, "/bb/ogc.thing", Some("application/schema+json")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_schema_proxy_upstream_failure_is_502() {
    let mut upstream = Server::new_async().await;
    let _mock = upstream
        .mock("GET", "/schemas/broken.json")
        .with_status(500)
        .create_async()
        .await;

    let catalog = format!(
        r#"[{{"itemIdentifier": "ogc.broken", "schema": "{}/schemas/broken.json"}}]"#,
        upstream.url()
    );
    let store = Arc::new(CatalogStore::with_snapshot(CatalogSnapshot::from_records(
        parse_catalog(catalog.as_bytes()).unwrap(),
        Utc::now(),
    )));
    let resolver = Resolver::new(
        MediaTypeTable::for_profile(Profile::Current),
        DocsStrategy::Explicit,
        Url::parse("https://example.org/bblocks/").unwrap(),
    );
    let app = build_router(
        AppState::new(store, resolver, reqwest::Client::new(), SchemaDelivery::Proxy),
        "",
    );

    let resp = get(app, "/bb/ogc.broken?_mediatype=application/schema%2Bjson", None).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}
