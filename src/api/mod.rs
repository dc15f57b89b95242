//! HTTP surface.
//!
//! GET /          - service name and accepted media types
//! GET /list      - sorted building block identifiers
//! GET /bb/:id    - content-negotiated redirect (or schema proxy)

pub mod handlers;
pub mod router;

use std::sync::Arc;

use reqwest::Client;

use crate::catalog::CatalogStore;
use crate::config::SchemaDelivery;
use crate::resolver::Resolver;

pub use router::build_router;

pub const SERVICE_NAME: &str = "bblocks-api";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CatalogStore>,
    pub resolver: Arc<Resolver>,
    /// Used only for [`SchemaDelivery::Proxy`].
    pub client: Client,
    pub schema_delivery: SchemaDelivery,
}

impl AppState {
    pub fn new(
        store: Arc<CatalogStore>,
        resolver: Resolver,
        client: Client,
        schema_delivery: SchemaDelivery,
    ) -> Self {
        Self {
            store,
            resolver: Arc::new(resolver),
            client,
            schema_delivery,
        }
    }
}
