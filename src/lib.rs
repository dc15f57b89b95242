//! Building block register API.
//!
//! Caches the building block register (`register.json`) in memory and serves
//! content-negotiated redirects to each block's documentation, schemas and
//! JSON-LD context.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod media_type;
pub mod negotiate;
pub mod resolver;

pub use api::{build_router, AppState};
pub use catalog::{CatalogRefresher, CatalogStore};
pub use config::ServiceConfig;
pub use error::ApiError;
pub use resolver::Resolver;
