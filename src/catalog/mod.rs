//! Building block catalog: records, the snapshot store, and the refresher
//! that keeps it current.

pub mod record;
pub mod refresher;
pub mod store;

pub use record::{BuildingBlock, SchemaLink};
pub use refresher::{CatalogRefresher, RefreshError, RefreshOutcome};
pub use store::{CatalogSnapshot, CatalogStore};
