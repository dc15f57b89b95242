//! Redirect resolver: picks the target URL for a building block and a
//! negotiated media type.
//!
//! Pure over already-fetched data; never performs I/O.

use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::catalog::record::BuildingBlock;
use crate::config::DocsStrategy;
use crate::media_type::{schema_content_type, DocKind, MediaTypeTable, Strategy};

/// Which representation a record was missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Representation {
    Documentation(String),
    Schema(String),
    LdContext,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{}", not_found_detail(.media_type, .missing))]
    NotFound {
        media_type: String,
        missing: Representation,
    },

    #[error("Unsupported media type")]
    UnsupportedMediaType(String),
}

fn not_found_detail(media_type: &str, missing: &Representation) -> String {
    match missing {
        Representation::Documentation(_) => {
            format!("Documentation for type {media_type} not found")
        }
        Representation::Schema(subtype) => {
            format!("Schema for type {} not found", schema_content_type(subtype))
        }
        Representation::LdContext => "No JSON-LD context found for the building block".into(),
    }
}

/// Where to send the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub url: String,
    /// Set for schema targets: the content type to declare if the HTTP layer
    /// proxies the document instead of redirecting.
    pub content_type: Option<String>,
}

impl Target {
    fn redirect(url: String) -> Self {
        Self {
            url,
            content_type: None,
        }
    }
}

/// Resolver settings shared by every request.
#[derive(Debug, Clone)]
pub struct Resolver {
    media_types: MediaTypeTable,
    docs: DocsStrategy,
    /// Register base URL; relative record URLs and templated documentation
    /// paths are resolved against it.
    base_url: Url,
}

impl Resolver {
    pub fn new(media_types: MediaTypeTable, docs: DocsStrategy, base_url: Url) -> Self {
        Self {
            media_types,
            docs,
            base_url,
        }
    }

    pub fn media_types(&self) -> &MediaTypeTable {
        &self.media_types
    }

    /// Like [`Resolver::resolve`], with relative record URLs made absolute
    /// against the register base URL. This is what gets sent to clients.
    pub fn locate(&self, record: &BuildingBlock, media_type: &str) -> Result<Target, ResolveError> {
        self.resolve(record, media_type).map(|target| Target {
            url: self.absolute(&target.url),
            ..target
        })
    }

    /// Resolve `media_type` (already negotiated) for `record`. URLs are
    /// returned as the record states them.
    pub fn resolve(&self, record: &BuildingBlock, media_type: &str) -> Result<Target, ResolveError> {
        let Some(entry) = self.media_types.get(media_type) else {
            return Err(ResolveError::UnsupportedMediaType(media_type.to_string()));
        };

        let not_found = |missing: Representation| ResolveError::NotFound {
            media_type: media_type.to_string(),
            missing,
        };

        match &entry.strategy {
            Strategy::Documentation(kind) => self
                .documentation_url(record, *kind)
                .map(Target::redirect)
                .ok_or_else(|| not_found(Representation::Documentation(kind.key().into()))),

            Strategy::Schema(subtype) => record
                .schema_url(subtype)
                .map(|url| Target {
                    url: url.to_string(),
                    content_type: Some(schema_content_type(subtype)),
                })
                .ok_or_else(|| not_found(Representation::Schema(subtype.clone()))),

            Strategy::LdContext => record
                .ld_context
                .as_deref()
                .map(|url| Target::redirect(url.to_string()))
                .ok_or_else(|| not_found(Representation::LdContext)),
        }
    }

    fn documentation_url(&self, record: &BuildingBlock, kind: DocKind) -> Option<String> {
        let explicit = || record.documentation_url(kind.key()).map(str::to_string);
        match self.docs {
            DocsStrategy::Explicit => explicit(),
            DocsStrategy::Templated => self.templated_documentation(record, kind),
            DocsStrategy::ExplicitThenTemplated => {
                explicit().or_else(|| self.templated_documentation(record, kind))
            }
        }
    }

    fn templated_documentation(&self, record: &BuildingBlock, kind: DocKind) -> Option<String> {
        let path = record.path();
        if path.is_empty() {
            return None;
        }
        let relative = match kind {
            DocKind::Slate => format!("generateddocs/slate-build/{path}/"),
            DocKind::Markdown => format!("generateddocs/markdown/{path}/index.md"),
            DocKind::JsonFull => format!("generateddocs/json-full/{path}/index.json"),
        };
        Some(self.absolute(&relative))
    }

    /// Resolve a possibly-relative URL against the register base. The result
    /// is the serialized `Url`, so stray whitespace in the record is dropped.
    /// Anything that fails to join is passed through untouched.
    fn absolute(&self, url: &str) -> String {
        if let Ok(parsed) = Url::parse(url) {
            return parsed.into();
        }
        match self.base_url.join(url) {
            Ok(joined) => joined.into(),
            Err(e) => {
                debug!(url, error = %e, "Could not resolve relative URL");
                url.to_string()
            }
        }
    }
}
