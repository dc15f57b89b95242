//! Building block records as published in `register.json`.
//!
//! The register format has changed shape over time, most visibly in the
//! `schema` field. Everything is canonicalized here, at ingestion, so the
//! resolver only ever sees one representation.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

/// One schema URL together with the dialect subtype it serves (`json`, `yaml`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaLink {
    pub subtype: String,
    pub url: String,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingBlock {
    pub item_identifier: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Schema URLs in register order.
    #[serde(default, deserialize_with = "schema_links")]
    pub schema: Vec<SchemaLink>,

    /// Documentation URL by kind (`slate`, `markdown`, `json-full`).
    #[serde(default, deserialize_with = "documentation_links")]
    pub documentation: BTreeMap<String, String>,

    #[serde(default, deserialize_with = "optional_url")]
    pub ld_context: Option<String>,
}

impl BuildingBlock {
    pub fn new(item_identifier: impl Into<String>) -> Self {
        Self {
            item_identifier: item_identifier.into(),
            name: None,
            schema: Vec::new(),
            documentation: BTreeMap::new(),
            ld_context: None,
        }
    }

    /// Path derived from the identifier: the leading namespace segment is
    /// dropped and the rest joined with `/` (`ogc.geo.point` → `geo/point`).
    pub fn path(&self) -> String {
        identifier_path(&self.item_identifier)
    }

    /// First schema URL for a subtype.
    pub fn schema_url(&self, subtype: &str) -> Option<&str> {
        self.schema
            .iter()
            .find(|link| link.subtype == subtype)
            .map(|link| link.url.as_str())
    }

    pub fn documentation_url(&self, kind: &str) -> Option<&str> {
        self.documentation.get(kind).map(String::as_str)
    }
}

pub fn identifier_path(identifier: &str) -> String {
    identifier
        .split('.')
        .skip(1)
        .collect::<Vec<_>>()
        .join("/")
}

/// Subtype for a schema file, from its extension.
fn subtype_from_extension(url: &str) -> Option<&'static str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let (_, ext) = path.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "json" => Some("json"),
        "yaml" | "yml" => Some("yaml"),
        _ => None,
    }
}

/// Subtype for a mapping key; accepts both `json` and `application/json`.
/// YAML aliases collapse to `yaml`, as `.yml` does for extensions.
fn subtype_from_key(key: &str) -> String {
    let key = key.trim().to_ascii_lowercase();
    let subtype = key.strip_prefix("application/").unwrap_or(&key);
    match subtype {
        "yml" | "x-yaml" | "x-yml" => "yaml".to_string(),
        other => other.to_string(),
    }
}

/// Blank URLs count as absent.
fn non_empty(url: &str) -> Option<&str> {
    if url.trim().is_empty() {
        None
    } else {
        Some(url)
    }
}

fn link_from_url(url: &str) -> Option<SchemaLink> {
    match subtype_from_extension(url) {
        Some(subtype) => Some(SchemaLink {
            subtype: subtype.to_string(),
            url: url.to_string(),
        }),
        None => {
            debug!(url = %url, "Schema URL has no recognizable extension, skipping");
            None
        }
    }
}

pub(crate) fn canonical_schema(value: &Value) -> Vec<SchemaLink> {
    match value {
        Value::String(url) => link_from_url(url).into_iter().collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(url) => link_from_url(url),
                other => {
                    debug!(?other, "Ignoring non-string schema entry");
                    None
                }
            })
            .collect(),
        Value::Object(map) => map
            .iter()
            .filter_map(|(key, url)| match url {
                Value::String(url) => non_empty(url).map(|url| SchemaLink {
                    subtype: subtype_from_key(key),
                    url: url.to_string(),
                }),
                other => {
                    debug!(key = %key, ?other, "Ignoring non-string schema mapping value");
                    None
                }
            })
            .collect(),
        Value::Null => Vec::new(),
        other => {
            debug!(?other, "Unrecognized schema shape");
            Vec::new()
        }
    }
}

fn schema_links<'de, D>(deserializer: D) -> Result<Vec<SchemaLink>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(canonical_schema(&value))
}

fn documentation_links<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Object(map) = value else {
        return Ok(BTreeMap::new());
    };
    Ok(map
        .into_iter()
        .filter_map(|(kind, entry)| {
            let url = non_empty(entry.get("url")?.as_str()?)?.to_string();
            Some((kind, url))
        })
        .collect())
}

fn optional_url<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => non_empty(&s).map(str::to_string),
        _ => None,
    })
}
