//! Supported media types and how each one is resolved.
//!
//! The set of media types the service accepts has grown over time. It is kept
//! as a [`MediaTypeTable`] so that the negotiator and the resolver read from the
//! same configuration instead of hardcoded literals. Versions are additive:
//! a newer profile never drops a media type an older one served.

use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;

/// Documentation kind as keyed in a record's `documentation` mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocKind {
    Slate,
    Markdown,
    JsonFull,
}

impl DocKind {
    pub fn key(self) -> &'static str {
        match self {
            DocKind::Slate => "slate",
            DocKind::Markdown => "markdown",
            DocKind::JsonFull => "json-full",
        }
    }
}

impl fmt::Display for DocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// How a negotiated media type turns into a target URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Redirect to a documentation page of the given kind.
    Documentation(DocKind),
    /// Redirect to (or proxy) the schema for a dialect subtype, e.g. `json`.
    Schema(String),
    /// Redirect to the record's JSON-LD context.
    LdContext,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTypeEntry {
    pub name: String,
    pub strategy: Strategy,
}

impl MediaTypeEntry {
    pub fn new(name: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            name: name.into(),
            strategy,
        }
    }
}

/// Versioned media type profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    /// Documentation and schemas only, documentation URLs derived from the
    /// register base URL.
    Legacy,
    /// Adds `application/json` (full JSON documentation); documentation URLs
    /// are read from the record.
    #[default]
    Current,
}

impl Profile {
    pub fn as_str(self) -> &'static str {
        match self {
            Profile::Legacy => "legacy",
            Profile::Current => "current",
        }
    }
}

impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(Profile::Legacy),
            "current" => Ok(Profile::Current),
            other => Err(ConfigError::Invalid {
                var: "BBLOCKS_PROFILE",
                value: other.to_string(),
                reason: "expected `legacy` or `current`".to_string(),
            }),
        }
    }
}

pub const DEFAULT_MEDIA_TYPE: &str = "text/html";

/// Ordered table of supported media types.
///
/// Order matters: it is the order reported by `GET /` and the final
/// tie-breaker during `Accept` negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTypeTable {
    entries: Vec<MediaTypeEntry>,
    default: String,
}

impl MediaTypeTable {
    /// Build a table. The default must be one of the entries.
    pub fn new(entries: Vec<MediaTypeEntry>, default: &str) -> Result<Self, ConfigError> {
        if !entries.iter().any(|e| e.name == default) {
            return Err(ConfigError::DefaultMediaTypeMissing(default.to_string()));
        }
        Ok(Self {
            entries,
            default: default.to_string(),
        })
    }

    pub fn for_profile(profile: Profile) -> Self {
        let mut entries = vec![
            MediaTypeEntry::new("text/html", Strategy::Documentation(DocKind::Slate)),
            MediaTypeEntry::new("text/markdown", Strategy::Documentation(DocKind::Markdown)),
            MediaTypeEntry::new("application/ld+json", Strategy::LdContext),
            MediaTypeEntry::new("application/schema+json", Strategy::Schema("json".into())),
            MediaTypeEntry::new("application/schema+yaml", Strategy::Schema("yaml".into())),
        ];
        if profile == Profile::Current {
            entries.push(MediaTypeEntry::new(
                "application/json",
                Strategy::Documentation(DocKind::JsonFull),
            ));
        }
        Self {
            entries,
            default: DEFAULT_MEDIA_TYPE.to_string(),
        }
    }

    pub fn entries(&self) -> &[MediaTypeEntry] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn default_entry(&self) -> &MediaTypeEntry {
        // `new` and `for_profile` both guarantee the default is present.
        self.get(&self.default).unwrap_or(&self.entries[0])
    }

    /// Exact, case-sensitive lookup.
    pub fn get(&self, name: &str) -> Option<&MediaTypeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

impl Default for MediaTypeTable {
    fn default() -> Self {
        Self::for_profile(Profile::default())
    }
}

/// Canonical content type for a schema subtype.
pub fn schema_content_type(subtype: &str) -> String {
    match subtype {
        "json" => "application/json".to_string(),
        "yaml" => "application/yaml".to_string(),
        other => format!("application/{other}"),
    }
}
