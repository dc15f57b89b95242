//! Service configuration.
//!
//! Reads config from env vars (after loading an optional `.env`):
//!   BBLOCKS_REGISTER_BASE_URL      - register base URL (default: OGC bblocks site)
//!   BBLOCKS_ROOT_PATH              - route prefix (default: none)
//!   BBLOCKS_BIND_ADDR              - listen address (default: 0.0.0.0:8000)
//!   BBLOCKS_REFRESH_INTERVAL_SECS  - catalog refresh period (default: 3600)
//!   BBLOCKS_STARTUP_TIMEOUT_SECS   - bound on the startup fetch (default: 30)
//!   BBLOCKS_FETCH_TIMEOUT_SECS     - upstream HTTP timeout (default: 30)
//!   BBLOCKS_PROFILE                - `legacy` | `current` (default: current)
//!   BBLOCKS_DOCS_STRATEGY          - `explicit` | `templated` | `explicit-then-templated`
//!   BBLOCKS_SCHEMA_DELIVERY        - `redirect` | `proxy` (default: redirect)

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::media_type::{MediaTypeTable, Profile};

pub const DEFAULT_REGISTER_BASE_URL: &str = "https://opengeospatial.github.io/bblocks/";
pub const CATALOG_DOCUMENT: &str = "register.json";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60 * 60;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid register base URL: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error("default media type {0} is not in the supported set")]
    DefaultMediaTypeMissing(String),
}

/// Where documentation URLs come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocsStrategy {
    /// Read `documentation.<kind>.url` from the record.
    Explicit,
    /// Derive the URL from the register base URL and the identifier path.
    Templated,
    /// Explicit URL when the record has one, templated otherwise.
    ExplicitThenTemplated,
}

impl DocsStrategy {
    pub fn profile_default(profile: Profile) -> Self {
        match profile {
            Profile::Legacy => DocsStrategy::Templated,
            Profile::Current => DocsStrategy::Explicit,
        }
    }
}

impl FromStr for DocsStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "explicit" => Ok(DocsStrategy::Explicit),
            "templated" => Ok(DocsStrategy::Templated),
            "explicit-then-templated" => Ok(DocsStrategy::ExplicitThenTemplated),
            other => Err(ConfigError::Invalid {
                var: "BBLOCKS_DOCS_STRATEGY",
                value: other.to_string(),
                reason: "expected `explicit`, `templated` or `explicit-then-templated`".into(),
            }),
        }
    }
}

/// What the HTTP layer does with a resolved schema URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaDelivery {
    #[default]
    Redirect,
    /// Fetch the schema and return it with the subtype's canonical content type.
    Proxy,
}

impl FromStr for SchemaDelivery {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redirect" => Ok(SchemaDelivery::Redirect),
            "proxy" => Ok(SchemaDelivery::Proxy),
            other => Err(ConfigError::Invalid {
                var: "BBLOCKS_SCHEMA_DELIVERY",
                value: other.to_string(),
                reason: "expected `redirect` or `proxy`".into(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Always ends with `/`.
    pub register_base_url: Url,
    /// Empty, or `/prefix` without a trailing slash.
    pub root_path: String,
    pub bind_addr: String,
    pub refresh_interval: Duration,
    pub startup_timeout: Duration,
    pub fetch_timeout: Duration,
    pub profile: Profile,
    pub docs_strategy: DocsStrategy,
    pub schema_delivery: SchemaDelivery,
}

impl ServiceConfig {
    /// Load from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset and empty values fall back to
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let register_base_url = parse_base_url(
            get("BBLOCKS_REGISTER_BASE_URL")
                .as_deref()
                .unwrap_or(DEFAULT_REGISTER_BASE_URL),
        )?;

        let profile = match get("BBLOCKS_PROFILE") {
            Some(v) => v.parse()?,
            None => Profile::default(),
        };
        let docs_strategy = match get("BBLOCKS_DOCS_STRATEGY") {
            Some(v) => v.parse()?,
            None => DocsStrategy::profile_default(profile),
        };
        let schema_delivery = match get("BBLOCKS_SCHEMA_DELIVERY") {
            Some(v) => v.parse()?,
            None => SchemaDelivery::default(),
        };

        Ok(Self {
            register_base_url,
            root_path: get("BBLOCKS_ROOT_PATH")
                .map(|v| normalize_root_path(&v))
                .unwrap_or_default(),
            bind_addr: get("BBLOCKS_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            refresh_interval: secs(&get, "BBLOCKS_REFRESH_INTERVAL_SECS")?
                .unwrap_or(Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS)),
            startup_timeout: secs(&get, "BBLOCKS_STARTUP_TIMEOUT_SECS")?
                .unwrap_or(Duration::from_secs(30)),
            fetch_timeout: secs(&get, "BBLOCKS_FETCH_TIMEOUT_SECS")?
                .unwrap_or(Duration::from_secs(30)),
            profile,
            docs_strategy,
            schema_delivery,
        })
    }

    /// URL of the catalog document.
    pub fn catalog_url(&self) -> Result<Url, ConfigError> {
        Ok(self.register_base_url.join(CATALOG_DOCUMENT)?)
    }

    pub fn media_types(&self) -> MediaTypeTable {
        MediaTypeTable::for_profile(self.profile)
    }
}

fn secs<F>(get: &F, var: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match get(var) {
        None => Ok(None),
        Some(v) => match v.trim().parse::<u64>() {
            Ok(0) => Err(ConfigError::Invalid {
                var,
                value: v,
                reason: "must be greater than zero".into(),
            }),
            Ok(n) => Ok(Some(Duration::from_secs(n))),
            Err(e) => Err(ConfigError::Invalid {
                var,
                value: v,
                reason: e.to_string(),
            }),
        },
    }
}

/// Parse a base URL, appending the trailing `/` that `Url::join` needs to keep
/// the last path segment.
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let raw = raw.trim();
    if raw.ends_with('/') {
        Ok(Url::parse(raw)?)
    } else {
        Ok(Url::parse(&format!("{raw}/"))?)
    }
}

fn normalize_root_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
