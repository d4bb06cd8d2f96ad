// src/config/frontends.rs
//! Per-frontend downstream endpoints, selected by exact match on the request
//! `Origin` header. Loaded from TOML:
//!
//! ```toml
//! [default]
//! lead_url = "https://sheets.example/lead"
//! logs_url = "https://sheets.example/logs"
//! crm_lead_url = "https://crm.example/rest/crm.lead.add.json"
//!
//! [[frontend]]
//! origin = "https://quiz.example"
//! lead_url = "https://sheets.example/other-lead"
//! logs_url = "https://sheets.example/other-logs"
//! crm_lead_url = "#"   # no CRM for this frontend
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Where to send logs and leads for one frontend. `None` disables that sink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FrontendEndpoints {
    #[serde(default, deserialize_with = "url_or_placeholder")]
    pub lead_url: Option<String>,
    #[serde(default, deserialize_with = "url_or_placeholder")]
    pub logs_url: Option<String>,
    #[serde(default, deserialize_with = "url_or_placeholder")]
    pub crm_lead_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontendRouting {
    default: FrontendEndpoints,
    by_origin: HashMap<String, FrontendEndpoints>,
}

#[derive(Deserialize)]
struct FrontendsFile {
    #[serde(default)]
    default: FrontendEndpoints,
    #[serde(default)]
    frontend: Vec<FrontendEntry>,
}

#[derive(Deserialize)]
struct FrontendEntry {
    origin: String,
    #[serde(flatten)]
    endpoints: FrontendEndpoints,
}

impl FrontendRouting {
    pub fn new(default: FrontendEndpoints) -> Self {
        Self {
            default,
            by_origin: HashMap::new(),
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>, endpoints: FrontendEndpoints) -> Self {
        self.by_origin.insert(origin.into(), endpoints);
        self
    }

    /// Exact origin match, else the default entry.
    pub fn resolve(&self, origin: Option<&str>) -> &FrontendEndpoints {
        origin
            .and_then(|o| self.by_origin.get(o))
            .unwrap_or(&self.default)
    }

    pub fn is_empty(&self) -> bool {
        self.by_origin.is_empty() && self.default == FrontendEndpoints::default()
    }

    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let file: FrontendsFile = toml::from_str(s)?;
        let mut routing = Self::new(file.default);
        for entry in file.frontend {
            let origin = entry.origin.trim().trim_end_matches('/').to_string();
            routing.by_origin.insert(origin, entry.endpoints);
        }
        Ok(routing)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// A missing file yields empty routing (no delivery); a broken one is an error.
    pub fn load_or_empty(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "frontends config not found; lead delivery disabled");
            return Ok(Self::default());
        }
        Self::load_from(path)
    }
}

// Empty strings and the "#" placeholder mean "not configured".
fn url_or_placeholder<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "#"))
}
