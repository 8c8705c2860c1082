//! Compliance section identifiers.
//!
//! Test binaries built for different harnesses name their host-interface
//! sections differently, so the four names are configurable from TOML:
//!
//! ```toml
//! tohost = ".tohost"
//! fromhost = ".fromhost"
//! sig_begin = ".begin_signature"
//! sig_end = ".end_signature"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::compliance::HostSymbol;
use crate::error::LoadError;

/// Section names bound to each [`HostSymbol`]. Matching is exact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ComplianceConfig {
    pub tohost: String,
    pub fromhost: String,
    pub sig_begin: String,
    pub sig_end: String,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            tohost: ".tohost".into(),
            fromhost: ".fromhost".into(),
            sig_begin: ".begin_signature".into(),
            sig_end: ".end_signature".into(),
        }
    }
}

impl ComplianceConfig {
    /// Parse a config from a TOML file path.
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse a config from a TOML string. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, LoadError> {
        toml::from_str(content).map_err(|e| LoadError::Config(format!("invalid TOML: {e}")))
    }

    /// Section name bound to `symbol`.
    pub fn name_of(&self, symbol: HostSymbol) -> &str {
        match symbol {
            HostSymbol::ToHost => &self.tohost,
            HostSymbol::FromHost => &self.fromhost,
            HostSymbol::SigBegin => &self.sig_begin,
            HostSymbol::SigEnd => &self.sig_end,
        }
    }
}
