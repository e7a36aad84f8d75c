//! Process configuration read from `config.toml`.
//!
//! Only two knobs exist and both are required:
//!
//! ```toml
//! "Max.DPI" = 1200
//! "Vibrance.Bump" = false
//! ```
//!
//! The file is re-read before every crop and render, so edits take effect
//! without restarting a long-lived host.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ProxyError, Result};

/// DPI ceiling written into a fresh configuration file.
pub const DEFAULT_MAX_DPI: u32 = 1200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Crops above this resolution are downsampled and sharpened.
    #[serde(rename = "Max.DPI")]
    pub max_dpi: u32,

    /// Apply the vibrance color table to every crop.
    #[serde(rename = "Vibrance.Bump")]
    pub vibrance_bump: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_dpi: DEFAULT_MAX_DPI,
            vibrance_bump: false,
        }
    }
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ProxyError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| ProxyError::Config(e.message().to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.max_dpi == 0 {
            return Err(ProxyError::Config("Max.DPI must be positive".to_string()));
        }
        Ok(())
    }

    /// Starter file contents for a new workspace.
    pub fn default_toml() -> String {
        // Serializing a two-field struct of plain scalars cannot fail.
        toml::to_string(&Config::default()).unwrap_or_else(|_| {
            format!("\"Max.DPI\" = {DEFAULT_MAX_DPI}\n\"Vibrance.Bump\" = false\n")
        })
    }
}
