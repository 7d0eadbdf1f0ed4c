//! Sandbox configuration (`warden.toml`).

use crate::engine::Budget;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use warden_engine::hardening::HardeningSet;
use warden_engine::transform::TransformOptions;

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SandboxOptions {
    /// Wall-clock budget of one evaluation, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Allow guest scripts that declare async functions.
    pub allow_async: bool,

    /// Script name used when an evaluation does not give one.
    pub filename: String,

    /// Reuse transform results for identical sources.
    pub transform_cache: bool,

    /// Hardenings installed into the guest realm.
    pub hardening: HardeningSet,
}

impl Default for SandboxOptions {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            allow_async: true,
            filename: "vm.js".to_string(),
            transform_cache: true,
            hardening: HardeningSet::default(),
        }
    }
}

impl SandboxOptions {
    pub fn from_file(path: &Path) -> Result<Self, OptionsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, OptionsError> {
        let options: SandboxOptions = toml::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.timeout_ms == Some(0) {
            return Err(OptionsError::Invalid("timeout_ms must be greater than zero".to_string()));
        }
        if self.filename.trim().is_empty() {
            return Err(OptionsError::Invalid("filename must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String, OptionsError> {
        toml::to_string(self).map_err(|e| OptionsError::Invalid(e.to_string()))
    }

    pub fn budget(&self) -> Budget {
        Budget {
            timeout: self.timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            allow_async: self.allow_async,
        }
    }
}
