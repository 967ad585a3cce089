// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration
//!
//! Values come from `ServiceConfig::default()`, optionally replaced by a TOML
//! file, and finally overridden by CLI flags / environment variables (see
//! `cli::ServeArgs`).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vision::image_utils::MAX_IMAGE_SIZE;

/// Mirror of the public tessdata repository
pub const DEFAULT_MODEL_BASE_URL: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

/// Envelope name existing clients send
pub const DEFAULT_SERVICE_NAME: &str = "MetaFrm.Service.ImageService";

/// Largest width or height a generated symbol may request
pub const DEFAULT_MAX_GENERATE_SIDE: u32 = 4096;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value for '{field}': {message}")]
    Invalid { field: String, message: String },
}

/// Top-level service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Name a request envelope must carry to be accepted
    pub service_name: String,
    /// HTTP listen address
    pub listen_addr: String,
    /// Directory with `<lang>.traineddata` files
    pub model_dir: PathBuf,
    /// Language used when a command has no `Language` field
    pub default_language: String,
    /// Band count used when a command has no `Seperate` field
    pub default_tile_count: u32,
    /// Maximum decoded size of an input image
    pub max_image_bytes: usize,
    /// Upper bound on `Width` and `Height` of a generated symbol
    pub max_generate_side: u32,
    pub provision: ProvisionConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            listen_addr: "127.0.0.1:8080".to_string(),
            model_dir: PathBuf::from("./tessdata"),
            default_language: "kor".to_string(),
            default_tile_count: 4,
            max_image_bytes: MAX_IMAGE_SIZE,
            max_generate_side: DEFAULT_MAX_GENERATE_SIDE,
            provision: ProvisionConfig::default(),
        }
    }
}

/// Startup download of missing language models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    pub enabled: bool,
    pub base_url: String,
    pub languages: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_MODEL_BASE_URL.to_string(),
            languages: vec![
                "eng".to_string(),
                "kor".to_string(),
                "kor_vert".to_string(),
            ],
            timeout_secs: 300,
        }
    }
}

impl ServiceConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(invalid("service_name", "must not be empty"));
        }
        if self.default_language.trim().is_empty() {
            return Err(invalid("default_language", "must not be empty"));
        }
        if self.default_tile_count == 0 {
            return Err(invalid("default_tile_count", "must be at least 1"));
        }
        if self.max_image_bytes == 0 {
            return Err(invalid("max_image_bytes", "must be positive"));
        }
        if self.max_generate_side == 0 {
            return Err(invalid("max_generate_side", "must be at least 1"));
        }
        if self.provision.enabled && self.provision.base_url.trim().is_empty() {
            return Err(invalid("provision.base_url", "required when provisioning is enabled"));
        }
        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        message: message.to_string(),
    }
}
