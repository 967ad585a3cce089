// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Startup download of OCR language models
//!
//! Runs once before the service accepts requests. A failed download is
//! reported but never fatal: the affected language simply fails later with
//! `ModelMissing`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::ProvisionConfig;
use crate::vision::ocr::ModelDirectory;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download of {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid language '{0}'")]
    InvalidLanguage(String),
}

/// What happened to each configured language
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProvisionReport {
    /// Already on disk
    pub present: Vec<String>,
    /// Fetched during this run
    pub downloaded: Vec<String>,
    /// Language and error message
    pub failed: Vec<(String, String)>,
}

impl ProvisionReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Make sure every configured language has a model file in `model_dir`.
///
/// Only creating the directory itself can fail the whole call.
pub async fn provision_models(
    model_dir: &Path,
    config: &ProvisionConfig,
) -> Result<ProvisionReport, ProvisionError> {
    tokio::fs::create_dir_all(model_dir)
        .await
        .map_err(|source| ProvisionError::Io {
            path: model_dir.to_path_buf(),
            source,
        })?;

    let models = ModelDirectory::new(model_dir);
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let mut report = ProvisionReport::default();
    for language in &config.languages {
        let path = models.model_path(language);
        if path.is_file() {
            report.present.push(language.clone());
            continue;
        }

        match download_model(&client, &config.base_url, language, &path).await {
            Ok(bytes) => {
                info!("Downloaded OCR model '{}' ({} bytes)", language, bytes);
                report.downloaded.push(language.clone());
            }
            Err(e) => {
                warn!("Could not provision OCR model '{}': {}", language, e);
                report.failed.push((language.clone(), e.to_string()));
            }
        }
    }

    Ok(report)
}

/// Fetch `<base_url>/<language>.traineddata` into `dest`.
///
/// The body is written to a `.part` file first and renamed into place, so a
/// half-written model is never picked up by the engine factory.
pub async fn download_model(
    client: &reqwest::Client,
    base_url: &str,
    language: &str,
    dest: &Path,
) -> Result<u64, ProvisionError> {
    // a single component only: no `+` tags, nothing that escapes the directory
    match ModelDirectory::components(language) {
        Ok(parts) if parts.len() == 1 => {}
        _ => return Err(ProvisionError::InvalidLanguage(language.to_string())),
    }

    let url = format!(
        "{}/{}.traineddata",
        base_url.trim_end_matches('/'),
        language
    );
    let response = client.get(&url).send().await?;
    if !response.status().is_success() {
        return Err(ProvisionError::Status {
            url,
            status: response.status().as_u16(),
        });
    }
    let body = response.bytes().await?;

    let partial = dest.with_extension("traineddata.part");
    tokio::fs::write(&partial, &body)
        .await
        .map_err(|source| ProvisionError::Io {
            path: partial.clone(),
            source,
        })?;
    tokio::fs::rename(&partial, dest)
        .await
        .map_err(|source| ProvisionError::Io {
            path: dest.to_path_buf(),
            source,
        })?;

    Ok(body.len() as u64)
}
