// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR engine traits and the on-disk model layout

use std::fs;
use std::path::{Path, PathBuf};

use image::RgbaImage;

use super::OcrError;

/// File extension of a language model inside the model directory
pub const MODEL_EXTENSION: &str = "traineddata";

/// A language-bound text recognizer.
///
/// Implementations are not expected to tolerate concurrent use; the pool
/// hands out `&mut` access under a per-language lock.
pub trait OcrEngine: Send {
    /// Extract raw text from `image`
    fn recognize(&mut self, image: &RgbaImage) -> Result<String, OcrError>;
}

/// Builds engines for a language tag such as `eng` or `kor+eng`
pub trait OcrEngineFactory: Send + Sync {
    fn create(&self, language: &str) -> Result<Box<dyn OcrEngine>, OcrError>;

    /// Backend name for logs and health output
    fn name(&self) -> &'static str;
}

/// Directory holding `<lang>.traineddata` files
#[derive(Debug, Clone)]
pub struct ModelDirectory {
    root: PathBuf,
}

impl ModelDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the model file for a single language component
    pub fn model_path(&self, language: &str) -> PathBuf {
        self.root.join(format!("{}.{}", language, MODEL_EXTENSION))
    }

    /// Split a `+`-joined tag into components. Components are restricted to
    /// ASCII alphanumerics and `_` so a tag can never escape the directory.
    pub fn components(tag: &str) -> Result<Vec<&str>, OcrError> {
        let parts: Vec<&str> = tag.split('+').map(str::trim).collect();
        let valid = parts.iter().all(|part| {
            !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
        if !valid {
            return Err(OcrError::InvalidLanguage(tag.to_string()));
        }
        Ok(parts)
    }

    /// Fail with `ModelMissing` unless every component of `tag` has a model file
    pub fn check(&self, tag: &str) -> Result<(), OcrError> {
        for language in Self::components(tag)? {
            let path = self.model_path(language);
            if !path.is_file() {
                return Err(OcrError::ModelMissing {
                    language: language.to_string(),
                    path,
                });
            }
        }
        Ok(())
    }

    /// Languages with a model file present, sorted
    pub fn available_languages(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return Vec::new();
        };

        let mut languages: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(MODEL_EXTENSION))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        languages.sort();
        languages
    }
}

/// Trim surrounding whitespace and turn `\r\n` / `\r` into `\n`
pub fn normalize_text(raw: &str) -> String {
    raw.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

/// Factory used when no OCR backend is compiled in.
///
/// It still performs the model check, so a missing model is reported as
/// such, and otherwise answers with `EngineUnavailable`.
#[derive(Debug, Clone)]
pub struct UnavailableEngineFactory {
    models: ModelDirectory,
}

impl UnavailableEngineFactory {
    pub fn new(models: ModelDirectory) -> Self {
        Self { models }
    }
}

impl OcrEngineFactory for UnavailableEngineFactory {
    fn create(&self, language: &str) -> Result<Box<dyn OcrEngine>, OcrError> {
        self.models.check(language)?;
        Err(OcrError::EngineUnavailable(
            "built without the `tesseract` feature".to_string(),
        ))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}
