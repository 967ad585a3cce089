// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR engine integration
//!
//! Components:
//! - `engine` - `OcrEngine` / `OcrEngineFactory` traits and the model directory layout
//! - `pool` - per-language engine cache with per-language serialization
//! - `tesseract` - Tesseract backend (requires the `tesseract` feature)

pub mod engine;
pub mod pool;
#[cfg(feature = "tesseract")]
pub mod tesseract;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

pub use engine::{normalize_text, ModelDirectory, OcrEngine, OcrEngineFactory, UnavailableEngineFactory};
pub use pool::{EngineHandle, OcrEnginePool};
#[cfg(feature = "tesseract")]
pub use tesseract::{TesseractEngine, TesseractEngineFactory};

/// Default recognition language
pub const DEFAULT_LANGUAGE: &str = "kor";

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR model for '{language}' not found at {}", path.display())]
    ModelMissing { language: String, path: PathBuf },

    #[error("Invalid OCR language tag '{0}'")]
    InvalidLanguage(String),

    #[error("Failed to initialize OCR engine for '{language}': {message}")]
    Initialization { language: String, message: String },

    #[error("OCR recognition failed: {0}")]
    Recognition(String),

    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),
}

/// Engine factory for this build: Tesseract when compiled in, otherwise a
/// factory that reports every language as unavailable
pub fn default_factory(models: ModelDirectory) -> Arc<dyn OcrEngineFactory> {
    #[cfg(feature = "tesseract")]
    {
        Arc::new(TesseractEngineFactory::new(models))
    }
    #[cfg(not(feature = "tesseract"))]
    {
        Arc::new(UnavailableEngineFactory::new(models))
    }
}
