// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tesseract backend via leptess

use image::RgbaImage;
use leptess::LepTess;
use tracing::info;

use super::engine::{ModelDirectory, OcrEngine, OcrEngineFactory};
use super::OcrError;
use crate::vision::image_utils::encode_png;

/// One Tesseract API instance bound to a language tag
pub struct TesseractEngine {
    api: LepTess,
}

// SAFETY: a TessBaseAPI has no thread affinity; it only must not be used
// from two threads at the same time. The pool guarantees that by handing out
// `&mut self` exclusively under the per-language mutex.
unsafe impl Send for TesseractEngine {}

impl OcrEngine for TesseractEngine {
    fn recognize(&mut self, image: &RgbaImage) -> Result<String, OcrError> {
        let png = encode_png(image).map_err(|e| OcrError::Recognition(e.to_string()))?;
        self.api
            .set_image_from_mem(&png)
            .map_err(|e| OcrError::Recognition(format!("{:?}", e)))?;
        self.api
            .get_utf8_text()
            .map_err(|e| OcrError::Recognition(e.to_string()))
    }
}

/// Creates [`TesseractEngine`]s from a tessdata directory
#[derive(Debug, Clone)]
pub struct TesseractEngineFactory {
    models: ModelDirectory,
}

impl TesseractEngineFactory {
    pub fn new(models: ModelDirectory) -> Self {
        Self { models }
    }
}

impl OcrEngineFactory for TesseractEngineFactory {
    fn create(&self, language: &str) -> Result<Box<dyn OcrEngine>, OcrError> {
        self.models.check(language)?;

        let data_path = self.models.root().to_string_lossy().into_owned();
        info!("Loading tesseract '{}' from {}", language, data_path);

        let api = LepTess::new(Some(&data_path), language).map_err(|e| {
            OcrError::Initialization {
                language: language.to_string(),
                message: format!("{:?}", e),
            }
        })?;

        Ok(Box::new(TesseractEngine { api }))
    }

    fn name(&self) -> &'static str {
        "tesseract"
    }
}
