// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Batched command dispatch
//!
//! `ImageService::handle` walks every command set in request order and every
//! row in index order. Each row is processed in isolation: a failure is logged
//! and the batch continues with the next row.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use image::RgbaImage;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::request::{
    CommandAction, CommandDefaults, CommandRow, Keywords, RecognitionCommand, RecognizeParams,
    ServiceRequest, SkipReason,
};
use super::response::{BarcodeImageRow, BarcodeRow, ResultTables, ServiceResponse, TextRow};
use crate::config::ServiceConfig;
use crate::vision::barcode::{self, decode_symbols, BarcodeCodec, BarcodeError, GenerateParams, RxingCodec};
use crate::vision::image_utils::{decode_base64_image_with_limit, ImageError};
use crate::vision::ocr::{self, ModelDirectory, OcrEnginePool, OcrError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Unknown service '{0}'")]
    UnknownService(String),

    #[error("Image decode failed: {0}")]
    Image(#[from] ImageError),

    #[error(transparent)]
    Barcode(#[from] BarcodeError),

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error("Command panicked: {0}")]
    Panicked(String),
}

/// Entry point for batched image requests
pub struct ImageService {
    config: ServiceConfig,
    codec: Arc<dyn BarcodeCodec>,
    ocr_pool: Arc<OcrEnginePool>,
}

impl ImageService {
    pub fn new(
        config: ServiceConfig,
        codec: Arc<dyn BarcodeCodec>,
        ocr_pool: Arc<OcrEnginePool>,
    ) -> Self {
        Self {
            config,
            codec,
            ocr_pool,
        }
    }

    /// rxing codec and the OCR backend compiled into this build
    pub fn from_config(config: ServiceConfig) -> Self {
        let factory = ocr::default_factory(ModelDirectory::new(config.model_dir.clone()));
        let pool = Arc::new(OcrEnginePool::new(factory));
        Self::new(config, Arc::new(RxingCodec::new()), pool)
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn ocr_pool(&self) -> &Arc<OcrEnginePool> {
        &self.ocr_pool
    }

    fn defaults(&self) -> CommandDefaults {
        CommandDefaults {
            language: self.config.default_language.clone(),
            tile_count: self.config.default_tile_count,
            max_generate_side: self.config.max_generate_side,
        }
    }

    pub fn handle(&self, request: &ServiceRequest) -> ServiceResponse {
        if let Err(e) = self.check_envelope(request) {
            warn!("Rejected request: {}", e);
            return ServiceResponse::failed(e.to_string());
        }

        let start = Instant::now();
        let defaults = self.defaults();
        let mut tables = ResultTables::default();

        for (name, table) in &request.commands {
            for (index, row) in table.values.iter().enumerate() {
                match self.process_row(name, index, row, &defaults) {
                    Ok(rows) => tables.append(rows),
                    Err(e) => warn!("Command {}[{}] failed: {}", name, index, e),
                }
            }
        }

        info!(
            "Processed {} command rows into {} result rows {:?} in {:?}",
            request.row_count(),
            tables.row_count(),
            tables.table_names(),
            start.elapsed()
        );
        ServiceResponse::ok(tables)
    }

    fn check_envelope(&self, request: &ServiceRequest) -> Result<(), ServiceError> {
        match request.service_name.as_deref() {
            Some(name) if name == self.config.service_name => Ok(()),
            other => Err(ServiceError::UnknownService(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    /// Parse and run one row. Rows are only merged into the response when the
    /// whole row completes, so a panic never leaves half a row behind.
    fn process_row(
        &self,
        name: &str,
        index: usize,
        row: &CommandRow,
        defaults: &CommandDefaults,
    ) -> Result<ResultTables, ServiceError> {
        let command = RecognitionCommand::parse(row, defaults);
        let mut out = ResultTables::default();

        match &command.action {
            CommandAction::Skip(reason @ SkipReason::InvalidParameter { .. }) => {
                warn!("Skipping {}[{}]: {}", name, index, reason);
            }
            CommandAction::Skip(reason) => debug!("Skipping {}[{}]: {}", name, index, reason),
            CommandAction::Recognize(params) => {
                let outcome = catch_unwind(AssertUnwindSafe(|| {
                    self.recognize(name, index, command.keywords, params, &mut out)
                }));
                flatten_panic(outcome)?;
            }
            CommandAction::Generate(params) => {
                let outcome = catch_unwind(AssertUnwindSafe(|| {
                    self.generate_image(name, index, params)
                }));
                match flatten_panic(outcome) {
                    Ok(row) => out.barcode_image.push(row),
                    Err(ServiceError::Barcode(e @ BarcodeError::Validation { .. })) => {
                        warn!("Skipping {}[{}]: {}", name, index, e);
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        Ok(out)
    }

    fn recognize(
        &self,
        name: &str,
        index: usize,
        keywords: Keywords,
        params: &RecognizeParams,
        out: &mut ResultTables,
    ) -> Result<(), ServiceError> {
        let (image, info) = decode_base64_image_with_limit(&params.image, self.config.max_image_bytes)?;
        debug!(
            "{}[{}]: {}x{} {:?} image",
            name, index, info.width, info.height, info.format
        );

        if keywords.barcode {
            out.barcode = self.read_barcodes(name, index, &image, params.tile_count);
        }

        if keywords.text {
            // barcode rows survive an OCR failure on the same row
            match self.read_text(name, index, &image, &params.language) {
                Ok(row) => out.text.push(row),
                Err(e) => warn!("OCR for {}[{}] failed: {}", name, index, e),
            }
        }

        Ok(())
    }

    fn read_barcodes(
        &self,
        name: &str,
        index: usize,
        image: &RgbaImage,
        tile_count: u32,
    ) -> Vec<BarcodeRow> {
        let scan = decode_symbols(self.codec.as_ref(), image, tile_count);
        if scan.used_tiling {
            debug!(
                "{}[{}]: tiled decode over {} bands ({} failed)",
                name, index, scan.bands_scanned, scan.bands_failed
            );
        }
        scan.symbols
            .iter()
            .map(|symbol| BarcodeRow::from_symbol(name, index, symbol))
            .collect()
    }

    fn read_text(
        &self,
        name: &str,
        index: usize,
        image: &RgbaImage,
        language: &str,
    ) -> Result<TextRow, ServiceError> {
        let text = self.ocr_pool.recognize_text(language, image)?;
        Ok(TextRow {
            command_name: name.to_string(),
            row_index: index,
            text,
        })
    }

    fn generate_image(
        &self,
        name: &str,
        index: usize,
        params: &GenerateParams,
    ) -> Result<BarcodeImageRow, ServiceError> {
        let generated = barcode::generate(self.codec.as_ref(), params)?;
        debug!(
            "{}[{}]: generated {} {}x{} (trimmed: {})",
            name, index, params.format, generated.width, generated.height, generated.trimmed
        );
        Ok(BarcodeImageRow {
            command_name: name.to_string(),
            row_index: index,
            barcode_image: generated.to_base64(),
        })
    }
}

fn flatten_panic<T>(
    outcome: std::thread::Result<Result<T, ServiceError>>,
) -> Result<T, ServiceError> {
    outcome.unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(ServiceError::Panicked(message))
    })
}
