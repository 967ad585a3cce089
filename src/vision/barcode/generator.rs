// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Barcode image synthesis

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{imageops, RgbaImage};
use tracing::debug;

use super::{BarcodeCodec, BarcodeError, EncodeOptions, SymbolFormat, SymbolShape};
use crate::vision::bounding_box;
use crate::vision::image_utils::encode_png;

pub const DEFAULT_CHARACTER_SET: &str = "UTF-8";
pub const DEFAULT_SIZE: u32 = 300;

/// What to render and how
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateParams {
    pub text: String,
    pub character_set: String,
    pub format: SymbolFormat,
    pub width: u32,
    pub height: u32,
    pub disable_eci: bool,
    pub pure_barcode: bool,
    /// Crop blank margins off the rendered symbol
    pub trim_margins: bool,
    /// Consulted for Data Matrix only
    pub symbol_shape: SymbolShape,
}

impl GenerateParams {
    /// QR code, UTF-8, 300x300, no trimming
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            character_set: DEFAULT_CHARACTER_SET.to_string(),
            format: SymbolFormat::QrCode,
            width: DEFAULT_SIZE,
            height: DEFAULT_SIZE,
            disable_eci: false,
            pure_barcode: false,
            trim_margins: false,
            symbol_shape: SymbolShape::default(),
        }
    }

    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            format: self.format,
            width: self.width,
            height: self.height,
            character_set: self.character_set.clone(),
            disable_eci: self.disable_eci,
            pure_barcode: self.pure_barcode,
            symbol_shape: self.symbol_shape,
        }
    }

    pub fn validate(&self) -> Result<(), BarcodeError> {
        if self.text.is_empty() {
            return Err(BarcodeError::Validation {
                field: "Text".to_string(),
                message: "text is required".to_string(),
            });
        }
        if self.character_set.trim().is_empty() {
            return Err(BarcodeError::Validation {
                field: "CharacterSet".to_string(),
                message: "character set must not be empty".to_string(),
            });
        }
        if self.width == 0 || self.height == 0 {
            return Err(BarcodeError::Validation {
                field: if self.width == 0 { "Width" } else { "Height" }.to_string(),
                message: "dimensions must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// A rendered symbol, PNG encoded
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
    /// True when blank margins were cropped off
    pub trimmed: bool,
}

impl GeneratedImage {
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.png)
    }
}

/// Render `params.text` through the codec, optionally trim, and encode PNG
pub fn generate(
    codec: &dyn BarcodeCodec,
    params: &GenerateParams,
) -> Result<GeneratedImage, BarcodeError> {
    params.validate()?;

    let rendered = codec.encode(&params.text, &params.encode_options())?;

    let (image, trimmed) = if params.trim_margins {
        trim_margins(rendered)
    } else {
        (rendered, false)
    };

    let png = encode_png(&image)?;
    Ok(GeneratedImage {
        width: image.width(),
        height: image.height(),
        png,
        trimmed,
    })
}

/// Crop `image` to the bounding box of its non-background pixels.
///
/// The image is returned untouched when it is blank or already tight. The
/// crop is a straight pixel copy, never a resample.
pub fn trim_margins(image: RgbaImage) -> (RgbaImage, bool) {
    let (width, height) = image.dimensions();
    let rect = bounding_box::scan(&image);

    if rect.is_empty() || rect.covers(width, height) {
        return (image, false);
    }

    debug!(
        "Trimming {}x{} symbol to {}x{} at ({}, {})",
        width,
        height,
        rect.width(),
        rect.height(),
        rect.min_x,
        rect.min_y
    );

    let cropped = imageops::crop_imm(&image, rect.min_x, rect.min_y, rect.width(), rect.height())
        .to_image();
    (cropped, true)
}
