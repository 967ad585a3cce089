// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Barcode recognition and synthesis
//!
//! Components:
//! - `codec` - `BarcodeCodec` trait and the rxing-backed implementation
//! - `decoder` - whole-image decode with band-tiling fallback and dedup
//! - `generator` - text to barcode PNG, with optional margin trimming
//! - `format` - symbology and Data Matrix shape names

pub mod codec;
pub mod decoder;
pub mod format;
pub mod generator;

use thiserror::Error;

use crate::vision::image_utils::ImageError;

pub use codec::{BarcodeCodec, EncodeOptions, RxingCodec};
pub use decoder::{decode_symbols, BarcodeScan, SymbolSet};
pub use format::{SymbolFormat, SymbolShape};
pub use generator::{generate, trim_margins, GenerateParams, GeneratedImage};

/// A symbol read from an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSymbol {
    /// Decoded payload
    pub text: String,
    /// Symbology the payload was read from
    pub format: SymbolFormat,
    /// Number of valid bits in the raw payload
    pub num_bits: usize,
}

impl DecodedSymbol {
    pub fn new(text: impl Into<String>, format: SymbolFormat, num_bits: usize) -> Self {
        Self {
            text: text.into(),
            format,
            num_bits,
        }
    }
}

#[derive(Debug, Error)]
pub enum BarcodeError {
    #[error("Barcode codec failed: {0}")]
    Codec(String),

    #[error("Unsupported barcode format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid value for '{field}': {message}")]
    Validation { field: String, message: String },

    #[error(transparent)]
    Image(#[from] ImageError),
}
