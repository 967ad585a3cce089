// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image analysis building blocks
//!
//! This module provides:
//! - Pixel buffer decoding/encoding (`image_utils`)
//! - Barcode decoding with band-tiling fallback, and barcode synthesis (`barcode`)
//! - Language-keyed OCR engine pool (`ocr`)
//! - Band tiling and bounding-box scanning used by the above
//! - Startup provisioning of OCR language models
//!
//! Everything here is synchronous and CPU bound; async callers should run it
//! on a blocking thread.

pub mod barcode;
pub mod bounding_box;
pub mod image_utils;
pub mod ocr;
pub mod provisioning;
pub mod tiling;

pub use barcode::{BarcodeCodec, BarcodeError, DecodedSymbol, RxingCodec, SymbolFormat};
pub use bounding_box::BoundingRect;
pub use image_utils::{decode_base64_image, decode_image_bytes, detect_format, ImageError, ImageInfo};
pub use ocr::{OcrEnginePool, OcrError};
