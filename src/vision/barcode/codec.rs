// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Barcode codec seam
//!
//! The orchestrator and generator only talk to [`BarcodeCodec`]; the concrete
//! implementation wraps `rxing`, a Rust port of ZXing.

use std::collections::HashMap;

use image::{imageops, Rgba, RgbaImage};
use rxing::datamatrix::encoder::SymbolShapeHint;
use rxing::{
    BarcodeFormat, EncodeHintType, EncodeHintValue, EncodingHintDictionary, Exceptions,
    MultiFormatWriter, RXingResult, Writer,
};
use tracing::debug;

use super::{BarcodeError, DecodedSymbol, SymbolFormat, SymbolShape};

/// Parameters handed to the codec's encode step
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeOptions {
    pub format: SymbolFormat,
    pub width: u32,
    pub height: u32,
    pub character_set: String,
    /// Omit the character-set declaration (ECI segment) from the symbol
    pub disable_eci: bool,
    /// Symbol only, no human-readable text. The rendering path never draws
    /// text, so this is satisfied for every symbology.
    pub pure_barcode: bool,
    /// Consulted for Data Matrix only
    pub symbol_shape: SymbolShape,
}

/// Encode/decode primitives for 1D and 2D symbols
#[cfg_attr(test, mockall::automock)]
pub trait BarcodeCodec: Send + Sync {
    /// Find every symbol in `image`. An image without symbols yields an
    /// empty vector, not an error.
    fn decode_multiple(&self, image: &RgbaImage) -> Result<Vec<DecodedSymbol>, BarcodeError>;

    /// Render `text` as a black-on-white symbol
    fn encode(&self, text: &str, options: &EncodeOptions) -> Result<RgbaImage, BarcodeError>;
}

/// [`BarcodeCodec`] backed by rxing
#[derive(Debug, Clone, Copy, Default)]
pub struct RxingCodec;

impl RxingCodec {
    pub fn new() -> Self {
        Self
    }
}

impl BarcodeCodec for RxingCodec {
    fn decode_multiple(&self, image: &RgbaImage) -> Result<Vec<DecodedSymbol>, BarcodeError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let luma = imageops::grayscale(image).into_raw();
        match rxing::helpers::detect_multiple_in_luma(luma, width, height) {
            Ok(results) => Ok(results.iter().map(symbol_from_result).collect()),
            Err(Exceptions::NotFoundException(_)) => Ok(Vec::new()),
            Err(e) => Err(BarcodeError::Codec(format!("{:?}", e))),
        }
    }

    fn encode(&self, text: &str, options: &EncodeOptions) -> Result<RgbaImage, BarcodeError> {
        let format = to_rxing_format(options.format)?;
        let width = to_dimension("Width", options.width)?;
        let height = to_dimension("Height", options.height)?;

        let mut hints: EncodingHintDictionary = HashMap::new();
        // without a charset hint the encoder falls back to ISO-8859-1, so the
        // hint stays for text outside Latin-1 even when ECI is disabled
        if !options.disable_eci || !is_latin1(text) {
            hints.insert(
                EncodeHintType::CHARACTER_SET,
                EncodeHintValue::CharacterSet(options.character_set.clone()),
            );
        }
        if options.format == SymbolFormat::DataMatrix {
            hints.insert(
                EncodeHintType::DATA_MATRIX_SHAPE,
                EncodeHintValue::DataMatrixShape(to_shape_hint(options.symbol_shape)),
            );
        }

        debug!(
            "Encoding {} chars as {} at {}x{}",
            text.chars().count(),
            options.format,
            width,
            height
        );

        let matrix = MultiFormatWriter::default()
            .encode_with_hints(text, &format, width, height, &hints)
            .map_err(|e| BarcodeError::Codec(format!("{:?}", e)))?;

        let black = Rgba([0, 0, 0, 255]);
        let white = Rgba([255, 255, 255, 255]);
        Ok(RgbaImage::from_fn(
            matrix.getWidth(),
            matrix.getHeight(),
            |x, y| if matrix.get(x, y) { black } else { white },
        ))
    }
}

fn symbol_from_result(result: &RXingResult) -> DecodedSymbol {
    DecodedSymbol {
        text: result.getText().to_string(),
        format: from_rxing_format(result.getBarcodeFormat()),
        num_bits: result.getNumBits(),
    }
}

fn is_latin1(text: &str) -> bool {
    text.chars().all(|c| u32::from(c) <= 0xFF)
}

fn to_dimension(field: &str, value: u32) -> Result<i32, BarcodeError> {
    match i32::try_from(value) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(BarcodeError::Validation {
            field: field.to_string(),
            message: format!("must be between 1 and {}, got {}", i32::MAX, value),
        }),
    }
}

fn to_shape_hint(shape: SymbolShape) -> SymbolShapeHint {
    match shape {
        SymbolShape::ForceNone => SymbolShapeHint::FORCE_NONE,
        SymbolShape::ForceSquare => SymbolShapeHint::FORCE_SQUARE,
        SymbolShape::ForceRectangle => SymbolShapeHint::FORCE_RECTANGLE,
    }
}

fn to_rxing_format(format: SymbolFormat) -> Result<BarcodeFormat, BarcodeError> {
    Ok(match format {
        SymbolFormat::Aztec => BarcodeFormat::AZTEC,
        SymbolFormat::Codabar => BarcodeFormat::CODABAR,
        SymbolFormat::Code39 => BarcodeFormat::CODE_39,
        SymbolFormat::Code93 => BarcodeFormat::CODE_93,
        SymbolFormat::Code128 => BarcodeFormat::CODE_128,
        SymbolFormat::DataMatrix => BarcodeFormat::DATA_MATRIX,
        SymbolFormat::Ean8 => BarcodeFormat::EAN_8,
        SymbolFormat::Ean13 => BarcodeFormat::EAN_13,
        SymbolFormat::Itf => BarcodeFormat::ITF,
        SymbolFormat::MaxiCode => BarcodeFormat::MAXICODE,
        SymbolFormat::Pdf417 => BarcodeFormat::PDF_417,
        SymbolFormat::QrCode => BarcodeFormat::QR_CODE,
        SymbolFormat::Rss14 => BarcodeFormat::RSS_14,
        SymbolFormat::RssExpanded => BarcodeFormat::RSS_EXPANDED,
        SymbolFormat::UpcA => BarcodeFormat::UPC_A,
        SymbolFormat::UpcE => BarcodeFormat::UPC_E,
        SymbolFormat::UpcEanExtension => BarcodeFormat::UPC_EAN_EXTENSION,
        SymbolFormat::Unknown => {
            return Err(BarcodeError::UnsupportedFormat(format.to_string()));
        }
    })
}

fn from_rxing_format(format: &BarcodeFormat) -> SymbolFormat {
    match format {
        BarcodeFormat::AZTEC => SymbolFormat::Aztec,
        BarcodeFormat::CODABAR => SymbolFormat::Codabar,
        BarcodeFormat::CODE_39 => SymbolFormat::Code39,
        BarcodeFormat::CODE_93 => SymbolFormat::Code93,
        BarcodeFormat::CODE_128 => SymbolFormat::Code128,
        BarcodeFormat::DATA_MATRIX => SymbolFormat::DataMatrix,
        BarcodeFormat::EAN_8 => SymbolFormat::Ean8,
        BarcodeFormat::EAN_13 => SymbolFormat::Ean13,
        BarcodeFormat::ITF => SymbolFormat::Itf,
        BarcodeFormat::MAXICODE => SymbolFormat::MaxiCode,
        BarcodeFormat::PDF_417 => SymbolFormat::Pdf417,
        BarcodeFormat::QR_CODE => SymbolFormat::QrCode,
        BarcodeFormat::RSS_14 => SymbolFormat::Rss14,
        BarcodeFormat::RSS_EXPANDED => SymbolFormat::RssExpanded,
        BarcodeFormat::UPC_A => SymbolFormat::UpcA,
        BarcodeFormat::UPC_E => SymbolFormat::UpcE,
        BarcodeFormat::UPC_EAN_EXTENSION => SymbolFormat::UpcEanExtension,
        _ => SymbolFormat::Unknown,
    }
}
