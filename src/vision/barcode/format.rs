// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Symbology and Data Matrix shape names as they appear on the wire

use std::fmt;
use std::str::FromStr;

use super::BarcodeError;

/// Barcode symbology, named the way clients spell it (`QR_CODE`, `CODE_128`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolFormat {
    Aztec,
    Codabar,
    Code39,
    Code93,
    Code128,
    DataMatrix,
    Ean8,
    Ean13,
    Itf,
    MaxiCode,
    Pdf417,
    QrCode,
    Rss14,
    RssExpanded,
    UpcA,
    UpcE,
    UpcEanExtension,
    /// Reported by the codec for symbologies this crate does not name
    Unknown,
}

impl SymbolFormat {
    pub const ALL: [SymbolFormat; 17] = [
        SymbolFormat::Aztec,
        SymbolFormat::Codabar,
        SymbolFormat::Code39,
        SymbolFormat::Code93,
        SymbolFormat::Code128,
        SymbolFormat::DataMatrix,
        SymbolFormat::Ean8,
        SymbolFormat::Ean13,
        SymbolFormat::Itf,
        SymbolFormat::MaxiCode,
        SymbolFormat::Pdf417,
        SymbolFormat::QrCode,
        SymbolFormat::Rss14,
        SymbolFormat::RssExpanded,
        SymbolFormat::UpcA,
        SymbolFormat::UpcE,
        SymbolFormat::UpcEanExtension,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolFormat::Aztec => "AZTEC",
            SymbolFormat::Codabar => "CODABAR",
            SymbolFormat::Code39 => "CODE_39",
            SymbolFormat::Code93 => "CODE_93",
            SymbolFormat::Code128 => "CODE_128",
            SymbolFormat::DataMatrix => "DATA_MATRIX",
            SymbolFormat::Ean8 => "EAN_8",
            SymbolFormat::Ean13 => "EAN_13",
            SymbolFormat::Itf => "ITF",
            SymbolFormat::MaxiCode => "MAXICODE",
            SymbolFormat::Pdf417 => "PDF_417",
            SymbolFormat::QrCode => "QR_CODE",
            SymbolFormat::Rss14 => "RSS_14",
            SymbolFormat::RssExpanded => "RSS_EXPANDED",
            SymbolFormat::UpcA => "UPC_A",
            SymbolFormat::UpcE => "UPC_E",
            SymbolFormat::UpcEanExtension => "UPC_EAN_EXTENSION",
            SymbolFormat::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for SymbolFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SymbolFormat {
    type Err = BarcodeError;

    /// Case-insensitive; underscores are optional (`qrcode`, `QR_CODE`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Self::ALL
            .iter()
            .copied()
            .find(|format| normalize(format.as_str()) == wanted)
            .ok_or_else(|| BarcodeError::UnsupportedFormat(s.to_string()))
    }
}

/// Data Matrix symbol shape preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SymbolShape {
    ForceNone,
    #[default]
    ForceSquare,
    ForceRectangle,
}

impl SymbolShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolShape::ForceNone => "FORCE_NONE",
            SymbolShape::ForceSquare => "FORCE_SQUARE",
            SymbolShape::ForceRectangle => "FORCE_RECTANGLE",
        }
    }
}

impl fmt::Display for SymbolShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SymbolShape {
    type Err = BarcodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "FORCENONE" => Ok(SymbolShape::ForceNone),
            "FORCESQUARE" => Ok(SymbolShape::ForceSquare),
            "FORCERECTANGLE" => Ok(SymbolShape::ForceRectangle),
            _ => Err(BarcodeError::Validation {
                field: "DatamatrixSymbolShape".to_string(),
                message: format!("unknown symbol shape '{}'", s),
            }),
        }
    }
}

fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
