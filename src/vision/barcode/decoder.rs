// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Barcode decode orchestration: whole image first, band tiling as fallback

use std::collections::HashSet;

use image::RgbaImage;
use tracing::debug;

use super::{BarcodeCodec, DecodedSymbol};
use crate::vision::tiling::split_into_bands;

/// Symbols in discovery order, unique by text. The first occurrence of a
/// text decides the reported format and bit count.
#[derive(Debug, Clone, Default)]
pub struct SymbolSet {
    seen: HashSet<String>,
    symbols: Vec<DecodedSymbol>,
}

impl SymbolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a symbol; returns false if its text was already present
    pub fn insert(&mut self, symbol: DecodedSymbol) -> bool {
        if self.seen.contains(&symbol.text) {
            return false;
        }
        self.seen.insert(symbol.text.clone());
        self.symbols.push(symbol);
        true
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn into_vec(self) -> Vec<DecodedSymbol> {
        self.symbols
    }
}

impl Extend<DecodedSymbol> for SymbolSet {
    fn extend<T: IntoIterator<Item = DecodedSymbol>>(&mut self, iter: T) {
        for symbol in iter {
            self.insert(symbol);
        }
    }
}

/// Outcome of one orchestrated decode
#[derive(Debug, Clone, Default)]
pub struct BarcodeScan {
    pub symbols: Vec<DecodedSymbol>,
    /// True when the whole-image pass found nothing and bands were decoded
    pub used_tiling: bool,
    pub bands_scanned: usize,
    /// Bands skipped because the codec failed on them
    pub bands_failed: usize,
}

/// Decode every symbol in `image`.
///
/// The whole image is decoded first; if that yields at least one symbol the
/// result is returned as is. Otherwise the image is cut into `tile_count` row
/// and/or column bands and each band is decoded independently. A codec error
/// on a band skips that band.
pub fn decode_symbols(codec: &dyn BarcodeCodec, image: &RgbaImage, tile_count: u32) -> BarcodeScan {
    let mut found = SymbolSet::new();

    match codec.decode_multiple(image) {
        Ok(symbols) => found.extend(symbols),
        Err(e) => debug!("Whole-image barcode decode failed: {}", e),
    }

    if !found.is_empty() {
        return BarcodeScan {
            symbols: found.into_vec(),
            ..Default::default()
        };
    }

    let bands = split_into_bands(image, tile_count);
    debug!(
        "No symbol in {}x{} image, trying {} bands",
        image.width(),
        image.height(),
        bands.len()
    );

    let mut bands_failed = 0;
    for band in &bands {
        match codec.decode_multiple(&band.image) {
            Ok(symbols) => found.extend(symbols),
            Err(e) => {
                bands_failed += 1;
                debug!(
                    "Skipping {:?} band {}: {}",
                    band.region.axis, band.region.index, e
                );
            }
        }
    }

    BarcodeScan {
        symbols: found.into_vec(),
        used_tiling: true,
        bands_scanned: bands.len(),
        bands_failed,
    }
}
