// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Band tiling used as a fallback when a whole-image barcode decode finds nothing

use image::{imageops, RgbaImage};

/// Minimum band thickness in pixels; a dimension is only split when it can
/// give every band at least this many pixels.
pub const MIN_BAND_PIXELS: u32 = 20;

/// Direction a band was cut along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandAxis {
    /// Full-width horizontal slice
    Row,
    /// Full-height vertical slice
    Column,
}

/// Location of a band inside the source image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandRegion {
    pub axis: BandAxis,
    pub index: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A cropped band together with where it came from
#[derive(Debug, Clone)]
pub struct Band {
    pub region: BandRegion,
    pub image: RgbaImage,
}

/// Compute the band layout for an image of `width` x `height`.
///
/// Row bands are produced when `height >= tile_count * 20` and column bands
/// when `width >= tile_count * 20`; both sets may be produced. Each band is
/// `floor(dimension / tile_count)` thick and remainder pixels at the end are
/// dropped. A `tile_count` of zero yields nothing.
pub fn band_regions(width: u32, height: u32, tile_count: u32) -> Vec<BandRegion> {
    let mut regions = Vec::new();
    if tile_count == 0 {
        return regions;
    }

    let threshold = tile_count.saturating_mul(MIN_BAND_PIXELS);

    if height >= threshold {
        let band = height / tile_count;
        regions.extend((0..tile_count).map(|index| BandRegion {
            axis: BandAxis::Row,
            index,
            x: 0,
            y: index * band,
            width,
            height: band,
        }));
    }

    if width >= threshold {
        let band = width / tile_count;
        regions.extend((0..tile_count).map(|index| BandRegion {
            axis: BandAxis::Column,
            index,
            x: index * band,
            y: 0,
            width: band,
            height,
        }));
    }

    regions
}

/// Split `image` into row and/or column bands (see [`band_regions`])
pub fn split_into_bands(image: &RgbaImage, tile_count: u32) -> Vec<Band> {
    band_regions(image.width(), image.height(), tile_count)
        .into_iter()
        .map(|region| Band {
            image: imageops::crop_imm(image, region.x, region.y, region.width, region.height)
                .to_image(),
            region,
        })
        .collect()
}
