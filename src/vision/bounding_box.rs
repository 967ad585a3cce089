// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Bounding-box scanner: smallest rectangle enclosing non-background pixels

use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Channel value above which R, G and B count as near-white background
pub const BACKGROUND_THRESHOLD: u8 = 250;

/// Axis-aligned rectangle; `max_x` and `max_y` are exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingRect {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl BoundingRect {
    /// Rectangle covering a whole `width` x `height` image
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            min_x: 0,
            min_y: 0,
            max_x: width,
            max_y: height,
        }
    }

    pub fn width(&self) -> u32 {
        self.max_x.saturating_sub(self.min_x)
    }

    pub fn height(&self) -> u32 {
        self.max_y.saturating_sub(self.min_y)
    }

    /// True when the rectangle encloses no pixels
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// True when the rectangle spans the whole `width` x `height` image
    pub fn covers(&self, width: u32, height: u32) -> bool {
        *self == Self::full(width, height)
    }
}

/// Scan with the default near-white threshold (> 250 on R, G and B)
pub fn scan(image: &RgbaImage) -> BoundingRect {
    scan_with_threshold(image, BACKGROUND_THRESHOLD)
}

/// Visit every pixel once and track the min/max coordinates of pixels that
/// are not background. Alpha is ignored.
///
/// Returns the full-image rectangle when every pixel is background, so callers
/// must check [`BoundingRect::covers`] before deciding to crop.
pub fn scan_with_threshold(image: &RgbaImage, threshold: u8) -> BoundingRect {
    let (width, height) = image.dimensions();

    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    let mut found = false;

    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b, _] = pixel.0;
        if r > threshold && g > threshold && b > threshold {
            continue;
        }
        found = true;
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x + 1);
        max_y = max_y.max(y + 1);
    }

    if !found {
        return BoundingRect::full(width, height);
    }

    BoundingRect {
        min_x,
        min_y,
        max_x,
        max_y,
    }
}
