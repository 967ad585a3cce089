// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the Fabstir Image Node

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-barcode-ocr-2026-10-16";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2026-10-16";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "barcode-decode",
    "band-tiling-fallback",
    "barcode-generate",
    "margin-trim",
    "ocr-engine-pool",
    "model-provisioning",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Fabstir Image Node {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info for API responses
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
        "tesseract": cfg!(feature = "tesseract"),
    })
}
