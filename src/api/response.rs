// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};

use crate::vision::barcode::DecodedSymbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "OK")]
    Ok,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BarcodeRow {
    pub command_name: String,
    pub row_index: usize,
    pub barcode: String,
    pub barcode_format: String,
    pub num_bits: usize,
}

impl BarcodeRow {
    pub fn from_symbol(command_name: &str, row_index: usize, symbol: &DecodedSymbol) -> Self {
        Self {
            command_name: command_name.to_string(),
            row_index,
            barcode: symbol.text.clone(),
            barcode_format: symbol.format.to_string(),
            num_bits: symbol.num_bits,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TextRow {
    pub command_name: String,
    pub row_index: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BarcodeImageRow {
    pub command_name: String,
    pub row_index: usize,
    /// Base64 PNG
    pub barcode_image: String,
}

/// Result tables; a table is serialized only when it has rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultTables {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub barcode: Vec<BarcodeRow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub text: Vec<TextRow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub barcode_image: Vec<BarcodeImageRow>,
}

impl ResultTables {
    pub fn is_empty(&self) -> bool {
        self.barcode.is_empty() && self.text.is_empty() && self.barcode_image.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.barcode.len() + self.text.len() + self.barcode_image.len()
    }

    /// Names of the tables that would appear in the response
    pub fn table_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if !self.barcode.is_empty() {
            names.push("Barcode");
        }
        if !self.text.is_empty() {
            names.push("Text");
        }
        if !self.barcode_image.is_empty() {
            names.push("BarcodeImage");
        }
        names
    }

    pub fn append(&mut self, mut other: ResultTables) {
        self.barcode.append(&mut other.barcode);
        self.text.append(&mut other.text);
        self.barcode_image.append(&mut other.barcode_image);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceResponse {
    pub status: Status,
    pub message: Option<String>,
    #[serde(default)]
    pub tables: ResultTables,
}

impl ServiceResponse {
    pub fn ok(tables: ResultTables) -> Self {
        Self {
            status: Status::Ok,
            message: None,
            tables,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Status::Failed,
            message: Some(message.into()),
            tables: ResultTables::default(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}
