// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request envelope and per-row command parsing

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::vision::barcode::{GenerateParams, SymbolFormat, SymbolShape};

/// Raw field bag of one command row
pub type CommandRow = Map<String, Value>;

/// Rows of one named command set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandTable {
    #[serde(default)]
    pub values: Vec<CommandRow>,
}

/// Batched request envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    #[serde(default)]
    pub service_name: Option<String>,
    /// Command sets in the order they appear in the request body
    #[serde(default, with = "ordered_commands")]
    pub commands: Vec<(String, CommandTable)>,
}

impl ServiceRequest {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: Some(service_name.into()),
            commands: Vec::new(),
        }
    }

    /// Append a command set
    pub fn with_command(mut self, name: impl Into<String>, rows: Vec<CommandRow>) -> Self {
        self.commands
            .push((name.into(), CommandTable { values: rows }));
        self
    }

    pub fn row_count(&self) -> usize {
        self.commands.iter().map(|(_, table)| table.values.len()).sum()
    }
}

mod ordered_commands {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::{Map, Value};

    use super::CommandTable;

    pub fn serialize<S: Serializer>(
        commands: &[(String, CommandTable)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(commands.iter().map(|(name, table)| (name, table)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(String, CommandTable)>, D::Error> {
        // serde_json is built with `preserve_order`, so the map keeps body order
        let raw = Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
        raw.into_iter()
            .map(|(name, value)| {
                let table = serde_json::from_value::<CommandTable>(value)
                    .map_err(|e| D::Error::custom(format!("command set '{}': {}", name, e)))?;
                Ok((name, table))
            })
            .collect()
    }
}

/// Operations named in a row's `Command` field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keywords {
    pub barcode: bool,
    pub text: bool,
    pub barcode_image: bool,
}

impl Keywords {
    /// Comma separated, case-insensitive; unknown words are ignored
    pub fn parse(command: &str) -> Self {
        let mut keywords = Keywords::default();
        for word in command.split(',').map(str::trim).filter(|w| !w.is_empty()) {
            match word.to_ascii_lowercase().as_str() {
                "barcode" => keywords.barcode = true,
                "text" => keywords.text = true,
                "barcodeimage" => keywords.barcode_image = true,
                _ => {}
            }
        }
        keywords
    }

    pub fn is_empty(&self) -> bool {
        !(self.barcode || self.text || self.barcode_image)
    }
}

/// Values used when a row leaves a field out
#[derive(Debug, Clone, PartialEq)]
pub struct CommandDefaults {
    pub language: String,
    pub tile_count: u32,
    /// Generated symbols larger than this on either side are rejected
    pub max_generate_side: u32,
}

impl Default for CommandDefaults {
    fn default() -> Self {
        Self {
            language: crate::vision::ocr::DEFAULT_LANGUAGE.to_string(),
            tile_count: 4,
            max_generate_side: crate::config::DEFAULT_MAX_GENERATE_SIDE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecognizeParams {
    /// Base64 image payload, decoded by the dispatcher
    pub image: String,
    pub tile_count: u32,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    MissingCommand,
    NoApplicableKeyword,
    InvalidParameter { field: String, message: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingCommand => write!(f, "no Command field"),
            SkipReason::NoApplicableKeyword => write!(f, "no keyword applies to this row"),
            SkipReason::InvalidParameter { field, message } => {
                write!(f, "invalid {}: {}", field, message)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandAction {
    Recognize(RecognizeParams),
    Generate(GenerateParams),
    Skip(SkipReason),
}

/// One row, parsed and validated once
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionCommand {
    pub keywords: Keywords,
    pub action: CommandAction,
}

impl RecognitionCommand {
    pub fn parse(row: &CommandRow, defaults: &CommandDefaults) -> Self {
        let command = match field(row, "Command").and_then(Value::as_str) {
            Some(command) => command,
            None => {
                return Self {
                    keywords: Keywords::default(),
                    action: CommandAction::Skip(SkipReason::MissingCommand),
                }
            }
        };
        let keywords = Keywords::parse(command);

        let action = match field(row, "Image") {
            Some(image) => {
                if keywords.barcode || keywords.text {
                    parse_recognize(row, image, defaults)
                        .map_or_else(CommandAction::Skip, CommandAction::Recognize)
                } else {
                    CommandAction::Skip(SkipReason::NoApplicableKeyword)
                }
            }
            None if keywords.barcode_image => {
                parse_generate(row, defaults).map_or_else(CommandAction::Skip, CommandAction::Generate)
            }
            None => CommandAction::Skip(SkipReason::NoApplicableKeyword),
        };

        Self { keywords, action }
    }
}

fn parse_recognize(
    row: &CommandRow,
    image: &Value,
    defaults: &CommandDefaults,
) -> Result<RecognizeParams, SkipReason> {
    let image = image
        .as_str()
        .ok_or_else(|| invalid("Image", "expected a base64 string"))?
        .to_string();

    // an unusable band count falls back to the default instead of dropping the row
    let tile_count = match int_field(row, "Seperate") {
        Ok(Some(n)) if n > 0 => u32::try_from(n).unwrap_or(defaults.tile_count),
        _ => defaults.tile_count,
    };

    let language = match str_field(row, "Language")? {
        Some(language) if !language.trim().is_empty() => language.trim().to_string(),
        _ => defaults.language.clone(),
    };

    Ok(RecognizeParams {
        image,
        tile_count,
        language,
    })
}

fn parse_generate(
    row: &CommandRow,
    defaults: &CommandDefaults,
) -> Result<GenerateParams, SkipReason> {
    let text = str_field(row, "Text")?.ok_or_else(|| invalid("Text", "required"))?;
    let mut params = GenerateParams::new(text);

    if let Some(charset) = str_field(row, "CharacterSet")? {
        params.character_set = charset.to_string();
    }
    if let Some(format) = str_field(row, "BarcodeFormat")? {
        params.format = format
            .parse::<SymbolFormat>()
            .map_err(|e| invalid("BarcodeFormat", &e.to_string()))?;
    }
    if let Some(width) = int_field(row, "Width")? {
        params.width = dimension("Width", width, defaults.max_generate_side)?;
    }
    if let Some(height) = int_field(row, "Height")? {
        params.height = dimension("Height", height, defaults.max_generate_side)?;
    }

    params.disable_eci = bool_field(row, "DisableECI").unwrap_or(false);
    params.pure_barcode = bool_field(row, "PureBarcode").unwrap_or(false);
    params.trim_margins = bool_field(row, "NoSpace").unwrap_or(false);

    if params.format == SymbolFormat::DataMatrix {
        if let Some(shape) = str_field(row, "DatamatrixSymbolShape")? {
            params.symbol_shape = shape
                .parse::<SymbolShape>()
                .map_err(|e| invalid("DatamatrixSymbolShape", &e.to_string()))?;
        }
    }

    params
        .validate()
        .map_err(|e| invalid("params", &e.to_string()))?;
    Ok(params)
}

fn dimension(name: &str, value: i64, max: u32) -> Result<u32, SkipReason> {
    match u32::try_from(value) {
        Ok(v) if v > 0 && v <= max => Ok(v),
        Ok(v) if v > max => Err(invalid(name, &format!("must be at most {}", max))),
        _ => Err(invalid(name, "must be a positive integer")),
    }
}

fn invalid(field: &str, message: &str) -> SkipReason {
    SkipReason::InvalidParameter {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// Exact key first, then a case-insensitive match; `null` counts as absent
fn field<'a>(row: &'a CommandRow, key: &str) -> Option<&'a Value> {
    row.get(key)
        .or_else(|| {
            row.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
        .filter(|v| !v.is_null())
}

fn str_field<'a>(row: &'a CommandRow, key: &str) -> Result<Option<&'a str>, SkipReason> {
    match field(row, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(invalid(key, "expected a string")),
    }
}

fn int_field(row: &CommandRow, key: &str) -> Result<Option<i64>, SkipReason> {
    match field(row, key) {
        None => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| invalid(key, "expected an integer")),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| invalid(key, "expected an integer")),
        Some(_) => Err(invalid(key, "expected an integer")),
    }
}

/// Absent or unreadable flags are `None`
fn bool_field(row: &CommandRow, key: &str) -> Option<bool> {
    match field(row, key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}
