// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Envelope parsing tests: a full request body down to typed row actions

use fabstir_image_node::api::{
    CommandAction, CommandDefaults, RecognitionCommand, ServiceRequest, SkipReason,
};
use fabstir_image_node::vision::barcode::{SymbolFormat, SymbolShape};

const REQUEST: &str = r#"{
    "serviceName": "MetaFrm.Service.ImageService",
    "commands": {
        "Scan": { "values": [
            { "Command": "barcode,text", "Image": "aGVsbG8=", "Seperate": 4, "Language": "eng" },
            { "Command": "BARCODE", "Image": "aGVsbG8=", "Seperate": "2" }
        ] },
        "Make": { "values": [
            { "Command": "barcodeimage", "Text": "ABC", "BarcodeFormat": "QR_CODE",
              "Width": 200, "Height": 200, "NoSpace": true },
            { "Command": "barcodeimage", "Text": "DM", "BarcodeFormat": "data_matrix",
              "DatamatrixSymbolShape": "FORCE_NONE", "DisableECI": "TRUE" },
            { "Command": "barcodeimage", "Text": "Bad", "DatamatrixSymbolShape": "ROUND" }
        ] },
        "Empty": { "values": [] },
        "Junk": { "values": [ { "Command": "", "Image": "x" }, { "Other": 1 } ] }
    }
}"#;

fn parsed() -> Vec<(String, Vec<RecognitionCommand>)> {
    let request: ServiceRequest = serde_json::from_str(REQUEST).unwrap();
    let defaults = CommandDefaults::default();
    request
        .commands
        .iter()
        .map(|(name, table)| {
            (
                name.clone(),
                table
                    .values
                    .iter()
                    .map(|row| RecognitionCommand::parse(row, &defaults))
                    .collect(),
            )
        })
        .collect()
}

#[cfg(test)]
mod request_parsing_tests {
    use super::*;

    #[test]
    fn test_command_sets_in_body_order() {
        let names: Vec<String> = parsed().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Scan", "Make", "Empty", "Junk"]);
    }

    #[test]
    fn test_scan_rows() {
        let sets = parsed();
        let scan = &sets[0].1;

        assert!(scan[0].keywords.barcode && scan[0].keywords.text);
        match &scan[0].action {
            CommandAction::Recognize(p) => {
                assert_eq!(p.tile_count, 4);
                assert_eq!(p.language, "eng");
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(scan[1].keywords.barcode && !scan[1].keywords.text);
        match &scan[1].action {
            CommandAction::Recognize(p) => {
                assert_eq!(p.tile_count, 2);
                assert_eq!(p.language, "kor");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_make_rows() {
        let sets = parsed();
        let make = &sets[1].1;

        match &make[0].action {
            CommandAction::Generate(p) => {
                assert_eq!(p.text, "ABC");
                assert_eq!((p.width, p.height), (200, 200));
                assert!(p.trim_margins);
            }
            other => panic!("unexpected {:?}", other),
        }

        match &make[1].action {
            CommandAction::Generate(p) => {
                assert_eq!(p.format, SymbolFormat::DataMatrix);
                assert_eq!(p.symbol_shape, SymbolShape::ForceNone);
                assert!(p.disable_eci);
            }
            other => panic!("unexpected {:?}", other),
        }

        // the shape is only read for Data Matrix, so a bad value on a QR row is ignored
        assert!(matches!(make[2].action, CommandAction::Generate(_)));
    }

    #[test]
    fn test_junk_rows_are_skipped() {
        let sets = parsed();
        assert!(sets[2].1.is_empty());

        let junk = &sets[3].1;
        assert_eq!(
            junk[0].action,
            CommandAction::Skip(SkipReason::NoApplicableKeyword)
        );
        assert_eq!(junk[1].action, CommandAction::Skip(SkipReason::MissingCommand));
    }

    #[test]
    fn test_defaults_come_from_caller() {
        let request: ServiceRequest = serde_json::from_str(REQUEST).unwrap();
        let defaults = CommandDefaults {
            language: "kor_vert".to_string(),
            tile_count: 8,
            ..CommandDefaults::default()
        };
        let row = &request.commands[0].1.values[1];

        match RecognitionCommand::parse(row, &defaults).action {
            CommandAction::Recognize(p) => {
                assert_eq!(p.language, "kor_vert");
                assert_eq!(p.tile_count, 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_malformed_envelope_is_rejected() {
        let bad = r#"{ "serviceName": "MetaFrm.Service.ImageService", "commands": { "Scan": { "values": 5 } } }"#;
        let err = serde_json::from_str::<ServiceRequest>(bad).unwrap_err();
        assert!(err.to_string().contains("Scan"));
    }

    #[test]
    fn test_request_serializes_back_in_order() {
        let request: ServiceRequest = serde_json::from_str(REQUEST).unwrap();
        let json = serde_json::to_string(&request).unwrap();
        let scan = json.find("\"Scan\"").unwrap();
        let make = json.find("\"Make\"").unwrap();
        let junk = json.find("\"Junk\"").unwrap();
        assert!(scan < make && make < junk);
    }
}
