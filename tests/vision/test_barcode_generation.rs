// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Barcode generation tests with the rxing codec

use fabstir_image_node::vision::barcode::{
    decode_symbols, generate, trim_margins, BarcodeError, GenerateParams, RxingCodec,
    SymbolFormat, SymbolShape,
};
use fabstir_image_node::vision::bounding_box;
use fabstir_image_node::vision::image_utils::{decode_base64_image, decode_image_bytes};

fn params(text: &str, format: SymbolFormat, width: u32, height: u32) -> GenerateParams {
    let mut params = GenerateParams::new(text);
    params.format = format;
    params.width = width;
    params.height = height;
    params
}

#[cfg(test)]
mod barcode_generation_tests {
    use super::*;

    #[test]
    fn test_qr_round_trip_through_png() {
        let codec = RxingCodec::new();
        let generated = generate(&codec, &params("HELLO", SymbolFormat::QrCode, 200, 200)).unwrap();

        assert!(!generated.trimmed);
        assert_eq!((generated.width, generated.height), (200, 200));

        let (image, info) = decode_image_bytes(&generated.png).unwrap();
        assert_eq!((info.width, info.height), (200, 200));

        let scan = decode_symbols(&codec, &image, 4);
        assert_eq!(scan.symbols.len(), 1);
        assert_eq!(scan.symbols[0].text, "HELLO");
    }

    #[test]
    fn test_trim_makes_image_strictly_smaller() {
        let codec = RxingCodec::new();
        let mut p = params("ABC", SymbolFormat::QrCode, 200, 200);
        p.trim_margins = true;

        let generated = generate(&codec, &p).unwrap();
        assert!(generated.trimmed);
        assert!(generated.width < 200);
        assert!(generated.height < 200);

        // the base64 payload decodes to the same dimensions
        let (image, _) = decode_base64_image(&generated.to_base64()).unwrap();
        assert_eq!(image.dimensions(), (generated.width, generated.height));

        // a trimmed symbol has ink on all four edges
        let rect = bounding_box::scan(&image);
        assert!(rect.covers(image.width(), image.height()));
    }

    #[test]
    fn test_trim_is_idempotent() {
        let codec = RxingCodec::new();
        let mut p = params("IDEMPOTENT", SymbolFormat::QrCode, 240, 240);
        p.trim_margins = true;
        let first = generate(&codec, &p).unwrap();
        let (image, _) = decode_image_bytes(&first.png).unwrap();

        let (again, trimmed) = trim_margins(image.clone());
        assert!(!trimmed);
        assert_eq!(again.dimensions(), image.dimensions());
    }

    #[test]
    fn test_code128_generation() {
        let codec = RxingCodec::new();
        let generated =
            generate(&codec, &params("SKU-12345", SymbolFormat::Code128, 300, 80)).unwrap();
        assert!(generated.width >= 300 || generated.height >= 80);

        let (image, _) = decode_image_bytes(&generated.png).unwrap();
        let scan = decode_symbols(&codec, &image, 4);
        assert!(scan.symbols.iter().any(|s| s.text == "SKU-12345"));
    }

    #[test]
    fn test_data_matrix_shapes() {
        let codec = RxingCodec::new();
        for shape in [SymbolShape::ForceSquare, SymbolShape::ForceRectangle, SymbolShape::ForceNone] {
            let mut p = params("DM-TEST", SymbolFormat::DataMatrix, 200, 200);
            p.symbol_shape = shape;
            let generated = generate(&codec, &p).unwrap();
            assert!(!generated.png.is_empty(), "{:?} produced no image", shape);
        }
    }

    #[test]
    fn test_disable_eci_still_renders() {
        let codec = RxingCodec::new();
        let mut p = params("ECI-OFF", SymbolFormat::QrCode, 150, 150);
        p.disable_eci = true;
        p.pure_barcode = true;
        assert!(generate(&codec, &p).is_ok());
    }

    #[test]
    fn test_disable_eci_keeps_korean_text() {
        let codec = RxingCodec::new();
        let mut p = params("안녕하세요", SymbolFormat::QrCode, 200, 200);
        p.disable_eci = true;

        let generated = generate(&codec, &p).unwrap();
        let (image, _) = decode_image_bytes(&generated.png).unwrap();
        let scan = decode_symbols(&codec, &image, 4);
        assert_eq!(scan.symbols.len(), 1);
        assert_eq!(scan.symbols[0].text, "안녕하세요");
    }

    #[test]
    fn test_invalid_params_are_validation_errors() {
        let codec = RxingCodec::new();

        let empty_text = params("", SymbolFormat::QrCode, 100, 100);
        assert!(matches!(
            generate(&codec, &empty_text),
            Err(BarcodeError::Validation { .. })
        ));

        let zero_width = params("X", SymbolFormat::QrCode, 0, 100);
        assert!(matches!(
            generate(&codec, &zero_width),
            Err(BarcodeError::Validation { field, .. }) if field == "Width"
        ));
    }

    #[test]
    fn test_unencodable_content_is_codec_error() {
        // EAN-13 only takes digits
        let codec = RxingCodec::new();
        let result = generate(&codec, &params("not digits", SymbolFormat::Ean13, 200, 100));
        assert!(matches!(result, Err(BarcodeError::Codec(_))));
    }
}
