// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! HTTP router tests
//!
//! Requests are driven through the axum router with `tower::ServiceExt`;
//! no socket is opened.

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use fabstir_image_node::api::{router, ImageService};
use fabstir_image_node::config::ServiceConfig;
use fabstir_image_node::vision::barcode::{BarcodeCodec, GenerateParams, RxingCodec};
use fabstir_image_node::vision::image_utils::encode_png_base64;
use fabstir_image_node::vision::ocr::{ModelDirectory, OcrEnginePool, UnavailableEngineFactory};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let pool = OcrEnginePool::new(Arc::new(UnavailableEngineFactory::new(ModelDirectory::new(
        "/nonexistent/tessdata",
    ))));
    let service = ImageService::new(
        ServiceConfig::default(),
        Arc::new(RxingCodec::new()),
        Arc::new(pool),
    );
    router(Arc::new(service))
}

fn qr_base64(text: &str) -> String {
    let params = GenerateParams::new(text);
    let image = RxingCodec::new()
        .encode(text, &params.encode_options())
        .unwrap();
    encode_png_base64(&image).unwrap()
}

async fn send(app: Router, method: Method, uri: &str, body: Body) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[cfg(test)]
mod http_routes_tests {
    use super::*;

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(app(), Method::GET, "/health", Body::empty()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["ocrBackend"], "unavailable");
        assert_eq!(body["ocrLanguages"], json!([]));
        assert!(body["version"].is_string());
        assert!(body["availableModels"].is_array());
    }

    #[tokio::test]
    async fn test_version() {
        let (status, body) = send(app(), Method::GET, "/v1/version", Body::empty()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert!(body["features"]
            .as_array()
            .unwrap()
            .iter()
            .any(|f| f == "barcode-decode"));
        assert!(body["tesseract"].is_boolean());
    }

    #[tokio::test]
    async fn test_image_request() {
        let request = json!({
            "serviceName": "MetaFrm.Service.ImageService",
            "commands": {
                "Scan": { "values": [ { "Command": "barcode", "Image": qr_base64("ROUTE") } ] },
                "Make": { "values": [ { "Command": "barcodeimage", "Text": "OUT" } ] }
            }
        });
        let (status, body) = send(
            app(),
            Method::POST,
            "/v1/image",
            Body::from(request.to_string()),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "OK");
        assert_eq!(body["tables"]["Barcode"][0]["Barcode"], "ROUTE");
        assert_eq!(body["tables"]["Barcode"][0]["BarcodeFormat"], "QR_CODE");
        assert_eq!(body["tables"]["BarcodeImage"][0]["CommandName"], "Make");
        assert!(body["tables"].get("Text").is_none());
    }

    #[tokio::test]
    async fn test_failed_envelope_is_still_200() {
        let request = json!({ "serviceName": "Nope", "commands": {} });
        let (status, body) = send(
            app(),
            Method::POST,
            "/v1/image",
            Body::from(request.to_string()),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "Failed");
        assert!(body["message"].as_str().unwrap().contains("Nope"));
    }

    #[tokio::test]
    async fn test_text_without_backend_yields_no_row() {
        let request = json!({
            "serviceName": "MetaFrm.Service.ImageService",
            "commands": { "Read": { "values": [
                { "Command": "text", "Image": qr_base64("X"), "Language": "eng" }
            ] } }
        });
        let (status, body) = send(
            app(),
            Method::POST,
            "/v1/image",
            Body::from(request.to_string()),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "OK");
        assert_eq!(body["tables"], json!({}));
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let (status, body) = send(
            app(),
            Method::POST,
            "/v1/image",
            Body::from("{ not json"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_type"], "invalid_request");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (status, body) = send(app(), Method::GET, "/v1/nothing", Body::empty()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error_type"], "not_found");
    }
}
