// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::{ApiError, ImageService, ServiceRequest, ServiceResponse};
use crate::version;
use crate::vision::ocr::ModelDirectory;

/// Base64 inflates by 4/3; leave headroom for the envelope around the images
const BODY_LIMIT_FACTOR: usize = 2;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ImageService>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub ocr_backend: String,
    /// Languages with a loaded engine
    pub ocr_languages: Vec<String>,
    /// Languages with a model file on disk
    pub available_models: Vec<String>,
}

pub fn router(service: Arc<ImageService>) -> Router {
    let body_limit = service
        .config()
        .max_image_bytes
        .saturating_mul(BODY_LIMIT_FACTOR);

    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/version", get(version_handler))
        .route("/v1/image", post(image_handler))
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(AppState { service })
}

pub async fn start_server(service: Arc<ImageService>, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(service);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Image service listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let pool = state.service.ocr_pool();
    let models = ModelDirectory::new(state.service.config().model_dir.clone());
    Json(HealthResponse {
        status: "ok".to_string(),
        version: version::VERSION.to_string(),
        ocr_backend: pool.backend().to_string(),
        ocr_languages: pool.languages(),
        available_models: models.available_languages(),
    })
}

async fn version_handler() -> Json<serde_json::Value> {
    Json(version::get_version_info())
}

async fn image_handler(
    State(state): State<AppState>,
    payload: Result<Json<ServiceRequest>, JsonRejection>,
) -> Result<Json<ServiceResponse>, ApiErrorResponse> {
    let Json(request) = payload.map_err(|rejection| {
        let err = match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge {
                limit: state
                    .service
                    .config()
                    .max_image_bytes
                    .saturating_mul(BODY_LIMIT_FACTOR),
            },
            _ => ApiError::InvalidRequest(rejection.body_text()),
        };
        ApiErrorResponse(err)
    })?;

    // decoding and OCR are CPU bound
    let service = state.service.clone();
    let response = tokio::task::spawn_blocking(move || service.handle(&request))
        .await
        .map_err(|e| ApiErrorResponse(ApiError::InternalError(e.to_string())))?;

    Ok(Json(response))
}

async fn not_found_handler() -> ApiErrorResponse {
    ApiErrorResponse(ApiError::NotFound("no such route".to_string()))
}

pub struct ApiErrorResponse(pub ApiError);

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let error_response = self.0.to_response(None);

        (status, Json(error_response)).into_response()
    }
}
