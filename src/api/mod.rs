// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod dispatcher;
pub mod errors;
pub mod http_server;
pub mod request;
pub mod response;

pub use dispatcher::{ImageService, ServiceError};
pub use errors::{ApiError, ErrorResponse};
pub use http_server::{router, start_server, HealthResponse};
pub use request::{
    CommandAction, CommandDefaults, CommandRow, CommandTable, Keywords, RecognitionCommand,
    RecognizeParams, ServiceRequest, SkipReason,
};
pub use response::{
    BarcodeImageRow, BarcodeRow, ResultTables, ServiceResponse, Status, TextRow,
};
