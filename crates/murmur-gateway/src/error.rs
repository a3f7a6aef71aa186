// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from the service error taxonomy onto HTTP responses.
//!
//! Retryable failures (slot timeout, pool backpressure, conflict after
//! retries, draining) come back as 503/409 with a `Retry-After` hint so
//! well-behaved clients back off and try again. Storage faults are 500
//! and also flip the health endpoint.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use murmur_core::MurmurError;
use serde::Serialize;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
    /// Whether the client may retry the same request.
    pub retryable: bool,
}

/// Gateway-level error: either a bad request or a storage failure.
#[derive(Debug)]
pub enum GatewayError {
    /// Malformed or invalid request payload.
    InvalidRequest(String),
    /// Failure surfaced from the storage layer.
    Storage(MurmurError),
}

impl From<MurmurError> for GatewayError {
    fn from(e: MurmurError) -> Self {
        GatewayError::Storage(e)
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, retryable, message) = match self {
            GatewayError::InvalidRequest(message) => (StatusCode::BAD_REQUEST, false, message),
            GatewayError::Storage(e) => {
                let status = match &e {
                    MurmurError::WriteTimeout { .. }
                    | MurmurError::PoolExhausted { .. }
                    | MurmurError::Draining => StatusCode::SERVICE_UNAVAILABLE,
                    MurmurError::WriteConflict { .. } => StatusCode::CONFLICT,
                    MurmurError::NotFound { .. } => StatusCode::NOT_FOUND,
                    MurmurError::StorageUnavailable { .. }
                    | MurmurError::MigrationFailure { .. }
                    | MurmurError::Config(_)
                    | MurmurError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    tracing::error!(error = %e, "request failed");
                }
                (status, e.is_retryable(), e.to_string())
            }
        };

        let mut response = (
            status,
            Json(ErrorResponse {
                error: message,
                retryable,
            }),
        )
            .into_response();
        if retryable {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn backpressure_maps_to_503_with_retry_after() {
        let response = GatewayError::Storage(MurmurError::PoolExhausted {
            waited: Duration::from_secs(1),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
    }

    #[test]
    fn conflict_maps_to_409() {
        let response =
            GatewayError::Storage(MurmurError::WriteConflict { attempts: 3 }).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn not_found_maps_to_404_without_retry_after() {
        let response =
            GatewayError::Storage(MurmurError::NotFound { id: "d1".into() }).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(!response.headers().contains_key(header::RETRY_AFTER));
    }

    #[test]
    fn invalid_request_maps_to_400() {
        let response = GatewayError::InvalidRequest("bad sentiment".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
