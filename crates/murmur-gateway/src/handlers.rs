// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the document API.
//!
//! Each handler declares its intent by construction: read handlers call
//! `Database::read` through the query layer, write handlers go through
//! `write_with_retry` and therefore the write serializer. There is no
//! other path to the database file.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use murmur_core::types::{Document, SENTIMENTS, SentimentStats};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::server::GatewayState;

const MAX_LIST_LIMIT: i64 = 500;
const DEFAULT_LIST_LIMIT: i64 = 50;

/// Request body for POST /v1/documents.
#[derive(Debug, Deserialize)]
pub struct DocumentRequest {
    /// Optional caller-supplied identifier; generated when absent.
    #[serde(default)]
    pub doc_id: Option<String>,
    pub brand: String,
    pub platform: String,
    pub country_code: String,
    #[serde(default = "default_language")]
    pub language: String,
    /// One of "pos", "neu", "neg".
    pub sentiment: String,
    pub text: String,
}

fn default_language() -> String {
    "en".to_string()
}

/// Query parameters for GET /v1/documents.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Response body for POST /v1/documents/{id}/engage.
#[derive(Debug, Serialize)]
pub struct EngageResponse {
    pub doc_id: String,
    pub engagement_count: i64,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Response body for GET /v1/documents.
#[derive(Debug, Serialize)]
pub struct DocumentListResponse {
    pub documents: Vec<Document>,
}

/// GET /health
///
/// Probes storage with a trivial read through the pool. Unauthenticated;
/// used by the supervisor and the ingress.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let status = state.db.health_check().await;
    let body = HealthResponse {
        status: status.as_str().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    };
    match status {
        murmur_core::HealthStatus::Healthy => (StatusCode::OK, Json(body)).into_response(),
        murmur_core::HealthStatus::Unhealthy => {
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
        }
    }
}

/// POST /v1/documents
pub async fn post_document(
    State(state): State<GatewayState>,
    Json(body): Json<DocumentRequest>,
) -> Result<(StatusCode, Json<Document>), GatewayError> {
    if !SENTIMENTS.contains(&body.sentiment.as_str()) {
        return Err(GatewayError::InvalidRequest(format!(
            "sentiment must be one of {SENTIMENTS:?}, got '{}'",
            body.sentiment
        )));
    }
    if body.text.trim().is_empty() {
        return Err(GatewayError::InvalidRequest("text must not be empty".into()));
    }

    let document = Document {
        doc_id: body
            .doc_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        brand: body.brand,
        platform: body.platform,
        country_code: body.country_code,
        language: body.language,
        sentiment: body.sentiment,
        text: body.text,
        engagement_count: 0,
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    murmur_storage::queries::documents::insert_document(&state.db, &document).await?;
    Ok((StatusCode::CREATED, Json(document)))
}

/// GET /v1/documents
pub async fn list_documents(
    State(state): State<GatewayState>,
    Query(params): Query<ListParams>,
) -> Result<Json<DocumentListResponse>, GatewayError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    let documents =
        murmur_storage::queries::documents::list_documents(&state.db, params.brand, limit).await?;
    Ok(Json(DocumentListResponse { documents }))
}

/// GET /v1/documents/{id}
pub async fn get_document(
    State(state): State<GatewayState>,
    Path(doc_id): Path<String>,
) -> Result<Json<Document>, GatewayError> {
    match murmur_storage::queries::documents::get_document(&state.db, &doc_id).await? {
        Some(document) => Ok(Json(document)),
        None => Err(murmur_core::MurmurError::NotFound { id: doc_id }.into()),
    }
}

/// POST /v1/documents/{id}/engage
pub async fn engage_document(
    State(state): State<GatewayState>,
    Path(doc_id): Path<String>,
) -> Result<Json<EngageResponse>, GatewayError> {
    match murmur_storage::queries::documents::engage_document(&state.db, &doc_id).await? {
        Some(engagement_count) => Ok(Json(EngageResponse {
            doc_id,
            engagement_count,
        })),
        None => Err(murmur_core::MurmurError::NotFound { id: doc_id }.into()),
    }
}

/// GET /v1/stats
pub async fn get_stats(
    State(state): State<GatewayState>,
) -> Result<Json<SentimentStats>, GatewayError> {
    let stats = murmur_storage::queries::documents::sentiment_stats(&state.db).await?;
    Ok(Json(stats))
}
