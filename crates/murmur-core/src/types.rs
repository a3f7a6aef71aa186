// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across crate boundaries.
//!
//! Timestamps are ISO 8601 strings throughout; SQLite stores them as TEXT
//! and the gateway emits them verbatim.

use serde::{Deserialize, Serialize};

/// A single ingested social document (post, comment, review).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Stable document identifier (caller-supplied or generated).
    pub doc_id: String,
    /// Brand the document mentions.
    pub brand: String,
    /// Source platform ("reddit", "x", "youtube", ...).
    pub platform: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country_code: String,
    /// BCP 47 language tag of the text.
    pub language: String,
    /// Sentiment label: "pos", "neu", or "neg".
    pub sentiment: String,
    /// Cleaned document text.
    pub text: String,
    /// Engagement counter, incremented through the write path.
    pub engagement_count: i64,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
}

/// Aggregate sentiment counts over the document store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentimentStats {
    pub total: i64,
    pub positive: i64,
    pub neutral: i64,
    pub negative: i64,
}

/// Health of the storage layer as observed by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// Storage answers queries.
    Healthy,
    /// Storage is unreachable or refusing work.
    Unhealthy,
}

impl HealthStatus {
    /// Lowercase label used in health responses and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

/// Valid sentiment labels, in the order reported by stats.
pub const SENTIMENTS: [&str; 3] = ["pos", "neu", "neg"];
