// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Murmur service.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across all Murmur crates.
///
/// The storage variants map one-to-one onto the failure modes of a single
/// shared database file: open failures are fatal to the triggering request,
/// conflicts and timeouts are retryable, migration failures are fatal to the
/// whole process.
#[derive(Debug, Error)]
pub enum MurmurError {
    /// Configuration errors (invalid TOML, out-of-range values, bad env overrides).
    #[error("configuration error: {0}")]
    Config(String),

    /// The database file cannot be opened or reached (missing volume,
    /// permissions, corrupted handle). Fatal to the calling request; the
    /// process stays up and reports unhealthy if this recurs.
    #[error("storage unavailable: {source}")]
    StorageUnavailable {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A write transaction could not commit because the file changed
    /// underneath it. Callers retry the whole logical operation.
    #[error("write conflict after {attempts} attempt(s)")]
    WriteConflict { attempts: u32 },

    /// A write request waited longer than the configured bound for the
    /// writer slot and was removed from the queue.
    #[error("timed out waiting {waited:?} for the write slot")]
    WriteTimeout { waited: Duration },

    /// All read connections were leased for longer than the configured
    /// bound. Surfaced to callers as backpressure.
    #[error("read pool exhausted after waiting {waited:?}")]
    PoolExhausted { waited: Duration },

    /// Schema migration failed during startup. The process must not serve.
    #[error("migration failure: {source}")]
    MigrationFailure {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The service is draining or closed and no longer admits new work.
    #[error("service is shutting down")]
    Draining,

    /// A requested entity does not exist.
    #[error("not found: {id}")]
    NotFound { id: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MurmurError {
    /// Whether the caller can reasonably retry the same logical operation.
    ///
    /// Conflicts, slot timeouts, and pool backpressure are transient under
    /// load; everything else indicates a bug, bad input, or a dead volume.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MurmurError::WriteConflict { .. }
                | MurmurError::WriteTimeout { .. }
                | MurmurError::PoolExhausted { .. }
        )
    }
}
