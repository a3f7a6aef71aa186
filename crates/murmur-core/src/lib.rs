// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Murmur service.
//!
//! This crate provides the error taxonomy and the domain types shared across
//! the Murmur workspace. Every other crate depends on it and nothing here
//! depends on the storage engine or the HTTP layer.

pub mod error;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::MurmurError;
pub use types::{Document, HealthStatus, SentimentStats};

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn murmur_error_has_all_variants() {
        // Verify every variant of the taxonomy can be constructed.
        let _config = MurmurError::Config("test".into());
        let _unavailable = MurmurError::StorageUnavailable {
            source: Box::new(std::io::Error::other("test")),
        };
        let _conflict = MurmurError::WriteConflict { attempts: 3 };
        let _write_timeout = MurmurError::WriteTimeout {
            waited: Duration::from_secs(5),
        };
        let _exhausted = MurmurError::PoolExhausted {
            waited: Duration::from_secs(5),
        };
        let _migration = MurmurError::MigrationFailure {
            source: Box::new(std::io::Error::other("test")),
        };
        let _draining = MurmurError::Draining;
        let _not_found = MurmurError::NotFound { id: "doc-1".into() };
        let _internal = MurmurError::Internal("test".into());
    }

    #[test]
    fn retryable_classification() {
        assert!(MurmurError::WriteConflict { attempts: 1 }.is_retryable());
        assert!(
            MurmurError::WriteTimeout {
                waited: Duration::from_secs(1)
            }
            .is_retryable()
        );
        assert!(
            MurmurError::PoolExhausted {
                waited: Duration::from_secs(1)
            }
            .is_retryable()
        );
        assert!(!MurmurError::Internal("test".into()).is_retryable());
        assert!(
            !MurmurError::StorageUnavailable {
                source: Box::new(std::io::Error::other("test")),
            }
            .is_retryable()
        );
    }
}
