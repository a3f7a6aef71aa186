// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide storage lifecycle: `Uninitialized -> Ready -> Draining -> Closed`.
//!
//! `initialize` creates the storage directory if absent, opens the database
//! (creating the file on first run), and applies pending migrations. Any
//! failure there is fatal: the caller must exit non-zero before binding the
//! listening port. `shutdown` stops admission, drains in-flight leases and
//! the active write slot, then checkpoints and closes the file. A shutdown
//! requested while still uninitialized goes straight to `Closed` without
//! opening anything.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use murmur_config::model::StorageConfig;
use murmur_core::MurmurError;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::database::Database;
use crate::migrations;

/// Lifecycle states, in transition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Ready,
    Draining,
    Closed,
}

const LS_UNINITIALIZED: u8 = 0;
const LS_READY: u8 = 1;
const LS_DRAINING: u8 = 2;
const LS_CLOSED: u8 = 3;

/// Owns startup and teardown of the storage layer.
pub struct Lifecycle {
    config: StorageConfig,
    db: OnceCell<Arc<Database>>,
    state: AtomicU8,
}

impl Lifecycle {
    /// Create a lifecycle in `Uninitialized`; nothing is opened yet.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
            state: AtomicU8::new(LS_UNINITIALIZED),
        }
    }

    /// Current state.
    pub fn state(&self) -> LifecycleState {
        match self.state.load(Ordering::Acquire) {
            LS_READY => LifecycleState::Ready,
            LS_DRAINING => LifecycleState::Draining,
            LS_CLOSED => LifecycleState::Closed,
            _ => LifecycleState::Uninitialized,
        }
    }

    /// `Uninitialized -> Ready`: create the data directory, open the
    /// database file, apply pending migrations.
    ///
    /// Fatal on failure; the lifecycle stays `Uninitialized` and the
    /// process must not start serving.
    pub async fn initialize(&self) -> Result<Arc<Database>, MurmurError> {
        if self.state.load(Ordering::Acquire) != LS_UNINITIALIZED {
            return Err(MurmurError::Internal(
                "lifecycle already initialized".to_string(),
            ));
        }

        std::fs::create_dir_all(&self.config.data_dir).map_err(|e| {
            MurmurError::StorageUnavailable {
                source: Box::new(e),
            }
        })?;

        let db = Arc::new(Database::open(&self.config).await?);
        db.run_on_writer(migrations::run_migrations)
            .await
            .map_err(|e| MurmurError::MigrationFailure {
                source: Box::new(e),
            })?;
        debug!("migrations applied");

        self.db
            .set(Arc::clone(&db))
            .map_err(|_| MurmurError::Internal("lifecycle already initialized".to_string()))?;
        self.state.store(LS_READY, Ordering::Release);
        info!(path = %self.config.database_path().display(), "storage ready");
        Ok(db)
    }

    /// The database handle, once `Ready`.
    pub fn database(&self) -> Result<Arc<Database>, MurmurError> {
        self.db.get().cloned().ok_or_else(|| {
            MurmurError::Internal("storage not initialized -- call initialize() first".to_string())
        })
    }

    /// `Ready -> Draining -> Closed`, or `Uninitialized -> Closed`.
    ///
    /// Blocks until every in-flight read lease and the active write slot
    /// holder have finished. Idempotence is rejected, not repeated: a
    /// second call returns an error.
    pub async fn shutdown(&self) -> Result<(), MurmurError> {
        match self.state.compare_exchange(
            LS_UNINITIALIZED,
            LS_CLOSED,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                info!("shutdown before initialization, nothing to drain");
                return Ok(());
            }
            Err(_) => {}
        }

        self.state
            .compare_exchange(LS_READY, LS_DRAINING, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| MurmurError::Internal("lifecycle already shut down".to_string()))?;

        let db = self.database()?;
        info!(in_flight = db.in_flight(), "draining storage");
        db.shutdown().await?;
        self.state.store(LS_CLOSED, Ordering::Release);
        info!("storage closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(dir: &tempfile::TempDir) -> StorageConfig {
        StorageConfig {
            data_dir: dir.path().join("data"),
            ..StorageConfig::default()
        }
    }

    #[tokio::test]
    async fn initialize_creates_directory_file_and_schema() {
        let dir = tempdir().unwrap();
        let config = make_config(&dir);
        let lifecycle = Lifecycle::new(config.clone());
        assert_eq!(lifecycle.state(), LifecycleState::Uninitialized);

        let db = lifecycle.initialize().await.unwrap();
        assert_eq!(lifecycle.state(), LifecycleState::Ready);
        assert!(config.database_path().exists());

        // Exactly one database file in the directory.
        let db_files: Vec<_> = std::fs::read_dir(&config.data_dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "db"))
            .collect();
        assert_eq!(db_files.len(), 1);

        // Schema is applied and queryable.
        let count: i64 = db
            .read(|tx| tx.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(count, 0);

        lifecycle.shutdown().await.unwrap();
        assert_eq!(lifecycle.state(), LifecycleState::Closed);

        // All connections are closed, so only the database file remains.
        let wal = format!("{}-wal", config.database_path().display());
        let shm = format!("{}-shm", config.database_path().display());
        assert!(!std::path::Path::new(&wal).exists());
        assert!(!std::path::Path::new(&shm).exists());
    }

    #[tokio::test]
    async fn reinitializing_an_existing_store_is_a_noop() {
        let dir = tempdir().unwrap();
        let config = make_config(&dir);

        let first = Lifecycle::new(config.clone());
        let db = first.initialize().await.unwrap();
        db.write(|tx| {
            tx.execute(
                "INSERT INTO documents (doc_id, brand, platform, country_code, language,
                                        sentiment, text_clean, created_at)
                 VALUES ('d1', 'acme', 'reddit', 'US', 'en', 'neu', 'hello',
                         '2026-01-01T00:00:00.000Z')",
                [],
            )?;
            Ok(())
        })
        .await
        .unwrap();
        first.shutdown().await.unwrap();

        // Second lifecycle over the same directory: migrations re-run as a
        // no-op and existing data survives.
        let second = Lifecycle::new(config);
        let db = second.initialize().await.unwrap();
        let count: i64 = db
            .read(|tx| tx.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(count, 1);
        second.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let lifecycle = Lifecycle::new(make_config(&dir));
        lifecycle.initialize().await.unwrap();
        assert!(lifecycle.initialize().await.is_err());
    }

    #[tokio::test]
    async fn shutdown_while_uninitialized_goes_straight_to_closed() {
        let dir = tempdir().unwrap();
        let config = make_config(&dir);
        let lifecycle = Lifecycle::new(config.clone());
        lifecycle.shutdown().await.unwrap();
        assert_eq!(lifecycle.state(), LifecycleState::Closed);
        assert!(!config.database_path().exists(), "nothing should be opened");
        assert!(lifecycle.initialize().await.is_err());
    }

    #[tokio::test]
    async fn double_shutdown_is_rejected() {
        let dir = tempdir().unwrap();
        let lifecycle = Lifecycle::new(make_config(&dir));
        lifecycle.initialize().await.unwrap();
        lifecycle.shutdown().await.unwrap();
        assert!(lifecycle.shutdown().await.is_err());
    }

    #[tokio::test]
    async fn initialization_failure_is_fatal_and_state_stays_uninitialized() {
        let config = StorageConfig {
            data_dir: std::path::PathBuf::from("/proc/no-such-dir/data"),
            ..StorageConfig::default()
        };
        let lifecycle = Lifecycle::new(config);
        let err = lifecycle.initialize().await.unwrap_err();
        assert!(matches!(err, MurmurError::StorageUnavailable { .. }));
        assert_eq!(lifecycle.state(), LifecycleState::Uninitialized);
    }
}
