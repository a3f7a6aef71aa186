// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and the
//! single-writer discipline.
//!
//! One read-write `tokio_rusqlite::Connection` (the writer) carries every
//! write transaction; the [`WriteSerializer`] admits them one at a time in
//! arrival order. Reads go through the [`ReadPool`]'s read-only
//! connections and run as deferred transactions, which under WAL gives
//! each read a consistent snapshot as of its first read. Do NOT create
//! additional read-write connections to the same file.
//!
//! Durability: the writer runs `synchronous = FULL`, so a committed write
//! has reached disk before `write` returns.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use murmur_config::model::StorageConfig;
use murmur_core::types::HealthStatus;
use murmur_core::MurmurError;
use rusqlite::{ErrorCode, TransactionBehavior};
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::pool::ReadPool;
use crate::serializer::WriteSerializer;

const STATE_ACCEPTING: u8 = 0;
const STATE_DRAINING: u8 = 1;
const STATE_CLOSED: u8 = 2;

/// Owning handle to the single database file.
pub struct Database {
    writer: tokio_rusqlite::Connection,
    serializer: WriteSerializer,
    pool: ReadPool,
    retry_max_attempts: u32,
    retry_backoff: Duration,
    state: AtomicU8,
    in_flight: AtomicUsize,
    drained: Notify,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open the database file named by `config`, creating it if absent,
    /// and apply the connection PRAGMAs.
    ///
    /// Fails with [`MurmurError::StorageUnavailable`] if the file cannot
    /// be opened (missing volume, permissions).
    pub async fn open(config: &StorageConfig) -> Result<Self, MurmurError> {
        let path = config.database_path();
        let writer = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(|e| MurmurError::StorageUnavailable {
                source: Box::new(e),
            })?;

        let busy_timeout_ms = config.busy_timeout_ms;
        writer
            .call(move |conn| {
                conn.execute_batch(&format!(
                    "PRAGMA journal_mode = WAL;
                     PRAGMA synchronous = FULL;
                     PRAGMA foreign_keys = ON;
                     PRAGMA busy_timeout = {busy_timeout_ms};"
                ))?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        debug!(path = %path.display(), "writer connection opened (WAL, synchronous=FULL)");

        Ok(Self {
            writer,
            serializer: WriteSerializer::new(config.write_timeout()),
            pool: ReadPool::new(
                path,
                config.pool_capacity,
                config.lease_timeout(),
                config.busy_timeout_ms,
            ),
            retry_max_attempts: config.retry_max_attempts,
            retry_backoff: config.retry_backoff(),
            state: AtomicU8::new(STATE_ACCEPTING),
            in_flight: AtomicUsize::new(0),
            drained: Notify::new(),
        })
    }

    /// Run `f` inside a snapshot read transaction on a pooled read-only
    /// connection.
    ///
    /// The closure executes on the pool entry's background thread; the
    /// transaction commits (a no-op for reads) when the closure returns,
    /// and rolls back on error or if the call is abandoned.
    pub async fn read<T, F>(&self, f: F) -> Result<T, MurmurError>
    where
        F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T, rusqlite::Error> + Send + 'static,
        T: Send + 'static,
    {
        let _op = self.begin_op()?;
        let mut lease = self.pool.lease().await?;
        let result = lease
            .connection()
            .call(move |conn| {
                let tx = conn.transaction()?;
                let out = f(&tx)?;
                tx.commit()?;
                Ok(out)
            })
            .await;
        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                if is_connection_error(&e) {
                    warn!(error = %e, "read connection broken, discarding pool entry");
                    lease.mark_stale();
                }
                Err(map_tr_err(e))
            }
        }
    }

    /// Run `f` inside an exclusive `BEGIN IMMEDIATE` write transaction.
    ///
    /// Acquires the writer slot first (FIFO, bounded wait), commits on
    /// closure success, rolls back on closure error. The slot is released
    /// on every exit path. `SQLITE_BUSY`/`SQLITE_LOCKED` at any point maps
    /// to [`MurmurError::WriteConflict`]; callers retry the whole logical
    /// operation, most conveniently via [`write_with_retry`](Self::write_with_retry).
    pub async fn write<T, F>(&self, f: F) -> Result<T, MurmurError>
    where
        F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T, rusqlite::Error> + Send + 'static,
        T: Send + 'static,
    {
        let _op = self.begin_op()?;
        let slot = self.serializer.acquire().await?;
        let result = self
            .writer
            .call(move |conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let out = f(&tx)?;
                tx.commit()?;
                Ok(out)
            })
            .await;
        slot.release();
        result.map_err(map_tr_err)
    }

    /// Like [`write`](Self::write), re-running the whole closure on
    /// [`MurmurError::WriteConflict`] with the configured bounded retry
    /// policy (fixed backoff between attempts).
    pub async fn write_with_retry<T, F>(&self, f: F) -> Result<T, MurmurError>
    where
        F: Fn(&rusqlite::Transaction<'_>) -> Result<T, rusqlite::Error> + Send + Sync + 'static,
        T: Send + 'static,
    {
        let f = Arc::new(f);
        let mut attempt: u32 = 1;
        loop {
            let f = Arc::clone(&f);
            match self.write(move |tx| f(tx)).await {
                Err(MurmurError::WriteConflict { .. }) if attempt < self.retry_max_attempts => {
                    debug!(attempt, "write conflict, retrying");
                    tokio::time::sleep(self.retry_backoff).await;
                    attempt += 1;
                }
                Err(MurmurError::WriteConflict { .. }) => {
                    return Err(MurmurError::WriteConflict { attempts: attempt });
                }
                other => return other,
            }
        }
    }

    /// Probe storage with a trivial read.
    pub async fn health_check(&self) -> HealthStatus {
        match self.read(|tx| tx.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))).await {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => {
                warn!(error = %e, "health check failed");
                HealthStatus::Unhealthy
            }
        }
    }

    /// Stop admitting work, wait for in-flight reads and the active write
    /// to finish, checkpoint the WAL, and close every connection: idle
    /// pool entries first, the writer last, so the final close removes
    /// the `-wal`/`-shm` sidecars.
    ///
    /// Single-shot: a second call is rejected, never silently repeated.
    pub async fn shutdown(&self) -> Result<(), MurmurError> {
        self.state
            .compare_exchange(
                STATE_ACCEPTING,
                STATE_DRAINING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| MurmurError::Internal("database already shut down".to_string()))?;

        self.wait_drained().await;

        self.writer
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        let released = self.pool.drain_idle();
        self.writer.clone().close().await.map_err(map_tr_err)?;
        self.state.store(STATE_CLOSED, Ordering::Release);
        debug!(released, "shutdown: WAL checkpointed, connections closed");
        Ok(())
    }

    /// Whether the handle still admits new work.
    pub fn is_accepting(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_ACCEPTING
    }

    /// Number of operations currently holding a lease or the writer slot.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub(crate) async fn run_on_writer<T, E, F>(&self, f: F) -> Result<T, tokio_rusqlite::Error<E>>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        self.writer.call(f).await
    }

    fn begin_op(&self) -> Result<OpGuard<'_>, MurmurError> {
        if self.state.load(Ordering::Acquire) != STATE_ACCEPTING {
            return Err(MurmurError::Draining);
        }
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        // Re-check after registering so a drain that raced us sees either
        // the new count or our refusal, never neither.
        if self.state.load(Ordering::Acquire) != STATE_ACCEPTING {
            self.finish_op();
            return Err(MurmurError::Draining);
        }
        Ok(OpGuard { db: self })
    }

    fn finish_op(&self) {
        if self.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.drained.notify_waiters();
        }
    }

    async fn wait_drained(&self) {
        loop {
            let notified = self.drained.notified();
            if self.in_flight.load(Ordering::Acquire) == 0 {
                break;
            }
            notified.await;
        }
    }
}

/// Scope of one admitted operation; decrements the in-flight gauge on every
/// exit path, including panics and cancellation.
struct OpGuard<'a> {
    db: &'a Database,
}

impl Drop for OpGuard<'_> {
    fn drop(&mut self) {
        self.db.finish_op();
    }
}

/// Classify errors that indicate the connection itself (or the file under
/// it) is broken, as opposed to a statement-level failure.
fn is_connection_error(e: &tokio_rusqlite::Error) -> bool {
    match e {
        tokio_rusqlite::Error::ConnectionClosed => true,
        tokio_rusqlite::Error::Error(rusqlite::Error::SqliteFailure(err, _)) => matches!(
            err.code,
            ErrorCode::CannotOpen
                | ErrorCode::NotADatabase
                | ErrorCode::DatabaseCorrupt
                | ErrorCode::SystemIoFailure
                | ErrorCode::DiskFull
        ),
        _ => false,
    }
}

/// Map a `tokio_rusqlite` error onto the service taxonomy.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error) -> MurmurError {
    match &e {
        tokio_rusqlite::Error::Error(rusqlite::Error::SqliteFailure(err, _))
            if matches!(
                err.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ) =>
        {
            MurmurError::WriteConflict { attempts: 1 }
        }
        _ if is_connection_error(&e) => MurmurError::StorageUnavailable {
            source: Box::new(e),
        },
        _ => MurmurError::Internal(format!("database error: {e}")),
    }
}
