// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded pool of read-only connections to the database file.
//!
//! Each entry wraps its own `tokio_rusqlite::Connection` (one background
//! thread per entry) opened with `SQLITE_OPEN_READ_ONLY`, so a pooled read
//! can never slip a write past the serializer. Capacity is enforced with a
//! FIFO semaphore; entries are opened lazily and reused across leases.
//! An entry that reported a connection-level failure is marked stale and
//! discarded on release instead of being recycled.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use murmur_core::MurmurError;
use rusqlite::OpenFlags;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// A reusable read-only connection owned by the pool.
struct PoolEntry {
    conn: tokio_rusqlite::Connection,
}

impl PoolEntry {
    async fn open(path: &Path, busy_timeout_ms: u64) -> Result<Self, MurmurError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_NO_MUTEX
            | OpenFlags::SQLITE_OPEN_URI;
        let conn = tokio_rusqlite::Connection::open_with_flags(path, flags)
            .await
            .map_err(|e| MurmurError::StorageUnavailable {
                source: Box::new(e),
            })?;

        let pragma = format!("PRAGMA busy_timeout = {busy_timeout_ms};");
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(&pragma)?;
            Ok(())
        })
        .await
        .map_err(|e| MurmurError::StorageUnavailable {
            source: Box::new(e),
        })?;

        debug!(path = %path.display(), "opened read-only pool connection");
        Ok(Self { conn })
    }
}

/// Idle entries shared between the pool and outstanding leases.
struct PoolShared {
    idle: Mutex<Vec<PoolEntry>>,
}

impl PoolShared {
    fn lock_idle(&self) -> std::sync::MutexGuard<'_, Vec<PoolEntry>> {
        // A poisoned idle list only means a panicked thread mid-push;
        // the Vec itself is still valid.
        self.idle.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Capacity-bounded pool of read-only connections.
pub struct ReadPool {
    path: PathBuf,
    busy_timeout_ms: u64,
    lease_timeout: Duration,
    permits: Arc<Semaphore>,
    shared: Arc<PoolShared>,
}

impl ReadPool {
    /// Create an empty pool; connections open lazily on first lease.
    pub fn new(
        path: PathBuf,
        capacity: usize,
        lease_timeout: Duration,
        busy_timeout_ms: u64,
    ) -> Self {
        Self {
            path,
            busy_timeout_ms,
            lease_timeout,
            permits: Arc::new(Semaphore::new(capacity)),
            shared: Arc::new(PoolShared {
                idle: Mutex::new(Vec::with_capacity(capacity)),
            }),
        }
    }

    /// Drop every idle entry, closing its connection and background
    /// thread. Called once when the storage handle closes; all leases
    /// have drained by then. Returns the number of entries closed.
    pub(crate) fn drain_idle(&self) -> usize {
        let mut idle = self.shared.lock_idle();
        let released = idle.len();
        idle.clear();
        released
    }

    /// Number of idle entries currently parked in the pool.
    pub(crate) fn idle_count(&self) -> usize {
        self.shared.lock_idle().len()
    }

    /// Borrow a read connection, waiting up to the configured bound when
    /// all entries are leased. Expiry fails with
    /// [`MurmurError::PoolExhausted`]; the semaphore guarantees outstanding
    /// leases never exceed capacity.
    pub async fn lease(&self) -> Result<ReadLease, MurmurError> {
        let permit =
            match tokio::time::timeout(self.lease_timeout, self.permits.clone().acquire_owned())
                .await
            {
                Ok(Ok(permit)) => permit,
                Ok(Err(_closed)) => {
                    return Err(MurmurError::Internal(
                        "read pool semaphore closed".to_string(),
                    ));
                }
                Err(_elapsed) => {
                    return Err(MurmurError::PoolExhausted {
                        waited: self.lease_timeout,
                    });
                }
            };

        let entry = self.shared.lock_idle().pop();
        let entry = match entry {
            Some(entry) => entry,
            None => PoolEntry::open(&self.path, self.busy_timeout_ms).await?,
        };

        Ok(ReadLease {
            entry: Some(entry),
            stale: false,
            shared: Arc::clone(&self.shared),
            _permit: permit,
        })
    }
}

/// A leased read connection; returns to the pool on drop.
pub struct ReadLease {
    entry: Option<PoolEntry>,
    stale: bool,
    shared: Arc<PoolShared>,
    _permit: OwnedSemaphorePermit,
}

impl std::fmt::Debug for ReadLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadLease").field("stale", &self.stale).finish_non_exhaustive()
    }
}

impl ReadLease {
    /// The leased connection. Reads run on its background thread via
    /// `call`.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        // entry is Some from construction until Drop.
        &self.entry.as_ref().expect("lease entry taken before drop").conn
    }

    /// Mark the underlying connection broken so it is discarded instead of
    /// recycled; the replacement opens lazily on the next lease.
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }
}

impl Drop for ReadLease {
    fn drop(&mut self) {
        if let Some(entry) = self.entry.take() {
            if self.stale {
                debug!("discarding stale read connection");
                // Dropping the entry closes its background thread.
            } else {
                self.shared.lock_idle().push(entry);
            }
        }
        // _permit drops after the entry is back in the idle list, waking
        // the next queued lease.
    }
}
