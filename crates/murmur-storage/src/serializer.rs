// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The write serializer: a process-wide gate admitting one write
//! transaction at a time.
//!
//! SQLite allows a single writer per database file. Rather than letting
//! concurrent writers collide on `SQLITE_BUSY`, every write acquires the
//! slot here first. `tokio::sync::Semaphore` queues waiters in FIFO order,
//! so a stream of write requests drains in pure arrival order. Reads never
//! touch the serializer; they go through the read pool.

use std::sync::Arc;
use std::time::Duration;

use murmur_core::MurmurError;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// FIFO gate over the single writer slot.
#[derive(Debug)]
pub struct WriteSerializer {
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl WriteSerializer {
    /// Create a serializer whose waiters give up after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(1)),
            timeout,
        }
    }

    /// Wait for the writer slot, in arrival order.
    ///
    /// A waiter that exceeds the configured bound fails with
    /// [`MurmurError::WriteTimeout`] and leaves the queue immediately
    /// (dropping the acquire future releases its queue position), so a
    /// timed-out request never blocks the requests behind it.
    pub async fn acquire(&self) -> Result<WriteSlot, MurmurError> {
        match tokio::time::timeout(self.timeout, self.permits.clone().acquire_owned()).await {
            Ok(Ok(permit)) => Ok(WriteSlot { _permit: permit }),
            Ok(Err(_closed)) => Err(MurmurError::Internal(
                "write serializer semaphore closed".to_string(),
            )),
            Err(_elapsed) => Err(MurmurError::WriteTimeout {
                waited: self.timeout,
            }),
        }
    }
}

/// The singleton token representing writer exclusivity.
///
/// Released exactly once: either explicitly via [`release`](Self::release)
/// or implicitly on drop. Ownership makes a double release unrepresentable.
#[derive(Debug)]
pub struct WriteSlot {
    _permit: OwnedSemaphorePermit,
}

impl WriteSlot {
    /// Hand the slot to the next queued waiter (or leave it free).
    pub fn release(self) {
        // Dropping the permit wakes the head of the FIFO queue.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn acquire_and_release_cycles() {
        let serializer = WriteSerializer::new(Duration::from_millis(200));
        let slot = serializer.acquire().await.unwrap();
        slot.release();
        let slot = serializer.acquire().await.unwrap();
        drop(slot);
        // Implicit release frees the slot just like an explicit one.
        let slot = serializer.acquire().await.unwrap();
        slot.release();
    }

    #[tokio::test]
    async fn queued_waiter_times_out_and_queue_recovers() {
        let serializer = Arc::new(WriteSerializer::new(Duration::from_millis(50)));
        let held = serializer.acquire().await.unwrap();

        // Second contender times out while the slot is held.
        let err = serializer.acquire().await.unwrap_err();
        assert!(matches!(err, MurmurError::WriteTimeout { .. }));

        // After release the slot is immediately grantable again.
        held.release();
        let slot = serializer.acquire().await.unwrap();
        slot.release();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn waiters_are_granted_in_arrival_order() {
        let serializer = Arc::new(WriteSerializer::new(Duration::from_secs(10)));
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let held = serializer.acquire().await.unwrap();

        let mut handles = Vec::new();
        for i in 0..8usize {
            let serializer = serializer.clone();
            let order = order.clone();
            handles.push(tokio::spawn(async move {
                let slot = serializer.acquire().await.unwrap();
                order.lock().unwrap().push(i);
                slot.release();
            }));
            // Let each waiter register with the semaphore before spawning
            // the next, so arrival order is well defined.
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        held.release();
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*order.lock().unwrap(), (0..8).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn at_most_one_holder_at_any_instant() {
        let serializer = Arc::new(WriteSerializer::new(Duration::from_secs(5)));
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let serializer = serializer.clone();
            let active = active.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                let slot = serializer.acquire().await.unwrap();
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                slot.release();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }
}
