// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence core for the Murmur service.
//!
//! Provides WAL-mode SQLite storage over a single database file with
//! embedded migrations, a FIFO write serializer, a capacity-bounded pool
//! of read-only connections, and a drain-aware lifecycle. All access to
//! the file goes through [`Database`]; nothing else in the workspace
//! opens a connection.

pub mod database;
pub mod lifecycle;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
pub mod serializer;

pub use database::Database;
pub use lifecycle::{Lifecycle, LifecycleState};
pub use models::*;
pub use pool::{ReadLease, ReadPool};
pub use serializer::{WriteSerializer, WriteSlot};
