// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Murmur service.
//!
//! The outward-facing dispatcher: accepts concurrent inbound requests,
//! classifies each as a read or a write by route, and maps it onto the
//! storage core's read pool or write serializer. Everything acquired is
//! released on every exit path via RAII guards in the storage layer.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::GatewayError;
pub use server::{GatewayState, ServerConfig, build_router, start_server};
