// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Reverie persona memory engine.
//!
//! Routes:
//! - `POST /v1/chat` -- streaming persona chat (SSE)
//! - `POST /v1/turns` -- save a completed turn into conversation memory
//! - `POST /v1/archive` -- ingest a lore document
//! - `POST /v1/archive/query` -- ranked archive search
//! - `POST /v1/validate` -- consistency verdict for generated content
//! - `GET /health` -- liveness

pub mod handlers;
pub mod server;

pub use server::{router, start_server, GatewayState, ServerConfig};
