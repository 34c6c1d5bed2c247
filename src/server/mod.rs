//! HTTP server layer for the sectional tile server.
//!
//! This module provides the HTTP API that web map clients load tiles from.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │   GET /tiles/{chart}/{z}/{x}/{y}.png                            │
//! │   GET /api/sectionals/{chart}/tiles/{z}/{x}/{y}.png             │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌─────────────────────────────┐  │
//! │  │        handlers          │  │          routes             │  │
//! │  │ (requests, status map)   │  │ (backends, CORS, tracing)   │  │
//! │  └──────────────────────────┘  └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    health_handler, metadata_handler, root_handler, tile_handler, ErrorResponse, HealthResponse,
    MetadataResponse, ResponsePolicy, TilePathParams, TileState, TILE_FALLBACK_HEADER,
};
pub use routes::{create_router, RouterConfig, TileBackends};
