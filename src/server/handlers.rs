//! HTTP request handlers for the sectional tile API.
//!
//! # Endpoints
//!
//! - `GET /tiles/{chart}/{z}/{x}/{y}.png` - Tile from the directory tree
//! - `GET /api/sectionals/{chart}/tiles/{z}/{x}/{y}.png` - Tile from the chart archive
//! - `GET /api/sectionals/{chart}/metadata` - Archive metadata
//! - `GET /health` - Health check endpoint
//! - `GET /` - Liveness text

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::archive::ArchiveSource;
use crate::config::MissingTileStatus;
use crate::error::{StoreError, TileError};
use crate::store::{ArchiveStore, TileStore, TILE_EXTENSION};
use crate::tile::{ChartId, TileRequest, TileResponse, TileService};

/// Response header reporting whether the row-flipped fallback served the tile.
pub const TILE_FALLBACK_HEADER: HeaderName = HeaderName::from_static("x-tile-fallback");

// =============================================================================
// Application State
// =============================================================================

/// How successful and missing tiles are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponsePolicy {
    /// Cache-Control max-age in seconds for tile responses
    pub cache_max_age: u32,

    /// Status for tiles absent at both addresses
    pub missing_tile_status: MissingTileStatus,
}

impl ResponsePolicy {
    pub fn new(cache_max_age: u32, missing_tile_status: MissingTileStatus) -> Self {
        Self {
            cache_max_age,
            missing_tile_status,
        }
    }

    /// `Cache-Control` value for tile responses.
    pub fn cache_control(&self) -> String {
        format!("public, max-age={}, immutable", self.cache_max_age)
    }

    fn tile_response(&self, tile: TileResponse) -> Response {
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "image/png".to_string()),
                (header::CACHE_CONTROL, self.cache_control()),
                (TILE_FALLBACK_HEADER, tile.fallback.to_string()),
            ],
            tile.data,
        )
            .into_response()
    }

    fn missing_response(&self) -> Response {
        self.missing_tile_status.status_code().into_response()
    }
}

/// Shared state for the tile routes of one backend.
///
/// This is passed to the handlers via Axum's State extractor.
pub struct TileState<T: TileStore> {
    /// The tile service for processing tile requests
    pub tile_service: Arc<TileService<T>>,

    pub policy: ResponsePolicy,
}

impl<T: TileStore> TileState<T> {
    pub fn new(tile_service: TileService<T>, policy: ResponsePolicy) -> Self {
        Self {
            tile_service: Arc::new(tile_service),
            policy,
        }
    }
}

impl<T: TileStore> Clone for TileState<T> {
    fn clone(&self) -> Self {
        Self {
            tile_service: Arc::clone(&self.tile_service),
            policy: self.policy,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Path parameters for tile requests.
///
/// Extracted from: `.../{chart}/{z}/{x}/{filename}` where filename is `{y}`
/// or `{y}.png`. Components are kept as strings so malformed values are
/// reported by our own validation rather than the extractor.
#[derive(Debug, Deserialize)]
pub struct TilePathParams {
    pub chart: String,
    pub z: String,
    pub x: String,
    pub filename: String,
}

impl TilePathParams {
    /// The row component, without any `.png` extension.
    pub fn y(&self) -> &str {
        self.filename
            .strip_suffix(TILE_EXTENSION)
            .and_then(|stem| stem.strip_suffix('.'))
            .unwrap_or(&self.filename)
    }

    /// Validate into a tile request.
    pub fn to_request(&self) -> Result<TileRequest, TileError> {
        TileRequest::parse(&self.chart, &self.z, &self.x, self.y())
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "invalid_coordinates", "backend_error")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Archive metadata response.
#[derive(Debug, Serialize)]
pub struct MetadataResponse {
    pub chart: String,
    pub metadata: BTreeMap<String, String>,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert TileError to HTTP response.
///
/// Backend faults keep their own status instead of collapsing into 404, and
/// are logged at ERROR level so a corrupt archive is visible to operators:
/// - 4xx errors are logged at WARN level (client errors)
/// - 404s are logged at DEBUG level
/// - 5xx errors are logged at ERROR level (server errors)
impl IntoResponse for TileError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            TileError::InvalidCoordinates(_) => (StatusCode::BAD_REQUEST, "invalid_coordinates"),
            TileError::InvalidChart(_) => (StatusCode::BAD_REQUEST, "invalid_chart"),
            TileError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            TileError::Store(store_err) => match store_err {
                StoreError::ArchiveNotFound { .. } => (StatusCode::NOT_FOUND, "chart_not_found"),
                StoreError::OpenTimeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "open_timeout"),
                StoreError::Open { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "open_error"),
                StoreError::Io { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
                StoreError::Backend(_) => (StatusCode::INTERNAL_SERVER_ERROR, "backend_error"),
            },
        };
        let message = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);

        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle tile requests for any backend.
///
/// # Endpoints
///
/// `GET /tiles/{chart}/{z}/{x}/{y}.png`
/// `GET /api/sectionals/{chart}/tiles/{z}/{x}/{y}.png`
///
/// # Response
///
/// - `200 OK`: PNG tile with `Content-Type: image/png`
/// - `400 Bad Request`: Malformed chart identifier or coordinates
/// - `404 Not Found` / `204 No Content`: No tile at either address (per policy)
/// - `500 Internal Server Error`: Storage fault
/// - `504 Gateway Timeout`: Archive took too long to open
///
/// # Headers
///
/// - `Content-Type: image/png`
/// - `Cache-Control: public, max-age={cache_max_age}, immutable`
/// - `X-Tile-Fallback: true|false`
pub async fn tile_handler<T: TileStore>(
    State(state): State<TileState<T>>,
    Path(params): Path<TilePathParams>,
) -> Response {
    let result = match params.to_request() {
        Ok(request) => state.tile_service.get_tile(request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(tile) => state.policy.tile_response(tile),
        Err(e) if e.is_missing() => {
            debug!("No tile: {}", e);
            state.policy.missing_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Handle archive metadata requests.
///
/// # Endpoint
///
/// `GET /api/sectionals/{chart}/metadata`
///
/// # Errors
///
/// - `400 Bad Request`: Malformed chart identifier
/// - `404 Not Found`: No archive for the chart
/// - `500 Internal Server Error`: Archive could not be read
pub async fn metadata_handler<S: ArchiveSource>(
    State(state): State<TileState<ArchiveStore<S>>>,
    Path(chart): Path<String>,
) -> Result<Json<MetadataResponse>, TileError> {
    let chart = ChartId::parse(&chart)?;
    let metadata = state.tile_service.store().metadata(&chart).await?;

    Ok(Json(MetadataResponse {
        chart: chart.to_string(),
        metadata,
    }))
}

/// Handle health check requests.
///
/// `200 OK` with `{"status": "ok", "version": "0.1.0"}`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Plain-text liveness check for load balancers.
pub async fn root_handler() -> &'static str {
    "ok"
}

// =============================================================================
// Tests
// =============================================================================
