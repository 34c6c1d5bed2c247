//! Router configuration for the sectional tile server.
//!
//! This module defines the HTTP routes and applies middleware for CORS and
//! request tracing.
//!
//! # Route Structure
//!
//! ```text
//! /                                             - Liveness text
//! /health                                       - Health check
//! /tiles/{chart}/{z}/{x}/{y}.png                - Directory tree tiles
//! /api/sectionals/{chart}/tiles/{z}/{x}/{y}.png - Archive tiles
//! /api/sectionals/{chart}/metadata              - Archive metadata
//! ```
//!
//! Tile routes are only mounted for the backends that are configured.
//!
//! # Example
//!
//! ```ignore
//! use sectional_tiles::server::{create_router, RouterConfig, TileBackends};
//! use sectional_tiles::archive::MbtilesSource;
//! use sectional_tiles::store::FilesystemStore;
//!
//! let backends = TileBackends::<MbtilesSource>::new()
//!     .with_filesystem(FilesystemStore::new("/var/data/tiles"));
//! let config = RouterConfig::new()
//!     .with_cors_origins(vec!["https://charts.example.com".to_string()]);
//!
//! let router = create_router(backends, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{routing::get, Router};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::handlers::{
    health_handler, metadata_handler, root_handler, tile_handler, ResponsePolicy, TileState,
    TILE_FALLBACK_HEADER,
};
use crate::archive::{ArchiveSource, MbtilesSource};
use crate::config::{MissingTileStatus, DEFAULT_CACHE_MAX_AGE};
use crate::store::{ArchiveStore, FilesystemStore};
use crate::tile::TileService;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (empty = no cross-origin access)
    pub cors_origins: Vec<String>,

    /// Cache-Control max-age in seconds
    pub cache_max_age: u32,

    /// Status for tiles that do not exist
    pub missing_tile_status: MissingTileStatus,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default:
    /// - No CORS origins are allowed
    /// - Cache max-age is 365 days
    /// - Missing tiles answer 404
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            cors_origins: Vec::new(),
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            missing_tile_status: MissingTileStatus::NotFound,
            enable_tracing: true,
        }
    }

    /// Set the allowed CORS origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Set the Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    pub fn with_missing_tile_status(mut self, status: MissingTileStatus) -> Self {
        self.missing_tile_status = status;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    fn policy(&self) -> ResponsePolicy {
        ResponsePolicy::new(self.cache_max_age, self.missing_tile_status)
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Backends
// =============================================================================

/// The tile stores to expose. Either, both, or (uselessly) neither.
pub struct TileBackends<S: ArchiveSource = MbtilesSource> {
    pub filesystem: Option<FilesystemStore>,
    pub archive: Option<ArchiveStore<S>>,
}

impl<S: ArchiveSource> TileBackends<S> {
    pub fn new() -> Self {
        Self {
            filesystem: None,
            archive: None,
        }
    }

    pub fn with_filesystem(mut self, store: FilesystemStore) -> Self {
        self.filesystem = Some(store);
        self
    }

    pub fn with_archive(mut self, store: ArchiveStore<S>) -> Self {
        self.archive = Some(store);
        self
    }
}

impl<S: ArchiveSource> Default for TileBackends<S> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// This function builds the complete Axum router with:
/// - Liveness routes (`/`, `/health`)
/// - Tile routes for each configured backend
/// - CORS configuration
/// - Request tracing (optional)
///
/// Tile paths use `{filename}` to capture both `{y}` and `{y}.png`.
pub fn create_router<S: ArchiveSource>(backends: TileBackends<S>, config: RouterConfig) -> Router {
    let policy = config.policy();

    let mut router = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler));

    if let Some(store) = backends.filesystem {
        let state = TileState::new(TileService::new(store), policy);
        let tiles = Router::new()
            .route(
                "/tiles/{chart}/{z}/{x}/{filename}",
                get(tile_handler::<FilesystemStore>),
            )
            .with_state(state);
        router = router.merge(tiles);
    }

    if let Some(store) = backends.archive {
        let state = TileState::new(TileService::new(store), policy);
        let sectionals = Router::new()
            .route(
                "/api/sectionals/{chart}/tiles/{z}/{x}/{filename}",
                get(tile_handler::<ArchiveStore<S>>),
            )
            .route("/api/sectionals/{chart}/metadata", get(metadata_handler::<S>))
            .with_state(state);
        router = router.merge(sectionals);
    }

    let router = router.layer(build_cors_layer(&config));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .expose_headers([TILE_FALLBACK_HEADER])
        .max_age(Duration::from_secs(86400)); // 24 hours

    if config.cors_origins.is_empty() {
        return cors;
    }

    // A wildcard cannot sit in an origin list
    if config.cors_origins.iter().any(|origin| origin.trim() == "*") {
        return cors.allow_origin(AllowOrigin::any());
    }

    let parsed_origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(parsed_origins)
}

// =============================================================================
// Tests
// =============================================================================
