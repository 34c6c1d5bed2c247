//! # Sectional Tiles
//!
//! A tile server for aeronautical sectional charts.
//!
//! Web map clients request `{chart}/{z}/{x}/{y}.png` tiles with rows in XYZ
//! order. Chart tiles are published in whichever row convention the export
//! tool used, so every lookup tries the requested row first and the
//! TMS-flipped row (`2^z - 1 - y`) second.
//!
//! ## Features
//!
//! - **Two backends**: a `{chart}/{z}/{x}/{y}.png` directory tree, and one
//!   MBTiles archive per chart
//! - **Row-order tolerance**: XYZ first, TMS fallback, exactly one flip for archives
//! - **Lazy archive handles**: opened on first use, shared, singleflight
//! - **Honest errors**: storage faults answer 5xx instead of looking like missing tiles
//!
//! ## Architecture
//!
//! - [`tile`] - Chart ids, coordinates, row schemes and the tile service
//! - [`store`] - Tile stores for the directory tree and for archives
//! - [`archive`] - MBTiles archives and the handle cache
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use sectional_tiles::{create_router, FilesystemStore, MbtilesSource, RouterConfig, TileBackends};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let backends = TileBackends::<MbtilesSource>::new()
//!         .with_filesystem(FilesystemStore::new("/var/data/tiles"));
//!     let router = create_router(backends, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, router).await
//! }
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod tile;

// Re-export commonly used types
pub use archive::{ArchiveHandle, ArchiveSource, HandleCache, MbtilesArchive, MbtilesSource};
pub use config::{Config, MissingTileStatus};
pub use error::{ChartIdError, CoordinateError, StoreError, TileError};
pub use server::{
    create_router, health_handler, metadata_handler, root_handler, tile_handler, ErrorResponse,
    HealthResponse, MetadataResponse, ResponsePolicy, RouterConfig, TileBackends, TilePathParams,
    TileState,
};
pub use store::{ArchiveStore, FilesystemStore, TileStore};
pub use tile::{
    flip_row, resolve, ChartId, Resolution, Scheme, TileAddress, TileCoords, TileRequest,
    TileResponse, TileService,
};
