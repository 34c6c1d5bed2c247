//! Tile Service for resolving and fetching tiles.
//!
//! The TileService is the main entry point for tile requests. It orchestrates:
//! - Request validation
//! - Primary/fallback address resolution
//! - Sequential store lookups
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         TileService                             │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │                    get_tile()                           │    │
//! │  │  1. Resolve addresses   3. On miss, fetch fallback      │    │
//! │  │  2. Fetch primary       4. Return bytes or NotFound     │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │           │                                   │                 │
//! │           ▼                                   ▼                 │
//! │    ┌──────────────┐                   ┌──────────────┐          │
//! │    │   resolve()  │                   │  TileStore   │          │
//! │    └──────────────┘                   └──────────────┘          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use bytes::Bytes;
use tracing::debug;

use crate::error::TileError;
use crate::store::TileStore;

use super::chart::ChartId;
use super::coords::{resolve, Scheme, TileAddress, TileCoords};

// =============================================================================
// Tile Request
// =============================================================================

/// A validated request for a tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRequest {
    pub chart: ChartId,
    pub coords: TileCoords,
}

impl TileRequest {
    pub fn new(chart: ChartId, coords: TileCoords) -> Self {
        Self { chart, coords }
    }

    /// Validate raw path segments into a request.
    ///
    /// Fails with [`TileError::InvalidChart`] or
    /// [`TileError::InvalidCoordinates`]; nothing is read from any store.
    pub fn parse(chart: &str, z: &str, x: &str, y: &str) -> Result<Self, TileError> {
        let chart = ChartId::parse(chart)?;
        let coords = TileCoords::parse(z, x, y)?;
        Ok(Self { chart, coords })
    }
}

// =============================================================================
// Tile Response
// =============================================================================

/// Response from the tile service.
#[derive(Debug, Clone)]
pub struct TileResponse {
    /// The tile bytes as stored
    pub data: Bytes,

    /// Address the bytes were found at
    pub address: TileAddress,

    /// Whether the row-flipped fallback address served the tile
    pub fallback: bool,
}

// =============================================================================
// Tile Service
// =============================================================================

/// Service resolving tile requests against a store.
///
/// # Example
///
/// ```ignore
/// use sectional_tiles::store::FilesystemStore;
/// use sectional_tiles::tile::{TileRequest, TileService};
///
/// let service = TileService::new(FilesystemStore::new("/var/data/tiles"));
///
/// let request = TileRequest::parse("chicago", "5", "10", "3")?;
/// let response = service.get_tile(request).await?;
///
/// println!("{} bytes, fallback: {}", response.data.len(), response.fallback);
/// ```
pub struct TileService<T: TileStore> {
    store: T,

    /// Scheme incoming request rows are expressed in
    request_scheme: Scheme,
}

impl<T: TileStore> TileService<T> {
    /// Create a service for XYZ requests.
    pub fn new(store: T) -> Self {
        Self::with_request_scheme(store, Scheme::Xyz)
    }

    pub fn with_request_scheme(store: T, request_scheme: Scheme) -> Self {
        Self {
            store,
            request_scheme,
        }
    }

    /// Fetch a tile, trying the requested row and then the flipped row.
    ///
    /// The two lookups are sequential. A store fault on the primary lookup is
    /// returned as-is; the fallback is only consulted on a clean miss.
    ///
    /// # Errors
    ///
    /// - [`TileError::NotFound`] if neither address holds a tile
    /// - [`TileError::Store`] if the store failed
    pub async fn get_tile(&self, request: TileRequest) -> Result<TileResponse, TileError> {
        let resolution = resolve(&request.chart, request.coords, self.request_scheme);

        if let Some(data) = self.store.fetch(&resolution.primary).await? {
            return Ok(TileResponse {
                data,
                address: resolution.primary,
                fallback: false,
            });
        }

        if resolution.fallback != resolution.primary {
            if let Some(data) = self.store.fetch(&resolution.fallback).await? {
                debug!(
                    requested = %resolution.primary,
                    served = %resolution.fallback,
                    "Tile served from row-flipped fallback"
                );
                return Ok(TileResponse {
                    data,
                    address: resolution.fallback,
                    fallback: true,
                });
            }
        }

        Err(TileError::NotFound {
            address: resolution.primary.to_string(),
        })
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &T {
        &self.store
    }

    pub fn request_scheme(&self) -> Scheme {
        self.request_scheme
    }
}
