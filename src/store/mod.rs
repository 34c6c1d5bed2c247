//! Tile stores.
//!
//! A [`TileStore`] answers one question: what bytes live at a tile address?
//! The answer is a tagged result:
//!
//! - `Ok(Some(bytes))` - the tile exists
//! - `Ok(None)` - no tile at this address (the caller may try a fallback)
//! - `Err(StoreError)` - the backend is broken; never masked as "not found"
//!
//! Each store has a native row scheme. Addresses arrive tagged with the scheme
//! of the request and the store converts them exactly once via
//! [`TileAddress::coords_in`](crate::tile::TileAddress::coords_in).
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              TileService                │
//! └────────────────────┬────────────────────┘
//!                      │
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//! ┌─────────────────┐    ┌─────────────────────┐
//! │ FilesystemStore │    │   ArchiveStore      │
//! │  (native XYZ)   │    │   (native TMS)      │
//! └─────────────────┘    └──────────┬──────────┘
//!                                   ▼
//!                        ┌─────────────────────┐
//!                        │    HandleCache      │
//!                        └─────────────────────┘
//! ```

mod archive;
mod filesystem;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;
use crate::tile::{Scheme, TileAddress};

pub use archive::ArchiveStore;
pub use filesystem::{FilesystemStore, TILE_EXTENSION};

/// Backing source of tile bytes.
#[async_trait]
pub trait TileStore: Send + Sync + 'static {
    /// Row order the store indexes tiles by.
    fn native_scheme(&self) -> Scheme;

    /// Look up the tile at `address`.
    async fn fetch(&self, address: &TileAddress) -> Result<Option<Bytes>, StoreError>;
}
