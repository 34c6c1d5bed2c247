//! Directory-tree tile store.
//!
//! Tiles live at `{root}/{chart}/{z}/{x}/{y}.png` with rows in XYZ order,
//! the layout written by `gdal2tiles --xyz` and most static tile exports.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::trace;

use crate::error::StoreError;
use crate::tile::{Scheme, TileAddress};

use super::TileStore;

/// File extension of tiles on disk.
pub const TILE_EXTENSION: &str = "png";

/// Tile store reading PNG files from a directory tree.
#[derive(Debug, Clone)]
pub struct FilesystemStore {
    root: PathBuf,
}

impl FilesystemStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding the tile at `address`.
    ///
    /// Every component is either a validated chart id or an integer, so the
    /// result is always below `root`.
    pub fn tile_path(&self, address: &TileAddress) -> PathBuf {
        let coords = address.coords_in(self.native_scheme());
        self.root
            .join(address.chart.as_str())
            .join(coords.z.to_string())
            .join(coords.x.to_string())
            .join(format!("{}.{}", coords.y, TILE_EXTENSION))
    }
}

#[async_trait]
impl TileStore for FilesystemStore {
    fn native_scheme(&self) -> Scheme {
        Scheme::Xyz
    }

    async fn fetch(&self, address: &TileAddress) -> Result<Option<Bytes>, StoreError> {
        let path = self.tile_path(address);
        trace!(path = %path.display(), "Reading tile file");

        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }
}
