//! Traits for opening per-chart tile archives.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;
use crate::tile::{ChartId, TileCoords};

/// An open, read-only archive of one chart's tiles.
///
/// Archives index tiles in TMS row order; callers convert before querying.
#[async_trait]
pub trait ArchiveHandle: Send + Sync + 'static {
    /// Read the tile stored under `(z, x, y_tms)`.
    async fn tile(&self, coords: TileCoords) -> Result<Option<Bytes>, StoreError>;

    /// Name/value metadata rows. Empty when the archive carries none.
    async fn metadata(&self) -> Result<BTreeMap<String, String>, StoreError>;
}

/// Opens archive handles by chart identifier.
///
/// This abstraction lets the [`HandleCache`](super::HandleCache) manage handle
/// lifecycle without knowing where or how archives are stored.
#[async_trait]
pub trait ArchiveSource: Send + Sync + 'static {
    /// The type of handle this source opens.
    type Handle: ArchiveHandle;

    /// Open the archive for `chart`.
    ///
    /// # Errors
    /// - [`StoreError::ArchiveNotFound`] when no archive exists for the chart
    /// - [`StoreError::Open`] when the file is not a readable archive
    async fn open(&self, chart: &ChartId) -> Result<Self::Handle, StoreError>;
}
