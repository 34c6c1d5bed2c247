//! Tile store backed by per-chart archives.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;

use crate::archive::{ArchiveHandle, ArchiveSource, HandleCache};
use crate::error::StoreError;
use crate::tile::{ChartId, Scheme, TileAddress};

use super::TileStore;

/// Tile store reading from one archive per chart.
///
/// Archives index rows in TMS order, so an XYZ request is flipped exactly
/// once here, immediately before the query.
pub struct ArchiveStore<S: ArchiveSource> {
    handles: HandleCache<S>,
}

impl<S: ArchiveSource> ArchiveStore<S> {
    pub fn new(handles: HandleCache<S>) -> Self {
        Self { handles }
    }

    /// The handle cache this store reads through.
    pub fn handles(&self) -> &HandleCache<S> {
        &self.handles
    }

    /// Metadata rows of the archive for `chart`.
    pub async fn metadata(&self, chart: &ChartId) -> Result<BTreeMap<String, String>, StoreError> {
        let handle = self.handles.get_or_open(chart).await?;
        handle.metadata().await
    }
}

#[async_trait]
impl<S: ArchiveSource> TileStore for ArchiveStore<S> {
    fn native_scheme(&self) -> Scheme {
        Scheme::Tms
    }

    async fn fetch(&self, address: &TileAddress) -> Result<Option<Bytes>, StoreError> {
        let handle = self.handles.get_or_open(&address.chart).await?;
        handle.tile(address.coords_in(self.native_scheme())).await
    }
}
