//! MBTiles archive backend.
//!
//! An MBTiles file is a SQLite database with a `tiles` table (or view)
//! keyed by `(zoom_level, tile_column, tile_row)` with rows in TMS order, and
//! an optional `metadata` table of name/value pairs. Archives are attached
//! read-only through a small sqlx connection pool.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::debug;

use crate::error::StoreError;
use crate::tile::{ChartId, TileCoords};

use super::source::{ArchiveHandle, ArchiveSource};

/// Default archive file extension.
pub const DEFAULT_ARCHIVE_EXTENSION: &str = "mbtiles";

/// Connections per archive pool. Tile reads are short point lookups.
const MAX_CONNECTIONS_PER_ARCHIVE: u32 = 4;

// =============================================================================
// MbtilesArchive
// =============================================================================

/// Read-only handle onto one MBTiles file.
pub struct MbtilesArchive {
    pool: SqlitePool,
    path: PathBuf,
}

impl MbtilesArchive {
    /// Attach to the archive at `path` read-only and check it has tiles.
    ///
    /// `chart` is used only for error reporting.
    pub async fn open(chart: &str, path: &Path) -> Result<Self, StoreError> {
        let open_error = |e: sqlx::Error| StoreError::Open {
            chart: chart.to_string(),
            message: e.to_string(),
        };

        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS_PER_ARCHIVE)
            .connect_with(options)
            .await
            .map_err(open_error)?;

        // Touching sqlite_master also rejects files that are not databases
        if !has_relation(&pool, "tiles").await.map_err(open_error)? {
            pool.close().await;
            return Err(StoreError::Open {
                chart: chart.to_string(),
                message: "archive has no tiles table".to_string(),
            });
        }

        Ok(Self {
            pool,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn has_relation(pool: &SqlitePool, name: &str) -> Result<bool, sqlx::Error> {
    let row: Option<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master WHERE name = ?1 AND type IN ('table', 'view')",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;
    Ok(row.is_some())
}

fn backend_error(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl ArchiveHandle for MbtilesArchive {
    async fn tile(&self, coords: TileCoords) -> Result<Option<Bytes>, StoreError> {
        let row: Option<(Option<Vec<u8>>,)> = sqlx::query_as(
            "SELECT tile_data FROM tiles \
             WHERE zoom_level = ?1 AND tile_column = ?2 AND tile_row = ?3 \
             LIMIT 1",
        )
        .bind(coords.z as i64)
        .bind(coords.x as i64)
        .bind(coords.y as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(row.and_then(|(data,)| data).map(Bytes::from))
    }

    async fn metadata(&self) -> Result<BTreeMap<String, String>, StoreError> {
        if !has_relation(&self.pool, "metadata")
            .await
            .map_err(backend_error)?
        {
            return Ok(BTreeMap::new());
        }

        let rows: Vec<(String, Option<String>)> =
            sqlx::query_as("SELECT name, value FROM metadata")
                .fetch_all(&self.pool)
                .await
                .map_err(backend_error)?;

        Ok(rows
            .into_iter()
            .map(|(name, value)| (name, value.unwrap_or_default()))
            .collect())
    }
}

// =============================================================================
// MbtilesSource
// =============================================================================

/// Opens `{dir}/{chart}.{extension}` as an MBTiles archive.
#[derive(Debug, Clone)]
pub struct MbtilesSource {
    dir: PathBuf,
    extension: String,
}

impl MbtilesSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_extension(dir, DEFAULT_ARCHIVE_EXTENSION)
    }

    pub fn with_extension(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Archive path for `chart`.
    pub fn archive_path(&self, chart: &ChartId) -> PathBuf {
        self.dir
            .join(format!("{}.{}", chart.as_str(), self.extension))
    }
}

#[async_trait]
impl ArchiveSource for MbtilesSource {
    type Handle = MbtilesArchive;

    async fn open(&self, chart: &ChartId) -> Result<Self::Handle, StoreError> {
        let path = self.archive_path(chart);
        let not_found = || StoreError::ArchiveNotFound {
            chart: chart.to_string(),
            path: path.display().to_string(),
        };

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(not_found()),
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found()),
            Err(e) => {
                return Err(StoreError::Io {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            }
        }

        debug!(chart = %chart, path = %path.display(), "Attaching archive");
        MbtilesArchive::open(chart.as_str(), &path).await
    }
}
