//! Test utilities for integration tests.
//!
//! This module provides tile fixtures on disk, MBTiles archive fixtures, an
//! in-memory archive source that counts opens, and request helpers.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tempfile::TempDir;
use tower::ServiceExt;

use sectional_tiles::archive::{ArchiveHandle, ArchiveSource};
use sectional_tiles::error::StoreError;
use sectional_tiles::tile::{ChartId, TileCoords};

/// PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Tile bytes that start like a PNG and carry a recognizable tag.
pub fn fake_png(tag: &str) -> Vec<u8> {
    let mut data = PNG_SIGNATURE.to_vec();
    data.extend_from_slice(tag.as_bytes());
    data
}

// =============================================================================
// Directory Tree Fixtures
// =============================================================================

/// A temporary `{chart}/{z}/{x}/{y}.png` tree.
pub struct TileTree {
    dir: TempDir,
}

impl TileTree {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a tile at XYZ row `y`.
    pub fn with_tile(self, chart: &str, z: u32, x: u32, y: u32, data: &[u8]) -> Self {
        let dir = self
            .dir
            .path()
            .join(chart)
            .join(z.to_string())
            .join(x.to_string());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{}.png", y)), data).unwrap();
        self
    }
}

// =============================================================================
// MBTiles Fixtures
// =============================================================================

/// Create an MBTiles archive at `path`. Tile rows are given in TMS order.
pub async fn create_mbtiles(
    path: &Path,
    tiles: &[(u32, u32, u32, &[u8])],
    metadata: &[(&str, &str)],
) {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Delete);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    sqlx::query(
        "CREATE TABLE tiles (zoom_level INTEGER, tile_column INTEGER, tile_row INTEGER, tile_data BLOB)",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("CREATE TABLE metadata (name TEXT, value TEXT)")
        .execute(&pool)
        .await
        .unwrap();

    for (z, x, y, data) in tiles {
        sqlx::query(
            "INSERT INTO tiles (zoom_level, tile_column, tile_row, tile_data) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(*z as i64)
        .bind(*x as i64)
        .bind(*y as i64)
        .bind(data.to_vec())
        .execute(&pool)
        .await
        .unwrap();
    }

    for (name, value) in metadata {
        sqlx::query("INSERT INTO metadata (name, value) VALUES (?1, ?2)")
            .bind(*name)
            .bind(*value)
            .execute(&pool)
            .await
            .unwrap();
    }

    pool.close().await;
}

// =============================================================================
// Counting Archive Source
// =============================================================================

/// In-memory archive keyed by TMS coordinates.
pub struct MemoryArchive {
    tiles: HashMap<TileCoords, Bytes>,
}

#[async_trait]
impl ArchiveHandle for MemoryArchive {
    async fn tile(&self, coords: TileCoords) -> Result<Option<Bytes>, StoreError> {
        Ok(self.tiles.get(&coords).cloned())
    }

    async fn metadata(&self) -> Result<BTreeMap<String, String>, StoreError> {
        Ok(BTreeMap::new())
    }
}

/// Archive source serving in-memory charts, counting every open.
///
/// Clones share the open counter.
#[derive(Clone)]
pub struct CountingSource {
    charts: Arc<HashMap<String, HashMap<TileCoords, Bytes>>>,
    opens: Arc<AtomicUsize>,
    delay: Duration,
}

impl CountingSource {
    pub fn new() -> Self {
        Self {
            charts: Arc::new(HashMap::new()),
            opens: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
        }
    }

    /// Add a chart with one tile at TMS row `y`.
    pub fn with_tile(mut self, chart: &str, z: u32, x: u32, y: u32, data: &[u8]) -> Self {
        let charts = Arc::make_mut(&mut self.charts);
        charts
            .entry(chart.to_string())
            .or_default()
            .insert(TileCoords::new(z, x, y).unwrap(), Bytes::from(data.to_vec()));
        self
    }

    /// Make every open take `delay`.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArchiveSource for CountingSource {
    type Handle = MemoryArchive;

    async fn open(&self, chart: &ChartId) -> Result<Self::Handle, StoreError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.charts.get(chart.as_str()) {
            Some(tiles) => Ok(MemoryArchive {
                tiles: tiles.clone(),
            }),
            None => Err(StoreError::ArchiveNotFound {
                chart: chart.to_string(),
                path: format!("memory://{}", chart),
            }),
        }
    }
}

// =============================================================================
// Request Helpers
// =============================================================================

/// Response parts collected for assertions.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// Send a GET request through the router.
pub async fn get(router: &Router, uri: &str) -> TestResponse {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();

    TestResponse {
        status,
        headers,
        body,
    }
}
