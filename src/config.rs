//! Configuration management for the sectional tile server.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with the `SECTIONAL_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Environment Variables
//!
//! - `SECTIONAL_HOST` - Server bind address (default: 0.0.0.0)
//! - `PORT` - Server port (default: 3000)
//! - `SECTIONAL_TILES_DIR` - Root of the `{chart}/{z}/{x}/{y}.png` tree
//! - `SECTIONAL_ARCHIVE_DIR` - Directory of `{chart}.mbtiles` archives
//! - `SECTIONAL_ARCHIVE_EXT` - Archive file extension (default: mbtiles)
//! - `SECTIONAL_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 365 days)
//! - `SECTIONAL_MISSING_TILE_STATUS` - `not-found` (404) or `no-content` (204)
//! - `SECTIONAL_OPEN_TIMEOUT_SECS` - Archive open timeout (default: 10)
//! - `SECTIONAL_OPEN_RETRY_BACKOFF_SECS` - Failed-open retry backoff (default: 30)
//! - `SECTIONAL_CORS_ORIGINS` - Allowed CORS origins, comma-separated

use std::path::PathBuf;
use std::time::Duration;

use axum::http::StatusCode;
use clap::{Parser, ValueEnum};

use crate::archive::{DEFAULT_ARCHIVE_EXTENSION, DEFAULT_OPEN_RETRY_BACKOFF, DEFAULT_OPEN_TIMEOUT};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default HTTP cache max-age in seconds (365 days). Published chart tiles
/// never change.
pub const DEFAULT_CACHE_MAX_AGE: u32 = 365 * 24 * 60 * 60;

/// Origins of the local Vite dev server.
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";

// =============================================================================
// Missing Tile Status
// =============================================================================

/// Status returned when no tile exists at either the requested or the
/// flipped address. Applies to every backend alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MissingTileStatus {
    /// 404 Not Found
    #[default]
    NotFound,
    /// 204 No Content (blank tile, client should not retry)
    NoContent,
}

impl MissingTileStatus {
    pub fn status_code(self) -> StatusCode {
        match self {
            MissingTileStatus::NotFound => StatusCode::NOT_FOUND,
            MissingTileStatus::NoContent => StatusCode::NO_CONTENT,
        }
    }
}

// =============================================================================
// CLI Arguments
// =============================================================================

/// Sectional Tiles - serves aeronautical chart tiles to web map clients.
///
/// Tiles come from a `{chart}/{z}/{x}/{y}.png` directory tree, from one
/// MBTiles archive per chart, or both. Rows are accepted in XYZ order and
/// looked up in TMS order as a fallback.
#[derive(Parser, Debug, Clone)]
#[command(name = "sectional-tiles")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "SECTIONAL_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    // =========================================================================
    // Backend Configuration
    // =========================================================================
    /// Root directory of the PNG tile tree, served at /tiles/...
    #[arg(long, env = "SECTIONAL_TILES_DIR")]
    pub tiles_dir: Option<PathBuf>,

    /// Directory holding one archive per chart, served at /api/sectionals/...
    #[arg(long, env = "SECTIONAL_ARCHIVE_DIR")]
    pub archive_dir: Option<PathBuf>,

    /// File extension of chart archives.
    #[arg(long, default_value = DEFAULT_ARCHIVE_EXTENSION, env = "SECTIONAL_ARCHIVE_EXT")]
    pub archive_ext: String,

    /// Seconds to wait for an archive to open before giving up.
    #[arg(long, default_value_t = DEFAULT_OPEN_TIMEOUT.as_secs(), env = "SECTIONAL_OPEN_TIMEOUT_SECS")]
    pub open_timeout_secs: u64,

    /// Seconds a failed archive open is remembered before retrying (0 = always retry).
    #[arg(long, default_value_t = DEFAULT_OPEN_RETRY_BACKOFF.as_secs(), env = "SECTIONAL_OPEN_RETRY_BACKOFF_SECS")]
    pub open_retry_backoff_secs: u64,

    // =========================================================================
    // Response Configuration
    // =========================================================================
    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "SECTIONAL_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    /// Status returned for tiles that do not exist.
    #[arg(long, value_enum, default_value_t = MissingTileStatus::NotFound, env = "SECTIONAL_MISSING_TILE_STATUS")]
    pub missing_tile_status: MissingTileStatus,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    #[arg(long, env = "SECTIONAL_CORS_ORIGINS", value_delimiter = ',', default_value = DEFAULT_CORS_ORIGINS)]
    pub cors_origins: Vec<String>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.tiles_dir.is_none() && self.archive_dir.is_none() {
            return Err(
                "No tile backend configured. Set --tiles-dir (SECTIONAL_TILES_DIR) \
                 and/or --archive-dir (SECTIONAL_ARCHIVE_DIR)"
                    .to_string(),
            );
        }

        for (flag, dir) in [
            ("--tiles-dir", &self.tiles_dir),
            ("--archive-dir", &self.archive_dir),
        ] {
            if let Some(dir) = dir {
                if !dir.is_dir() {
                    return Err(format!("{} {} is not a directory", flag, dir.display()));
                }
            }
        }

        if self.archive_ext.is_empty() || self.archive_ext.contains(['/', '\\']) {
            return Err("archive_ext must be a non-empty file extension".to_string());
        }

        if self.open_timeout_secs == 0 {
            return Err("open_timeout_secs must be greater than 0".to_string());
        }

        if self.cache_max_age == 0 {
            return Err("cache_max_age must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn open_timeout(&self) -> Duration {
        Duration::from_secs(self.open_timeout_secs)
    }

    pub fn open_retry_backoff(&self) -> Duration {
        Duration::from_secs(self.open_retry_backoff_secs)
    }
}

// =============================================================================
// Tests
// =============================================================================
