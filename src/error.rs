use std::time::Duration;

use thiserror::Error;

/// Errors produced while parsing tile coordinates from a request path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
    /// Component is not a non-negative integer
    #[error("Invalid {component} coordinate: {value:?} is not a non-negative integer")]
    Invalid {
        component: &'static str,
        value: String,
    },

    /// Zoom level beyond what the row flip can represent
    #[error("Zoom level {zoom} exceeds the maximum of {max}")]
    ZoomTooLarge { zoom: u32, max: u8 },

    /// Column or row outside `[0, 2^z - 1]`
    #[error("{component} coordinate {value} is out of range at zoom {zoom} (max: {max})")]
    OutOfRange {
        component: &'static str,
        value: u32,
        zoom: u8,
        max: u32,
    },
}

/// Errors produced while validating a chart identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChartIdError {
    #[error("Chart identifier is empty")]
    Empty,

    #[error("Chart identifier is too long: {len} characters (max: {max})")]
    TooLong { len: usize, max: usize },

    /// Only ASCII alphanumerics, `-` and `_` may reach a filesystem path
    #[error("Chart identifier contains invalid character {ch:?}")]
    InvalidCharacter { ch: char },
}

/// Faults raised by a tile store or the archive handle cache.
///
/// Every variant carries owned strings so results can be cloned out to all
/// callers waiting on the same archive open.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Filesystem failure other than a missing file
    #[error("I/O error reading {path}: {message}")]
    Io { path: String, message: String },

    /// No archive file exists for the chart
    #[error("Archive not found for chart {chart}: {path}")]
    ArchiveNotFound { chart: String, path: String },

    /// The archive exists but could not be attached read-only
    #[error("Failed to open archive for chart {chart}: {message}")]
    Open { chart: String, message: String },

    /// Opening the archive did not complete in time
    #[error("Timed out after {timeout:?} opening archive for chart {chart}")]
    OpenTimeout { chart: String, timeout: Duration },

    /// Query against an open archive failed
    #[error("Archive backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by the tile service to the HTTP layer.
#[derive(Debug, Clone, Error)]
pub enum TileError {
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(#[from] CoordinateError),

    #[error("Invalid chart: {0}")]
    InvalidChart(#[from] ChartIdError),

    /// Neither the primary nor the fallback address held a tile
    #[error("Tile not found: {address}")]
    NotFound { address: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TileError {
    /// Whether this error means "there is no tile here" rather than a fault.
    ///
    /// A chart without an archive is indistinguishable, for the client, from
    /// a chart whose archive lacks the requested tile.
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            TileError::NotFound { .. } | TileError::Store(StoreError::ArchiveNotFound { .. })
        )
    }

    /// Whether this error was caused by a malformed request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TileError::InvalidCoordinates(_) | TileError::InvalidChart(_)
        )
    }
}
