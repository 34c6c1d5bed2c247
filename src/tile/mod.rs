//! Tile resolution layer.
//!
//! This module turns a `(chart, z, x, y)` request into tile bytes, tolerating
//! stores whose rows follow the opposite convention to the client.
//!
//! # Components
//!
//! - [`ChartId`]: Validated chart identifier, safe to join onto a path
//! - [`TileCoords`]: Validated `(z, x, y)` with `x, y < 2^z`
//! - [`Scheme`]: XYZ or TMS row order, and [`flip_row`] between them
//! - [`resolve`]: Primary and row-flipped fallback addresses for a request
//! - [`TileService`]: Fetches the primary address, then the fallback
//!
//! # Example
//!
//! ```
//! use sectional_tiles::tile::{flip_row, resolve, ChartId, Scheme, TileCoords};
//!
//! let chart = ChartId::parse("chicago").unwrap();
//! let coords = TileCoords::parse("5", "10", "3").unwrap();
//!
//! let resolution = resolve(&chart, coords, Scheme::Xyz);
//! assert_eq!(resolution.primary.coords.y, 3);
//! assert_eq!(resolution.fallback.coords.y, 28);
//! assert_eq!(flip_row(28, 5), 3);
//! ```

mod chart;
mod coords;
mod service;

pub use chart::{ChartId, MAX_CHART_ID_LEN};
pub use coords::{
    flip_row, max_index, resolve, Resolution, Scheme, TileAddress, TileCoords, MAX_ZOOM,
};
pub use service::{TileRequest, TileResponse, TileService};
