//! Tile coordinates and the XYZ/TMS row flip.
//!
//! Clients such as Leaflet address tiles in XYZ order (row 0 at the top of
//! the map) while MBTiles archives and some tile generators use TMS order
//! (row 0 at the bottom). The two are related by
//!
//! ```text
//! row_tms = 2^z - 1 - row_xyz
//! ```
//!
//! which is its own inverse. [`resolve`] turns a requested tile into a
//! primary address (as requested) and a fallback address (row flipped) so a
//! store built with the "wrong" convention still serves the right tile.

use std::fmt;

use crate::error::CoordinateError;

use super::chart::ChartId;

/// Highest zoom level accepted. `2^30 - 1` still fits in a `u32` row.
pub const MAX_ZOOM: u8 = 30;

// =============================================================================
// Scheme
// =============================================================================

/// Row-ordering convention for a tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scheme {
    /// Row 0 is the northernmost row
    #[default]
    Xyz,
    /// Row 0 is the southernmost row
    Tms,
}

impl Scheme {
    /// The other scheme.
    pub fn complement(self) -> Self {
        match self {
            Scheme::Xyz => Scheme::Tms,
            Scheme::Tms => Scheme::Xyz,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Xyz => "xyz",
            Scheme::Tms => "tms",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Largest valid column or row index at zoom `z`.
pub fn max_index(z: u8) -> u32 {
    debug_assert!(z <= MAX_ZOOM);
    (1u32 << z) - 1
}

/// Convert a row between XYZ and TMS at zoom `z`.
///
/// Rows outside `[0, 2^z - 1]` saturate to 0; [`TileCoords`] rejects them
/// before they get here.
pub fn flip_row(y: u32, z: u8) -> u32 {
    max_index(z).saturating_sub(y)
}

// =============================================================================
// Tile Coordinates
// =============================================================================

/// Validated `(z, x, y)` triple with `x, y` in `[0, 2^z - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoords {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoords {
    /// Create coordinates, checking the zoom cap and the column/row bounds.
    pub fn new(z: u32, x: u32, y: u32) -> Result<Self, CoordinateError> {
        if z > MAX_ZOOM as u32 {
            return Err(CoordinateError::ZoomTooLarge {
                zoom: z,
                max: MAX_ZOOM,
            });
        }
        let z = z as u8;
        let max = max_index(z);

        for (component, value) in [("x", x), ("y", y)] {
            if value > max {
                return Err(CoordinateError::OutOfRange {
                    component,
                    value,
                    zoom: z,
                    max,
                });
            }
        }

        Ok(Self { z, x, y })
    }

    /// Parse coordinates from raw path segments.
    ///
    /// Each component must be a non-negative decimal integer.
    pub fn parse(z: &str, x: &str, y: &str) -> Result<Self, CoordinateError> {
        let z = parse_component("z", z)?;
        let x = parse_component("x", x)?;
        let y = parse_component("y", y)?;
        Self::new(z, x, y)
    }

    /// Same tile column, row mirrored across the equator of the pyramid.
    pub fn flipped(self) -> Self {
        Self {
            y: flip_row(self.y, self.z),
            ..self
        }
    }
}

fn parse_component(component: &'static str, value: &str) -> Result<u32, CoordinateError> {
    // u32::from_str accepts a leading '+', which has no place in a tile path
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoordinateError::Invalid {
            component,
            value: value.to_string(),
        });
    }
    value.parse().map_err(|_| CoordinateError::Invalid {
        component,
        value: value.to_string(),
    })
}

// =============================================================================
// Tile Address
// =============================================================================

/// A tile within a chart, with the scheme its row is expressed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileAddress {
    pub chart: ChartId,
    pub coords: TileCoords,
    pub scheme: Scheme,
}

impl TileAddress {
    pub fn new(chart: ChartId, coords: TileCoords, scheme: Scheme) -> Self {
        Self {
            chart,
            coords,
            scheme,
        }
    }

    /// Coordinates of this tile expressed in `target` scheme.
    ///
    /// This is the single place a store converts a request into its native
    /// row order.
    pub fn coords_in(&self, target: Scheme) -> TileCoords {
        if self.scheme == target {
            self.coords
        } else {
            self.coords.flipped()
        }
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{} ({})",
            self.chart, self.coords.z, self.coords.x, self.coords.y, self.scheme
        )
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Primary and fallback addresses for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The tile exactly as requested
    pub primary: TileAddress,
    /// Same chart, zoom and column with the row flipped
    pub fallback: TileAddress,
}

/// Resolve a requested tile into the addresses a store should try, in order.
pub fn resolve(chart: &ChartId, coords: TileCoords, scheme: Scheme) -> Resolution {
    Resolution {
        primary: TileAddress::new(chart.clone(), coords, scheme),
        fallback: TileAddress::new(chart.clone(), coords.flipped(), scheme),
    }
}
