//! Coordinate type definitions

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Zoom levels accepted by [`super::tile_index`].
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 30;

/// Deepest zoom level accepted by [`super::tile_count`].
pub const MAX_COUNT_ZOOM: u8 = 25;

/// Tile coordinates in the Web Mercator / slippy map grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// X coordinate (west-east), 0 at the antimeridian
    pub col: u32,
    /// Y coordinate (north-south), 0 at north
    pub row: u32,
    /// Zoom level
    pub zoom: u8,
}

/// Geographic rectangle in degrees.
///
/// A box whose `west` exceeds its `east` wraps across the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub north: f64,
    pub east: f64,
    pub south: f64,
}

impl BoundingBox {
    pub fn new(west: f64, north: f64, east: f64, south: f64) -> Self {
        Self {
            west,
            north,
            east,
            south,
        }
    }

    /// Returns true when the box wraps across the ±180° meridian.
    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// Splits a wrapping box into its eastern and western halves.
    ///
    /// Returns `None` for boxes that do not cross the antimeridian.
    pub fn split_at_antimeridian(&self) -> Option<(BoundingBox, BoundingBox)> {
        if !self.crosses_antimeridian() {
            return None;
        }
        Some((
            BoundingBox::new(self.west, self.north, MAX_LON, self.south),
            BoundingBox::new(MIN_LON, self.north, self.east, self.south),
        ))
    }
}

/// Inclusive zoom level range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub min: u8,
    pub max: u8,
}

impl ZoomRange {
    pub fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    /// Iterates the zoom levels from `min` to `max` inclusive.
    pub fn levels(&self) -> std::ops::RangeInclusive<u8> {
        self.min..=self.max
    }
}

/// Inclusive column/row span of tiles at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub zoom: u8,
    pub col_start: u32,
    pub col_end: u32,
    pub row_start: u32,
    pub row_end: u32,
}

impl TileRange {
    /// Number of tiles in the range, 0 when either axis is empty.
    pub fn len(&self) -> u64 {
        if self.col_end < self.col_start || self.row_end < self.row_start {
            return 0;
        }
        let cols = u64::from(self.col_end - self.col_start) + 1;
        let rows = u64::from(self.row_end - self.row_start) + 1;
        cols * rows
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Errors that can occur during coordinate conversion and tile counting.
///
/// Each variant has a stable negative code, see [`CoordError::code`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Longitude is outside -180.0 to 180.0
    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),

    /// Latitude is outside the Web Mercator range
    #[error("Invalid latitude: {0} (must be between -85.05112878 and 85.05112878)")]
    InvalidLatitude(f64),

    /// Zoom level or zoom range is outside the accepted domain
    #[error("Invalid zoom range: {min}..={max} (must satisfy 0 <= min <= max <= {limit})")]
    InvalidZoomRange { min: u8, max: u8, limit: u8 },

    /// North edge lies south of the south edge
    #[error("Inverted bounding box: north {north} is below south {south}")]
    InvertedBox { north: f64, south: f64 },
}

impl CoordError {
    /// Stable negative code identifying the failed check.
    pub fn code(&self) -> i32 {
        match self {
            CoordError::InvalidLongitude(_) => -1,
            CoordError::InvalidLatitude(_) => -2,
            CoordError::InvalidZoomRange { .. } => -3,
            CoordError::InvertedBox { .. } => -4,
        }
    }
}
