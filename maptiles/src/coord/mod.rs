//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and Web Mercator tile coordinates, plus closed-form tile counting for a
//! bounding box over a zoom range.
//!
//! Counting never materialises the tile list: at deep zoom levels a single
//! task can cover millions of tiles, and the count is only an estimate of
//! the work the download worker will perform.

mod types;

pub use types::{
    BoundingBox, CoordError, TileCoord, TileRange, ZoomRange, MAX_COUNT_ZOOM, MAX_LAT, MAX_LON,
    MAX_ZOOM, MIN_LAT, MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

/// Converts geographic coordinates to tile coordinates.
///
/// # Arguments
///
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `zoom` - Zoom level (0 to 30)
///
/// Longitude 180 lands in the last column rather than one past the grid,
/// and rows that round past either pole are clamped to the first/last row.
///
/// # Errors
///
/// Returns a [`CoordError`] instead of a tile when any input is outside its
/// domain (including NaN).
#[inline]
pub fn tile_index(lon: f64, lat: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoomRange {
            min: zoom,
            max: zoom,
            limit: MAX_ZOOM,
        });
    }

    let tiles = 1u64 << zoom;
    let n = tiles as f64;
    let last = (tiles - 1) as u32;

    // Column is linear in longitude
    let mut x = (lon + 180.0) / 360.0 * n;
    if x >= n {
        x = n * (1.0 - f64::EPSILON);
    }

    // Row follows the Web Mercator projection
    let lat_rad = lat.to_radians();
    let y = (0.5 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / (2.0 * PI)) * n;

    Ok(TileCoord {
        col: floor_into_grid(x, last),
        row: floor_into_grid(y, last),
        zoom,
    })
}

fn floor_into_grid(value: f64, last: u32) -> u32 {
    value.floor().clamp(0.0, f64::from(last)) as u32
}

/// Computes the tile span covering a non-wrapping box at one zoom level.
///
/// Projects the north-west and south-east corners and orders each axis.
/// Boxes crossing the antimeridian must be split first; [`tile_count`]
/// does this automatically.
pub fn level_range(bbox: &BoundingBox, zoom: u8) -> Result<TileRange, CoordError> {
    let north_west = tile_index(bbox.west, bbox.north, zoom)?;
    let south_east = tile_index(bbox.east, bbox.south, zoom)?;

    Ok(TileRange {
        zoom,
        col_start: north_west.col.min(south_east.col),
        col_end: north_west.col.max(south_east.col),
        row_start: north_west.row.min(south_east.row),
        row_end: north_west.row.max(south_east.row),
    })
}

/// Counts the distinct tiles covering `bbox` at every level of `zoom`.
///
/// Checks run in a fixed order and the first failure is returned:
/// longitude, latitude, zoom range (0 to 25, min <= max), then
/// north >= south. A box with `west > east` is split at the antimeridian
/// and both halves are summed; `west == east` is a single meridian.
///
/// # Example
///
/// ```
/// use maptiles::coord::{tile_count, BoundingBox, ZoomRange};
///
/// let world = BoundingBox::new(-180.0, 85.05112878, 180.0, -85.05112878);
/// assert_eq!(tile_count(&world, ZoomRange::new(0, 2)).unwrap(), 1 + 4 + 16);
/// ```
pub fn tile_count(bbox: &BoundingBox, zoom: ZoomRange) -> Result<u64, CoordError> {
    for lon in [bbox.west, bbox.east] {
        if !(MIN_LON..=MAX_LON).contains(&lon) {
            return Err(CoordError::InvalidLongitude(lon));
        }
    }
    for lat in [bbox.north, bbox.south] {
        if !(MIN_LAT..=MAX_LAT).contains(&lat) {
            return Err(CoordError::InvalidLatitude(lat));
        }
    }
    if zoom.max > MAX_COUNT_ZOOM || zoom.min > zoom.max {
        return Err(CoordError::InvalidZoomRange {
            min: zoom.min,
            max: zoom.max,
            limit: MAX_COUNT_ZOOM,
        });
    }
    if bbox.north < bbox.south {
        return Err(CoordError::InvertedBox {
            north: bbox.north,
            south: bbox.south,
        });
    }

    if let Some((east_of_west, west_of_east)) = bbox.split_at_antimeridian() {
        let left = tile_count(&east_of_west, zoom)?;
        let right = tile_count(&west_of_east, zoom)?;
        return Ok(left + right);
    }

    let mut total = 0u64;
    for level in zoom.levels() {
        total += level_range(bbox, level)?.len();
    }
    Ok(total)
}

#[cfg(test)]
mod tests;
