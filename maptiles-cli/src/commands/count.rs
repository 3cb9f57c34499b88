//! Tile count estimate for a bounding box.
//!
//! Pure computation: no configuration, database or logging is touched.

use clap::Args;
use serde::Serialize;

use maptiles::coord::{tile_count, BoundingBox, CoordError, ZoomRange};
use maptiles::envelope::Response;
use maptiles::error::ErrorCode;

use super::common::emit;
use crate::error::CliError;

/// Arguments for `maptiles count`.
#[derive(Debug, Args)]
pub struct CountArgs {
    /// Western longitude
    #[arg(long, allow_negative_numbers = true)]
    pub west: f64,

    /// Northern latitude
    #[arg(long, allow_negative_numbers = true)]
    pub north: f64,

    /// Eastern longitude
    #[arg(long, allow_negative_numbers = true)]
    pub east: f64,

    /// Southern latitude
    #[arg(long, allow_negative_numbers = true)]
    pub south: f64,

    /// Lowest zoom level (0-25)
    #[arg(long)]
    pub zoom_min: u8,

    /// Highest zoom level (0-25)
    #[arg(long)]
    pub zoom_max: u8,
}

/// Tiles per zoom level and in total.
#[derive(Debug, Serialize, PartialEq)]
pub struct CountReport {
    pub tile_count: u64,
    pub levels: Vec<LevelCount>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct LevelCount {
    pub zoom: u8,
    pub tiles: u64,
}

/// Count tiles level by level.
pub fn count(args: &CountArgs) -> Result<CountReport, CoordError> {
    let bbox = BoundingBox::new(args.west, args.north, args.east, args.south);
    let zoom = ZoomRange::new(args.zoom_min, args.zoom_max);
    let total = tile_count(&bbox, zoom)?;

    let levels = zoom
        .levels()
        .map(|level| {
            tile_count(&bbox, ZoomRange::new(level, level))
                .map(|tiles| LevelCount { zoom: level, tiles })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CountReport {
        tile_count: total,
        levels,
    })
}

/// Run the count command.
pub fn run(args: CountArgs) -> Result<ErrorCode, CliError> {
    let response = match count(&args) {
        Ok(report) => Response::ok(report),
        Err(e) => Response::failure(
            ErrorCode::Validation,
            format!("{} (tile_count code {})", e, e.code()),
        ),
    };
    emit(&response)
}
