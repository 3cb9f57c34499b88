//! Tests for coordinate conversion and tile counting

use super::*;
use proptest::prelude::*;

#[test]
fn test_new_york_city_at_zoom_16() {
    // New York City: 40.7128°N, 74.0060°W
    let tile = tile_index(-74.0060, 40.7128, 16).unwrap();
    assert_eq!(tile.col, 19295);
    assert_eq!(tile.row, 24640);
    assert_eq!(tile.zoom, 16);
}

#[test]
fn test_london_at_zoom_10() {
    let tile = tile_index(-0.1278, 51.5074, 10).unwrap();
    assert_eq!(tile.col, 511);
    assert_eq!(tile.row, 340);
}

#[test]
fn test_equator_prime_meridian() {
    // At zoom 1 the world is 2×2 tiles, the origin sits at the corner of (1, 1)
    let tile = tile_index(0.0, 0.0, 1).unwrap();
    assert_eq!((tile.col, tile.row), (1, 1));
}

#[test]
fn test_zoom_zero_is_single_tile() {
    for (lon, lat) in [(-180.0, MAX_LAT), (180.0, MIN_LAT), (12.5, -33.0)] {
        let tile = tile_index(lon, lat, 0).unwrap();
        assert_eq!((tile.col, tile.row), (0, 0));
    }
}

#[test]
fn test_longitude_180_maps_to_last_column() {
    let tile = tile_index(180.0, 0.0, 3).unwrap();
    assert_eq!(tile.col, 7, "180° must not overflow the grid");

    let deep = tile_index(180.0, 0.0, 30).unwrap();
    assert_eq!(deep.col, (1u32 << 30) - 1);
}

#[test]
fn test_poles_clamp_to_edge_rows() {
    let north = tile_index(-180.0, MAX_LAT, 3).unwrap();
    assert_eq!((north.col, north.row), (0, 0));

    let south = tile_index(0.0, MIN_LAT, 3).unwrap();
    assert_eq!((south.col, south.row), (4, 7));
}

#[test]
fn test_invalid_latitude() {
    assert!(matches!(
        tile_index(0.0, 90.0, 10),
        Err(CoordError::InvalidLatitude(_))
    ));
    assert!(matches!(
        tile_index(0.0, -90.0, 10),
        Err(CoordError::InvalidLatitude(_))
    ));
}

#[test]
fn test_invalid_longitude() {
    assert!(matches!(
        tile_index(181.0, 0.0, 10),
        Err(CoordError::InvalidLongitude(_))
    ));
    assert!(matches!(
        tile_index(-181.0, 0.0, 10),
        Err(CoordError::InvalidLongitude(_))
    ));
}

#[test]
fn test_nan_is_rejected() {
    assert!(tile_index(f64::NAN, 0.0, 4).is_err());
    assert!(tile_index(0.0, f64::NAN, 4).is_err());
}

#[test]
fn test_invalid_zoom_too_high() {
    assert!(matches!(
        tile_index(0.0, 0.0, 31),
        Err(CoordError::InvalidZoomRange { limit: 30, .. })
    ));
}

#[test]
fn test_golden_tile_count_shenzhen() {
    let bbox = BoundingBox::new(114.903983, 22.677423, 114.969300, 22.638533);
    let count = tile_count(&bbox, ZoomRange::new(12, 15)).unwrap();
    assert_eq!(count, 57);

    // Reproducible across calls
    assert_eq!(tile_count(&bbox, ZoomRange::new(12, 15)).unwrap(), count);
}

#[test]
fn test_golden_per_level_ranges() {
    let bbox = BoundingBox::new(114.903983, 22.677423, 114.969300, 22.638533);
    let counts: Vec<u64> = (12..=15)
        .map(|z| level_range(&bbox, z).unwrap().len())
        .collect();
    assert_eq!(counts, vec![4, 6, 12, 35]);

    let z12 = level_range(&bbox, 12).unwrap();
    assert_eq!((z12.col_start, z12.col_end), (3355, 3356));
    assert_eq!((z12.row_start, z12.row_end), (1782, 1783));
}

#[test]
fn test_whole_world_counts_every_tile() {
    let world = BoundingBox::new(MIN_LON, MAX_LAT, MAX_LON, MIN_LAT);
    assert_eq!(tile_count(&world, ZoomRange::new(0, 3)).unwrap(), 85);
}

#[test]
fn test_point_box_is_one_tile_per_level() {
    let point = BoundingBox::new(10.0, 10.0, 10.0, 10.0);
    assert_eq!(tile_count(&point, ZoomRange::new(5, 7)).unwrap(), 3);
}

#[test]
fn test_antimeridian_split_sums_halves() {
    let zoom = ZoomRange::new(5, 5);
    let wrapped = tile_count(&BoundingBox::new(170.0, 10.0, -170.0, -10.0), zoom).unwrap();
    let east = tile_count(&BoundingBox::new(170.0, 10.0, 180.0, -10.0), zoom).unwrap();
    let west = tile_count(&BoundingBox::new(-180.0, 10.0, -170.0, -10.0), zoom).unwrap();

    assert_eq!(east, 2);
    assert_eq!(west, 2);
    assert_eq!(wrapped, east + west);
}

#[test]
fn test_split_at_antimeridian_only_when_wrapping() {
    assert!(BoundingBox::new(-10.0, 5.0, 10.0, -5.0)
        .split_at_antimeridian()
        .is_none());

    let (east, west) = BoundingBox::new(170.0, 5.0, -170.0, -5.0)
        .split_at_antimeridian()
        .unwrap();
    assert_eq!(east, BoundingBox::new(170.0, 5.0, 180.0, -5.0));
    assert_eq!(west, BoundingBox::new(-180.0, 5.0, -170.0, -5.0));
}

#[test]
fn test_tile_count_error_order_and_codes() {
    let zoom = ZoomRange::new(1, 5);

    // Longitude is checked before latitude
    let err = tile_count(&BoundingBox::new(200.0, 95.0, 0.0, 0.0), zoom).unwrap_err();
    assert_eq!(err, CoordError::InvalidLongitude(200.0));
    assert_eq!(err.code(), -1);

    let err = tile_count(&BoundingBox::new(0.0, 95.0, 1.0, 0.0), zoom).unwrap_err();
    assert_eq!(err.code(), -2);

    // Latitude is checked before zoom
    let err = tile_count(&BoundingBox::new(0.0, 95.0, 1.0, 0.0), ZoomRange::new(9, 3)).unwrap_err();
    assert_eq!(err.code(), -2);

    let err = tile_count(&BoundingBox::new(0.0, 1.0, 1.0, 0.0), ZoomRange::new(9, 3)).unwrap_err();
    assert_eq!(err.code(), -3);

    let err = tile_count(&BoundingBox::new(0.0, 1.0, 1.0, 0.0), ZoomRange::new(0, 26)).unwrap_err();
    assert_eq!(err.code(), -3);

    // Zoom is checked before orientation
    let err = tile_count(&BoundingBox::new(0.0, -1.0, 1.0, 1.0), ZoomRange::new(4, 2)).unwrap_err();
    assert_eq!(err.code(), -3);

    let err = tile_count(&BoundingBox::new(0.0, -1.0, 1.0, 1.0), zoom).unwrap_err();
    assert_eq!(
        err,
        CoordError::InvertedBox {
            north: -1.0,
            south: 1.0
        }
    );
    assert_eq!(err.code(), -4);
}

#[test]
fn test_deepest_zoom_does_not_overflow() {
    let world = BoundingBox::new(MIN_LON, MAX_LAT, MAX_LON, MIN_LAT);
    let count = tile_count(&world, ZoomRange::new(25, 25)).unwrap();
    assert_eq!(count, 1u64 << 50);
}

#[test]
fn test_tile_range_empty_when_inverted() {
    let range = TileRange {
        zoom: 3,
        col_start: 4,
        col_end: 3,
        row_start: 0,
        row_end: 0,
    };
    assert!(range.is_empty());
}

proptest! {
    /// Property: every in-domain point maps inside the 2^zoom grid.
    #[test]
    fn prop_tile_index_in_grid(
        lon in -180.0f64..180.0f64,
        lat in -85.05112877f64..85.05112877f64,
        zoom in 0u8..=30u8,
    ) {
        let tile = tile_index(lon, lat, zoom).unwrap();
        let size = 1u64 << zoom;
        prop_assert!(u64::from(tile.col) < size);
        prop_assert!(u64::from(tile.row) < size);
    }

    /// Property: widening the zoom span never lowers the count.
    #[test]
    fn prop_count_monotone_in_zoom_span(
        west in -180.0f64..180.0f64,
        width in 0.0f64..40.0f64,
        south in -80.0f64..80.0f64,
        height in 0.0f64..5.0f64,
        zoom_min in 0u8..18u8,
        span in 0u8..5u8,
    ) {
        let bbox = BoundingBox::new(west, (south + height).min(MAX_LAT), (west + width).min(MAX_LON), south);
        let narrow = tile_count(&bbox, ZoomRange::new(zoom_min, zoom_min + span)).unwrap();
        let wide = tile_count(&bbox, ZoomRange::new(zoom_min, zoom_min + span + 1)).unwrap();
        prop_assert!(narrow <= wide);
    }

    /// Property: enlarging the box never lowers the count at a fixed zoom.
    #[test]
    fn prop_count_monotone_in_area(
        west in -170.0f64..0.0f64,
        width in 0.0f64..100.0f64,
        south in -70.0f64..0.0f64,
        height in 0.0f64..60.0f64,
        grow_w in 0.0f64..10.0f64,
        grow_e in 0.0f64..10.0f64,
        grow_n in 0.0f64..10.0f64,
        grow_s in 0.0f64..10.0f64,
        zoom in 0u8..16u8,
    ) {
        let small = BoundingBox::new(west, south + height, west + width, south);
        let large = BoundingBox::new(
            (west - grow_w).max(MIN_LON),
            (south + height + grow_n).min(MAX_LAT),
            (west + width + grow_e).min(MAX_LON),
            (south - grow_s).max(MIN_LAT),
        );
        let zoom = ZoomRange::new(zoom, zoom);
        prop_assert!(tile_count(&small, zoom).unwrap() <= tile_count(&large, zoom).unwrap());
    }

    /// Property: a wrapping box counts exactly its two halves.
    #[test]
    fn prop_antimeridian_identity(
        a in -85.0f64..85.0f64,
        b in -85.0f64..85.0f64,
        zoom in 0u8..=20u8,
    ) {
        let (north, south) = if a >= b { (a, b) } else { (b, a) };
        let zoom = ZoomRange::new(zoom, zoom);
        let wrapped = tile_count(&BoundingBox::new(170.0, north, -170.0, south), zoom).unwrap();
        let east = tile_count(&BoundingBox::new(170.0, north, 180.0, south), zoom).unwrap();
        let west = tile_count(&BoundingBox::new(-180.0, north, -170.0, south), zoom).unwrap();
        prop_assert_eq!(wrapped, east + west);
    }
}
