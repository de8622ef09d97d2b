//! Tests for BoundingBox operations and the location codec.

use geo_common::error::GeoError;
use geo_common::{decode_location, encode_location, BoundingBox, LatLng, MapLocation};
use test_utils::{assert_approx_eq, assert_coords_approx_eq, fixtures};

// ============================================================================
// Constructor tests
// ============================================================================

#[test]
fn test_bbox_new() {
    let bbox = BoundingBox::new(-180.0, -90.0, 180.0, 90.0);
    assert_eq!(bbox.min_x, -180.0);
    assert_eq!(bbox.min_y, -90.0);
    assert_eq!(bbox.max_x, 180.0);
    assert_eq!(bbox.max_y, 90.0);
}

#[test]
fn test_bbox_corners_roundtrip() {
    let corners = [[43.0, -5.0], [51.0, 8.0]];
    let bbox = BoundingBox::from_corners(corners);
    assert_eq!(bbox.min_x, -5.0);
    assert_eq!(bbox.min_y, 43.0);
    assert_eq!(bbox.to_corners(), corners);
}

#[test]
fn test_bbox_from_fixture() {
    let (min_x, min_y, max_x, max_y) = fixtures::bbox::FRANCE;
    let bbox = BoundingBox::new(min_x, min_y, max_x, max_y);
    assert!(bbox.contains_point(LatLng::new(48.85, 2.35)));
    assert!(!bbox.contains_point(LatLng::new(40.4, -3.7)));
}

// ============================================================================
// from_bounds_string tests
// ============================================================================

#[test]
fn test_parse_bounds_floating() {
    let bbox = BoundingBox::from_bounds_string("24.75,-125.5,50.125,-66.25").unwrap();
    assert_approx_eq!(bbox.min_x, -125.5, 0.001);
    assert_approx_eq!(bbox.min_y, 24.75, 0.001);
    assert_approx_eq!(bbox.max_x, -66.25, 0.001);
    assert_approx_eq!(bbox.max_y, 50.125, 0.001);
}

#[test]
fn test_parse_bounds_invalid_format() {
    let result = BoundingBox::from_bounds_string("0,0,100");
    assert!(matches!(result, Err(GeoError::InvalidBoundsFormat(_))));

    let result = BoundingBox::from_bounds_string("");
    assert!(matches!(result, Err(GeoError::InvalidBoundsFormat(_))));
}

#[test]
fn test_parse_bounds_invalid_number() {
    let result = BoundingBox::from_bounds_string("abc,0,100,100");
    assert!(matches!(result, Err(GeoError::InvalidNumber(_))));
}

// ============================================================================
// Extension tests
// ============================================================================

#[test]
fn test_extend_disjoint_boxes() {
    let mut running = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
    running.extend(&BoundingBox::new(10.0, 20.0, 11.0, 21.0));

    assert_eq!(running, BoundingBox::new(0.0, 0.0, 11.0, 21.0));
    assert_eq!(running.width(), 11.0);
    assert_eq!(running.height(), 21.0);
}

#[test]
fn test_extend_point_inside_is_noop() {
    let mut bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    bbox.extend_point(LatLng::new(5.0, 5.0));
    assert_eq!(bbox, BoundingBox::new(0.0, 0.0, 10.0, 10.0));
}

#[test]
fn test_center() {
    let bbox = BoundingBox::new(-10.0, 20.0, 10.0, 40.0);
    let center = bbox.center();
    assert_coords_approx_eq!((center.lat, center.lng), (30.0, 0.0), 1e-9);
}

#[test]
fn test_polygon_is_closed_ring() {
    let polygon = BoundingBox::new(-1.0, -2.0, 3.0, 4.0).to_polygon();
    assert_eq!(polygon.len(), 5);
    assert_eq!(polygon.first(), polygon.last());
    assert_eq!(polygon[0], [-2.0, -1.0]);
    assert_eq!(polygon[2], [4.0, 3.0]);
}

#[test]
fn test_intersects() {
    let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
    let c = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
    assert!(a.intersects(&b));
    assert!(!a.intersects(&c));
}

// ============================================================================
// Location codec tests
// ============================================================================

#[test]
fn test_location_roundtrip_within_rounding() {
    let samples = [
        (0u8, 0.0, 0.0),
        (3, 89.999999, -179.999999),
        (18, -33.8678500, 151.2073200),
        (12, 48.85661412, 2.35222189),
        (7, -0.000004, 0.000006),
    ];

    for (zoom, lat, lng) in samples {
        let location = MapLocation::new(LatLng::new(lat, lng), zoom);
        let decoded = decode_location(&encode_location(&location)).unwrap();

        assert_eq!(decoded.zoom, zoom);
        assert_coords_approx_eq!(
            (decoded.center.lat, decoded.center.lng),
            (lat, lng),
            0.000005
        );
    }
}

#[test]
fn test_location_encode_is_stable_after_decode() {
    let encoded = "9,45.76404,4.83566";
    let decoded = decode_location(encoded).unwrap();
    assert_eq!(encode_location(&decoded), encoded);
}

#[test]
fn test_location_invalid_error_message() {
    let err = decode_location("nine,1,2").unwrap_err();
    assert!(err.to_string().contains("nine,1,2"));
}
