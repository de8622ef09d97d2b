//! Compact map location codec.
//!
//! A location is serialized as `"zoom,lat,lng"`, with latitude and longitude
//! rounded to 5 decimal digits (about one meter).

use serde::{Deserialize, Serialize};

use crate::error::GeoError;
use crate::geometry::LatLng;

const COORDINATE_PRECISION: f64 = 100_000.0;

/// A map center and zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapLocation {
    pub center: LatLng,
    pub zoom: u8,
}

impl MapLocation {
    pub fn new(center: LatLng, zoom: u8) -> Self {
        Self { center, zoom }
    }
}

fn round_coordinate(value: f64) -> f64 {
    (value * COORDINATE_PRECISION).round() / COORDINATE_PRECISION
}

/// Encode a location as `"zoom,lat,lng"`.
pub fn encode_location(location: &MapLocation) -> String {
    format!(
        "{},{},{}",
        location.zoom,
        round_coordinate(location.center.lat),
        round_coordinate(location.center.lng)
    )
}

/// Decode a `"zoom,lat,lng"` string produced by [`encode_location`].
pub fn decode_location(s: &str) -> Result<MapLocation, GeoError> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err(GeoError::invalid_location(s, "expected 'zoom,lat,lng'"));
    }

    let zoom: u8 = parts[0]
        .trim()
        .parse()
        .map_err(|_| GeoError::invalid_location(s, format!("bad zoom '{}'", parts[0])))?;

    let coordinate = |raw: &str| -> Result<f64, GeoError> {
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| GeoError::invalid_location(s, format!("bad coordinate '{}'", raw)))
    };

    let lat = coordinate(parts[1])?;
    let lng = coordinate(parts[2])?;

    if !(-90.0..=90.0).contains(&lat) {
        return Err(GeoError::invalid_location(s, "latitude out of range"));
    }

    Ok(MapLocation::new(LatLng::new(lat, lng), zoom))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_rounds_to_five_digits() {
        let location = MapLocation::new(LatLng::new(48.8566141, 2.3522219), 12);
        assert_eq!(encode_location(&location), "12,48.85661,2.35222");
    }

    #[test]
    fn test_decode() {
        let location = decode_location("5,-33.86785,151.20732").unwrap();
        assert_eq!(location.zoom, 5);
        assert_eq!(location.center, LatLng::new(-33.86785, 151.20732));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_location("").is_err());
        assert!(decode_location("5,10").is_err());
        assert!(decode_location("x,10,20").is_err());
        assert!(decode_location("5,abc,20").is_err());
        assert!(decode_location("5,95,20").is_err());
        assert!(decode_location("5,NaN,20").is_err());
    }
}
