//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

use crate::error::GeoError;
use crate::geometry::LatLng;

/// A geographic bounding box in degrees.
///
/// `min_x`/`max_x` are longitudes (west/east), `min_y`/`max_y` are latitudes
/// (south/north).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Rectangle used when no data source reports any record.
    pub fn world_fallback() -> Self {
        Self::from_corners([[-60.0, -180.0], [80.0, 180.0]])
    }

    /// Build from map-style corners: `[[lat_sw, lng_sw], [lat_ne, lng_ne]]`.
    pub fn from_corners(corners: [[f64; 2]; 2]) -> Self {
        let [[lat_sw, lng_sw], [lat_ne, lng_ne]] = corners;
        Self::new(lng_sw, lat_sw, lng_ne, lat_ne)
    }

    /// Map-style corners: `[[lat_sw, lng_sw], [lat_ne, lng_ne]]`.
    pub fn to_corners(&self) -> [[f64; 2]; 2] {
        [[self.min_y, self.min_x], [self.max_y, self.max_x]]
    }

    /// Degenerate box around a single point.
    pub fn from_point(point: LatLng) -> Self {
        Self::new(point.lng, point.lat, point.lng, point.lat)
    }

    /// Parse "south,west,north,east" (the same axis order as `to_corners`).
    pub fn from_bounds_string(s: &str) -> Result<Self, GeoError> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 4 {
            return Err(GeoError::InvalidBoundsFormat(s.to_string()));
        }

        let mut values = [0.0f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| GeoError::InvalidNumber(part.to_string()))?;
        }

        let [south, west, north, east] = values;
        Ok(Self::from_corners([[south, west], [north, east]]))
    }

    /// Width of the bounding box in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Center point of the box.
    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.min_y + self.max_y) / 2.0,
            (self.min_x + self.max_x) / 2.0,
        )
    }

    /// Grow this box so that it also covers `other`.
    pub fn extend(&mut self, other: &BoundingBox) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    /// Grow this box so that it also covers `point`.
    pub fn extend_point(&mut self, point: LatLng) {
        self.extend(&BoundingBox::from_point(point));
    }

    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, point: LatLng) -> bool {
        point.lng >= self.min_x
            && point.lng <= self.max_x
            && point.lat >= self.min_y
            && point.lat <= self.max_y
    }

    /// Closed ring of `[lat, lng]` vertices, counter-clockwise from south-west.
    ///
    /// This is the polygon the search backend uses to restrict queries to the
    /// visible area.
    pub fn to_polygon(&self) -> Vec<[f64; 2]> {
        vec![
            [self.min_y, self.min_x],
            [self.min_y, self.max_x],
            [self.max_y, self.max_x],
            [self.max_y, self.min_x],
            [self.min_y, self.min_x],
        ]
    }

    /// Cache key fragment, quantized to avoid floating point noise.
    pub fn cache_key(&self) -> String {
        format!(
            "{:.6}_{:.6}_{:.6}_{:.6}",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}
