//! GeoJSON geometry types used for records, clusters and drawn shapes.
//!
//! Coordinates follow the GeoJSON convention of `[longitude, latitude]`.

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Build from a GeoJSON `[lng, lat]` position.
    pub fn from_position(position: [f64; 2]) -> Self {
        Self::new(position[1], position[0])
    }

    /// GeoJSON `[lng, lat]` position.
    pub fn to_position(&self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

/// Discriminant of a geometry, as counted by the backend's type histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
}

/// GeoJSON geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: [f64; 2],
    },
    MultiPoint {
        coordinates: Vec<[f64; 2]>,
    },
    LineString {
        coordinates: Vec<[f64; 2]>,
    },
    MultiLineString {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    /// Linear rings, the first one exterior.
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
}

impl Geometry {
    /// Create a point geometry.
    pub fn point(lat: f64, lng: f64) -> Self {
        Geometry::Point {
            coordinates: [lng, lat],
        }
    }

    /// Create a polygon from a single exterior ring of `[lng, lat]` positions.
    pub fn polygon(ring: Vec<[f64; 2]>) -> Self {
        Geometry::Polygon {
            coordinates: vec![ring],
        }
    }

    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point { .. } => GeometryKind::Point,
            Geometry::MultiPoint { .. } => GeometryKind::MultiPoint,
            Geometry::LineString { .. } => GeometryKind::LineString,
            Geometry::MultiLineString { .. } => GeometryKind::MultiLineString,
            Geometry::Polygon { .. } => GeometryKind::Polygon,
            Geometry::MultiPolygon { .. } => GeometryKind::MultiPolygon,
        }
    }

    pub fn is_point(&self) -> bool {
        matches!(self, Geometry::Point { .. })
    }

    /// Position of a point geometry.
    pub fn as_point(&self) -> Option<LatLng> {
        match self {
            Geometry::Point { coordinates } => Some(LatLng::from_position(*coordinates)),
            _ => None,
        }
    }

    /// All positions of the geometry, flattened.
    pub fn positions(&self) -> Vec<[f64; 2]> {
        match self {
            Geometry::Point { coordinates } => vec![*coordinates],
            Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
                coordinates.clone()
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                coordinates.iter().flatten().copied().collect()
            }
            Geometry::MultiPolygon { coordinates } => {
                coordinates.iter().flatten().flatten().copied().collect()
            }
        }
    }

    /// Bounding box of every position, or None for an empty geometry.
    pub fn bounds(&self) -> Option<BoundingBox> {
        let positions = self.positions();
        let (first, rest) = positions.split_first()?;

        let mut bbox = BoundingBox::from_point(LatLng::from_position(*first));
        for position in rest {
            bbox.extend_point(LatLng::from_position(*position));
        }
        Some(bbox)
    }

    /// Center of the geometry's bounding box.
    pub fn center(&self) -> Option<LatLng> {
        match self {
            Geometry::Point { coordinates } => Some(LatLng::from_position(*coordinates)),
            _ => self.bounds().map(|b| b.center()),
        }
    }
}
