//! The visible map area, as reported by the canvas on every move.

use geo_common::BoundingBox;
use serde::{Deserialize, Serialize};

/// Visible bounds and zoom of the map canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub bounds: BoundingBox,
    pub zoom: u8,
    pub max_zoom: u8,
}

impl Viewport {
    /// Build from map-style corners `[[lat_sw, lng_sw], [lat_ne, lng_ne]]`.
    pub fn new(corners: [[f64; 2]; 2], zoom: u8, max_zoom: u8) -> Self {
        Self {
            bounds: BoundingBox::from_corners(corners),
            zoom,
            max_zoom,
        }
    }

    pub fn from_bounds(bounds: BoundingBox, zoom: u8, max_zoom: u8) -> Self {
        Self {
            bounds,
            zoom,
            max_zoom,
        }
    }

    /// Whether the map cannot zoom in any further.
    pub fn at_max_zoom(&self) -> bool {
        self.zoom >= self.max_zoom
    }
}
