//! Common geographic types shared by the layer engine and its services.

pub mod bbox;
pub mod color;
pub mod error;
pub mod geometry;
pub mod location;

pub use bbox::BoundingBox;
pub use color::Color;
pub use error::{GeoError, GeoResult};
pub use geometry::{Geometry, GeometryKind, LatLng};
pub use location::{decode_location, encode_location, MapLocation};
