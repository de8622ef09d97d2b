//! The interactive map surface the engine draws onto.

use geo_common::{BoundingBox, LatLng};
use serde::{Deserialize, Serialize};

use crate::render::RenderResult;
use crate::viewport::Viewport;

/// Opaque handle of a visual attached to the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisualHandle(pub u64);

/// Map drawing surface.
///
/// Implementations own pan/zoom, vector drawing and popups; the engine only
/// attaches and detaches whole layer visuals.
pub trait MapCanvas: Send + Sync {
    /// Attach a visual and return its handle.
    fn add_layer(&self, visual: RenderResult) -> VisualHandle;

    /// Detach a previously attached visual.
    fn remove_layer(&self, handle: VisualHandle);

    /// Currently visible area.
    fn viewport(&self) -> Viewport;

    /// Move the map so that `bounds` is fully visible.
    fn fit_bounds(&self, bounds: BoundingBox);
}

/// Notifications emitted by the canvas, delivered on a broadcast channel.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// The user panned or zoomed.
    ViewportChanged(Viewport),
    /// The user drew a polygon to restrict every layer to.
    ShapeDrawn(Vec<LatLng>),
    /// The drawn polygon was removed.
    ShapeCleared,
}
