//! Visual primitives produced by the builders and handed to the canvas.

use geo_common::{BoundingBox, Color, Geometry, LatLng};
use serde::{Deserialize, Serialize};

/// Filter applied by clicking a primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordFilter {
    /// Records intersecting a geometry.
    Geometry { geometry: Geometry },
    /// Records whose field equals a value.
    FieldValue { field: String, value: String },
    /// One record.
    RecordId { id: String },
}

/// What happens when a primitive is clicked.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Interaction {
    #[default]
    None,
    /// Open a detail view of the matching records.
    OpenDetail {
        filter: RecordFilter,
        #[serde(default)]
        sort: Option<String>,
    },
    /// Fit the map to an area.
    FitBounds { bounds: BoundingBox },
    /// Center the map on a point at a given zoom.
    FitPoint { center: LatLng, zoom: u8 },
    /// Restrict the surrounding UI to the matching records.
    Filter { filter: RecordFilter },
}

/// Values the canvas needs to render a tooltip.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TooltipMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    /// Value of the layer's hover field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover_value: Option<String>,
    /// Field ordering records in the detail view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_field: Option<String>,
}

/// One weighted heatmap sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatSample {
    pub lat: f64,
    pub lng: f64,
    pub weight: f64,
}

/// A drawable element of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Primitive {
    /// A single record.
    Marker {
        position: LatLng,
        color: Color,
        #[serde(default)]
        picto: Option<String>,
        #[serde(default)]
        tooltip: TooltipMeta,
        #[serde(default)]
        interaction: Interaction,
    },

    /// A group of records showing a count or aggregate.
    ClusterMarker {
        position: LatLng,
        value: f64,
        count: u64,
        /// Size relative to the request's value range, in [0, 1].
        relative_size: f64,
        color: Color,
        #[serde(default)]
        interaction: Interaction,
    },

    /// A non-point geometry.
    Shape {
        geometry: Geometry,
        fill: Color,
        #[serde(default)]
        border: Option<Color>,
        opacity: f64,
        #[serde(default)]
        tooltip: TooltipMeta,
        #[serde(default)]
        interaction: Interaction,
    },

    /// A small fixed-size circle.
    Circle {
        position: LatLng,
        radius: f64,
        color: Color,
    },

    /// Weighted heat samples sharing one radius.
    Heatmap {
        samples: Vec<HeatSample>,
        radius: f64,
        color: Color,
    },

    /// Server-rendered raster tiles.
    TileLayer { url_template: String, opacity: f64 },
}

impl Primitive {
    pub fn kind(&self) -> &'static str {
        match self {
            Primitive::Marker { .. } => "marker",
            Primitive::ClusterMarker { .. } => "cluster_marker",
            Primitive::Shape { .. } => "shape",
            Primitive::Circle { .. } => "circle",
            Primitive::Heatmap { .. } => "heatmap",
            Primitive::TileLayer { .. } => "tile_layer",
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, Primitive::Marker { .. })
    }

    pub fn is_cluster_marker(&self) -> bool {
        matches!(self, Primitive::ClusterMarker { .. })
    }

    pub fn interaction(&self) -> Option<&Interaction> {
        match self {
            Primitive::Marker { interaction, .. }
            | Primitive::ClusterMarker { interaction, .. }
            | Primitive::Shape { interaction, .. } => Some(interaction),
            _ => None,
        }
    }
}

/// One legend color swatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendSwatch {
    /// Value the color was resolved for.
    pub value: f64,
    pub color: Color,
}

/// Grade boundaries and their swatches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendSpec {
    pub grades: Vec<f64>,
    pub swatches: Vec<LegendSwatch>,
}

/// Everything a builder produced for one render of one layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RenderResult {
    pub primitives: Vec<Primitive>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend: Option<LegendSpec>,
}

impl RenderResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(primitives: Vec<Primitive>) -> Self {
        Self {
            primitives,
            legend: None,
        }
    }

    pub fn with_legend(mut self, legend: Option<LegendSpec>) -> Self {
        self.legend = legend;
        self
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty() && self.legend.is_none()
    }

    /// Number of primitives of the given kind.
    pub fn count_of(&self, kind: &str) -> usize {
        self.primitives.iter().filter(|p| p.kind() == kind).count()
    }
}
