//! Layer definitions: which data source a layer shows and how.

use std::collections::BTreeMap;
use std::fmt;

use geo_common::Color;
use serde::{Deserialize, Serialize};

/// Unique identifier for a layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rendering strategy requested by the layer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerStrategy {
    /// Server-rendered raster tiles.
    Tiles,
    /// Every record as a marker or shape.
    Raw,
    /// Server-side spatial clusters; single-record clusters become markers.
    Clustered,
    /// Server-side spatial clusters, always drawn as cluster markers.
    ClusteredForced,
    /// Weighted heat samples.
    Heatmap,
    /// Aggregated values drawn on shapes, local or joined.
    Aggregation,
    /// Lightweight shape previews.
    ShapePreview,
    /// Decided from a volume probe on every render.
    #[default]
    Auto,
}

/// Aggregation function applied to clusters or joined shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregationFunction {
    #[default]
    Count,
    Avg,
    Sum,
    Min,
    Max,
    Stddev,
}

impl AggregationFunction {
    /// Name used in backend queries.
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationFunction::Count => "COUNT",
            AggregationFunction::Avg => "AVG",
            AggregationFunction::Sum => "SUM",
            AggregationFunction::Min => "MIN",
            AggregationFunction::Max => "MAX",
            AggregationFunction::Stddev => "STDDEV",
        }
    }

    pub fn is_count(&self) -> bool {
        matches!(self, AggregationFunction::Count)
    }
}

/// How values map to display colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColorSpec {
    /// One color for everything.
    Fixed { color: Color },

    /// A named continuous gradient, scaled to the value domain.
    Scale { name: String },

    /// Step function: the color of the first threshold above the value.
    Range {
        thresholds: Vec<f64>,
        colors: Vec<Color>,
        /// Record field holding the value, for per-record coloring.
        #[serde(default)]
        source_field: Option<String>,
    },
}

impl ColorSpec {
    pub fn fixed(color: Color) -> Self {
        ColorSpec::Fixed { color }
    }
}

/// Field type as declared in a dataset schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Int,
    Double,
    Date,
    Datetime,
    /// Centroid computed by the backend for every record.
    GeoPoint2d,
    /// Full GeoJSON shape.
    GeoShape,
    #[serde(other)]
    Other,
}

/// One field of a dataset schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// A filtered view of one dataset, owned by the surrounding UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredSource {
    /// Base URL of the portal hosting the dataset.
    pub domain: String,

    /// Dataset identifier.
    pub dataset: String,

    /// Query parameters (full-text query, refinements, ...).
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,

    /// Dataset schema.
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

impl FilteredSource {
    pub fn new(domain: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            dataset: dataset.into(),
            parameters: BTreeMap::new(),
            fields: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldSchema::new(name, field_type));
        self
    }

    /// First field holding full shapes, if any.
    pub fn shape_field(&self) -> Option<&FieldSchema> {
        self.fields
            .iter()
            .find(|f| f.field_type == FieldType::GeoShape)
    }

    /// First field holding centroids, if any.
    pub fn point_field(&self) -> Option<&FieldSchema> {
        self.fields
            .iter()
            .find(|f| f.field_type == FieldType::GeoPoint2d)
    }
}

/// Remote dataset whose shapes receive the aggregated values of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinSource {
    pub source: FilteredSource,
    /// Field of the layer's own dataset used as join key.
    #[serde(default)]
    pub local_key: Option<String>,
    /// Field of the remote dataset matched against `local_key`.
    #[serde(default)]
    pub remote_key: Option<String>,
}

/// One visual layer bound to one filtered data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub id: LayerId,

    #[serde(default)]
    pub title: Option<String>,

    pub source: FilteredSource,

    #[serde(default)]
    pub strategy: LayerStrategy,

    /// Color mapping; layers without one get the next palette color.
    #[serde(default)]
    pub color_spec: Option<ColorSpec>,

    /// Marker pictogram name.
    #[serde(default)]
    pub picto: Option<String>,

    #[serde(default)]
    pub aggregation_function: AggregationFunction,

    /// Field or expression the aggregation function applies to.
    #[serde(default)]
    pub aggregation_expression: Option<String>,

    #[serde(default)]
    pub join_source: Option<JoinSource>,

    /// Field used to order records in detail views.
    #[serde(default)]
    pub tooltip_sort: Option<String>,

    /// Field whose value is shown on hover and used for click filters.
    #[serde(default)]
    pub hover_field: Option<String>,

    #[serde(default = "default_opacity")]
    pub opacity: f64,

    #[serde(default)]
    pub border_color: Option<Color>,

    /// Ignore this layer when fitting the map to the data.
    #[serde(default)]
    pub exclude_from_refit: bool,
}

fn default_opacity() -> f64 {
    1.0
}

impl LayerConfig {
    pub fn new(id: impl Into<String>, source: FilteredSource, strategy: LayerStrategy) -> Self {
        Self {
            id: LayerId::new(id),
            title: None,
            source,
            strategy,
            color_spec: None,
            picto: None,
            aggregation_function: AggregationFunction::Count,
            aggregation_expression: None,
            join_source: None,
            tooltip_sort: None,
            hover_field: None,
            opacity: default_opacity(),
            border_color: None,
            exclude_from_refit: false,
        }
    }

    pub fn with_color(mut self, spec: ColorSpec) -> Self {
        self.color_spec = Some(spec);
        self
    }

    pub fn with_aggregation(
        mut self,
        function: AggregationFunction,
        expression: Option<&str>,
    ) -> Self {
        self.aggregation_function = function;
        self.aggregation_expression = expression.map(str::to_string);
        self
    }

    pub fn with_join(mut self, join: JoinSource) -> Self {
        self.join_source = Some(join);
        self
    }

    /// The aggregation to request from the backend, None for plain counts.
    pub fn aggregation(&self) -> Option<AggregationRequest> {
        if self.aggregation_function.is_count() {
            return None;
        }
        Some(AggregationRequest {
            function: self.aggregation_function,
            expression: self.aggregation_expression.clone(),
        })
    }

    /// Fixed color of the layer, when its color spec is `Fixed`.
    pub fn fixed_color(&self) -> Option<Color> {
        match &self.color_spec {
            Some(ColorSpec::Fixed { color }) => Some(*color),
            _ => None,
        }
    }
}

/// Aggregate requested from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationRequest {
    pub function: AggregationFunction,
    pub expression: Option<String>,
}
