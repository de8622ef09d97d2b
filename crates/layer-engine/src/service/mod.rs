//! Search backend trait and its request/response types.
//!
//! The engine never talks to a backend directly: every spatial, clustering
//! and aggregation query goes through [`SearchService`]. Dropping a returned
//! future must abort the underlying request, which is how cancelled renders
//! stop their I/O.

mod http;

pub use http::HttpSearchService;

use std::collections::HashMap;

use async_trait::async_trait;
use geo_common::{BoundingBox, Geometry, GeometryKind, LatLng};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::layer::{AggregationRequest, FilteredSource};

/// Spatial restrictions applied on top of a source's own filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryContext {
    /// Only records inside the visible area.
    pub viewport: Option<BoundingBox>,
    /// Only records inside a polygon drawn by the user.
    pub drawn_polygon: Option<Vec<LatLng>>,
}

impl QueryContext {
    pub fn within(viewport: BoundingBox) -> Self {
        Self {
            viewport: Some(viewport),
            drawn_polygon: None,
        }
    }
}

/// Minimum and maximum of a value distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregationStat {
    pub min: f64,
    pub max: f64,
}

impl AggregationStat {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Min and max over a set of values, None when empty.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values.into_iter().fold(None, |acc, v| match acc {
            None => Some(Self::new(v, v)),
            Some(stat) => Some(Self::new(stat.min.min(v), stat.max.max(v))),
        })
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }
}

/// Cheap volume probe: record count, extent and geometry type histogram.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeProbe {
    pub count: u64,
    pub bbox: Option<BoundingBox>,
    #[serde(default)]
    pub geometries: HashMap<GeometryKind, u64>,
}

impl VolumeProbe {
    /// Share of `count` made of point geometries, in [0, 1].
    pub fn point_share(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let points = self
            .geometries
            .get(&GeometryKind::Point)
            .copied()
            .unwrap_or(0);
        points as f64 / self.count as f64
    }
}

/// Parameters of a clustering or heatmap query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterParams {
    /// Clustering distance in pixels.
    pub cluster_distance: u32,
    /// Clustering precision, the current zoom level.
    pub cluster_precision: u8,
    /// Return each cluster's covering polygon.
    pub return_polygons: bool,
    /// Aggregate to compute per cluster instead of a plain count.
    pub aggregation: Option<AggregationRequest>,
}

/// A server-computed spatial group of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRecord {
    pub center: LatLng,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    pub count: u64,
    /// Aggregate value, when one was requested.
    #[serde(default)]
    pub value: Option<f64>,
}

impl ClusterRecord {
    /// The value shown for this cluster: the aggregate, or the count.
    pub fn display_value(&self) -> f64 {
        self.value.unwrap_or(self.count as f64)
    }
}

/// Result of a clustering query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterResponse {
    pub clusters: Vec<ClusterRecord>,
    /// Min/max of the per-cluster counts.
    pub count: AggregationStat,
    /// Min/max of the per-cluster aggregates, when one was requested.
    #[serde(default)]
    pub series: Option<AggregationStat>,
}

impl ClusterResponse {
    /// Domain of the displayed values.
    pub fn value_stat(&self) -> AggregationStat {
        self.series.unwrap_or(self.count)
    }
}

/// Result of a heatmap query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapResponse {
    pub clusters: Vec<ClusterRecord>,
}

/// Parameters of a server-side join between the layer's dataset and a
/// remote shape dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinParams {
    pub remote: FilteredSource,
    pub remote_shape_field: String,
    pub local_key: String,
    pub remote_key: String,
    pub aggregation: AggregationRequest,
}

/// One remote shape with the aggregate of the local records joined onto it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinResult {
    /// Join key value of the shape.
    pub key: String,
    pub geometry: Geometry,
    pub value: Option<f64>,
}

/// Result of a join aggregation query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinResponse {
    pub results: Vec<JoinResult>,
    /// MIN and MAX of the aggregate over all shapes.
    pub aggregations: AggregationStat,
}

/// A downloaded record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub record_id: Option<String>,
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
    /// Value of the declared shape field.
    #[serde(default)]
    pub geometry: Option<Geometry>,
    /// Backend-computed centroid.
    #[serde(default)]
    pub centroid: Option<LatLng>,
}

impl Record {
    /// Numeric value of a field, accepting numbers and numeric strings.
    pub fn number(&self, field: &str) -> Option<f64> {
        match self.fields.get(field)? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Display text of a field.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.fields.get(field)? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// A lightweight shape preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapePreviewItem {
    pub geometry: Geometry,
    pub digest: String,
}

/// Search and aggregation backend.
#[async_trait]
pub trait SearchService: Send + Sync {
    /// Record count, extent and geometry histogram of a filtered source.
    async fn bounding_box(&self, source: &FilteredSource, query: &QueryContext)
        -> Result<VolumeProbe>;

    /// Spatial clustering, optionally with a per-cluster aggregate.
    async fn cluster_query(
        &self,
        source: &FilteredSource,
        query: &QueryContext,
        params: &ClusterParams,
    ) -> Result<ClusterResponse>;

    /// Spatial clustering in heatmap mode.
    async fn heatmap_query(
        &self,
        source: &FilteredSource,
        query: &QueryContext,
        params: &ClusterParams,
    ) -> Result<HeatmapResponse>;

    /// Join the source onto remote shapes and aggregate per shape.
    async fn join_aggregate_query(
        &self,
        source: &FilteredSource,
        query: &QueryContext,
        params: &JoinParams,
    ) -> Result<JoinResponse>;

    /// Download up to `row_cap` records.
    async fn raw_download(
        &self,
        source: &FilteredSource,
        query: &QueryContext,
        row_cap: usize,
    ) -> Result<Vec<Record>>;

    /// Download up to `row_cap` lightweight shape previews.
    async fn shape_preview(
        &self,
        source: &FilteredSource,
        query: &QueryContext,
        row_cap: usize,
    ) -> Result<Vec<ShapePreviewItem>>;
}
