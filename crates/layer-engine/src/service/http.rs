//! [`SearchService`] backed by a records search API over HTTP.
//!
//! Endpoints live under `{domain}/api/records/1.0/`. Every request carries
//! the dataset, the source's own query parameters and up to two
//! `geofilter.polygon` filters (viewport and drawn shape).

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use geo_common::{BoundingBox, Geometry, GeometryKind, LatLng};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{
    AggregationStat, ClusterParams, ClusterRecord, ClusterResponse, HeatmapResponse, JoinParams,
    JoinResponse, JoinResult, QueryContext, Record, SearchService, ShapePreviewItem, VolumeProbe,
};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::layer::FilteredSource;

const API_PREFIX: &str = "api/records/1.0";

/// Query string as ordered key/value pairs; keys may repeat.
type Params = Vec<(String, String)>;

/// HTTP search backend.
pub struct HttpSearchService {
    client: Client,
}

impl HttpSearchService {
    /// Create a backend client with the configured request timeout.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| EngineError::configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Reuse an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        source: &FilteredSource,
        endpoint: &str,
        params: &Params,
    ) -> Result<T> {
        let url = endpoint_url(&source.domain, endpoint);
        debug!(url = %url, params = params.len(), "Backend request");

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await?
            .error_for_status()?;

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn endpoint_url(domain: &str, endpoint: &str) -> String {
    format!("{}/{}/{}/", domain.trim_end_matches('/'), API_PREFIX, endpoint)
}

/// `(lat,lng),(lat,lng),...` polygon filter syntax.
fn polygon_filter(points: impl IntoIterator<Item = LatLng>) -> String {
    points
        .into_iter()
        .map(|p| format!("({},{})", p.lat, p.lng))
        .collect::<Vec<_>>()
        .join(",")
}

/// Dataset, source parameters and spatial filters shared by every request.
fn base_params(source: &FilteredSource, query: &QueryContext) -> Params {
    let mut params: Params = vec![("dataset".to_string(), source.dataset.clone())];
    params.extend(
        source
            .parameters
            .iter()
            .map(|(k, v)| (k.clone(), v.clone())),
    );

    if let Some(viewport) = &query.viewport {
        let ring = viewport
            .to_polygon()
            .into_iter()
            .map(|[lat, lng]| LatLng::new(lat, lng));
        params.push(("geofilter.polygon".to_string(), polygon_filter(ring)));
    }

    if let Some(drawn) = &query.drawn_polygon {
        if drawn.len() >= 3 {
            params.push((
                "geofilter.polygon".to_string(),
                polygon_filter(drawn.iter().copied()),
            ));
        }
    }

    params
}

fn cluster_params(source: &FilteredSource, query: &QueryContext, params: &ClusterParams) -> Params {
    let mut out = base_params(source, query);
    out.push((
        "clusterdistance".to_string(),
        params.cluster_distance.to_string(),
    ));
    out.push((
        "clusterprecision".to_string(),
        params.cluster_precision.to_string(),
    ));
    if params.return_polygons {
        out.push(("shape".to_string(), "polygon".to_string()));
    }
    if let Some(aggregation) = &params.aggregation {
        out.push((
            "y.serie1.func".to_string(),
            aggregation.function.as_str().to_string(),
        ));
        if let Some(expression) = &aggregation.expression {
            out.push(("y.serie1.expr".to_string(), expression.clone()));
        }
    }
    out
}

fn join_params(source: &FilteredSource, query: &QueryContext, params: &JoinParams) -> Params {
    let mut out = base_params(source, query);
    out.push(("clustermode".to_string(), "polygon".to_string()));
    out.push((
        "join.geo.remotedataset".to_string(),
        params.remote.dataset.clone(),
    ));
    out.push(("join.geo.remotekey".to_string(), params.remote_key.clone()));
    out.push(("join.geo.localkey".to_string(), params.local_key.clone()));
    out.push((
        "join.geo.remoteshape".to_string(),
        params.remote_shape_field.clone(),
    ));
    for (key, value) in &params.remote.parameters {
        out.push((format!("join.geo.remote.{}", key), value.clone()));
    }

    out.push((
        "y.serie1.func".to_string(),
        params.aggregation.function.as_str().to_string(),
    ));
    // MIN and MAX of the aggregated expression; COUNT has none to bound
    if let Some(expression) = &params.aggregation.expression {
        out.push(("y.min.func".to_string(), "MIN".to_string()));
        out.push(("y.max.func".to_string(), "MAX".to_string()));
        out.push(("y.serie1.expr".to_string(), expression.clone()));
        out.push(("y.min.expr".to_string(), expression.clone()));
        out.push(("y.max.expr".to_string(), expression.clone()));
    }
    out
}

fn rows_params(source: &FilteredSource, query: &QueryContext, row_cap: usize) -> Params {
    let mut out = base_params(source, query);
    out.push(("rows".to_string(), row_cap.to_string()));
    out
}

// ============================================================================
// Wire formats
// ============================================================================

#[derive(Debug, Deserialize)]
struct BoundingBoxWire {
    count: u64,
    /// `[lng_sw, lat_sw, lng_ne, lat_ne]`, absent without data.
    #[serde(default)]
    bbox: Option<[f64; 4]>,
    #[serde(default)]
    geometries: HashMap<String, u64>,
}

#[derive(Debug, Deserialize)]
struct StatWire {
    min: f64,
    max: f64,
}

impl From<StatWire> for AggregationStat {
    fn from(wire: StatWire) -> Self {
        AggregationStat::new(wire.min, wire.max)
    }
}

#[derive(Debug, Deserialize)]
struct ClusterWire {
    /// `[lat, lng]`
    cluster_center: [f64; 2],
    #[serde(default)]
    cluster: Option<Geometry>,
    count: u64,
    #[serde(default)]
    series: HashMap<String, Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ClusterResponseWire {
    clusters: Vec<ClusterWire>,
    count: StatWire,
    #[serde(default)]
    series: HashMap<String, StatWire>,
}

#[derive(Debug, Deserialize)]
struct JoinClusterWire {
    #[serde(default)]
    cluster: Option<Geometry>,
    #[serde(default)]
    join_key: Option<serde_json::Value>,
    #[serde(default)]
    series: HashMap<String, Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct JoinResponseWire {
    clusters: Vec<JoinClusterWire>,
    #[serde(default)]
    series: HashMap<String, StatWire>,
}

#[derive(Debug, Deserialize)]
struct RecordWire {
    #[serde(default)]
    recordid: Option<String>,
    #[serde(default)]
    fields: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct PreviewWire {
    geometry: Geometry,
    #[serde(default)]
    geo_digest: String,
}

fn geometry_kind(name: &str) -> Option<GeometryKind> {
    match name {
        "Point" => Some(GeometryKind::Point),
        "MultiPoint" => Some(GeometryKind::MultiPoint),
        "LineString" => Some(GeometryKind::LineString),
        "MultiLineString" => Some(GeometryKind::MultiLineString),
        "Polygon" => Some(GeometryKind::Polygon),
        "MultiPolygon" => Some(GeometryKind::MultiPolygon),
        _ => None,
    }
}

fn map_bounding_box(wire: BoundingBoxWire) -> VolumeProbe {
    let bbox = wire
        .bbox
        .map(|[min_x, min_y, max_x, max_y]| BoundingBox::new(min_x, min_y, max_x, max_y));

    let mut geometries = HashMap::new();
    for (name, n) in wire.geometries {
        if let Some(kind) = geometry_kind(&name) {
            *geometries.entry(kind).or_insert(0) += n;
        }
    }

    VolumeProbe {
        count: wire.count,
        bbox,
        geometries,
    }
}

fn map_cluster(wire: ClusterWire) -> ClusterRecord {
    ClusterRecord {
        center: LatLng::new(wire.cluster_center[0], wire.cluster_center[1]),
        geometry: wire.cluster,
        count: wire.count,
        value: wire.series.get("serie1").copied().flatten(),
    }
}

fn map_cluster_response(mut wire: ClusterResponseWire) -> ClusterResponse {
    let series = wire.series.remove("serie1").map(AggregationStat::from);
    ClusterResponse {
        clusters: wire.clusters.into_iter().map(map_cluster).collect(),
        count: wire.count.into(),
        series,
    }
}

fn join_key_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn map_join_response(mut wire: JoinResponseWire) -> JoinResponse {
    let results: Vec<JoinResult> = wire
        .clusters
        .into_iter()
        .filter_map(|c| {
            let geometry = c.cluster?;
            Some(JoinResult {
                key: c.join_key.and_then(join_key_text).unwrap_or_default(),
                geometry,
                value: c.series.get("serie1").copied().flatten(),
            })
        })
        .collect();

    // Fills color the per-shape aggregates, so their range wins over the
    // raw value spread of the MIN/MAX series
    let raw_spread = match (wire.series.remove("min"), wire.series.remove("max")) {
        (Some(min), Some(max)) => Some(AggregationStat::new(min.min, max.max)),
        _ => None,
    };
    let aggregations = wire
        .series
        .remove("serie1")
        .map(AggregationStat::from)
        .or_else(|| AggregationStat::from_values(results.iter().filter_map(|r| r.value)))
        .or(raw_spread)
        .unwrap_or(AggregationStat::new(0.0, 0.0));

    JoinResponse {
        results,
        aggregations,
    }
}

/// Centroid field values come as `[lat, lng]` or `{"lat":..,"lon":..}`.
fn parse_centroid(value: &serde_json::Value) -> Option<LatLng> {
    match value {
        serde_json::Value::Array(items) if items.len() == 2 => {
            Some(LatLng::new(items[0].as_f64()?, items[1].as_f64()?))
        }
        serde_json::Value::Object(map) => {
            let lat = map.get("lat")?.as_f64()?;
            let lng = map.get("lon").or_else(|| map.get("lng"))?.as_f64()?;
            Some(LatLng::new(lat, lng))
        }
        _ => None,
    }
}

fn map_record(source: &FilteredSource, wire: RecordWire) -> Record {
    let geometry = source
        .shape_field()
        .and_then(|f| wire.fields.get(&f.name))
        .and_then(|v| serde_json::from_value::<Geometry>(v.clone()).ok());

    let centroid = source
        .point_field()
        .and_then(|f| wire.fields.get(&f.name))
        .and_then(parse_centroid)
        .or_else(|| wire.geometry.as_ref().and_then(Geometry::as_point));

    Record {
        record_id: wire.recordid,
        fields: wire.fields,
        geometry,
        centroid,
    }
}

#[async_trait]
impl SearchService for HttpSearchService {
    #[instrument(skip_all, fields(dataset = %source.dataset))]
    async fn bounding_box(
        &self,
        source: &FilteredSource,
        query: &QueryContext,
    ) -> Result<VolumeProbe> {
        let wire: BoundingBoxWire = self
            .get(source, "boundingbox", &base_params(source, query))
            .await?;
        Ok(map_bounding_box(wire))
    }

    #[instrument(skip_all, fields(dataset = %source.dataset))]
    async fn cluster_query(
        &self,
        source: &FilteredSource,
        query: &QueryContext,
        params: &ClusterParams,
    ) -> Result<ClusterResponse> {
        let wire: ClusterResponseWire = self
            .get(source, "geocluster", &cluster_params(source, query, params))
            .await?;
        Ok(map_cluster_response(wire))
    }

    #[instrument(skip_all, fields(dataset = %source.dataset))]
    async fn heatmap_query(
        &self,
        source: &FilteredSource,
        query: &QueryContext,
        params: &ClusterParams,
    ) -> Result<HeatmapResponse> {
        let mut request = cluster_params(source, query, params);
        request.push(("clustermode".to_string(), "heatmap".to_string()));

        let wire: ClusterResponseWire = self.get(source, "geocluster", &request).await?;
        Ok(HeatmapResponse {
            clusters: wire.clusters.into_iter().map(map_cluster).collect(),
        })
    }

    #[instrument(skip_all, fields(dataset = %source.dataset, remote = %params.remote.dataset))]
    async fn join_aggregate_query(
        &self,
        source: &FilteredSource,
        query: &QueryContext,
        params: &JoinParams,
    ) -> Result<JoinResponse> {
        let wire: JoinResponseWire = self
            .get(source, "geocluster", &join_params(source, query, params))
            .await?;
        Ok(map_join_response(wire))
    }

    #[instrument(skip_all, fields(dataset = %source.dataset, row_cap = row_cap))]
    async fn raw_download(
        &self,
        source: &FilteredSource,
        query: &QueryContext,
        row_cap: usize,
    ) -> Result<Vec<Record>> {
        let mut params = rows_params(source, query, row_cap);
        params.push(("format".to_string(), "json".to_string()));

        let wire: Vec<RecordWire> = self.get(source, "download", &params).await?;
        Ok(wire
            .into_iter()
            .take(row_cap)
            .map(|r| map_record(source, r))
            .collect())
    }

    #[instrument(skip_all, fields(dataset = %source.dataset, row_cap = row_cap))]
    async fn shape_preview(
        &self,
        source: &FilteredSource,
        query: &QueryContext,
        row_cap: usize,
    ) -> Result<Vec<ShapePreviewItem>> {
        let wire: Vec<PreviewWire> = self
            .get(source, "geopreview", &rows_params(source, query, row_cap))
            .await?;
        Ok(wire
            .into_iter()
            .take(row_cap)
            .map(|p| ShapePreviewItem {
                geometry: p.geometry,
                digest: p.geo_digest,
            })
            .collect())
    }
}
