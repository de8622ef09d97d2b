//! In-memory collaborators for layer-engine integration tests.
//!
//! - `MockSearchService`: canned responses per dataset, call log, optional
//!   gates that hold a call until released
//! - `RecordingCanvas`: keeps attached visuals and an add/remove log

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use geo_common::{BoundingBox, Geometry, GeometryKind, LatLng};
use layer_engine::{
    AggregationStat, ClusterParams, ClusterRecord, ClusterResponse, EngineError, FilteredSource,
    HeatmapResponse, JoinParams, JoinResponse, MapCanvas, QueryContext, Record, RenderResult,
    SearchService, ShapePreviewItem, Viewport, VisualHandle, VolumeProbe,
};
use test_utils::fixtures::{bbox, datasets, zoom};
use tokio::sync::Notify;

// ============================================================================
// Fixtures
// ============================================================================

pub fn bounds(b: (f64, f64, f64, f64)) -> BoundingBox {
    BoundingBox::new(b.0, b.1, b.2, b.3)
}

pub fn viewport(level: u8) -> Viewport {
    Viewport::from_bounds(bounds(bbox::PARIS), level, zoom::MAX)
}

pub fn source(dataset: &str) -> FilteredSource {
    FilteredSource::new(datasets::DOMAIN, dataset)
}

pub fn point_record(id: &str, lat: f64, lng: f64) -> Record {
    Record {
        record_id: Some(id.to_string()),
        fields: serde_json::Map::new(),
        geometry: None,
        centroid: Some(LatLng::new(lat, lng)),
    }
}

pub fn probe(count: u64, point_share: f64) -> VolumeProbe {
    let points = (count as f64 * point_share).round() as u64;
    let mut geometries = HashMap::new();
    geometries.insert(GeometryKind::Point, points);
    geometries.insert(GeometryKind::Polygon, count - points);
    VolumeProbe {
        count,
        bbox: Some(bounds(bbox::PARIS)),
        geometries,
    }
}

pub fn cluster(lat: f64, lng: f64, count: u64, value: Option<f64>) -> ClusterRecord {
    ClusterRecord {
        center: LatLng::new(lat, lng),
        geometry: None,
        count,
        value,
    }
}

// ============================================================================
// Search service
// ============================================================================

/// One recorded backend call.
#[derive(Debug, Clone)]
pub struct Call {
    pub op: &'static str,
    pub dataset: String,
    pub query: QueryContext,
    pub cluster: Option<ClusterParams>,
    pub join: Option<JoinParams>,
    pub row_cap: Option<usize>,
}

#[derive(Default)]
pub struct MockSearchService {
    pub probes: Mutex<HashMap<String, VolumeProbe>>,
    pub clusters: Mutex<Option<ClusterResponse>>,
    pub heat: Mutex<Vec<ClusterRecord>>,
    pub join: Mutex<Option<JoinResponse>>,
    pub records: Mutex<Vec<Record>>,
    pub previews: Mutex<Vec<ShapePreviewItem>>,
    /// Datasets whose calls fail.
    pub failing: Mutex<HashSet<String>>,
    /// Raw downloads return one record at the queried viewport's center.
    pub echo_viewport: AtomicBool,
    /// Each gated call takes the next gate and waits for it.
    gates: Mutex<VecDeque<Arc<Notify>>>,
    pub calls: Mutex<Vec<Call>>,
}

impl MockSearchService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_probe(&self, dataset: &str, probe: VolumeProbe) {
        self.probes.lock().unwrap().insert(dataset.to_string(), probe);
    }

    pub fn set_clusters(&self, clusters: Vec<ClusterRecord>) {
        let counts = AggregationStat::from_values(clusters.iter().map(|c| c.count as f64))
            .unwrap_or(AggregationStat::new(0.0, 0.0));
        let series = AggregationStat::from_values(clusters.iter().filter_map(|c| c.value));
        *self.clusters.lock().unwrap() = Some(ClusterResponse {
            clusters,
            count: counts,
            series,
        });
    }

    pub fn set_join(&self, response: JoinResponse) {
        *self.join.lock().unwrap() = Some(response);
    }

    pub fn set_records(&self, records: Vec<Record>) {
        *self.records.lock().unwrap() = records;
    }

    pub fn fail(&self, dataset: &str) {
        self.failing.lock().unwrap().insert(dataset.to_string());
    }

    pub fn heal(&self, dataset: &str) {
        self.failing.lock().unwrap().remove(dataset);
    }

    /// Hold the next backend call until the returned gate is notified.
    pub fn gate_next(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().push_back(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, op: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.op == op).collect()
    }

    /// Yield until `n` calls were recorded.
    pub async fn wait_for_calls(&self, n: usize) {
        for _ in 0..1000 {
            if self.calls.lock().unwrap().len() >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {} backend calls", n);
    }

    async fn enter(&self, call: Call) -> Result<(), EngineError> {
        let dataset = call.dataset.clone();
        self.calls.lock().unwrap().push(call);

        let gate = self.gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.failing.lock().unwrap().contains(&dataset) {
            return Err(EngineError::BackendStatus {
                status: 503,
                message: format!("{} unavailable", dataset),
            });
        }
        Ok(())
    }

    fn call(op: &'static str, source: &FilteredSource, query: &QueryContext) -> Call {
        Call {
            op,
            dataset: source.dataset.clone(),
            query: query.clone(),
            cluster: None,
            join: None,
            row_cap: None,
        }
    }
}

#[async_trait]
impl SearchService for MockSearchService {
    async fn bounding_box(
        &self,
        source: &FilteredSource,
        query: &QueryContext,
    ) -> layer_engine::Result<VolumeProbe> {
        self.enter(Self::call("bounding_box", source, query)).await?;
        Ok(self
            .probes
            .lock()
            .unwrap()
            .get(&source.dataset)
            .cloned()
            .unwrap_or_default())
    }

    async fn cluster_query(
        &self,
        source: &FilteredSource,
        query: &QueryContext,
        params: &ClusterParams,
    ) -> layer_engine::Result<ClusterResponse> {
        let mut call = Self::call("cluster_query", source, query);
        call.cluster = Some(params.clone());
        self.enter(call).await?;
        Ok(self.clusters.lock().unwrap().clone().unwrap_or(ClusterResponse {
            clusters: Vec::new(),
            count: AggregationStat::new(0.0, 0.0),
            series: None,
        }))
    }

    async fn heatmap_query(
        &self,
        source: &FilteredSource,
        query: &QueryContext,
        params: &ClusterParams,
    ) -> layer_engine::Result<HeatmapResponse> {
        let mut call = Self::call("heatmap_query", source, query);
        call.cluster = Some(params.clone());
        self.enter(call).await?;
        Ok(HeatmapResponse {
            clusters: self.heat.lock().unwrap().clone(),
        })
    }

    async fn join_aggregate_query(
        &self,
        source: &FilteredSource,
        query: &QueryContext,
        params: &JoinParams,
    ) -> layer_engine::Result<JoinResponse> {
        let mut call = Self::call("join_aggregate_query", source, query);
        call.join = Some(params.clone());
        self.enter(call).await?;
        Ok(self.join.lock().unwrap().clone().unwrap_or(JoinResponse {
            results: Vec::new(),
            aggregations: AggregationStat::new(0.0, 0.0),
        }))
    }

    async fn raw_download(
        &self,
        source: &FilteredSource,
        query: &QueryContext,
        row_cap: usize,
    ) -> layer_engine::Result<Vec<Record>> {
        let mut call = Self::call("raw_download", source, query);
        call.row_cap = Some(row_cap);
        self.enter(call).await?;

        if self.echo_viewport.load(Ordering::SeqCst) {
            let center = query
                .viewport
                .map(|v| v.center())
                .unwrap_or(LatLng::new(0.0, 0.0));
            return Ok(vec![point_record("echo", center.lat, center.lng)]);
        }

        let records = self.records.lock().unwrap();
        Ok(records.iter().take(row_cap).cloned().collect())
    }

    async fn shape_preview(
        &self,
        source: &FilteredSource,
        query: &QueryContext,
        row_cap: usize,
    ) -> layer_engine::Result<Vec<ShapePreviewItem>> {
        let mut call = Self::call("shape_preview", source, query);
        call.row_cap = Some(row_cap);
        self.enter(call).await?;
        let previews = self.previews.lock().unwrap();
        Ok(previews.iter().take(row_cap).cloned().collect())
    }
}

// ============================================================================
// Canvas
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasOp {
    Added(VisualHandle),
    Removed(VisualHandle),
}

pub struct RecordingCanvas {
    next: AtomicU64,
    pub attached: Mutex<BTreeMap<u64, RenderResult>>,
    pub log: Mutex<Vec<CanvasOp>>,
    pub current: Mutex<Viewport>,
    pub fitted: Mutex<Vec<BoundingBox>>,
}

impl RecordingCanvas {
    pub fn new(viewport: Viewport) -> Arc<Self> {
        Arc::new(Self {
            next: AtomicU64::new(1),
            attached: Mutex::new(BTreeMap::new()),
            log: Mutex::new(Vec::new()),
            current: Mutex::new(viewport),
            fitted: Mutex::new(Vec::new()),
        })
    }

    pub fn attached_count(&self) -> usize {
        self.attached.lock().unwrap().len()
    }

    pub fn visual(&self, handle: VisualHandle) -> Option<RenderResult> {
        self.attached.lock().unwrap().get(&handle.0).cloned()
    }

    pub fn only_visual(&self) -> RenderResult {
        let attached = self.attached.lock().unwrap();
        assert_eq!(attached.len(), 1, "expected exactly one attached visual");
        attached.values().next().cloned().unwrap()
    }

    pub fn ops(&self) -> Vec<CanvasOp> {
        self.log.lock().unwrap().clone()
    }
}

impl MapCanvas for RecordingCanvas {
    fn add_layer(&self, visual: RenderResult) -> VisualHandle {
        let handle = VisualHandle(self.next.fetch_add(1, Ordering::SeqCst));
        self.attached.lock().unwrap().insert(handle.0, visual);
        self.log.lock().unwrap().push(CanvasOp::Added(handle));
        handle
    }

    fn remove_layer(&self, handle: VisualHandle) {
        self.attached.lock().unwrap().remove(&handle.0);
        self.log.lock().unwrap().push(CanvasOp::Removed(handle));
    }

    fn viewport(&self) -> Viewport {
        *self.current.lock().unwrap()
    }

    fn fit_bounds(&self, bounds: BoundingBox) {
        self.fitted.lock().unwrap().push(bounds);
    }
}

/// A square polygon shape around a point.
pub fn square(lat: f64, lng: f64, half: f64) -> Geometry {
    Geometry::polygon(test_utils::square_ring(lat, lng, half))
}
