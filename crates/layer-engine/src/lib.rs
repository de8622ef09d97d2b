//! Adaptive rendering engine for server-backed map layers.
//!
//! For every layer and every viewport change the engine decides how to show
//! a potentially huge dataset held by a search backend (raw records,
//! clusters, heatmap, aggregated shapes, shape previews or tiles), builds the
//! visual asynchronously and swaps it onto the map canvas. A newer render of
//! a layer cancels the older one, so only the latest result ever lands.

pub mod bounds;
pub mod builders;
pub mod canvas;
pub mod color;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod layer;
pub mod legend;
pub mod render;
pub mod service;
pub mod strategy;
pub mod viewport;

pub use bounds::{decode_location, encode_location, retrieve_bounds, MapLocation};
pub use canvas::{MapCanvas, MapEvent, VisualHandle};
pub use color::{ColorResolver, Palette};
pub use config::EngineConfig;
pub use coordinator::{LayerState, RenderCoordinator, RenderOutcome, RenderSummary};
pub use error::{EngineError, Result};
pub use layer::{
    AggregationFunction, AggregationRequest, ColorSpec, FieldSchema, FieldType, FilteredSource,
    JoinSource, LayerConfig, LayerId, LayerStrategy,
};
pub use legend::build_legend;
pub use render::{
    HeatSample, Interaction, LegendSpec, LegendSwatch, Primitive, RecordFilter, RenderResult,
    TooltipMeta,
};
pub use service::{
    AggregationStat, ClusterParams, ClusterRecord, ClusterResponse, HeatmapResponse,
    HttpSearchService, JoinParams, JoinResponse, JoinResult, QueryContext, Record, SearchService,
    ShapePreviewItem, VolumeProbe,
};
pub use strategy::{decide_auto, plan_for_strategy, select_plan, RenderPlan};
pub use viewport::Viewport;
