//! Strategy selection.
//!
//! Explicit strategies map straight to a [`RenderPlan`]. `auto` layers probe
//! the backend for the volume of data in view and decide from the count,
//! the point share and the zoom level.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::layer::{LayerConfig, LayerStrategy};
use crate::service::{QueryContext, SearchService};
use crate::viewport::Viewport;

/// The concrete rendering algorithm of one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "plan", rename_all = "snake_case")]
pub enum RenderPlan {
    Tiles,
    Raw,
    Clustered {
        /// Draw single-record clusters as cluster markers too.
        forced: bool,
        return_polygons: bool,
    },
    Heatmap,
    Aggregation,
    ShapePreview,
}

/// Plan of an explicit strategy, None for `auto`.
pub fn plan_for_strategy(strategy: LayerStrategy) -> Option<RenderPlan> {
    match strategy {
        LayerStrategy::Tiles => Some(RenderPlan::Tiles),
        LayerStrategy::Raw => Some(RenderPlan::Raw),
        LayerStrategy::Clustered => Some(RenderPlan::Clustered {
            forced: false,
            return_polygons: true,
        }),
        LayerStrategy::ClusteredForced => Some(RenderPlan::Clustered {
            forced: true,
            return_polygons: true,
        }),
        LayerStrategy::Heatmap => Some(RenderPlan::Heatmap),
        LayerStrategy::Aggregation => Some(RenderPlan::Aggregation),
        LayerStrategy::ShapePreview => Some(RenderPlan::ShapePreview),
        LayerStrategy::Auto => None,
    }
}

/// Decision table of `auto` layers.
pub fn decide_auto(
    count: u64,
    point_share: f64,
    zoom: u8,
    max_zoom: u8,
    config: &EngineConfig,
) -> RenderPlan {
    let mostly_points = point_share > 0.5;
    let return_polygons = count <= config.polygon_cluster_high_cap;

    if mostly_points && (count < config.download_cap || zoom >= max_zoom) {
        return RenderPlan::Raw;
    }

    if count < config.shape_preview_high_cap {
        if mostly_points {
            return RenderPlan::Clustered {
                forced: false,
                return_polygons,
            };
        }
        return RenderPlan::ShapePreview;
    }

    RenderPlan::Clustered {
        forced: false,
        return_polygons,
    }
}

/// Select the plan of one render, probing the backend for `auto` layers.
#[instrument(skip_all, fields(layer = %layer.id, strategy = ?layer.strategy))]
pub async fn select_plan(
    service: &dyn SearchService,
    layer: &LayerConfig,
    viewport: &Viewport,
    query: &QueryContext,
    config: &EngineConfig,
) -> Result<RenderPlan> {
    if let Some(plan) = plan_for_strategy(layer.strategy) {
        return Ok(plan);
    }

    let probe = service.bounding_box(&layer.source, query).await?;
    let point_share = probe.point_share();
    let plan = decide_auto(
        probe.count,
        point_share,
        viewport.zoom,
        viewport.max_zoom,
        config,
    );

    debug!(
        count = probe.count,
        point_share,
        zoom = viewport.zoom,
        plan = ?plan,
        "Selected plan from volume probe"
    );

    Ok(plan)
}
