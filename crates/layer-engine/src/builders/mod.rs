//! Render builders: one per [`RenderPlan`] variant.
//!
//! Builders query the backend and turn the response into a [`RenderResult`].
//! They never touch layer state or the canvas; the coordinator swaps the
//! result in.

mod aggregation;
mod clustered;
mod heatmap;
mod raw;
mod shape_preview;
mod tiles;

pub use aggregation::build_aggregation;
pub use clustered::build_clustered;
pub use heatmap::{build_heatmap, heat_radius};
pub use raw::build_raw;
pub use shape_preview::build_shape_preview;
pub use tiles::{build_tiles, tile_url_template};

use geo_common::{BoundingBox, Geometry, LatLng};

use crate::color::ColorResolver;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::layer::LayerConfig;
use crate::render::{Interaction, RecordFilter, RenderResult, TooltipMeta};
use crate::service::{QueryContext, SearchService};
use crate::strategy::RenderPlan;
use crate::viewport::Viewport;

/// Everything a builder needs for one render.
pub struct BuildContext<'a> {
    pub service: &'a dyn SearchService,
    pub layer: &'a LayerConfig,
    pub viewport: &'a Viewport,
    pub query: &'a QueryContext,
    pub config: &'a EngineConfig,
    pub resolver: &'a ColorResolver,
}

impl BuildContext<'_> {
    /// Click action of a group of records at `center`.
    ///
    /// At maximum zoom this opens the detail view of the group; otherwise the
    /// map zooms onto the group's extent, or onto its center two levels
    /// deeper when the extent is unknown or a single point.
    pub(crate) fn drill_down(&self, center: LatLng, geometry: Option<&Geometry>) -> Interaction {
        if self.viewport.at_max_zoom() {
            let geometry = geometry
                .cloned()
                .unwrap_or_else(|| Geometry::point(center.lat, center.lng));
            return Interaction::OpenDetail {
                filter: RecordFilter::Geometry { geometry },
                sort: self.layer.tooltip_sort.clone(),
            };
        }

        match geometry.and_then(Geometry::bounds).filter(has_area) {
            Some(bounds) => Interaction::FitBounds { bounds },
            None => Interaction::FitPoint {
                center,
                zoom: self
                    .viewport
                    .zoom
                    .saturating_add(2)
                    .min(self.viewport.max_zoom),
            },
        }
    }

    pub(crate) fn tooltip(&self, record_id: Option<String>, hover_value: Option<String>) -> TooltipMeta {
        TooltipMeta {
            record_id,
            hover_value,
            sort_field: self.layer.tooltip_sort.clone(),
        }
    }
}

fn has_area(bounds: &BoundingBox) -> bool {
    bounds.width() > 0.0 || bounds.height() > 0.0
}

/// Run the builder of `plan`.
pub async fn build(plan: RenderPlan, ctx: &BuildContext<'_>) -> Result<RenderResult> {
    match plan {
        RenderPlan::Tiles => build_tiles(ctx.layer),
        RenderPlan::Raw => build_raw(ctx).await,
        RenderPlan::Clustered {
            forced,
            return_polygons,
        } => build_clustered(ctx, forced, return_polygons).await,
        RenderPlan::Heatmap => build_heatmap(ctx).await,
        RenderPlan::Aggregation => build_aggregation(ctx).await,
        RenderPlan::ShapePreview => build_shape_preview(ctx).await,
    }
}
