use tracing::debug;

use super::BuildContext;
use crate::error::Result;
use crate::render::{Primitive, RenderResult};
use crate::service::{AggregationStat, ClusterParams, ClusterRecord};

/// Cluster query parameters of the current layer and viewport.
pub(crate) fn cluster_params(ctx: &BuildContext<'_>, return_polygons: bool) -> ClusterParams {
    ClusterParams {
        cluster_distance: ctx.config.cluster_distance,
        cluster_precision: ctx.viewport.zoom,
        return_polygons,
        aggregation: ctx.layer.aggregation(),
    }
}

/// Position of `value` within the request's range, in [0, 1].
fn relative_size(value: f64, stat: AggregationStat) -> f64 {
    if stat.span() > 0.0 {
        ((value - stat.min) / stat.span()).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

fn single_marker(ctx: &BuildContext<'_>, cluster: &ClusterRecord, stat: AggregationStat) -> Primitive {
    let position = cluster.center;
    let interaction = ctx.drill_down(position, None);

    Primitive::Marker {
        position,
        color: ctx.resolver.resolve(cluster.display_value(), Some(stat)),
        picto: ctx.layer.picto.clone(),
        tooltip: ctx.tooltip(None, None),
        interaction,
    }
}

/// Server-side clusters as markers and cluster markers.
///
/// Single-record clusters become plain markers unless `forced`. Values are
/// sized and colored against the range of this response only.
pub async fn build_clustered(
    ctx: &BuildContext<'_>,
    forced: bool,
    return_polygons: bool,
) -> Result<RenderResult> {
    let params = cluster_params(ctx, return_polygons);
    let response = ctx
        .service
        .cluster_query(&ctx.layer.source, ctx.query, &params)
        .await?;

    let stat = response.value_stat();
    let primitives: Vec<Primitive> = response
        .clusters
        .iter()
        .map(|cluster| {
            if cluster.count == 1 && !forced {
                return single_marker(ctx, cluster, stat);
            }
            let value = cluster.display_value();
            Primitive::ClusterMarker {
                position: cluster.center,
                value,
                count: cluster.count,
                relative_size: relative_size(value, stat),
                color: ctx.resolver.resolve(value, Some(stat)),
                interaction: ctx.drill_down(cluster.center, cluster.geometry.as_ref()),
            }
        })
        .collect();

    debug!(
        layer = %ctx.layer.id,
        clusters = response.clusters.len(),
        min = stat.min,
        max = stat.max,
        "Built clusters"
    );

    Ok(RenderResult::new(primitives))
}
