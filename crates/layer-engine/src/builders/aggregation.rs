use geo_common::Geometry;
use tracing::{debug, error};

use super::clustered::cluster_params;
use super::BuildContext;
use crate::error::{EngineError, Result};
use crate::layer::{AggregationRequest, JoinSource};
use crate::legend::build_legend;
use crate::render::{Interaction, Primitive, RecordFilter, RenderResult};
use crate::service::{AggregationStat, JoinParams};

/// Aggregated values drawn on shapes.
///
/// Layers with a join source aggregate onto the remote dataset's shapes;
/// others aggregate onto their own cluster polygons. A join that cannot be
/// expressed is logged and yields an empty result.
pub async fn build_aggregation(ctx: &BuildContext<'_>) -> Result<RenderResult> {
    let result = match &ctx.layer.join_source {
        Some(join) => build_join(ctx, join).await,
        None => build_local(ctx).await,
    };

    match result {
        Err(e) if e.is_configuration() => {
            error!(layer = %ctx.layer.id, error = %e, "Aggregation layer misconfigured");
            Ok(RenderResult::empty())
        }
        other => other,
    }
}

/// Validate a join source into backend parameters.
pub(crate) fn join_params(ctx: &BuildContext<'_>, join: &JoinSource) -> Result<JoinParams> {
    let local_key = join
        .local_key
        .clone()
        .ok_or_else(|| EngineError::configuration("join source without local key"))?;
    let remote_key = join
        .remote_key
        .clone()
        .ok_or_else(|| EngineError::configuration("join source without remote key"))?;
    let shape_field = join.source.shape_field().ok_or_else(|| {
        EngineError::configuration(format!(
            "remote dataset '{}' has no shape field",
            join.source.dataset
        ))
    })?;

    Ok(JoinParams {
        remote: join.source.clone(),
        remote_shape_field: shape_field.name.clone(),
        local_key,
        remote_key,
        aggregation: AggregationRequest {
            function: ctx.layer.aggregation_function,
            expression: ctx.layer.aggregation_expression.clone(),
        },
    })
}

async fn build_join(ctx: &BuildContext<'_>, join: &JoinSource) -> Result<RenderResult> {
    let params = join_params(ctx, join)?;
    let response = ctx
        .service
        .join_aggregate_query(&ctx.layer.source, ctx.query, &params)
        .await?;

    let stat = response.aggregations;
    let filter_field = ctx
        .layer
        .hover_field
        .clone()
        .unwrap_or_else(|| params.local_key.clone());

    let primitives: Vec<Primitive> = response
        .results
        .into_iter()
        .filter_map(|result| {
            let value = result.value?;
            let filter = RecordFilter::FieldValue {
                field: filter_field.clone(),
                value: result.key.clone(),
            };
            Some(shape(ctx, result.geometry, value, stat, filter, Some(result.key)))
        })
        .collect();

    debug!(layer = %ctx.layer.id, shapes = primitives.len(), "Built join aggregation");
    Ok(with_legend(ctx, primitives, stat))
}

async fn build_local(ctx: &BuildContext<'_>) -> Result<RenderResult> {
    let params = cluster_params(ctx, true);
    let response = ctx
        .service
        .cluster_query(&ctx.layer.source, ctx.query, &params)
        .await?;

    let stat = response.value_stat();
    let primitives: Vec<Primitive> = response
        .clusters
        .into_iter()
        .filter_map(|cluster| {
            // With an aggregation requested, clusters without a value are skipped
            let value = match params.aggregation {
                Some(_) => cluster.value?,
                None => cluster.count as f64,
            };
            let geometry = cluster
                .geometry
                .unwrap_or_else(|| Geometry::point(cluster.center.lat, cluster.center.lng));
            let filter = RecordFilter::Geometry {
                geometry: geometry.clone(),
            };
            Some(shape(ctx, geometry, value, stat, filter, None))
        })
        .collect();

    debug!(layer = %ctx.layer.id, shapes = primitives.len(), "Built local aggregation");
    Ok(with_legend(ctx, primitives, stat))
}

fn shape(
    ctx: &BuildContext<'_>,
    geometry: Geometry,
    value: f64,
    stat: AggregationStat,
    filter: RecordFilter,
    key: Option<String>,
) -> Primitive {
    Primitive::Shape {
        geometry,
        fill: ctx.resolver.resolve(value, Some(stat)),
        border: ctx.layer.border_color,
        opacity: ctx.layer.opacity,
        tooltip: ctx.tooltip(None, key.or_else(|| Some(format_value(value)))),
        interaction: Interaction::Filter { filter },
    }
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

fn with_legend(ctx: &BuildContext<'_>, primitives: Vec<Primitive>, stat: AggregationStat) -> RenderResult {
    let function = ctx.layer.aggregation_function;
    let legend = if !stat.is_degenerate() || !function.is_count() {
        build_legend(stat, function, ctx.resolver, ctx.config.legend_max_grades)
    } else {
        None
    };
    RenderResult::new(primitives).with_legend(legend)
}
