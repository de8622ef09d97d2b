use super::BuildContext;
use crate::error::Result;
use crate::render::{Interaction, Primitive, RenderResult, TooltipMeta};

/// Radius of point previews, in pixels.
const POINT_RADIUS: f64 = 4.0;

/// Lightweight previews in the layer's single color: points as small
/// circles, other geometries as their shape.
pub async fn build_shape_preview(ctx: &BuildContext<'_>) -> Result<RenderResult> {
    let items = ctx
        .service
        .shape_preview(&ctx.layer.source, ctx.query, ctx.config.preview_row_cap)
        .await?;

    let color = ctx.resolver.base_color();
    let primitives = items
        .into_iter()
        .map(|item| match item.geometry.as_point() {
            Some(position) => Primitive::Circle {
                position,
                radius: POINT_RADIUS,
                color,
            },
            None => Primitive::Shape {
                geometry: item.geometry,
                fill: color,
                border: ctx.layer.border_color,
                opacity: ctx.layer.opacity,
                tooltip: TooltipMeta::default(),
                interaction: Interaction::None,
            },
        })
        .collect();

    Ok(RenderResult::new(primitives))
}
