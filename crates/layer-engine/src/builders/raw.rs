use geo_common::Geometry;
use tracing::debug;

use super::BuildContext;
use crate::error::Result;
use crate::render::{Interaction, Primitive, RecordFilter, RenderResult};
use crate::service::Record;

/// Geometry to draw for a record: its shape, else its centroid when the
/// source declares no shape field.
fn record_geometry(record: &Record, has_shape_field: bool) -> Option<Geometry> {
    if has_shape_field {
        return record.geometry.clone();
    }
    record
        .geometry
        .clone()
        .or_else(|| record.centroid.map(|c| Geometry::point(c.lat, c.lng)))
}

/// One marker or shape per downloaded record.
pub async fn build_raw(ctx: &BuildContext<'_>) -> Result<RenderResult> {
    let records = ctx
        .service
        .raw_download(&ctx.layer.source, ctx.query, ctx.config.raw_row_cap)
        .await?;

    let layer = ctx.layer;
    let has_shape_field = layer.source.shape_field().is_some();
    let mut skipped = 0usize;
    let mut primitives = Vec::with_capacity(records.len());

    for record in &records {
        let Some(geometry) = record_geometry(record, has_shape_field) else {
            skipped += 1;
            continue;
        };

        let color = ctx.resolver.resolve_record(record, None);
        let hover_value = layer.hover_field.as_deref().and_then(|f| record.text(f));
        let tooltip = ctx.tooltip(record.record_id.clone(), hover_value);
        let interaction = match &record.record_id {
            Some(id) => Interaction::OpenDetail {
                filter: RecordFilter::RecordId { id: id.clone() },
                sort: layer.tooltip_sort.clone(),
            },
            None => Interaction::None,
        };

        let primitive = match geometry.as_point() {
            Some(position) => Primitive::Marker {
                position,
                color,
                picto: layer.picto.clone(),
                tooltip,
                interaction,
            },
            None => Primitive::Shape {
                geometry,
                fill: color,
                border: layer.border_color,
                opacity: layer.opacity,
                tooltip,
                interaction,
            },
        };
        primitives.push(primitive);
    }

    if skipped > 0 {
        debug!(layer = %layer.id, skipped, "Skipped records without geometry");
    }

    Ok(RenderResult::new(primitives))
}
