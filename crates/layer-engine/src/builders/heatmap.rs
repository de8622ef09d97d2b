use super::clustered::cluster_params;
use super::BuildContext;
use crate::error::Result;
use crate::render::{HeatSample, Primitive, RenderResult};

const MAX_RADIUS: f64 = 50.0;

/// Heat radius for `n` samples: fewer samples spread wider, up to 50.
pub fn heat_radius(n: usize) -> f64 {
    if n == 0 {
        return MAX_RADIUS;
    }
    (4000.0 / n as f64 + 20.0).min(MAX_RADIUS)
}

/// Weighted heat samples from a heatmap-mode cluster query.
pub async fn build_heatmap(ctx: &BuildContext<'_>) -> Result<RenderResult> {
    let params = cluster_params(ctx, false);
    let response = ctx
        .service
        .heatmap_query(&ctx.layer.source, ctx.query, &params)
        .await?;

    if response.clusters.is_empty() {
        return Ok(RenderResult::empty());
    }

    let min = response
        .clusters
        .iter()
        .map(|c| c.display_value())
        .fold(f64::INFINITY, f64::min);

    let samples: Vec<HeatSample> = response
        .clusters
        .iter()
        .map(|c| HeatSample {
            lat: c.center.lat,
            lng: c.center.lng,
            weight: c.display_value() - min + 1.0,
        })
        .collect();

    let radius = heat_radius(samples.len());
    Ok(RenderResult::new(vec![Primitive::Heatmap {
        samples,
        radius,
        color: ctx.resolver.base_color(),
    }]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heat_radius() {
        assert_eq!(heat_radius(1), 50.0);
        assert_eq!(heat_radius(200), 40.0);
        assert_eq!(heat_radius(4000), 21.0);
        assert!(heat_radius(1_000_000) > 20.0);
    }
}
