use reqwest::Url;

use crate::error::{EngineError, Result};
use crate::layer::LayerConfig;
use crate::render::{Primitive, RenderResult};

/// Tile URL template of a source, with its filters and color form-encoded
/// as query parameters. The `{z}/{x}/{y}` placeholders stay literal.
pub fn tile_url_template(layer: &LayerConfig) -> Result<String> {
    let source = &layer.source;
    let base = format!(
        "{}/explore/dataset/{}/tiles/",
        source.domain.trim_end_matches('/'),
        source.dataset
    );

    let mut encoder = Url::parse(&base).map_err(|e| {
        EngineError::configuration(format!("Invalid tile URL '{}': {}", base, e))
    })?;
    {
        let mut pairs = encoder.query_pairs_mut();
        for (key, value) in &source.parameters {
            pairs.append_pair(key, value);
        }
        if let Some(color) = layer.fixed_color() {
            pairs.append_pair("color", &color.to_hex());
        }
    }

    let mut template = format!("{}{{z}}/{{x}}/{{y}}.png", base);
    if let Some(query) = encoder.query().filter(|q| !q.is_empty()) {
        template.push('?');
        template.push_str(query);
    }
    Ok(template)
}

/// A single tile layer primitive.
pub fn build_tiles(layer: &LayerConfig) -> Result<RenderResult> {
    Ok(RenderResult::new(vec![Primitive::TileLayer {
        url_template: tile_url_template(layer)?,
        opacity: layer.opacity,
    }]))
}
