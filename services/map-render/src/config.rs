//! Map definition loading.
//!
//! A map definition is a YAML file describing the initial view, engine
//! tunables and the layers to render.

use std::path::Path;

use anyhow::{Context, Result};
use geo_common::{decode_location, BoundingBox, LatLng, MapLocation};
use layer_engine::{EngineConfig, LayerConfig, Viewport};
use serde::Deserialize;
use tracing::{debug, info};

/// Web mercator tile size in pixels.
const TILE_SIZE: f64 = 256.0;

/// Latitude limit of web mercator maps.
const MAX_LATITUDE: f64 = 85.0511;

/// Root of a map definition file.
#[derive(Debug, Clone, Deserialize)]
pub struct MapDefinition {
    /// Initial location as `"zoom,lat,lng"`.
    #[serde(default = "default_location")]
    pub location: String,

    #[serde(default = "default_max_zoom")]
    pub max_zoom: u8,

    #[serde(default)]
    pub canvas: CanvasSize,

    /// Engine tunables; falls back to `LAYER_*` environment variables.
    #[serde(default)]
    pub engine: Option<EngineConfig>,

    #[serde(default)]
    pub layers: Vec<LayerConfig>,
}

fn default_location() -> String {
    "2,20,0".to_string()
}

fn default_max_zoom() -> u8 {
    18
}

/// Size of the rendered map in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
        }
    }
}

impl MapDefinition {
    /// Load a map definition from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read map definition: {}", path.display()))?;

        let definition: MapDefinition = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse map definition: {}", path.display()))?;

        info!(
            path = %path.display(),
            layers = definition.layers.len(),
            "Loaded map definition"
        );
        Ok(definition)
    }

    /// Engine configuration of the file, else from the environment.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let config = match &self.engine {
            Some(config) => config.clone(),
            None => {
                debug!("No engine section, reading LAYER_* environment");
                EngineConfig::from_env()
            }
        };
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid engine configuration: {}", e))?;
        Ok(config)
    }

    /// Decode the initial location, or `overridden` when given.
    pub fn start_location(&self, overridden: Option<&str>) -> Result<MapLocation> {
        let raw = overridden.unwrap_or(&self.location);
        decode_location(raw).with_context(|| format!("Invalid location '{}'", raw))
    }

    /// Pixel frame of the map.
    pub fn frame(&self) -> MapFrame {
        MapFrame {
            size: self.canvas,
            max_zoom: self.max_zoom,
        }
    }
}

/// Pixel size and zoom range of the map, for viewport arithmetic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapFrame {
    pub size: CanvasSize,
    pub max_zoom: u8,
}

impl MapFrame {
    /// Viewport of this map's canvas centered on `location`.
    pub fn viewport_at(&self, location: &MapLocation) -> Viewport {
        let zoom = location.zoom.min(self.max_zoom);
        let degrees_per_pixel = 360.0 / (TILE_SIZE * 2f64.powi(zoom as i32));
        let half_width = degrees_per_pixel * self.size.width as f64 / 2.0;
        let half_height = degrees_per_pixel
            * location.center.lat.to_radians().cos()
            * self.size.height as f64
            / 2.0;

        let LatLng { lat, lng } = location.center;
        let bounds = BoundingBox::new(
            (lng - half_width).max(-180.0),
            (lat - half_height).max(-MAX_LATITUDE),
            (lng + half_width).min(180.0),
            (lat + half_height).min(MAX_LATITUDE),
        );
        Viewport::from_bounds(bounds, zoom, self.max_zoom)
    }

    /// Deepest zoom at which `bounds` fits the canvas.
    pub fn fit_zoom(&self, bounds: &BoundingBox) -> u8 {
        let span = bounds.width().max(f64::EPSILON);
        let fitting = (360.0 * self.size.width as f64 / (TILE_SIZE * span)).log2();
        if !fitting.is_finite() || fitting <= 0.0 {
            return 0;
        }
        (fitting.floor() as u64).min(self.max_zoom as u64) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer_engine::{ColorSpec, LayerStrategy};

    const PARIS_MAP: &str = r##"
location: "12,48.8566,2.3522"
max_zoom: 18
canvas:
  width: 800
  height: 600

engine:
  download_cap: 500
  cluster_distance: 40

layers:
  - id: trees
    title: "Les arbres"
    source:
      domain: https://data.example.org
      dataset: les-arbres
      parameters:
        q: "platane"
      fields:
        - name: geo_point_2d
          type: geo_point_2d
    strategy: clustered
    color_spec:
      type: fixed
      color: "#2e7d32"

  - id: districts
    source:
      domain: https://data.example.org
      dataset: arrondissements
    strategy: aggregation
    exclude_from_refit: true
"##;

    fn paris() -> MapDefinition {
        serde_yaml::from_str(PARIS_MAP).unwrap()
    }

    #[test]
    fn test_parse_map_definition() {
        let definition = paris();
        assert_eq!(definition.canvas, CanvasSize { width: 800, height: 600 });
        assert_eq!(definition.layers.len(), 2);

        let trees = &definition.layers[0];
        assert_eq!(trees.strategy, LayerStrategy::Clustered);
        assert_eq!(trees.source.parameters.get("q").map(String::as_str), Some("platane"));
        assert!(matches!(trees.color_spec, Some(ColorSpec::Fixed { .. })));
        assert!(definition.layers[1].exclude_from_refit);
    }

    #[test]
    fn test_shipped_paris_map_parses() {
        let definition: MapDefinition =
            serde_yaml::from_str(include_str!("../../../config/paris.yaml")).unwrap();
        assert_eq!(definition.layers.len(), 3);
        assert!(definition.engine_config().is_ok());

        let join = definition.layers[2].join_source.as_ref().unwrap();
        assert_eq!(join.source.shape_field().unwrap().name, "geom");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paris.yaml");
        std::fs::write(&path, PARIS_MAP).unwrap();

        assert_eq!(MapDefinition::load(&path).unwrap().layers.len(), 2);
        assert!(MapDefinition::load(&dir.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn test_engine_section_overrides_defaults() {
        let config = paris().engine_config().unwrap();
        assert_eq!(config.download_cap, 500);
        assert_eq!(config.cluster_distance, 40);
        assert_eq!(config.raw_row_cap, 1000);
    }

    #[test]
    fn test_invalid_engine_section_is_rejected() {
        let definition: MapDefinition =
            serde_yaml::from_str("engine:\n  scale_steps: 40\n").unwrap();
        assert!(definition.engine_config().is_err());
    }

    #[test]
    fn test_minimal_definition_defaults() {
        let definition: MapDefinition = serde_yaml::from_str("layers: []").unwrap();
        assert_eq!(definition.max_zoom, 18);
        assert_eq!(definition.canvas, CanvasSize::default());
        assert_eq!(definition.start_location(None).unwrap().zoom, 2);
    }

    #[test]
    fn test_location_override() {
        let definition = paris();
        let location = definition.start_location(Some("15,48.85,2.35")).unwrap();
        assert_eq!(location.zoom, 15);
        assert!(definition.start_location(Some("nowhere")).is_err());
    }

    #[test]
    fn test_viewport_centered_on_location() {
        let definition = paris();
        let location = definition.start_location(None).unwrap();
        let viewport = definition.frame().viewport_at(&location);

        assert_eq!(viewport.zoom, 12);
        assert_eq!(viewport.max_zoom, 18);
        let center = viewport.bounds.center();
        assert!((center.lat - 48.8566).abs() < 1e-9);
        assert!((center.lng - 2.3522).abs() < 1e-9);
        // 800 px at zoom 12
        assert!((viewport.bounds.width() - 800.0 * 360.0 / (256.0 * 4096.0)).abs() < 1e-9);
    }

    #[test]
    fn test_fit_zoom() {
        let definition = paris();
        let world = BoundingBox::new(-180.0, -60.0, 180.0, 80.0);
        assert_eq!(definition.frame().fit_zoom(&world), 1);

        let city = BoundingBox::new(2.224, 48.815, 2.470, 48.902);
        let zoom = definition.frame().fit_zoom(&city);
        assert!(zoom > 10 && zoom < 14);

        let point = BoundingBox::new(2.35, 48.85, 2.35, 48.85);
        assert_eq!(definition.frame().fit_zoom(&point), 18);
    }
}
