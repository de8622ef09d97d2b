//! Configuration for the layer engine.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for strategy selection, query shapes and color quantization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Below this many records (mostly points) the raw records are downloaded.
    pub download_cap: u64,

    /// Below this many records, non-point datasets get a shape preview.
    pub shape_preview_high_cap: u64,

    /// Clusters carry polygon detail up to this many records.
    pub polygon_cluster_high_cap: u64,

    /// Row cap of raw downloads.
    pub raw_row_cap: usize,

    /// Row cap of shape previews.
    pub preview_row_cap: usize,

    /// Clustering distance in pixels.
    pub cluster_distance: u32,

    /// Maximum number of legend grade boundaries.
    pub legend_max_grades: usize,

    /// Number of quantization steps of continuous color scales (2-10).
    pub scale_steps: usize,

    /// Timeout of a single backend request in seconds.
    pub request_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            download_cap: 200,
            shape_preview_high_cap: 500_000,
            polygon_cluster_high_cap: 500_000,
            raw_row_cap: 1000,
            preview_row_cap: 1000,
            cluster_distance: 50,
            legend_max_grades: 10,
            scale_steps: 10,
            request_timeout_secs: 30,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(val) = env_parse("LAYER_DOWNLOAD_CAP") {
            config.download_cap = val;
        }

        if let Some(val) = env_parse("LAYER_SHAPE_PREVIEW_HIGHCAP") {
            config.shape_preview_high_cap = val;
        }

        if let Some(val) = env_parse("LAYER_POLYGON_CLUSTER_HIGHCAP") {
            config.polygon_cluster_high_cap = val;
        }

        if let Some(val) = env_parse("LAYER_RAW_ROW_CAP") {
            config.raw_row_cap = val;
        }

        if let Some(val) = env_parse("LAYER_PREVIEW_ROW_CAP") {
            config.preview_row_cap = val;
        }

        if let Some(val) = env_parse("LAYER_CLUSTER_DISTANCE") {
            config.cluster_distance = val;
        }

        if let Some(val) = env_parse("LAYER_LEGEND_MAX_GRADES") {
            config.legend_max_grades = val;
        }

        if let Some(val) = env_parse("LAYER_SCALE_STEPS") {
            config.scale_steps = val;
        }

        if let Some(val) = env_parse("LAYER_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = val;
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.raw_row_cap == 0 || self.preview_row_cap == 0 {
            return Err("row caps must be > 0".to_string());
        }

        if self.cluster_distance == 0 {
            return Err("cluster_distance must be > 0".to_string());
        }

        if !(2..=10).contains(&self.legend_max_grades) {
            return Err("legend_max_grades must be 2-10".to_string());
        }

        if !(2..=10).contains(&self.scale_steps) {
            return Err("scale_steps must be 2-10".to_string());
        }

        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be > 0".to_string());
        }

        Ok(())
    }

    /// Backend request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.trim().parse().ok()
}
