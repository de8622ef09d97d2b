//! Value to color mapping for layers and legends.
//!
//! Each layer owns one [`ColorResolver`]. Its cache is private to that
//! instance and is dropped with it when the layer's configuration changes.

mod scales;

pub use scales::{Gradient, DEFAULT_SCALE};

use std::collections::HashMap;
use std::sync::Mutex;

use geo_common::Color;
use tracing::warn;

use crate::layer::ColorSpec;
use crate::service::{AggregationStat, Record};

/// Fallback for range specs without any color.
const NO_COLOR: Color = Color::rgb(128, 128, 128);

/// Round-robin colors for layers configured without one.
const PALETTE: &[Color] = &[
    Color::rgb(31, 119, 180),
    Color::rgb(255, 127, 14),
    Color::rgb(44, 160, 44),
    Color::rgb(214, 39, 40),
    Color::rgb(148, 103, 189),
    Color::rgb(140, 86, 75),
    Color::rgb(227, 119, 194),
    Color::rgb(127, 127, 127),
    Color::rgb(188, 189, 34),
    Color::rgb(23, 190, 207),
];

/// Round-robin palette. One per coordinator.
#[derive(Debug, Default)]
pub struct Palette {
    next: usize,
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next color, wrapping around.
    pub fn next_color(&mut self) -> Color {
        let color = PALETTE[self.next % PALETTE.len()];
        self.next = (self.next + 1) % PALETTE.len();
        color
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}

/// Resolved form of a [`ColorSpec`].
#[derive(Debug, Clone)]
enum Mapping {
    Fixed(Color),
    Scale(Gradient),
    Range {
        /// Ascending thresholds, each with its color.
        steps: Vec<(f64, Color)>,
        /// Color above every threshold.
        overflow: Color,
        source_field: Option<String>,
    },
}

/// Cache key: bit patterns of the value and the domain.
type CacheKey = (u64, u64, u64);

/// Maps values and records to colors for one layer.
#[derive(Debug)]
pub struct ColorResolver {
    mapping: Mapping,
    steps: usize,
    cache: Mutex<HashMap<CacheKey, Color>>,
}

impl ColorResolver {
    /// Build a resolver; `steps` bounds the quantization of continuous scales.
    pub fn new(spec: &ColorSpec, steps: usize) -> Self {
        let mapping = match spec {
            ColorSpec::Fixed { color } => Mapping::Fixed(*color),
            ColorSpec::Scale { name } => Mapping::Scale(Gradient::named(name).unwrap_or_else(|| {
                warn!(scale = %name, fallback = DEFAULT_SCALE, "Unknown color scale");
                Gradient::default_scale()
            })),
            ColorSpec::Range {
                thresholds,
                colors,
                source_field,
            } => range_mapping(thresholds, colors, source_field.clone()),
        };

        Self {
            mapping,
            steps: steps.clamp(2, 10),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Drop cached colors at the start of a render cycle.
    pub fn begin_cycle(&self) {
        self.cache_guard().clear();
    }

    /// Number of cached entries.
    pub fn cached(&self) -> usize {
        self.cache_guard().len()
    }

    fn cache_guard(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, Color>> {
        // Cache contents stay valid even if a holder panicked
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Color of a value within an optional domain.
    pub fn resolve(&self, value: f64, domain: Option<AggregationStat>) -> Color {
        match &self.mapping {
            Mapping::Fixed(color) => *color,
            _ => {
                let key = cache_key(value, domain);
                if let Some(color) = self.cache_guard().get(&key) {
                    return *color;
                }
                let color = self.compute(value, domain);
                self.cache_guard().insert(key, color);
                color
            }
        }
    }

    fn compute(&self, value: f64, domain: Option<AggregationStat>) -> Color {
        match &self.mapping {
            Mapping::Fixed(color) => *color,
            Mapping::Scale(gradient) => {
                let step = self.scale_step(value, domain);
                gradient.at(step as f64 / (self.steps - 1) as f64)
            }
            Mapping::Range {
                steps, overflow, ..
            } => {
                let index = self.range_index(value);
                steps.get(index).map(|(_, c)| *c).unwrap_or(*overflow)
            }
        }
    }

    /// Color of a record, when the spec colors records individually.
    ///
    /// Only range specs with a source field do; the record's field value is
    /// resolved like any other value. Records lacking the value fall back to
    /// [`base_color`](Self::base_color).
    pub fn resolve_record(&self, record: &Record, domain: Option<AggregationStat>) -> Color {
        match &self.mapping {
            Mapping::Range {
                source_field: Some(field),
                ..
            } => match record.number(field) {
                Some(value) => self.resolve(value, domain),
                None => self.base_color(),
            },
            _ => self.base_color(),
        }
    }

    /// Single color representing the layer where no value is available.
    pub fn base_color(&self) -> Color {
        match &self.mapping {
            Mapping::Fixed(color) => *color,
            Mapping::Scale(gradient) => gradient.last(),
            Mapping::Range { overflow, .. } => *overflow,
        }
    }

    /// Quantized position of a value on the scale, in `0..steps`.
    ///
    /// Without a usable domain the top step is used.
    pub fn scale_step(&self, value: f64, domain: Option<AggregationStat>) -> usize {
        let t = match domain {
            Some(stat) if stat.span() > 0.0 && value.is_finite() => {
                ((value - stat.min) / stat.span()).clamp(0.0, 1.0)
            }
            _ => 1.0,
        };
        (t * (self.steps - 1) as f64).round() as usize
    }

    /// Index of the first threshold strictly greater than `value`, or the
    /// threshold count when none is.
    pub fn range_index(&self, value: f64) -> usize {
        match &self.mapping {
            Mapping::Range { steps, .. } => steps
                .iter()
                .position(|(threshold, _)| *threshold > value)
                .unwrap_or(steps.len()),
            _ => 0,
        }
    }
}

fn cache_key(value: f64, domain: Option<AggregationStat>) -> CacheKey {
    let (min, max) = domain.map(|d| (d.min, d.max)).unwrap_or((f64::NAN, f64::NAN));
    (value.to_bits(), min.to_bits(), max.to_bits())
}

fn range_mapping(thresholds: &[f64], colors: &[Color], source_field: Option<String>) -> Mapping {
    let Some(last) = colors.last().copied() else {
        warn!("Range color spec without colors");
        return Mapping::Fixed(NO_COLOR);
    };

    // Pair before sorting so each threshold keeps its configured color
    let mut steps: Vec<(f64, Color)> = thresholds
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_finite())
        .map(|(i, t)| (*t, colors[i.min(colors.len() - 1)]))
        .collect();
    steps.sort_by(|a, b| a.0.total_cmp(&b.0));

    Mapping::Range {
        steps,
        overflow: last,
        source_field,
    }
}
