//! Named continuous color gradients.

use geo_common::Color;

/// Gradient used when a scale name is unknown.
pub const DEFAULT_SCALE: &str = "YlOrRd";

const YL_OR_RD: &[Color] = &[
    Color::rgb(255, 255, 204),
    Color::rgb(254, 217, 118),
    Color::rgb(253, 141, 60),
    Color::rgb(227, 26, 28),
    Color::rgb(128, 0, 38),
];

const BLUES: &[Color] = &[
    Color::rgb(247, 251, 255),
    Color::rgb(198, 219, 239),
    Color::rgb(107, 174, 214),
    Color::rgb(33, 113, 181),
    Color::rgb(8, 48, 107),
];

const GREENS: &[Color] = &[
    Color::rgb(247, 252, 245),
    Color::rgb(199, 233, 192),
    Color::rgb(116, 196, 118),
    Color::rgb(35, 139, 69),
    Color::rgb(0, 68, 27),
];

const REDS: &[Color] = &[
    Color::rgb(255, 245, 240),
    Color::rgb(252, 187, 161),
    Color::rgb(251, 106, 74),
    Color::rgb(203, 24, 29),
    Color::rgb(103, 0, 13),
];

const VIRIDIS: &[Color] = &[
    Color::rgb(68, 1, 84),
    Color::rgb(59, 82, 139),
    Color::rgb(33, 145, 140),
    Color::rgb(94, 201, 98),
    Color::rgb(253, 231, 37),
];

const RD_YL_GN: &[Color] = &[
    Color::rgb(215, 48, 39),
    Color::rgb(252, 141, 89),
    Color::rgb(255, 255, 191),
    Color::rgb(145, 207, 96),
    Color::rgb(26, 152, 80),
];

/// Evenly spaced color stops, interpolated linearly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient {
    stops: &'static [Color],
}

impl Gradient {
    /// Look up a gradient by name, case-insensitively.
    pub fn named(name: &str) -> Option<Gradient> {
        let stops = match name.to_ascii_lowercase().as_str() {
            "ylorrd" => YL_OR_RD,
            "blues" => BLUES,
            "greens" => GREENS,
            "reds" => REDS,
            "viridis" => VIRIDIS,
            "rdylgn" => RD_YL_GN,
            _ => return None,
        };
        Some(Gradient { stops })
    }

    pub fn default_scale() -> Gradient {
        Gradient { stops: YL_OR_RD }
    }

    /// Color at position `t` in [0, 1].
    pub fn at(&self, t: f64) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let segments = self.stops.len() - 1;
        let scaled = t * segments as f64;
        let index = (scaled.floor() as usize).min(segments - 1);
        self.stops[index].lerp(&self.stops[index + 1], scaled - index as f64)
    }

    pub fn first(&self) -> Color {
        self.stops[0]
    }

    pub fn last(&self) -> Color {
        self.stops[self.stops.len() - 1]
    }
}
