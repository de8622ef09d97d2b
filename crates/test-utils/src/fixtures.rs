//! Common test fixtures for map layer tests.
//!
//! Bounding boxes are `(min_x, min_y, max_x, max_y)` tuples, i.e.
//! `(west, south, east, north)` in degrees, so they can be fed to any
//! bounding box constructor without pulling engine types into this crate.

/// Common bounding box definitions for testing.
pub mod bbox {
    /// Global bounding box (-180 to 180, -90 to 90)
    pub const GLOBAL: (f64, f64, f64, f64) = (-180.0, -90.0, 180.0, 90.0);

    /// Rectangle shown when no source has any data: `[[-60,-180],[80,180]]`
    pub const WORLD_FALLBACK: (f64, f64, f64, f64) = (-180.0, -60.0, 180.0, 80.0);

    /// Metropolitan France
    pub const FRANCE: (f64, f64, f64, f64) = (-5.2, 41.3, 9.6, 51.1);

    /// Paris city limits
    pub const PARIS: (f64, f64, f64, f64) = (2.224, 48.815, 2.470, 48.902);

    /// A few blocks around Notre-Dame (typical max-zoom viewport)
    pub const ILE_DE_LA_CITE: (f64, f64, f64, f64) = (2.340, 48.850, 2.356, 48.858);

    /// Single point (degenerate bbox)
    pub const POINT: (f64, f64, f64, f64) = (2.35, 48.85, 2.35, 48.85);
}

/// Zoom levels used by viewport fixtures.
pub mod zoom {
    /// Typical maximum zoom of a slippy map
    pub const MAX: u8 = 18;

    /// Country-level zoom
    pub const COUNTRY: u8 = 5;

    /// City-level zoom
    pub const CITY: u8 = 10;
}

/// Record volumes around the strategy thresholds.
pub mod volume {
    /// Below the raw download cap
    pub const SMALL: u64 = 50;

    /// Exactly at the raw download cap
    pub const DOWNLOAD_CAP: u64 = 200;

    /// Between the download cap and the shape preview high cap
    pub const MEDIUM: u64 = 25_000;

    /// Exactly at the shape preview and polygon cluster high caps
    pub const HIGH_CAP: u64 = 500_000;

    /// Well above every cap
    pub const HUGE: u64 = 1_000_000;
}

/// Dataset identifiers used by mock backends.
pub mod datasets {
    pub const TREES: &str = "les-arbres";
    pub const STATIONS: &str = "velib-disponibilite-en-temps-reel";
    pub const DISTRICTS: &str = "arrondissements";
    pub const DOMAIN: &str = "https://data.example.org";
}
