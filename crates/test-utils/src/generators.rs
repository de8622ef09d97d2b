//! Deterministic data generators for map layer tests.
//!
//! These generators produce predictable, verifiable point clouds and value
//! series without pulling in a random number crate.

/// Creates `n` evenly spaced values from `min` to `max` inclusive.
///
/// # Example
///
/// ```
/// use test_utils::linear_values;
///
/// let values = linear_values(5, 0.0, 100.0);
/// assert_eq!(values, vec![0.0, 25.0, 50.0, 75.0, 100.0]);
/// ```
pub fn linear_values(n: usize, min: f64, max: f64) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let step = (max - min) / (n - 1) as f64;
            (0..n).map(|i| min + step * i as f64).collect()
        }
    }
}

/// Creates `n` pseudo-random `(lat, lng)` points inside a bbox tuple.
///
/// Uses a linear congruential generator so the same seed always yields the
/// same points.
///
/// # Example
///
/// ```
/// use test_utils::{scattered_points, fixtures::bbox::PARIS};
///
/// let points = scattered_points(10, PARIS, 42);
/// assert_eq!(points.len(), 10);
/// assert_eq!(points, scattered_points(10, PARIS, 42));
/// ```
pub fn scattered_points(n: usize, bbox: (f64, f64, f64, f64), seed: u64) -> Vec<(f64, f64)> {
    let (min_x, min_y, max_x, max_y) = bbox;
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };

    (0..n)
        .map(|_| {
            let lng = min_x + next() * (max_x - min_x);
            let lat = min_y + next() * (max_y - min_y);
            (lat, lng)
        })
        .collect()
}

/// Creates a square polygon ring of `[lng, lat]` positions centered on a point.
pub fn square_ring(lat: f64, lng: f64, half_size: f64) -> Vec<[f64; 2]> {
    vec![
        [lng - half_size, lat - half_size],
        [lng + half_size, lat - half_size],
        [lng + half_size, lat + half_size],
        [lng - half_size, lat + half_size],
        [lng - half_size, lat - half_size],
    ]
}
