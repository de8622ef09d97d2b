//! Legend grades and swatches for aggregated layers.

use crate::color::ColorResolver;
use crate::layer::AggregationFunction;
use crate::render::{LegendSpec, LegendSwatch};
use crate::service::AggregationStat;

/// `n` evenly spaced values from `min` to `max`, both included.
fn linspace(min: f64, max: f64, n: usize) -> Vec<f64> {
    let step = (max - min) / (n - 1) as f64;
    (0..n)
        .map(|i| if i == n - 1 { max } else { min + step * i as f64 })
        .collect()
}

/// Build the legend of an aggregation result.
///
/// Returns None for a COUNT aggregation whose values are all equal. Counts
/// never get more grades than there are distinct integers in the range.
pub fn build_legend(
    stat: AggregationStat,
    function: AggregationFunction,
    resolver: &ColorResolver,
    max_grades: usize,
) -> Option<LegendSpec> {
    if !stat.min.is_finite() || !stat.max.is_finite() {
        return None;
    }

    if stat.is_degenerate() {
        if function.is_count() {
            return None;
        }
        let grades = vec![stat.min, stat.max];
        let value = (grades[0] + grades[1]) / 2.0;
        return Some(LegendSpec {
            swatches: vec![LegendSwatch {
                value,
                color: resolver.resolve(value, Some(stat)),
            }],
            grades,
        });
    }

    let mut n = max_grades.clamp(2, 10);
    if function.is_count() {
        let distinct = (stat.span().floor() as usize).saturating_add(1);
        n = n.min(distinct).max(2);
    }

    let grades = linspace(stat.min, stat.max, n);
    let swatches = grades
        .windows(2)
        .map(|pair| {
            let value = (pair[0] + pair[1]) / 2.0;
            LegendSwatch {
                value,
                color: resolver.resolve(value, Some(stat)),
            }
        })
        .collect();

    Some(LegendSpec { grades, swatches })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::ColorSpec;
    use geo_common::Color;

    fn scale() -> ColorResolver {
        ColorResolver::new(
            &ColorSpec::Scale {
                name: "YlOrRd".to_string(),
            },
            10,
        )
    }

    #[test]
    fn test_linspace_hits_bounds() {
        let grades = linspace(0.0, 1.0, 3);
        assert_eq!(grades, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_count_degenerate_is_omitted() {
        let legend = build_legend(
            AggregationStat::new(4.0, 4.0),
            AggregationFunction::Count,
            &scale(),
            10,
        );
        assert!(legend.is_none());
    }

    #[test]
    fn test_single_value_single_swatch() {
        let legend = build_legend(
            AggregationStat::new(7.5, 7.5),
            AggregationFunction::Avg,
            &scale(),
            10,
        )
        .unwrap();
        assert_eq!(legend.grades, vec![7.5, 7.5]);
        assert_eq!(legend.swatches.len(), 1);
        assert_eq!(legend.swatches[0].value, 7.5);
    }

    #[test]
    fn test_count_grades_capped_by_distinct_values() {
        let legend = build_legend(
            AggregationStat::new(1.0, 4.0),
            AggregationFunction::Count,
            &scale(),
            10,
        )
        .unwrap();
        assert_eq!(legend.grades, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(legend.swatches.len(), 3);
    }

    #[test]
    fn test_swatch_count_is_grades_minus_one() {
        let legend = build_legend(
            AggregationStat::new(0.0, 100.0),
            AggregationFunction::Sum,
            &scale(),
            10,
        )
        .unwrap();
        assert_eq!(legend.grades.len(), 10);
        assert_eq!(legend.swatches.len(), 9);
        assert_eq!(legend.grades[0], 0.0);
        assert_eq!(legend.grades[9], 100.0);
    }

    #[test]
    fn test_fixed_color_legend() {
        let red = Color::rgb(255, 0, 0);
        let legend = build_legend(
            AggregationStat::new(0.0, 10.0),
            AggregationFunction::Max,
            &ColorResolver::new(&ColorSpec::fixed(red), 10),
            5,
        )
        .unwrap();
        assert!(legend.swatches.iter().all(|s| s.color == red));
    }
}
