//! Grouped aggregation and result assembly

use super::spec::{AggregationUnit, INTERSECT_AREA_OUTPUT};
use super::AreaZonalParams;
use crate::statistics::AggFunc;
use std::ops::Range;
use zonalis_core::{AttributeValue, FeatureCollection};

/// Area zonal statistics, one row per AOI feature.
///
/// `features` is the AOI collection (same order, ids, index name, CRS and
/// geometries) with every statistic added as a `Float` property. Missing
/// values are `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaZonalStats {
    pub features: FeatureCollection,
    /// Statistic columns in output order
    pub columns: Vec<String>,
}

impl AreaZonalStats {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Values of a statistic column in row order
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        if !self.columns.iter().any(|c| c == name) {
            return None;
        }
        Some(
            self.features
                .iter()
                .map(|f| {
                    f.get_property(name)
                        .and_then(AttributeValue::as_f64)
                        .unwrap_or(f64::NAN)
                })
                .collect(),
        )
    }
}

/// Aggregated values of one unit, one per AOI row
#[derive(Debug, Clone)]
pub(crate) struct Aggregate {
    pub unit: AggregationUnit,
    pub values: Vec<f64>,
}

/// Reduce `values` per group. Rows with no records stay missing, the same as
/// a left join against an absent group.
pub(crate) fn aggregate_groups(values: &[f64], groups: &[Range<usize>], func: AggFunc) -> Vec<f64> {
    groups
        .iter()
        .map(|range| {
            if range.is_empty() {
                f64::NAN
            } else {
                func.apply(&values[range.clone()])
            }
        })
        .collect()
}

fn fill_missing(value: f64, fill: Option<f64>) -> f64 {
    match fill {
        Some(fill) if value.is_nan() => fill,
        _ => value,
    }
}

/// Scale a statistic over the covered area up to the full AOI area.
/// No coverage means no estimate.
fn impute(value: f64, aoi_area: f64, covered: f64) -> f64 {
    if covered.is_nan() || covered <= 0.0 {
        return f64::NAN;
    }
    value * aoi_area / covered
}

/// Apply the min-fix, fill-na and imputed corrections and merge every
/// column onto the AOI features.
pub(crate) fn assemble(
    aoi: &FeatureCollection,
    aoi_area: &[f64],
    intersect_sum: Vec<f64>,
    aggregates: Vec<Aggregate>,
    params: &AreaZonalParams,
) -> AreaZonalStats {
    let mut columns: Vec<(String, Vec<f64>)> = Vec::with_capacity(aggregates.len() + 1);

    for Aggregate { unit, values } in aggregates {
        let corrected = values
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                let (area, covered) = (aoi_area[row], intersect_sum[row]);

                // A minimum over partial coverage ignores the uncovered part
                let value = if params.fix_min
                    && unit.func == AggFunc::Min
                    && !params.coverage.is_close(area, covered)
                {
                    0.0
                } else {
                    value
                };

                let value = fill_missing(value, unit.fillna);

                if unit.modifiers.imputed {
                    impute(value, area, covered)
                } else {
                    value
                }
            })
            .collect();
        columns.push((unit.output, corrected));
    }

    if params.include_intersect {
        columns.insert(0, (INTERSECT_AREA_OUTPUT.to_string(), intersect_sum));
    }

    let mut features = aoi.clone();
    for (row, feature) in features.features.iter_mut().enumerate() {
        for (name, values) in &columns {
            feature.set_property(name.clone(), AttributeValue::Float(values[row]));
        }
    }

    AreaZonalStats {
        features,
        columns: columns.into_iter().map(|(name, _)| name).collect(),
    }
}
