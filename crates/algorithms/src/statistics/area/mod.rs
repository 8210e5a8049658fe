//! Area-weighted zonal statistics
//!
//! Summarizes attributes of data polygons over AOI polygons, weighting each
//! data polygon by how much of it overlaps the AOI:
//!
//! 1. Normalize, validate and expand the aggregation specs
//! 2. Reproject the data into the AOI CRS and overlay the two tables
//! 3. Compute `intersect_area`, `pct_data` and `pct_aoi` per intersection
//! 4. Resolve and materialize the column each statistic reads
//! 5. Aggregate per AOI row, then apply the min-fix, fill-na and imputed
//!    corrections
//!
//! `sum` defaults to data-share apportionment (counts such as population),
//! `mean` to AOI-share apportionment (densities); prefix a function with
//! `raw_`, `data_` or `aoi_` to override, and with `imputed_` to extrapolate
//! from covered area to the whole AOI.

mod assemble;
mod intersect;
mod source;
mod spec;

pub use assemble::AreaZonalStats;
pub use intersect::{IntersectionRecord, IntersectionTable};
pub use source::{resolve_source, Apportionment, SourceColumn, SourceColumns};
pub use spec::{
    expand_specs, extract_func, normalize_spec, validate_specs, AggregationSpec, AggregationUnit,
    FillNa, Modifiers, NormalizedSpec, OneOrMany, SourceMode, AOI_AREA_COLUMN,
    INTERSECT_AREA_COLUMN, INTERSECT_AREA_OUTPUT,
};

use crate::statistics::AggFunc;
use crate::vector::{collection_polygons, reproject};
use assemble::{aggregate_groups, assemble, Aggregate};
use std::borrow::Cow;
use std::time::Instant;
use tracing::{debug, info, warn};
use zonalis_core::{Algorithm, Error, FeatureCollection, Result, CRS};

/// Tolerance for deciding that an AOI polygon is fully covered by data.
///
/// `aoi_area` and `intersect_area_sum` are close when
/// `|aoi_area - intersect_area_sum| <= absolute + relative * |intersect_area_sum|`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageTolerance {
    pub relative: f64,
    pub absolute: f64,
}

impl Default for CoverageTolerance {
    fn default() -> Self {
        Self {
            relative: 1e-5,
            absolute: 1e-8,
        }
    }
}

impl CoverageTolerance {
    /// `false` whenever either area is `NaN`
    pub fn is_close(&self, aoi_area: f64, covered: f64) -> bool {
        (aoi_area - covered).abs() <= self.absolute + self.relative * covered.abs()
    }
}

/// Parameters for area zonal statistics
#[derive(Debug, Clone, PartialEq)]
pub struct AreaZonalParams {
    /// Keep the `intersect_area_sum` column in the output
    pub include_intersect: bool,
    /// Force `min` statistics to 0 on AOI polygons not fully covered by data
    pub fix_min: bool,
    /// Closeness test used by `fix_min`
    pub coverage: CoverageTolerance,
}

impl Default for AreaZonalParams {
    fn default() -> Self {
        Self {
            include_intersect: true,
            fix_min: true,
            coverage: CoverageTolerance::default(),
        }
    }
}

impl AreaZonalParams {
    fn validate(&self) -> Result<()> {
        let checks = [
            ("coverage.relative", self.coverage.relative),
            ("coverage.absolute", self.coverage.absolute),
        ];
        for (name, value) in checks {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(Error::InvalidParameter {
                    name,
                    value: value.to_string(),
                    reason: "must be a finite, non-negative number".into(),
                });
            }
        }
        Ok(())
    }
}

/// Input tables and specs for [`AreaZonal`]
#[derive(Debug, Clone, Default)]
pub struct AreaZonalInput {
    pub aoi: FeatureCollection,
    pub data: FeatureCollection,
    pub aggregations: Vec<AggregationSpec>,
}

/// Area zonal statistics algorithm
#[derive(Debug, Clone, Default)]
pub struct AreaZonal;

impl Algorithm for AreaZonal {
    type Input = AreaZonalInput;
    type Output = AreaZonalStats;
    type Params = AreaZonalParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "AreaZonalStats"
    }

    fn description(&self) -> &'static str {
        "Summarize data polygon attributes over AOI polygons, weighted by overlap area"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        compute_area_zonal_stats(&input.aoi, &input.data, &input.aggregations, params)
    }
}

fn projected_crs<'a>(collection: &'a FeatureCollection, role: &'static str) -> Result<&'a CRS> {
    let crs = collection.crs.as_ref().ok_or(Error::MissingCrs { role })?;
    match crs.is_geographic() {
        Some(false) => Ok(crs),
        Some(true) => Err(Error::GeographicCrs {
            role,
            crs: crs.identifier(),
        }),
        None => Err(Error::UnknownCrs {
            role,
            crs: crs.identifier(),
        }),
    }
}

/// Compute area-weighted zonal statistics of `data` over `aoi`.
///
/// Both tables must be in a projected CRS; `data` is reprojected into the
/// AOI CRS when they differ. The result has one row per AOI feature in
/// input order, with the AOI ids and index name, `intersect_area_sum`
/// (unless `params.include_intersect` is off) and one column per requested
/// statistic.
///
/// # Errors
/// Fails before any geometric work on a geographic, unrecognized or missing
/// CRS, a non-polygonal geometry, or an invalid aggregation spec.
pub fn compute_area_zonal_stats(
    aoi: &FeatureCollection,
    data: &FeatureCollection,
    aggregations: &[AggregationSpec],
    params: AreaZonalParams,
) -> Result<AreaZonalStats> {
    let started = Instant::now();
    params.validate()?;

    let aoi_crs = projected_crs(aoi, "aoi")?;
    let data_crs = projected_crs(data, "data")?;

    let specs: Vec<NormalizedSpec> = aggregations.iter().map(normalize_spec).collect();
    validate_specs(&specs, data, aoi)?;
    let units = expand_specs(&specs)?;
    debug!(specs = specs.len(), units = units.len(), "expanded aggregation specs");

    let data = if data_crs.is_equivalent(aoi_crs) {
        Cow::Borrowed(data)
    } else {
        warn!(from = %data_crs, to = %aoi_crs, "reprojecting data into aoi crs");
        Cow::Owned(reproject(data, aoi_crs)?)
    };

    let aoi_polygons = collection_polygons(aoi, "aoi")?;
    let data_polygons = collection_polygons(&data, "data")?;
    let table = IntersectionTable::build(&aoi_polygons, &data_polygons);
    debug!(
        aoi = aoi_polygons.len(),
        data = data_polygons.len(),
        records = table.len(),
        "overlaid aoi and data"
    );

    let groups = table.groups();
    let mut columns = SourceColumns::new(&table, &data);

    let intersect_sum = aggregate_groups(
        columns.values(&SourceColumn::IntersectArea)?,
        &groups,
        AggFunc::Sum,
    );

    let mut aggregates = Vec::with_capacity(units.len());
    for unit in units {
        let source = resolve_source(&unit);
        let values = aggregate_groups(columns.values(&source)?, &groups, unit.func);
        aggregates.push(Aggregate { unit, values });
    }
    debug!(columns = columns.materialized(), "materialized source columns");

    let result = assemble(aoi, &table.aoi_area, intersect_sum, aggregates, &params);
    info!(
        aoi = result.len(),
        records = table.len(),
        elapsed = ?started.elapsed(),
        "area zonal stats complete"
    );
    Ok(result)
}
