//! Source column resolution and materialization
//!
//! Every unit reads one column of the intersection table: the computed
//! intersection area, a raw data attribute, or an attribute apportioned by
//! the data or AOI share of each intersection. Apportioned columns are
//! computed lazily, once per `(column, apportionment)` pair.

use super::intersect::IntersectionTable;
use super::spec::{AggregationUnit, SourceMode, INTERSECT_AREA_COLUMN};
use crate::statistics::AggFunc;
use std::collections::HashMap;
use zonalis_core::{Error, FeatureCollection, Result};

/// Which overlap share scales an apportioned attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Apportionment {
    /// `pct_data * value`
    Data,
    /// `pct_aoi * value`
    Aoi,
}

/// Column of the intersection table a unit aggregates
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceColumn {
    /// Planar area of each intersection
    IntersectArea,
    /// Data attribute as stored
    Raw(String),
    /// Data attribute scaled by an overlap share
    Apportioned { column: String, by: Apportionment },
}

impl SourceColumn {
    /// Conventional column name, e.g. `intersect_data_population`
    pub fn name(&self) -> String {
        match self {
            SourceColumn::IntersectArea => INTERSECT_AREA_COLUMN.to_string(),
            SourceColumn::Raw(column) => column.clone(),
            SourceColumn::Apportioned { column, by: Apportionment::Data } => {
                format!("intersect_data_{column}")
            }
            SourceColumn::Apportioned { column, by: Apportionment::Aoi } => {
                format!("intersect_aoi_{column}")
            }
        }
    }
}

/// Decide which column `unit` reads.
///
/// An explicit modifier wins. Otherwise `sum` apportions by data share
/// (additive quantities), `mean` apportions by AOI share (densities), and
/// every other function reads the raw attribute.
pub fn resolve_source(unit: &AggregationUnit) -> SourceColumn {
    let apportioned = |by| SourceColumn::Apportioned {
        column: unit.column.clone(),
        by,
    };

    let mode = unit.modifiers.source.unwrap_or(match unit.func {
        AggFunc::Sum => SourceMode::Data,
        AggFunc::Mean => SourceMode::Aoi,
        _ => SourceMode::Raw,
    });

    match mode {
        SourceMode::Raw => SourceColumn::Raw(unit.column.clone()),
        SourceMode::Data => apportioned(Apportionment::Data),
        SourceMode::Aoi => apportioned(Apportionment::Aoi),
    }
}

/// Lazily materialized columns over one intersection table
pub struct SourceColumns<'a> {
    table: &'a IntersectionTable,
    data: &'a FeatureCollection,
    cache: HashMap<SourceColumn, Vec<f64>>,
}

impl<'a> SourceColumns<'a> {
    pub fn new(table: &'a IntersectionTable, data: &'a FeatureCollection) -> Self {
        Self {
            table,
            data,
            cache: HashMap::new(),
        }
    }

    /// Number of distinct columns materialized so far
    pub fn materialized(&self) -> usize {
        self.cache.len()
    }

    /// Values of `source`, one per intersection record
    pub fn values(&mut self, source: &SourceColumn) -> Result<&[f64]> {
        if !self.cache.contains_key(source) {
            let values = self.compute(source)?;
            self.cache.insert(source.clone(), values);
        }
        Ok(&self.cache[source])
    }

    fn compute(&self, source: &SourceColumn) -> Result<Vec<f64>> {
        let records = &self.table.records;
        match source {
            SourceColumn::IntersectArea => Ok(records.iter().map(|r| r.intersect_area).collect()),
            SourceColumn::Raw(column) => self.raw(column),
            SourceColumn::Apportioned { column, by } => {
                let raw = self.raw(column)?;
                Ok(records
                    .iter()
                    .zip(raw)
                    .map(|(r, value)| match by {
                        Apportionment::Data => r.pct_data * value,
                        Apportionment::Aoi => r.pct_aoi * value,
                    })
                    .collect())
            }
        }
    }

    /// Attribute of each record's data polygon; missing or null is `NaN`
    fn raw(&self, column: &str) -> Result<Vec<f64>> {
        self.table
            .records
            .iter()
            .map(|r| {
                let value = self.data.features[r.data].get_property(column);
                match value {
                    None => Ok(f64::NAN),
                    Some(v) if v.is_null() => Ok(f64::NAN),
                    Some(v) => v.as_f64().ok_or_else(|| Error::NonNumericAttribute {
                        column: column.to_string(),
                        row: r.data,
                    }),
                }
            })
            .collect()
    }
}
