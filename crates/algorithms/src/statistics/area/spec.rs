//! Aggregation specs for area zonal statistics
//!
//! Callers describe statistics with [`AggregationSpec`]s. Function names may
//! carry modifier prefixes (`raw_`, `data_`, `aoi_`, `imputed_`) which are
//! parsed once into [`Modifiers`]. A spec is then normalized (default
//! outputs and fill values), validated against the input tables, and
//! expanded into one [`AggregationUnit`] per function.

use crate::statistics::AggFunc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use zonalis_core::{Error, FeatureCollection, Result};

/// Column holding the planar area of each intersection
pub const INTERSECT_AREA_COLUMN: &str = "intersect_area";
/// Output column for the total overlap area of each AOI polygon
pub const INTERSECT_AREA_OUTPUT: &str = "intersect_area_sum";
/// Transient per-AOI area column, never part of the output
pub const AOI_AREA_COLUMN: &str = "aoi_area";

/// A single value or a list of values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

impl From<&str> for OneOrMany<String> {
    fn from(value: &str) -> Self {
        OneOrMany::One(value.to_string())
    }
}

impl From<String> for OneOrMany<String> {
    fn from(value: String) -> Self {
        OneOrMany::One(value)
    }
}

impl From<Vec<&str>> for OneOrMany<String> {
    fn from(values: Vec<&str>) -> Self {
        OneOrMany::Many(values.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for OneOrMany<String> {
    fn from(values: [&str; N]) -> Self {
        OneOrMany::Many(values.iter().map(|s| s.to_string()).collect())
    }
}

macro_rules! fillna_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for OneOrMany<FillNa> {
                fn from(value: $t) -> Self {
                    OneOrMany::One(value.into())
                }
            }

            impl From<Vec<$t>> for OneOrMany<FillNa> {
                fn from(values: Vec<$t>) -> Self {
                    OneOrMany::Many(values.into_iter().map(Into::into).collect())
                }
            }
        )*
    };
}

fillna_from!(bool, f64, FillNa);

/// What to put in an aggregate that no intersection contributed to.
///
/// `true` fills with zero, `false` leaves the value missing (`NaN`), and a
/// number fills with that number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FillNa {
    Flag(bool),
    Value(f64),
}

impl FillNa {
    pub fn fill_value(&self) -> Option<f64> {
        match *self {
            FillNa::Flag(true) => Some(0.0),
            FillNa::Flag(false) => None,
            FillNa::Value(v) => Some(v),
        }
    }
}

impl Default for FillNa {
    fn default() -> Self {
        FillNa::Flag(false)
    }
}

impl From<bool> for FillNa {
    fn from(value: bool) -> Self {
        FillNa::Flag(value)
    }
}

impl From<f64> for FillNa {
    fn from(value: f64) -> Self {
        FillNa::Value(value)
    }
}

/// Statistics requested on one data column, as supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationSpec {
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub func: Option<OneOrMany<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OneOrMany<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fillna: Option<OneOrMany<FillNa>>,
}

impl AggregationSpec {
    pub fn new(column: impl Into<String>, func: impl Into<OneOrMany<String>>) -> Self {
        Self {
            column: column.into(),
            func: Some(func.into()),
            output: None,
            fillna: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<OneOrMany<String>>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_fillna(mut self, fillna: impl Into<OneOrMany<FillNa>>) -> Self {
        self.fillna = Some(fillna.into());
        self
    }
}

/// Which column an area statistic reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceMode {
    /// The attribute as stored on the data polygon, not area weighted
    Raw,
    /// Weighted by the share of the data polygon inside the intersection
    Data,
    /// Weighted by the share of the AOI polygon inside the intersection
    Aoi,
}

/// Modifiers parsed from a prefixed function name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// Explicit source; `None` means the function's default applies
    pub source: Option<SourceMode>,
    /// Rescale the aggregate from covered area to full AOI area
    pub imputed: bool,
}

/// Split a function name into its base name and modifiers.
///
/// At most one of `raw_`, `data_`, `aoi_` is honoured, checked in that
/// order. `imputed_` is independent. Markers are removed wherever they occur.
///
/// ```
/// use zonalis_algorithms::statistics::{extract_func, SourceMode};
///
/// let (base, mods) = extract_func("data_imputed_sum");
/// assert_eq!(base, "sum");
/// assert_eq!(mods.source, Some(SourceMode::Data));
/// assert!(mods.imputed);
/// ```
pub fn extract_func(name: &str) -> (String, Modifiers) {
    let mut modifiers = Modifiers::default();
    let mut base = name.to_string();

    for (marker, mode) in [
        ("raw_", SourceMode::Raw),
        ("data_", SourceMode::Data),
        ("aoi_", SourceMode::Aoi),
    ] {
        if base.contains(marker) {
            modifiers.source = Some(mode);
            base = base.replace(marker, "");
            break;
        }
    }

    if base.contains("imputed_") {
        modifiers.imputed = true;
        base = base.replace("imputed_", "");
    }

    (base, modifiers)
}

/// A spec after modifier extraction and default filling
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSpec {
    pub column: String,
    /// Base function names with their modifiers; `None` when the caller gave no func
    pub funcs: Option<Vec<(String, Modifiers)>>,
    pub output: Vec<String>,
    pub fillna: Vec<FillNa>,
}

/// Extract modifiers and fill in default outputs and fill values.
///
/// Default outputs are `<column>_<base func>`. A spec without `func` is
/// carried through for [`validate_specs`] to reject.
pub fn normalize_spec(spec: &AggregationSpec) -> NormalizedSpec {
    let output = spec.output.clone().map(OneOrMany::into_vec);
    let fillna = spec.fillna.clone().map(OneOrMany::into_vec);

    let Some(func) = spec.func.clone() else {
        return NormalizedSpec {
            column: spec.column.clone(),
            funcs: None,
            output: output.unwrap_or_default(),
            fillna: fillna.unwrap_or_default(),
        };
    };

    let funcs: Vec<(String, Modifiers)> =
        func.into_vec().iter().map(|name| extract_func(name)).collect();

    let output = output.unwrap_or_else(|| {
        funcs
            .iter()
            .map(|(base, _)| format!("{}_{}", spec.column, base))
            .collect()
    });
    let fillna = fillna.unwrap_or_else(|| vec![FillNa::default(); funcs.len()]);

    NormalizedSpec {
        column: spec.column.clone(),
        funcs: Some(funcs),
        output,
        fillna,
    }
}

/// Reject specs that cannot be computed against `data` and merged onto `aoi`.
pub fn validate_specs(
    specs: &[NormalizedSpec],
    data: &FeatureCollection,
    aoi: &FeatureCollection,
) -> Result<()> {
    let mut outputs: HashSet<&str> = HashSet::from([INTERSECT_AREA_OUTPUT, AOI_AREA_COLUMN]);

    for spec in specs {
        let funcs = spec.funcs.as_ref().ok_or_else(|| Error::MissingFunction {
            column: spec.column.clone(),
        })?;

        if !data.has_column(&spec.column) {
            return Err(Error::UnknownColumn(spec.column.clone()));
        }

        for (base, _) in funcs {
            base.parse::<AggFunc>().map_err(|func| Error::UnknownFunction {
                column: spec.column.clone(),
                func,
            })?;
        }

        for (field, actual) in [("output", spec.output.len()), ("fillna", spec.fillna.len())] {
            if actual != funcs.len() {
                return Err(Error::MisalignedSpec {
                    column: spec.column.clone(),
                    field,
                    expected: funcs.len(),
                    actual,
                });
            }
        }

        for output in &spec.output {
            if !outputs.insert(output.as_str()) {
                return Err(Error::DuplicateOutput(output.clone()));
            }
            if aoi.has_column(output) {
                return Err(Error::OutputCollision(output.clone()));
            }
        }
    }

    Ok(())
}

/// One statistic on one column, the unit every later stage works with
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationUnit {
    pub column: String,
    pub func: AggFunc,
    pub modifiers: Modifiers,
    pub output: String,
    pub fillna: Option<f64>,
}

/// Flatten validated specs into one unit per function, in spec order
pub fn expand_specs(specs: &[NormalizedSpec]) -> Result<Vec<AggregationUnit>> {
    let mut units = Vec::new();
    for spec in specs {
        let funcs = spec.funcs.as_deref().unwrap_or_default();
        for (i, (base, modifiers)) in funcs.iter().enumerate() {
            let func = base.parse::<AggFunc>().map_err(|func| Error::UnknownFunction {
                column: spec.column.clone(),
                func,
            })?;
            let (Some(output), Some(fillna)) = (spec.output.get(i), spec.fillna.get(i)) else {
                return Err(Error::MisalignedSpec {
                    column: spec.column.clone(),
                    field: "output",
                    expected: funcs.len(),
                    actual: spec.output.len().min(spec.fillna.len()),
                });
            };
            units.push(AggregationUnit {
                column: spec.column.clone(),
                func,
                modifiers: *modifiers,
                output: output.clone(),
                fillna: fillna.fill_value(),
            });
        }
    }
    Ok(units)
}
