//! Grouped aggregation functions
//!
//! Each function reduces the values of one group to a single number.
//! Missing values are `NaN` and are skipped, except by `size` which counts
//! rows. A group with nothing to reduce yields `NaN` (or the identity for
//! `sum`, `prod`, `count`, `nunique`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Aggregation function names accepted in aggregation specs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFunc {
    /// Number of non-missing values
    Count,
    /// Number of rows, missing values included
    Size,
    Sum,
    /// Product of values
    Prod,
    Mean,
    Median,
    Min,
    Max,
    /// Sample standard deviation (n - 1)
    Std,
    /// Sample variance (n - 1)
    Var,
    /// Standard error of the mean
    Sem,
    /// First non-missing value in group order
    First,
    /// Last non-missing value in group order
    Last,
    /// Number of distinct non-missing values
    Nunique,
}

impl AggFunc {
    pub const ALL: [AggFunc; 14] = [
        AggFunc::Count,
        AggFunc::Size,
        AggFunc::Sum,
        AggFunc::Prod,
        AggFunc::Mean,
        AggFunc::Median,
        AggFunc::Min,
        AggFunc::Max,
        AggFunc::Std,
        AggFunc::Var,
        AggFunc::Sem,
        AggFunc::First,
        AggFunc::Last,
        AggFunc::Nunique,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AggFunc::Count => "count",
            AggFunc::Size => "size",
            AggFunc::Sum => "sum",
            AggFunc::Prod => "prod",
            AggFunc::Mean => "mean",
            AggFunc::Median => "median",
            AggFunc::Min => "min",
            AggFunc::Max => "max",
            AggFunc::Std => "std",
            AggFunc::Var => "var",
            AggFunc::Sem => "sem",
            AggFunc::First => "first",
            AggFunc::Last => "last",
            AggFunc::Nunique => "nunique",
        }
    }

    /// Reduce one group of values
    pub fn apply(&self, values: &[f64]) -> f64 {
        if *self == AggFunc::Size {
            return values.len() as f64;
        }

        let mut present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        let n = present.len();

        match self {
            AggFunc::Size => values.len() as f64,
            AggFunc::Count => n as f64,
            AggFunc::Sum => present.iter().sum(),
            AggFunc::Prod => present.iter().product(),
            AggFunc::First => present.first().copied().unwrap_or(f64::NAN),
            AggFunc::Last => present.last().copied().unwrap_or(f64::NAN),
            _ if n == 0 => f64::NAN,
            AggFunc::Mean => present.iter().sum::<f64>() / n as f64,
            AggFunc::Min => present.iter().copied().fold(f64::INFINITY, f64::min),
            AggFunc::Max => present.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            AggFunc::Median => {
                present.sort_by(f64::total_cmp);
                if n % 2 == 0 {
                    (present[n / 2 - 1] + present[n / 2]) / 2.0
                } else {
                    present[n / 2]
                }
            }
            AggFunc::Var => sample_variance(&present),
            AggFunc::Std => sample_variance(&present).sqrt(),
            AggFunc::Sem => (sample_variance(&present) / n as f64).sqrt(),
            AggFunc::Nunique => {
                present.sort_by(f64::total_cmp);
                present.dedup();
                present.len() as f64
            }
        }
    }
}

/// Variance with n - 1 in the denominator; `NaN` below two values
fn sample_variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1) as f64
}

impl fmt::Display for AggFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AggFunc {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AggFunc::ALL
            .iter()
            .copied()
            .find(|func| func.name() == s)
            .ok_or_else(|| s.to_string())
    }
}
