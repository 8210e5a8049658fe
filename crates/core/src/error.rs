//! Error types for zonalis

use thiserror::Error;

/// Main error type for zonalis operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("{role} has geographic crs: {crs}, areas maybe incorrectly computed")]
    GeographicCrs { role: &'static str, crs: String },

    #[error("{role} has no crs, areas cannot be computed")]
    MissingCrs { role: &'static str },

    #[error("{role} has unrecognized crs: {crs}, cannot tell whether areas are planar")]
    UnknownCrs { role: &'static str, crs: String },

    #[error("Unsupported CRS transform: {from} -> {to}")]
    UnsupportedTransform { from: String, to: String },

    #[error("Unsupported geometry in {role} row {row}: {kind} (expected polygons)")]
    UnsupportedGeometry {
        role: &'static str,
        row: usize,
        kind: &'static str,
    },

    #[error("Aggregation on column '{column}' has no func")]
    MissingFunction { column: String },

    #[error("Column '{0}' not found in data")]
    UnknownColumn(String),

    #[error("Unknown aggregation function '{func}' for column '{column}'")]
    UnknownFunction { column: String, func: String },

    #[error("Aggregation on column '{column}': {field} has {actual} entries, expected {expected}")]
    MisalignedSpec {
        column: String,
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Duplicate output column '{0}'")]
    DuplicateOutput(String),

    #[error("Output column '{0}' already exists in aoi")]
    OutputCollision(String),

    #[error("Non-numeric value in column '{column}' at data row {row}")]
    NonNumericAttribute { column: String, row: usize },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

}

/// Result type alias for zonalis operations
pub type Result<T> = std::result::Result<T, Error>;
