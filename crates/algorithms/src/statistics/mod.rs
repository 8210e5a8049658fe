//! Statistical analysis algorithms for vector data
//!
//! - **aggregate**: Grouped aggregation functions (sum, mean, min, ...)
//! - **area**: Area-weighted zonal statistics over polygon overlays

pub mod aggregate;
pub mod area;

pub use aggregate::AggFunc;
pub use area::{
    compute_area_zonal_stats, extract_func, AggregationSpec, AggregationUnit, AreaZonal,
    AreaZonalInput, AreaZonalParams, AreaZonalStats, CoverageTolerance, FillNa, Modifiers,
    SourceMode,
};
