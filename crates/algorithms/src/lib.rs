//! # Zonalis Algorithms
//!
//! Vector overlay and zonal statistics algorithms for zonalis.
//!
//! ## Available Algorithm Categories
//!
//! - **vector**: Planar area, bounding boxes, reprojection, polygon overlay
//! - **statistics**: Grouped aggregation functions and area-weighted zonal statistics

mod maybe_rayon;

pub mod statistics;
pub mod vector;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::statistics::{
        compute_area_zonal_stats, extract_func, AggFunc, AggregationSpec, AreaZonalParams,
        AreaZonalStats, CoverageTolerance, Modifiers, SourceMode,
    };
    pub use crate::vector::{area, intersection_overlay, reproject, OverlayPiece};
    pub use zonalis_core::prelude::*;
}
