//! Vector analysis algorithms
//!
//! Geometric operations on polygon tables:
//! - Area: planar area in CRS units
//! - Spatial index: R-tree of polygon envelopes used as an overlay prefilter
//! - Overlay: pairwise polygon intersections of two tables
//! - Reproject: move a table into another CRS

mod measurements;
mod overlay;
mod reproject;
mod spatial;

pub use measurements::{area, area_or_zero};
pub use overlay::{collection_polygons, intersection_overlay, polygonal, OverlayPiece};
pub use reproject::reproject;
pub use spatial::{envelope, PolygonIndex};
