//! Planar area of polygonal geometries

use geo::{Area as GeoArea, MultiPolygon};

/// Calculate the planar area of a multipolygon.
///
/// Returns unsigned area in CRS units squared. Only meaningful for projected
/// CRSs; in a geographic CRS the result is in square degrees. Holes are
/// subtracted.
pub fn area(geom: &MultiPolygon<f64>) -> f64 {
    geom.unsigned_area()
}

/// Area of an optional geometry; a missing geometry has zero area
pub fn area_or_zero(geom: Option<&MultiPolygon<f64>>) -> f64 {
    geom.map_or(0.0, area)
}
