//! Polygon intersection overlay
//!
//! Pairs every left polygon with the right polygons whose envelopes overlap
//! it in an R-tree and keeps the intersections with non-zero area. Pieces are
//! ordered by left row, then right row.

use crate::maybe_rayon::*;
use crate::vector::area;
use crate::vector::spatial::PolygonIndex;
use geo::{BooleanOps, Geometry, MultiPolygon};
use zonalis_core::{Error, FeatureCollection, Result};

/// One intersection of a left and a right polygon
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayPiece {
    /// Row of the originating left polygon
    pub left: usize,
    /// Row of the originating right polygon
    pub right: usize,
    pub geometry: MultiPolygon<f64>,
}

/// Convert an areal geometry to a multipolygon. Returns `None` for points,
/// lines and other non-areal geometries.
pub fn polygonal(geom: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geom {
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        Geometry::Rect(r) => Some(MultiPolygon::new(vec![r.to_polygon()])),
        Geometry::Triangle(t) => Some(MultiPolygon::new(vec![t.to_polygon()])),
        _ => None,
    }
}

fn geometry_kind(geom: &Geometry<f64>) -> &'static str {
    match geom {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// Extract the polygons of a collection in row order.
///
/// Features without geometry map to `None`; any non-areal geometry is an
/// [`Error::UnsupportedGeometry`] naming `role` and the row.
pub fn collection_polygons(
    collection: &FeatureCollection,
    role: &'static str,
) -> Result<Vec<Option<MultiPolygon<f64>>>> {
    collection
        .features
        .iter()
        .enumerate()
        .map(|(row, feature)| match &feature.geometry {
            None => Ok(None),
            Some(geom) => polygonal(geom).map(Some).ok_or(Error::UnsupportedGeometry {
                role,
                row,
                kind: geometry_kind(geom),
            }),
        })
        .collect()
}

/// Intersect two polygon sets.
///
/// Invalid or self-overlapping inputs are not repaired; their pieces are
/// whatever the boolean operation yields.
pub fn intersection_overlay(
    left: &[Option<MultiPolygon<f64>>],
    right: &[Option<MultiPolygon<f64>>],
) -> Vec<OverlayPiece> {
    let index = PolygonIndex::new(right);

    let per_left: Vec<Vec<OverlayPiece>> = (0..left.len())
        .into_par_iter()
        .map(|li| {
            let Some(lg) = left[li].as_ref() else {
                return Vec::new();
            };

            index
                .candidates(lg)
                .into_iter()
                .filter_map(|ri| {
                    let geometry = lg.intersection(right[ri].as_ref()?);
                    // Shared edges and corners are not areal overlaps
                    if geometry.0.is_empty() || area(&geometry) == 0.0 {
                        return None;
                    }
                    Some(OverlayPiece {
                        left: li,
                        right: ri,
                        geometry,
                    })
                })
                .collect()
        })
        .collect();

    per_left.into_iter().flatten().collect()
}
