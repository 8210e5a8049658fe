//! R-tree over polygon envelopes used to prefilter overlay candidates

use geo::{BoundingRect, MultiPolygon};
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};

type RowEnvelope = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// Axis-aligned envelope of a multipolygon, `None` when it is empty
pub fn envelope(geom: &MultiPolygon<f64>) -> Option<AABB<[f64; 2]>> {
    geom.bounding_rect().map(|rect| {
        AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
    })
}

/// Spatial index of a polygon table, keyed by row
pub struct PolygonIndex {
    tree: RTree<RowEnvelope>,
}

impl PolygonIndex {
    /// Bulk-load the envelope of every non-empty polygon
    pub fn new(polygons: &[Option<MultiPolygon<f64>>]) -> Self {
        let entries = polygons
            .iter()
            .enumerate()
            .filter_map(|(row, geom)| {
                let env = envelope(geom.as_ref()?)?;
                Some(GeomWithData::new(Rectangle::from_aabb(env), row))
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Rows whose envelopes intersect or touch the envelope of `geom`, in
    /// ascending order
    pub fn candidates(&self, geom: &MultiPolygon<f64>) -> Vec<usize> {
        let Some(env) = envelope(geom) else {
            return Vec::new();
        };
        let mut rows: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&env)
            .map(|entry| entry.data)
            .collect();
        rows.sort_unstable();
        rows
    }
}
