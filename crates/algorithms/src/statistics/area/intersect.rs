//! Intersection table between AOI and data polygons

use crate::vector::{area, area_or_zero, intersection_overlay};
use geo::MultiPolygon;
use std::ops::Range;

/// One AOI/data intersection with its area shares
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionRecord {
    /// AOI row this intersection belongs to
    pub aoi: usize,
    /// Data row this intersection came from
    pub data: usize,
    pub geometry: MultiPolygon<f64>,
    pub intersect_area: f64,
    /// `intersect_area / data_area`
    pub pct_data: f64,
    /// `intersect_area / aoi_area`
    pub pct_aoi: f64,
}

/// Records ordered by AOI row then data row, plus the area of every AOI polygon
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntersectionTable {
    pub records: Vec<IntersectionRecord>,
    pub aoi_area: Vec<f64>,
}

impl IntersectionTable {
    /// Overlay `aoi` and `data` polygons (same CRS) and compute area shares
    pub fn build(aoi: &[Option<MultiPolygon<f64>>], data: &[Option<MultiPolygon<f64>>]) -> Self {
        let aoi_area: Vec<f64> = aoi.iter().map(|g| area_or_zero(g.as_ref())).collect();
        let data_area: Vec<f64> = data.iter().map(|g| area_or_zero(g.as_ref())).collect();

        let records = intersection_overlay(aoi, data)
            .into_iter()
            .map(|piece| {
                let intersect_area = area(&piece.geometry);
                IntersectionRecord {
                    aoi: piece.left,
                    data: piece.right,
                    intersect_area,
                    pct_data: intersect_area / data_area[piece.right],
                    pct_aoi: intersect_area / aoi_area[piece.left],
                    geometry: piece.geometry,
                }
            })
            .collect();

        Self { records, aoi_area }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record range of each AOI row. AOI rows without intersections get an
    /// empty range.
    pub fn groups(&self) -> Vec<Range<usize>> {
        let n = self.aoi_area.len();
        let mut groups = vec![0..0; n];
        let mut start = 0;
        while start < self.records.len() {
            let aoi = self.records[start].aoi;
            let mut end = start + 1;
            while end < self.records.len() && self.records[end].aoi == aoi {
                end += 1;
            }
            groups[aoi] = start..end;
            start = end;
        }
        groups
    }
}
