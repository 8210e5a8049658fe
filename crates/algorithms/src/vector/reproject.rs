//! Reproject feature collections between coordinate reference systems

use geo::{Coord, MapCoordsInPlace};
use zonalis_core::{CrsTransform, Error, FeatureCollection, Result, CRS};

/// Return a copy of `collection` with every coordinate moved into `target`.
///
/// Attributes, ids and the index name are kept. A collection already in
/// `target` is returned unchanged.
pub fn reproject(collection: &FeatureCollection, target: &CRS) -> Result<FeatureCollection> {
    let source = collection
        .crs
        .as_ref()
        .ok_or(Error::MissingCrs { role: "data" })?;

    let transform = CrsTransform::new(source, target)?;
    let mut out = collection.clone();
    out.crs = Some(target.clone());
    if transform.is_identity() {
        return Ok(out);
    }

    let project = |c: Coord<f64>| {
        let (x, y) = transform.transform(c.x, c.y);
        Coord { x, y }
    };
    for feature in &mut out.features {
        if let Some(geom) = feature.geometry.as_mut() {
            geom.map_coords_in_place(project);
        }
    }
    Ok(out)
}
