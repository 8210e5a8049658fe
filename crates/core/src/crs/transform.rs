//! Pure-Rust point transforms between WGS84, Web Mercator and UTM
//! (Snyder 1987, USGS Prof. Paper 1395).
//!
//! Covers EPSG 4326, 3857, 326xx (UTM North) and 327xx (UTM South). Every
//! transform pivots through WGS84 longitude/latitude. No external C
//! dependencies (no libproj).

use super::CRS;
use crate::error::{Error, Result};
use std::f64::consts::FRAC_PI_4;

// ── WGS84 ellipsoid constants ────────────────────────────────────────────

const A: f64 = 6_378_137.0; // semi-major axis (m)
const F: f64 = 1.0 / 298.257_223_563; // flattening
const E2: f64 = 2.0 * F - F * F; // eccentricity squared
const E_PRIME2: f64 = E2 / (1.0 - E2); // second eccentricity squared
const K0: f64 = 0.9996; // UTM scale factor
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Projection {
    Wgs84,
    WebMercator,
    Utm { zone: u32, north: bool },
}

impl Projection {
    fn from_crs(crs: &CRS) -> Option<Self> {
        match crs.epsg()? {
            4326 => Some(Projection::Wgs84),
            3857 | 900913 => Some(Projection::WebMercator),
            code => parse_utm_epsg(code).map(|(zone, north)| Projection::Utm { zone, north }),
        }
    }

    fn inverse(self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Projection::Wgs84 => (x, y),
            Projection::WebMercator => web_mercator_to_wgs84(x, y),
            Projection::Utm { zone, north } => utm_to_wgs84(x, y, zone, north),
        }
    }

    fn forward(self, lon: f64, lat: f64) -> (f64, f64) {
        match self {
            Projection::Wgs84 => (lon, lat),
            Projection::WebMercator => wgs84_to_web_mercator(lon, lat),
            Projection::Utm { zone, north } => wgs84_to_utm(lon, lat, zone, north),
        }
    }
}

/// A point transform between two coordinate reference systems.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrsTransform {
    /// `None` when source and target are equivalent
    steps: Option<(Projection, Projection)>,
}

impl CrsTransform {
    /// Build the transform from `from` to `to`.
    ///
    /// Equivalent CRSs always succeed with the identity transform. Otherwise
    /// both sides must be one of EPSG 4326, 3857, 326xx or 327xx.
    pub fn new(from: &CRS, to: &CRS) -> Result<Self> {
        if from.is_equivalent(to) {
            return Ok(Self::identity());
        }

        match (Projection::from_crs(from), Projection::from_crs(to)) {
            (Some(src), Some(dst)) if src == dst => Ok(Self::identity()),
            (Some(src), Some(dst)) => Ok(Self {
                steps: Some((src, dst)),
            }),
            _ => Err(Error::UnsupportedTransform {
                from: from.identifier(),
                to: to.identifier(),
            }),
        }
    }

    /// The transform that leaves coordinates unchanged
    pub fn identity() -> Self {
        Self { steps: None }
    }

    pub fn is_identity(&self) -> bool {
        self.steps.is_none()
    }

    /// Transform a single coordinate pair
    pub fn transform(&self, x: f64, y: f64) -> (f64, f64) {
        match self.steps {
            None => (x, y),
            Some((src, dst)) => {
                let (lon, lat) = src.inverse(x, y);
                dst.forward(lon, lat)
            }
        }
    }
}

/// Parse an EPSG code into UTM zone info: `Some((zone, is_north))`.
///
/// - EPSG 326xx → zone xx, North hemisphere
/// - EPSG 327xx → zone xx, South hemisphere
fn parse_utm_epsg(epsg: u32) -> Option<(u32, bool)> {
    if (32601..=32660).contains(&epsg) {
        Some((epsg - 32600, true))
    } else if (32701..=32760).contains(&epsg) {
        Some((epsg - 32700, false))
    } else {
        None
    }
}

fn central_meridian(zone: u32) -> f64 {
    ((zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians()
}

// ── Web Mercator (spherical, EPSG:3857) ──────────────────────────────────

fn wgs84_to_web_mercator(lon_deg: f64, lat_deg: f64) -> (f64, f64) {
    let x = A * lon_deg.to_radians();
    let y = A * (FRAC_PI_4 + lat_deg.to_radians() / 2.0).tan().ln();
    (x, y)
}

fn web_mercator_to_wgs84(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / A).to_degrees();
    let lat = (2.0 * (y / A).exp().atan() - 2.0 * FRAC_PI_4).to_degrees();
    (lon, lat)
}

// ── Transverse Mercator (Snyder 1987, pp. 61-64) ─────────────────────────

/// Convert WGS84 (longitude, latitude) in degrees to UTM (easting, northing)
/// in metres for the given zone and hemisphere.
fn wgs84_to_utm(lon_deg: f64, lat_deg: f64, zone: u32, north: bool) -> (f64, f64) {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    let lon0 = central_meridian(zone);

    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let tan_lat = lat.tan();

    let n = A / (1.0 - E2 * sin_lat * sin_lat).sqrt();
    let t = tan_lat * tan_lat;
    let c = E_PRIME2 * cos_lat * cos_lat;
    let a_coeff = cos_lat * (lon - lon0);

    let m = meridional_arc(lat);

    let a2 = a_coeff * a_coeff;
    let a4 = a2 * a2;
    let a6 = a4 * a2;

    // Snyder eq. 8-9
    let easting = K0 * n
        * (a_coeff
            + (1.0 - t + c) * a2 * a_coeff / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * E_PRIME2) * a4 * a_coeff / 120.0)
        + FALSE_EASTING;

    // Snyder eq. 8-10
    let northing = K0
        * (m + n
            * tan_lat
            * (a2 / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * E_PRIME2) * a6 / 720.0));

    let northing = if north {
        northing
    } else {
        northing + FALSE_NORTHING_SOUTH
    };

    (easting, northing)
}

/// Inverse of [`wgs84_to_utm`]: UTM metres to WGS84 degrees.
/// Snyder eqs. 8-18 to 8-25.
fn utm_to_wgs84(easting: f64, northing: f64, zone: u32, north: bool) -> (f64, f64) {
    let x = easting - FALSE_EASTING;
    let y = if north {
        northing
    } else {
        northing - FALSE_NORTHING_SOUTH
    };
    let lon0 = central_meridian(zone);

    let e4 = E2 * E2;
    let e6 = e4 * E2;
    let m = y / K0;
    let mu = m / (A * (1.0 - E2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

    let sqrt_1_e2 = (1.0 - E2).sqrt();
    let e1 = (1.0 - sqrt_1_e2) / (1.0 + sqrt_1_e2);
    let e1_2 = e1 * e1;
    let e1_3 = e1_2 * e1;
    let e1_4 = e1_3 * e1;

    // Footpoint latitude
    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();

    let c1 = E_PRIME2 * cos_phi1 * cos_phi1;
    let t1 = tan_phi1 * tan_phi1;
    let denom = 1.0 - E2 * sin_phi1 * sin_phi1;
    let n1 = A / denom.sqrt();
    let r1 = A * (1.0 - E2) / denom.powf(1.5);
    let d = x / (n1 * K0);

    let d2 = d * d;
    let d3 = d2 * d;
    let d4 = d3 * d;
    let d5 = d4 * d;
    let d6 = d5 * d;

    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d2 / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * E_PRIME2) * d4 / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                    - 252.0 * E_PRIME2
                    - 3.0 * c1 * c1)
                    * d6
                    / 720.0);

    let lon = lon0
        + (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * E_PRIME2 + 24.0 * t1 * t1)
                * d5
                / 120.0)
            / cos_phi1;

    (lon.to_degrees(), lat.to_degrees())
}

/// Meridional arc from equator to latitude `lat` (radians).
/// Snyder eq. 3-21.
fn meridional_arc(lat: f64) -> f64 {
    let e2 = E2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    A * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
        - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}
