//! Coordinate Reference System handling

mod transform;

pub use transform::CrsTransform;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    /// WKT representation (primary)
    wkt: Option<String>,
    /// EPSG code if known
    epsg: Option<u32>,
    /// PROJ string if available
    proj: Option<String>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            wkt: None,
            epsg: Some(code),
            proj: None,
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            wkt: Some(wkt.into()),
            epsg: None,
            proj: None,
        }
    }

    /// Create a CRS from a PROJ string
    pub fn from_proj(proj: impl Into<String>) -> Self {
        Self {
            wkt: None,
            epsg: None,
            proj: Some(proj.into()),
        }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self::from_epsg(3857)
    }

    /// WGS84 / UTM zone (EPSG:326xx north, 327xx south)
    pub fn utm(zone: u32, north: bool) -> Self {
        let base = if north { 32600 } else { 32700 };
        Self::from_epsg(base + zone)
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Whether coordinates are angular (degrees) rather than planar.
    ///
    /// Planar areas computed in a geographic CRS are in square degrees and
    /// meaningless as surface areas. EPSG codes are looked up in the EPSG
    /// registry; WKT (1 and 2) and PROJ strings are read directly. `None`
    /// when the CRS cannot be classified: an unregistered code, a geocentric
    /// or vertical CRS, or an unrecognized definition.
    pub fn is_geographic(&self) -> Option<bool> {
        if let Some(code) = self.epsg {
            return epsg_is_geographic(code);
        }
        if let Some(wkt) = &self.wkt {
            let normalized: String = wkt
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_ascii_uppercase();
            return wkt_is_geographic(&normalized);
        }
        if let Some(proj) = &self.proj {
            return proj_is_geographic(proj);
        }
        None
    }

    /// Check if two CRS are equivalent
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        // Simple check: if both have EPSG codes, compare them
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }

        // If both have WKT, compare (this is imperfect)
        if let (Some(a), Some(b)) = (&self.wkt, &other.wkt) {
            return a == b;
        }

        // If both have PROJ, compare
        if let (Some(a), Some(b)) = (&self.proj, &other.proj) {
            return a == b;
        }

        false
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(proj) = &self.proj {
            return proj.clone();
        }
        if let Some(wkt) = &self.wkt {
            // Return first 50 chars of WKT
            let end = wkt
                .char_indices()
                .nth(50)
                .map(|(i, _)| i)
                .unwrap_or(wkt.len());
            return format!("WKT:{}", &wkt[..end]);
        }
        "Unknown".to_string()
    }
}

/// Horizontal CRS keywords that can open a nested definition
const HORIZONTAL_WKT: [&str; 8] = [
    "PROJCS[",
    "PROJCRS[",
    "PROJECTEDCRS[",
    "GEOGCS[",
    "GEOGCRS[",
    "GEOGRAPHICCRS[",
    "GEODCRS[",
    "GEODETICCRS[",
];

fn epsg_is_geographic(code: u32) -> Option<bool> {
    // Legacy Google code for Web Mercator, outside the registry range
    let code = if code == 900913 { 3857 } else { code };
    let def = crs_definitions::from_code(u16::try_from(code).ok()?)?;
    proj_is_geographic(def.proj4)
}

/// `wkt` must be uppercase with whitespace removed
fn wkt_is_geographic(wkt: &str) -> Option<bool> {
    let (keyword, body) = wkt.split_once('[')?;
    match keyword {
        "GEOGCS" | "GEOGCRS" | "GEOGRAPHICCRS" => Some(true),
        // WKT2 geodetic CRSs are geographic with an ellipsoidal CS and
        // geocentric with a Cartesian one
        "GEODCRS" | "GEODETICCRS" => body.contains("CS[ELLIPSOIDAL").then_some(true),
        "PROJCS" | "PROJCRS" | "PROJECTEDCRS" => Some(false),
        "COMPD_CS" | "COMPOUNDCRS" | "BOUNDCRS" => {
            let nested = HORIZONTAL_WKT
                .iter()
                .filter_map(|k| body.find(k))
                .min()?;
            wkt_is_geographic(&body[nested..])
        }
        _ => None,
    }
}

fn proj_is_geographic(proj: &str) -> Option<bool> {
    let mut init = None;
    for token in proj.split_whitespace() {
        if let Some(name) = token.strip_prefix("+proj=") {
            return match name {
                "longlat" | "latlong" | "lonlat" | "latlon" => Some(true),
                "geocent" => None,
                _ => Some(false),
            };
        }
        if let Some(code) = token
            .strip_prefix("+init=epsg:")
            .or_else(|| token.strip_prefix("+init=EPSG:"))
        {
            init = code.parse().ok();
        }
    }
    init.and_then(epsg_is_geographic)
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for CRS {
    fn default() -> Self {
        Self::wgs84()
    }
}
