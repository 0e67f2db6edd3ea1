//! Working frame selection.
//!
//! The working frame is the WGS84 / UTM zone containing the AOI centroid.
//! Zone numbers come straight from `floor((lon + 180) / 6) + 1`, so a
//! centroid at exactly 180° lands in zone 61; that seam is left as is.

use crate::error::{Result, SynthError};
use constants::coordinate_system::{
    UTM_MAX_ZONE, UTM_NORTH_PREFIX, UTM_SOUTH_PREFIX, UTM_ZONE_WIDTH_DEG, WGS84_EPSG,
};
use std::fmt;

/// Pick the UTM EPSG code for a WGS84 longitude/latitude in degrees.
pub fn utm_epsg_for(lon: f64, lat: f64) -> u32 {
    let zone = ((lon + 180.0) / UTM_ZONE_WIDTH_DEG).floor() as i64 + 1;
    let hemisphere = if lat >= 0.0 {
        UTM_NORTH_PREFIX
    } else {
        UTM_SOUTH_PREFIX
    };
    (hemisphere as i64 * 100 + zone) as u32
}

/// Zone number and hemisphere decoded from a 326xx/327xx EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtmZone {
    pub zone: u32,
    pub north: bool,
}

impl UtmZone {
    pub fn from_epsg(epsg: u32) -> Result<Self> {
        let prefix = epsg / 100;
        let zone = epsg % 100;
        if zone == 0 || zone > UTM_MAX_ZONE {
            return Err(SynthError::UnsupportedCrs(format!("EPSG:{epsg}")));
        }
        match prefix {
            UTM_NORTH_PREFIX => Ok(Self { zone, north: true }),
            UTM_SOUTH_PREFIX => Ok(Self { zone, north: false }),
            _ => Err(SynthError::UnsupportedCrs(format!("EPSG:{epsg}"))),
        }
    }

    pub fn epsg(&self) -> u32 {
        let prefix = if self.north {
            UTM_NORTH_PREFIX
        } else {
            UTM_SOUTH_PREFIX
        };
        prefix * 100 + self.zone
    }

    /// Central meridian in degrees.
    pub fn central_meridian(&self) -> f64 {
        -183.0 + UTM_ZONE_WIDTH_DEG * self.zone as f64
    }
}

/// Coordinate system a feature set is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceCrs {
    /// Geographic longitude/latitude degrees.
    Wgs84,
    /// A WGS84 / UTM zone.
    Utm(UtmZone),
    /// Already metric and in the working frame; never reprojected.
    Local(u32),
}

impl SourceCrs {
    /// Interpret an EPSG code as a source CRS.
    pub fn from_epsg(epsg: u32) -> Result<Self> {
        if epsg == WGS84_EPSG {
            return Ok(SourceCrs::Wgs84);
        }
        UtmZone::from_epsg(epsg).map(SourceCrs::Utm)
    }

    /// Parse the names GeoJSON files carry in their legacy `crs` member.
    pub fn from_name(name: &str) -> Result<Self> {
        let upper = name.trim().to_ascii_uppercase();
        if upper.ends_with("CRS84") {
            return Ok(SourceCrs::Wgs84);
        }
        let code = upper
            .rsplit(':')
            .next()
            .and_then(|tail| tail.parse::<u32>().ok())
            .ok_or_else(|| SynthError::UnsupportedCrs(name.to_string()))?;
        Self::from_epsg(code)
    }

    pub fn epsg(&self) -> u32 {
        match self {
            SourceCrs::Wgs84 => WGS84_EPSG,
            SourceCrs::Utm(zone) => zone.epsg(),
            SourceCrs::Local(epsg) => *epsg,
        }
    }
}

impl fmt::Display for SourceCrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceCrs::Local(epsg) => write!(f, "EPSG:{} (local frame)", epsg),
            other => write!(f, "EPSG:{}", other.epsg()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_and_hemisphere_selection() {
        assert_eq!(utm_epsg_for(3.0, 45.0), 32631);
        assert_eq!(utm_epsg_for(116.4, 39.9), 32650);
        assert_eq!(utm_epsg_for(-70.6, -33.4), 32719);
        // The equator belongs to the northern hemisphere.
        assert_eq!(utm_epsg_for(0.0, 0.0), 32631);
    }

    #[test]
    fn seam_follows_floor_division() {
        assert_eq!(utm_epsg_for(-180.0, 10.0), 32601);
        assert_eq!(utm_epsg_for(179.999, 10.0), 32660);
        assert_eq!(utm_epsg_for(180.0, 10.0), 32661);
    }

    #[test]
    fn decodes_epsg_codes() {
        let zone = UtmZone::from_epsg(32719).unwrap();
        assert_eq!(zone, UtmZone { zone: 19, north: false });
        assert_eq!(zone.central_meridian(), -69.0);
        assert_eq!(zone.epsg(), 32719);
        assert!(UtmZone::from_epsg(32600).is_err());
        assert!(UtmZone::from_epsg(3857).is_err());
    }

    #[test]
    fn parses_geojson_crs_names() {
        assert_eq!(
            SourceCrs::from_name("urn:ogc:def:crs:OGC:1.3:CRS84").unwrap(),
            SourceCrs::Wgs84
        );
        assert_eq!(SourceCrs::from_name("EPSG:4326").unwrap(), SourceCrs::Wgs84);
        assert_eq!(
            SourceCrs::from_name("urn:ogc:def:crs:EPSG::32650")
                .unwrap()
                .epsg(),
            32650
        );
        assert!(SourceCrs::from_name("EPSG:3857").is_err());
        assert!(SourceCrs::from_name("nonsense").is_err());
    }
}
