//! Reprojection between WGS84 and UTM zones.
//!
//! Forward and inverse transverse Mercator on the WGS84 ellipsoid using the
//! series expansions in Snyder, "Map Projections: A Working Manual" (1987),
//! pp. 61-64. Accuracy is well below a centimetre inside a zone, which is
//! far tighter than the synthetic data needs.

use crate::crs::{SourceCrs, UtmZone};
use crate::error::{Result, SynthError};
use constants::coordinate_system::{
    UTM_FALSE_EASTING, UTM_FALSE_NORTHING_SOUTH, UTM_SCALE_FACTOR, WGS84_INV_FLATTENING,
    WGS84_SEMI_MAJOR,
};
use geo::{Coord, Geometry, MapCoords};

/// Coordinate reprojection capability.
pub trait Projector: Send + Sync {
    /// Project one coordinate from `from` into `to`.
    fn project(&self, coord: Coord<f64>, from: SourceCrs, to: SourceCrs) -> Result<Coord<f64>>;

    /// Project every coordinate of a geometry.
    fn project_geometry(
        &self,
        geometry: &Geometry<f64>,
        from: SourceCrs,
        to: SourceCrs,
    ) -> Result<Geometry<f64>> {
        if from == to {
            return Ok(geometry.clone());
        }
        geometry.try_map_coords(|coord| self.project(coord, from, to))
    }
}

/// WGS84 ellipsoid transverse Mercator, as used by every UTM zone.
#[derive(Debug, Clone, Copy)]
pub struct TransverseMercator {
    a: f64,
    e2: f64,
    ep2: f64,
    k0: f64,
}

impl Default for TransverseMercator {
    fn default() -> Self {
        let f = 1.0 / WGS84_INV_FLATTENING;
        let e2 = f * (2.0 - f);
        Self {
            a: WGS84_SEMI_MAJOR,
            e2,
            ep2: e2 / (1.0 - e2),
            k0: UTM_SCALE_FACTOR,
        }
    }
}

impl TransverseMercator {
    /// Meridian arc length from the equator to latitude `phi` (radians).
    fn meridian_arc(&self, phi: f64) -> f64 {
        let e2 = self.e2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        self.a
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
    }

    /// Longitude/latitude degrees to UTM easting/northing.
    pub fn forward(&self, lon: f64, lat: f64, zone: UtmZone) -> Coord<f64> {
        let phi = lat.to_radians();
        let dlambda = (lon - zone.central_meridian()).to_radians();

        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = phi.tan();
        let n = self.a / (1.0 - self.e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = self.ep2 * cos_phi * cos_phi;
        let a = dlambda * cos_phi;
        let m = self.meridian_arc(phi);

        let a2 = a * a;
        let a3 = a2 * a;
        let a4 = a3 * a;
        let a5 = a4 * a;
        let a6 = a5 * a;

        let x = self.k0
            * n
            * (a + (1.0 - t + c) * a3 / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * self.ep2) * a5 / 120.0);
        let y = self.k0
            * (m + n
                * tan_phi
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * self.ep2) * a6 / 720.0));

        let false_northing = if zone.north {
            0.0
        } else {
            UTM_FALSE_NORTHING_SOUTH
        };
        Coord {
            x: x + UTM_FALSE_EASTING,
            y: y + false_northing,
        }
    }

    /// UTM easting/northing to longitude/latitude degrees.
    pub fn inverse(&self, easting: f64, northing: f64, zone: UtmZone) -> Coord<f64> {
        let e2 = self.e2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let x = easting - UTM_FALSE_EASTING;
        let y = if zone.north {
            northing
        } else {
            northing - UTM_FALSE_NORTHING_SOUTH
        };

        let m = y / self.k0;
        let mu = m / (self.a * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));
        let sqrt_1e2 = (1.0 - e2).sqrt();
        let e1 = (1.0 - sqrt_1e2) / (1.0 + sqrt_1e2);
        let e1_2 = e1 * e1;
        let e1_3 = e1_2 * e1;
        let e1_4 = e1_3 * e1;

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

        let (sin_phi1, cos_phi1) = phi1.sin_cos();
        let tan_phi1 = phi1.tan();
        let c1 = self.ep2 * cos_phi1 * cos_phi1;
        let t1 = tan_phi1 * tan_phi1;
        let denom = 1.0 - e2 * sin_phi1 * sin_phi1;
        let n1 = self.a / denom.sqrt();
        let r1 = self.a * (1.0 - e2) / denom.powf(1.5);
        let d = x / (n1 * self.k0);

        let d2 = d * d;
        let d3 = d2 * d;
        let d4 = d3 * d;
        let d5 = d4 * d;
        let d6 = d5 * d;

        let phi = phi1
            - (n1 * tan_phi1 / r1)
                * (d2 / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * self.ep2) * d4 / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * self.ep2
                        - 3.0 * c1 * c1)
                        * d6
                        / 720.0);
        let lambda = (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * self.ep2 + 24.0 * t1 * t1)
                * d5
                / 120.0)
            / cos_phi1;

        Coord {
            x: zone.central_meridian() + lambda.to_degrees(),
            y: phi.to_degrees(),
        }
    }
}

impl Projector for TransverseMercator {
    fn project(&self, coord: Coord<f64>, from: SourceCrs, to: SourceCrs) -> Result<Coord<f64>> {
        match (from, to) {
            _ if from == to => Ok(coord),
            (SourceCrs::Wgs84, SourceCrs::Utm(zone)) => Ok(self.forward(coord.x, coord.y, zone)),
            (SourceCrs::Utm(zone), SourceCrs::Wgs84) => Ok(self.inverse(coord.x, coord.y, zone)),
            (SourceCrs::Utm(src), SourceCrs::Utm(dst)) => {
                let geographic = self.inverse(coord.x, coord.y, src);
                Ok(self.forward(geographic.x, geographic.y, dst))
            }
            _ => Err(SynthError::UnsupportedCrs(format!(
                "no transform from {} to {}",
                from, to
            ))),
        }
    }
}
