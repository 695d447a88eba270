//! Lambert Conformal Conic projection (spherical).
//!
//! Maps a cone tangent or secant to the Earth's surface onto a flat plane.
//! Common for mid-latitude regional rasters.
//!
//! The projection parameters include:
//! - Origin latitude (lat0) and central meridian (lon0)
//! - Standard parallel(s): latin1 and latin2 (equal for a tangent cone)
//! - False easting / northing in meters
//! - Sphere radius

use std::f64::consts::PI;

use raster_common::{Result, ScenarioError};

use crate::Point;

/// Mean Earth radius used by NCEP grids.
pub const NCEP_EARTH_RADIUS: f64 = 6_371_229.0;

/// Lambert Conformal Conic parameters with precomputed cone constants.
#[derive(Debug, Clone, PartialEq)]
pub struct LambertConformal {
    /// Central meridian in radians
    pub lon0: f64,
    /// Latitude of origin in radians
    pub lat0: f64,
    /// First standard parallel in radians
    pub latin1: f64,
    /// Second standard parallel in radians
    pub latin2: f64,
    /// False easting (meters)
    pub false_easting: f64,
    /// False northing (meters)
    pub false_northing: f64,
    /// Sphere radius (meters)
    pub earth_radius: f64,
    /// Cone constant (n)
    n: f64,
    /// F constant
    f: f64,
    /// Rho at the latitude of origin
    rho0: f64,
}

impl LambertConformal {
    /// Build a projection from parameters in degrees.
    ///
    /// Fails with `InvalidProjection` when the standard parallels produce a
    /// degenerate cone (for example parallels symmetric about the equator, or
    /// a parallel at a pole).
    pub fn new(
        lat0_deg: f64,
        lon0_deg: f64,
        latin1_deg: f64,
        latin2_deg: f64,
        false_easting: f64,
        false_northing: f64,
        earth_radius: f64,
    ) -> Result<Self> {
        let to_rad = PI / 180.0;

        let lat0 = lat0_deg * to_rad;
        let lon0 = lon0_deg * to_rad;
        let latin1 = latin1_deg * to_rad;
        let latin2 = latin2_deg * to_rad;

        if !(earth_radius.is_finite() && earth_radius > 0.0) {
            return Err(ScenarioError::invalid_projection(format!(
                "lambert earth radius must be positive, got {}",
                earth_radius
            )));
        }

        // Compute cone constant n
        let n = if (latin1 - latin2).abs() < 1e-10 {
            // Tangent cone (single standard parallel)
            latin1.sin()
        } else {
            // Secant cone (two standard parallels)
            let ln_ratio = (latin1.cos() / latin2.cos()).ln();
            let tan_ratio =
                ((PI / 4.0 + latin2 / 2.0).tan() / (PI / 4.0 + latin1 / 2.0).tan()).ln();
            ln_ratio / tan_ratio
        };

        if !n.is_finite() || n.abs() < 1e-10 {
            return Err(ScenarioError::invalid_projection(format!(
                "lambert standard parallels {} / {} give a degenerate cone",
                latin1_deg, latin2_deg
            )));
        }

        let f = (latin1.cos() * (PI / 4.0 + latin1 / 2.0).tan().powf(n)) / n;
        let rho0 = earth_radius * f / (PI / 4.0 + lat0 / 2.0).tan().powf(n);

        if !f.is_finite() || f == 0.0 || !rho0.is_finite() {
            return Err(ScenarioError::invalid_projection(format!(
                "lambert parameters lat0={} latin1={} latin2={} are outside the projection domain",
                lat0_deg, latin1_deg, latin2_deg
            )));
        }

        Ok(Self {
            lon0,
            lat0,
            latin1,
            latin2,
            false_easting,
            false_northing,
            earth_radius,
            n,
            f,
            rho0,
        })
    }

    /// Cone constant.
    pub fn cone_constant(&self) -> f64 {
        self.n
    }

    /// Project lon/lat degrees to easting/northing meters.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> Option<Point> {
        let lat = lat_deg.to_radians();
        let lon = lon_deg.to_radians();

        // Normalize longitude difference to [-π, π]
        let mut dlon = lon - self.lon0;
        while dlon > PI {
            dlon -= 2.0 * PI;
        }
        while dlon < -PI {
            dlon += 2.0 * PI;
        }

        let rho = self.earth_radius * self.f / (PI / 4.0 + lat / 2.0).tan().powf(self.n);
        let theta = self.n * dlon;

        let x = self.false_easting + rho * theta.sin();
        let y = self.false_northing + self.rho0 - rho * theta.cos();

        (x.is_finite() && y.is_finite()).then_some((x, y))
    }

    /// Easting/northing meters back to lon/lat degrees.
    pub fn inverse(&self, x: f64, y: f64) -> Option<Point> {
        let dx = x - self.false_easting;
        let dy = self.rho0 - (y - self.false_northing);

        let sign = self.n.signum();
        let rho = sign * (dx * dx + dy * dy).sqrt();
        let theta = (sign * dx).atan2(sign * dy);

        let lat = 2.0 * ((self.earth_radius * self.f / rho).powf(1.0 / self.n)).atan() - PI / 2.0;
        let lon = self.lon0 + theta / self.n;

        let (lon, lat) = (lon.to_degrees(), lat.to_degrees());
        (lon.is_finite() && lat.is_finite()).then_some((lon, lat))
    }
}
