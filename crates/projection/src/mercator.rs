//! Spherical Web Mercator (EPSG:3857).

use std::f64::consts::PI;

use crate::Point;

/// Semi-major axis of WGS84, used as the sphere radius by Web Mercator.
pub const WGS84_RADIUS: f64 = 6_378_137.0;

/// Spherical Mercator as used by web map tiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebMercator {
    /// Sphere radius in meters.
    pub radius: f64,
}

impl WebMercator {
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }

    /// Project lon/lat degrees to meters.
    ///
    /// Returns `None` at or beyond the poles, which have no Mercator image.
    pub fn forward(&self, lon: f64, lat: f64) -> Option<Point> {
        if !lon.is_finite() || !lat.is_finite() || lat.abs() >= 90.0 {
            return None;
        }
        let x = self.radius * lon.to_radians();
        let y = self.radius * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
        Some((x, y))
    }

    /// Meters back to lon/lat degrees.
    pub fn inverse(&self, x: f64, y: f64) -> Option<Point> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let lon = (x / self.radius).to_degrees();
        let lat = (2.0 * (y / self.radius).exp().atan() - PI / 2.0).to_degrees();
        Some((lon, lat))
    }
}

impl Default for WebMercator {
    fn default() -> Self {
        Self::new(WGS84_RADIUS)
    }
}
