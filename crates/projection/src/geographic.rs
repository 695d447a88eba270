//! Geographic longitude/latitude in degrees.

use crate::Point;

/// Plain lon/lat coordinates. The pivot every other projection converts
/// through, so forward and inverse are identities.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Geographic;

impl Geographic {
    pub fn forward(&self, lon: f64, lat: f64) -> Option<Point> {
        (lon.is_finite() && lat.is_finite()).then_some((lon, lat))
    }

    pub fn inverse(&self, x: f64, y: f64) -> Option<Point> {
        self.forward(x, y)
    }
}
