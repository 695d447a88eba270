//! Polygon geometries made of point rings.

use projection::{Point, TransformPipeline};
use raster_common::{BoundingBox, Result};
use serde::{Deserialize, Serialize};

/// An ordered sequence of rings of (x, y) points.
///
/// A ring's first and last points are implicitly joined; an explicitly
/// repeated closing point is accepted. Self-intersecting rings are used as
/// given. Coverage is decided by the even-odd rule across all rings, so a
/// ring nested inside another cuts a hole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub rings: Vec<Vec<Point>>,
}

impl Geometry {
    pub fn new(rings: Vec<Vec<Point>>) -> Self {
        Self { rings }
    }

    /// Single-ring polygon.
    pub fn polygon(ring: Vec<Point>) -> Self {
        Self { rings: vec![ring] }
    }

    /// Axis-aligned rectangle.
    pub fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::polygon(vec![
            (min_x, min_y),
            (max_x, min_y),
            (max_x, max_y),
            (min_x, max_y),
        ])
    }

    /// True when there are no rings at all.
    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.rings.iter().map(Vec::len).sum()
    }

    /// Bounding box of every vertex, or `None` without vertices.
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.rings.iter().flatten().copied())
    }

    /// Every vertex passed through `pipeline`, ring structure preserved.
    pub fn reproject(&self, pipeline: &TransformPipeline) -> Result<Geometry> {
        if pipeline.is_identity() {
            return Ok(self.clone());
        }
        let rings = self
            .rings
            .iter()
            .map(|ring| pipeline.apply_all(ring))
            .collect::<Result<Vec<_>>>()?;
        Ok(Geometry { rings })
    }

    /// Rings that can enclose area: explicit closing points removed, rings
    /// with fewer than three distinct vertices dropped.
    pub fn effective_rings(&self) -> Vec<Vec<Point>> {
        self.rings
            .iter()
            .filter_map(|ring| {
                let mut ring = ring.clone();
                if ring.len() > 1 && ring.first() == ring.last() {
                    ring.pop();
                }
                (distinct_vertices(&ring) >= 3).then_some(ring)
            })
            .collect()
    }
}

fn distinct_vertices(ring: &[Point]) -> usize {
    let mut keys: Vec<(u64, u64)> = ring
        .iter()
        .map(|(x, y)| (normalize_zero(*x).to_bits(), normalize_zero(*y).to_bits()))
        .collect();
    keys.sort_unstable();
    keys.dedup();
    keys.len()
}

fn normalize_zero(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else {
        v
    }
}

/// Number of ring edges crossed by a ray from `(x, y)` towards +x.
pub(crate) fn crossings(ring: &[Point], x: f64, y: f64) -> usize {
    let mut count = 0;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            count += 1;
        }
        j = i;
    }
    count
}

/// Even-odd containment across all `rings`.
pub(crate) fn contains(rings: &[Vec<Point>], x: f64, y: f64) -> bool {
    rings.iter().map(|r| crossings(r, x, y)).sum::<usize>() % 2 == 1
}
