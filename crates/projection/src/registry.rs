//! Injectable registry of known coordinate reference systems.

use std::collections::HashMap;
use std::sync::Arc;

use raster_common::{Result, ScenarioError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::lambert::NCEP_EARTH_RADIUS;
use crate::mercator::WGS84_RADIUS;
use crate::{AffineProjection, Geographic, LambertConformal, Point, WebMercator};

/// Serializable projection parameters, as supplied by a caller or a
/// scenario file.
///
/// ```yaml
/// type: lambert_conformal
/// lat0: 38.5
/// lon0: -97.5
/// latin1: 38.5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProjectionParams {
    /// Longitude/latitude in degrees.
    Geographic,
    /// Spherical Web Mercator.
    WebMercator {
        #[serde(default = "default_mercator_radius")]
        radius: f64,
    },
    /// Spherical Lambert Conformal Conic; `latin2` defaults to `latin1`.
    LambertConformal {
        lat0: f64,
        lon0: f64,
        latin1: f64,
        #[serde(default)]
        latin2: Option<f64>,
        #[serde(default)]
        false_easting: f64,
        #[serde(default)]
        false_northing: f64,
        #[serde(default = "default_lambert_radius")]
        radius: f64,
    },
    /// Affine map from lon/lat, GDAL coefficient order.
    Affine { coefficients: [f64; 6] },
}

fn default_mercator_radius() -> f64 {
    WGS84_RADIUS
}

fn default_lambert_radius() -> f64 {
    NCEP_EARTH_RADIUS
}

impl ProjectionParams {
    /// Validate the parameters and precompute projection constants.
    pub fn build(&self) -> Result<CrsDefinition> {
        match self {
            ProjectionParams::Geographic => Ok(CrsDefinition::Geographic(Geographic)),
            ProjectionParams::WebMercator { radius } => {
                if !(radius.is_finite() && *radius > 0.0) {
                    return Err(ScenarioError::invalid_projection(format!(
                        "mercator radius must be positive, got {}",
                        radius
                    )));
                }
                Ok(CrsDefinition::WebMercator(WebMercator::new(*radius)))
            }
            ProjectionParams::LambertConformal {
                lat0,
                lon0,
                latin1,
                latin2,
                false_easting,
                false_northing,
                radius,
            } => LambertConformal::new(
                *lat0,
                *lon0,
                *latin1,
                latin2.unwrap_or(*latin1),
                *false_easting,
                *false_northing,
                *radius,
            )
            .map(CrsDefinition::LambertConformal),
            ProjectionParams::Affine { coefficients } => {
                AffineProjection::new(*coefficients).map(CrsDefinition::Affine)
            }
        }
    }
}

/// A resolved projection, ready to convert coordinates to and from the
/// geographic pivot.
#[derive(Debug, Clone, PartialEq)]
pub enum CrsDefinition {
    Geographic(Geographic),
    WebMercator(WebMercator),
    LambertConformal(LambertConformal),
    Affine(AffineProjection),
}

impl CrsDefinition {
    /// Native coordinates to lon/lat degrees.
    pub fn to_geographic(&self, x: f64, y: f64) -> Option<Point> {
        match self {
            CrsDefinition::Geographic(p) => p.inverse(x, y),
            CrsDefinition::WebMercator(p) => p.inverse(x, y),
            CrsDefinition::LambertConformal(p) => p.inverse(x, y),
            CrsDefinition::Affine(p) => p.inverse(x, y),
        }
    }

    /// Lon/lat degrees to native coordinates.
    pub fn from_geographic(&self, lon: f64, lat: f64) -> Option<Point> {
        match self {
            CrsDefinition::Geographic(p) => p.forward(lon, lat),
            CrsDefinition::WebMercator(p) => p.forward(lon, lat),
            CrsDefinition::LambertConformal(p) => p.forward(lon, lat),
            CrsDefinition::Affine(p) => p.forward(lon, lat),
        }
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsDefinition::Geographic(_))
    }

    /// Short name of the projection family.
    pub fn kind(&self) -> &'static str {
        match self {
            CrsDefinition::Geographic(_) => "geographic",
            CrsDefinition::WebMercator(_) => "web_mercator",
            CrsDefinition::LambertConformal(_) => "lambert_conformal",
            CrsDefinition::Affine(_) => "affine",
        }
    }
}

/// Maps CRS identifiers to projection definitions.
///
/// Identifiers are matched case-insensitively after trimming, so
/// `epsg:4326` and `EPSG:4326` resolve to the same entry. Lookups of
/// anything not registered fail closed with `UnknownCrs`.
#[derive(Debug, Clone, Default)]
pub struct CrsRegistry {
    entries: HashMap<String, Arc<CrsDefinition>>,
}

impl CrsRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the common web-mapping CRSs.
    ///
    /// - `EPSG:4326` (alias `CRS:84`)
    /// - `EPSG:4269`, treated as geographic without a datum shift
    /// - `EPSG:3857` (alias `EPSG:900913`)
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let geographic = Arc::new(CrsDefinition::Geographic(Geographic));
        let mercator = Arc::new(CrsDefinition::WebMercator(WebMercator::default()));

        for id in ["EPSG:4326", "CRS:84"] {
            registry.entries.insert(id.to_string(), geographic.clone());
        }
        registry.entries.insert(
            "EPSG:4269".to_string(),
            Arc::new(CrsDefinition::Geographic(Geographic)),
        );
        for id in ["EPSG:3857", "EPSG:900913"] {
            registry.entries.insert(id.to_string(), mercator.clone());
        }
        registry
    }

    fn normalize(id: &str) -> String {
        id.trim().to_uppercase()
    }

    /// Register (or replace) a definition under `id`.
    pub fn register(&mut self, id: &str, definition: CrsDefinition) -> Result<()> {
        let key = Self::normalize(id);
        if key.is_empty() {
            return Err(ScenarioError::invalid_projection("CRS identifier is empty"));
        }
        debug!(crs = %key, kind = definition.kind(), "Registered CRS");
        self.entries.insert(key, Arc::new(definition));
        Ok(())
    }

    /// Validate `params` and register the resulting definition.
    pub fn register_params(&mut self, id: &str, params: &ProjectionParams) -> Result<()> {
        let definition = params.build()?;
        self.register(id, definition)
    }

    /// Make `alias` resolve to the same definition as `target`.
    pub fn alias(&mut self, alias: &str, target: &str) -> Result<()> {
        let definition = self.resolve(target)?;
        let key = Self::normalize(alias);
        if key.is_empty() {
            return Err(ScenarioError::invalid_projection("CRS alias is empty"));
        }
        self.entries.insert(key, definition);
        Ok(())
    }

    /// Look up a definition, failing with `UnknownCrs`.
    pub fn resolve(&self, id: &str) -> Result<Arc<CrsDefinition>> {
        self.get(id).ok_or_else(|| ScenarioError::unknown_crs(id))
    }

    /// Look up a definition without failing.
    pub fn get(&self, id: &str) -> Option<Arc<CrsDefinition>> {
        self.entries.get(&Self::normalize(id)).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(&Self::normalize(id))
    }

    /// Registered identifiers, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let registry = CrsRegistry::with_defaults();
        assert!(registry.contains("EPSG:4326"));
        assert!(registry.contains("epsg:3857"));
        assert!(registry.contains(" crs:84 "));
        assert!(!registry.contains("EPSG:32633"));
        assert_eq!(registry.resolve("EPSG:900913").unwrap().kind(), "web_mercator");
    }

    #[test]
    fn test_unknown_fails_closed() {
        let registry = CrsRegistry::new();
        let err = registry.resolve("EPSG:4326").unwrap_err();
        assert_eq!(err, ScenarioError::UnknownCrs("EPSG:4326".to_string()));
    }

    #[test]
    fn test_register_and_alias() {
        let mut registry = CrsRegistry::new();
        registry
            .register_params(
                "LOCAL:SITE",
                &ProjectionParams::Affine {
                    coefficients: [0.0, 10.0, 0.0, 0.0, 0.0, 10.0],
                },
            )
            .unwrap();
        registry.alias("site", "local:site").unwrap();
        assert_eq!(registry.resolve("SITE").unwrap().kind(), "affine");
        assert_eq!(registry.ids(), vec!["LOCAL:SITE".to_string(), "SITE".to_string()]);

        assert_eq!(
            registry.alias("other", "missing").unwrap_err().kind(),
            "UnknownCRS"
        );
        assert!(registry.register("  ", CrsDefinition::Geographic(Geographic)).is_err());
    }

    #[test]
    fn test_degenerate_params_rejected() {
        let mut registry = CrsRegistry::new();
        let err = registry
            .register_params("BAD", &ProjectionParams::WebMercator { radius: 0.0 })
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidProjection");
        assert!(!registry.contains("BAD"));
    }

    #[test]
    fn test_params_from_yaml() {
        let params: ProjectionParams = serde_yaml::from_str(
            "type: lambert_conformal\nlat0: 38.5\nlon0: -97.5\nlatin1: 38.5\n",
        )
        .unwrap();
        match &params {
            ProjectionParams::LambertConformal {
                latin2, radius, ..
            } => {
                assert_eq!(*latin2, None);
                assert_eq!(*radius, NCEP_EARTH_RADIUS);
            }
            other => panic!("unexpected params {:?}", other),
        }
        assert_eq!(params.build().unwrap().kind(), "lambert_conformal");

        let geo: ProjectionParams = serde_yaml::from_str("type: geographic").unwrap();
        assert!(geo.build().unwrap().is_geographic());
    }
}
