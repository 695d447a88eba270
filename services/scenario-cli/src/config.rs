//! Loading scenario, geometry and engine configuration files.
//!
//! Scenario and geometry files are YAML or JSON, chosen by extension. A
//! scenario file may carry extra CRS definitions that are registered
//! before any edit is evaluated:
//!
//! ```yaml
//! name: raise the levee
//! crs_definitions:
//!   LOCAL:SITE:
//!     type: affine
//!     coefficients: [500000, 1000, 0, 4000000, 0, 1000]
//! edits:
//!   - crs: LOCAL:SITE
//!     geometry:
//!       rings: [[[0, 0], [2, 0], [2, 2], [0, 2]]]
//!     rule:
//!       type: add_delta
//!       delta: 1.5
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use projection::{CrsRegistry, ProjectionParams};
use scenario_engine::{EngineConfig, Geometry, Scenario};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A scenario plus the CRS definitions it relies on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioFile {
    #[serde(flatten)]
    pub scenario: Scenario,

    #[serde(default)]
    pub crs_definitions: BTreeMap<String, ProjectionParams>,
}

/// A geometry tagged with the CRS its coordinates are in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryFile {
    pub crs: String,

    #[serde(flatten)]
    pub geometry: Geometry,

    #[serde(default)]
    pub crs_definitions: BTreeMap<String, ProjectionParams>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Yaml,
    Json,
}

impl FileFormat {
    fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "yaml" | "yml" => Ok(FileFormat::Yaml),
            "json" => Ok(FileFormat::Json),
            _ => bail!(
                "Unsupported file extension for {} (expected .yaml, .yml or .json)",
                path.display()
            ),
        }
    }
}

fn parse_file<T: DeserializeOwned>(path: &Path, contents: &str) -> Result<T> {
    match FileFormat::from_path(path)? {
        FileFormat::Yaml => {
            serde_yaml::from_str(contents).with_context(|| format!("Failed to parse YAML file: {}", path.display()))
        }
        FileFormat::Json => {
            serde_json::from_str(contents).with_context(|| format!("Failed to parse JSON file: {}", path.display()))
        }
    }
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Load a scenario file.
pub async fn load_scenario(path: &Path) -> Result<ScenarioFile> {
    let file: ScenarioFile = parse_file(path, &read_text(path).await?)?;
    info!(
        path = %path.display(),
        scenario = file.scenario.name(),
        edits = file.scenario.edits().len(),
        crs_definitions = file.crs_definitions.len(),
        "Loaded scenario"
    );
    Ok(file)
}

/// Load a geometry file.
pub async fn load_geometry(path: &Path) -> Result<GeometryFile> {
    let file: GeometryFile = parse_file(path, &read_text(path).await?)?;
    debug!(path = %path.display(), crs = %file.crs, rings = file.geometry.rings.len(), "Loaded geometry");
    Ok(file)
}

/// Built-in CRSs plus `definitions`, in key order.
pub fn build_registry(definitions: &BTreeMap<String, ProjectionParams>) -> Result<CrsRegistry> {
    let mut registry = CrsRegistry::with_defaults();
    for (id, params) in definitions {
        registry
            .register_params(id, params)
            .with_context(|| format!("Invalid CRS definition '{}'", id))?;
    }
    Ok(registry)
}

/// Engine configuration from the environment, with an optional YAML file
/// overriding the keys it sets.
pub async fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    let base = EngineConfig::from_env();
    let Some(path) = path else {
        return Ok(base);
    };

    let overrides: serde_yaml::Value = serde_yaml::from_str(&read_text(path).await?)
        .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;
    let merged = merge_yaml(serde_yaml::to_value(&base)?, overrides);
    let config: EngineConfig =
        serde_yaml::from_value(merged).with_context(|| format!("Invalid engine configuration in {}", path.display()))?;

    info!(path = %path.display(), "Loaded engine configuration");
    Ok(config)
}

fn merge_yaml(base: serde_yaml::Value, overrides: serde_yaml::Value) -> serde_yaml::Value {
    match (base, overrides) {
        (serde_yaml::Value::Mapping(mut base), serde_yaml::Value::Mapping(overrides)) => {
            for (key, value) in overrides {
                base.insert(key, value);
            }
            serde_yaml::Value::Mapping(base)
        }
        (base, serde_yaml::Value::Null) => base,
        (_, overrides) => overrides,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenario_engine::ValueRule;

    #[test]
    fn test_file_format_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a.yaml")).unwrap(), FileFormat::Yaml);
        assert_eq!(FileFormat::from_path(Path::new("a.YML")).unwrap(), FileFormat::Yaml);
        assert_eq!(FileFormat::from_path(Path::new("a.json")).unwrap(), FileFormat::Json);
        assert!(FileFormat::from_path(Path::new("a.toml")).is_err());
        assert!(FileFormat::from_path(Path::new("scenario")).is_err());
    }

    #[test]
    fn test_parse_scenario_with_crs_definitions() {
        let yaml = r#"
name: site
crs_definitions:
  LOCAL:SITE:
    type: affine
    coefficients: [0, 2, 0, 0, 0, 2]
edits:
  - crs: LOCAL:SITE
    geometry:
      rings: [[[0, 0], [1, 0], [1, 1]]]
    rule:
      type: set_constant
      value: 3
"#;
        let file: ScenarioFile = parse_file(Path::new("s.yaml"), yaml).unwrap();
        assert_eq!(file.scenario.name(), "site");
        assert_eq!(file.scenario.edits()[0].rule, ValueRule::SetConstant { value: 3.0 });

        let registry = build_registry(&file.crs_definitions).unwrap();
        assert!(registry.contains("local:site"));
    }

    #[test]
    fn test_parse_json_geometry() {
        let json = r#"{"crs": "EPSG:4326", "rings": [[[0, 0], [1, 0], [1, 1]]]}"#;
        let file: GeometryFile = parse_file(Path::new("g.json"), json).unwrap();
        assert_eq!(file.crs, "EPSG:4326");
        assert_eq!(file.geometry.vertex_count(), 3);
    }

    #[test]
    fn test_invalid_crs_definition() {
        let mut definitions = BTreeMap::new();
        definitions.insert(
            "BAD".to_string(),
            ProjectionParams::Affine {
                coefficients: [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            },
        );
        let err = build_registry(&definitions).unwrap_err();
        assert!(err.to_string().contains("BAD"));
    }

    #[test]
    fn test_merge_keeps_unset_keys() {
        let base = serde_yaml::to_value(EngineConfig::default()).unwrap();
        let overrides: serde_yaml::Value = serde_yaml::from_str("histogram_buckets: 4").unwrap();
        let config: EngineConfig = serde_yaml::from_value(merge_yaml(base, overrides)).unwrap();
        assert_eq!(config.histogram_buckets, 4);
        assert!(config.bbox_prefilter);
    }
}
