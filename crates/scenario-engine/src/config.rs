//! Configuration for the scenario engine.

use raster_codec::Compression;
use serde::{Deserialize, Serialize};

/// Tuning knobs shared by the rasterizer, statistics and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of equal-width histogram buckets in a summary.
    pub histogram_buckets: usize,

    /// Scanned cells at which rasterization switches to parallel rows.
    pub parallel_threshold_cells: usize,

    /// Skip cells outside the geometry's bounding box before testing them.
    pub bbox_prefilter: bool,

    /// Strip compression used when exporting.
    pub default_compression: Compression,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            histogram_buckets: 10,
            parallel_threshold_cells: 65_536,
            bbox_prefilter: true,
            default_compression: Compression::None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("SCENARIO_HISTOGRAM_BUCKETS") {
            if let Ok(buckets) = val.parse() {
                config.histogram_buckets = buckets;
            }
        }

        if let Ok(val) = std::env::var("SCENARIO_PARALLEL_THRESHOLD") {
            if let Ok(cells) = val.parse() {
                config.parallel_threshold_cells = cells;
            }
        }

        if let Ok(val) = std::env::var("SCENARIO_BBOX_PREFILTER") {
            config.bbox_prefilter = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("SCENARIO_COMPRESSION") {
            if let Ok(compression) = val.parse() {
                config.default_compression = compression;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.histogram_buckets == 0 {
            return Err("histogram_buckets must be > 0".to_string());
        }

        if self.parallel_threshold_cells == 0 {
            return Err("parallel_threshold_cells must be > 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.histogram_buckets, 10);
        assert!(config.bbox_prefilter);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_buckets_rejected() {
        let config = EngineConfig {
            histogram_buckets: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("SCENARIO_HISTOGRAM_BUCKETS", "4");
        std::env::set_var("SCENARIO_BBOX_PREFILTER", "false");
        std::env::set_var("SCENARIO_COMPRESSION", "packbits");
        let config = EngineConfig::from_env();
        std::env::remove_var("SCENARIO_HISTOGRAM_BUCKETS");
        std::env::remove_var("SCENARIO_BBOX_PREFILTER");
        std::env::remove_var("SCENARIO_COMPRESSION");

        assert_eq!(config.histogram_buckets, 4);
        assert!(!config.bbox_prefilter);
        assert_eq!(config.default_compression, Compression::PackBits);
        assert_eq!(config.parallel_threshold_cells, 65_536);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: EngineConfig = serde_yaml::from_str("histogram_buckets: 20\n").unwrap();
        assert_eq!(config.histogram_buckets, 20);
        assert_eq!(config.default_compression, Compression::None);
    }
}
