//! Routing configuration
//!
//! Loaded from JSON; every field has a default so an empty object is a valid
//! configuration.

use butterfly_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::tiles::check_zoom;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Zoom level of the network tiles.
    #[serde(default = "default_zoom")]
    pub zoom: u32,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub snap: SnapSettings,
    #[serde(default)]
    pub cache: CacheSettings,
}

/// Dijkstra limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Settled states after which a search gives up without a route.
    #[serde(default = "default_max_settled")]
    pub max_settled: usize,
    /// Edges of history handed to the cost function, for turn-cost prefixes.
    #[serde(default = "default_max_previous_edges")]
    pub max_previous_edges: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapSettings {
    /// Distances below this are treated as an exact hit.
    #[serde(default = "default_exact_tolerance_m")]
    pub exact_tolerance_m: f64,
    /// Half-size of the search box used by `snap`.
    #[serde(default = "default_offset_m")]
    pub default_offset_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_edge_factor_capacity")]
    pub edge_factor_capacity: usize,
    #[serde(default = "default_turn_cost_factor_capacity")]
    pub turn_cost_factor_capacity: usize,
}

fn default_zoom() -> u32 {
    14
}

fn default_max_settled() -> usize {
    1 << 20
}

fn default_max_previous_edges() -> usize {
    8
}

fn default_exact_tolerance_m() -> f64 {
    1.0
}

fn default_offset_m() -> f64 {
    100.0
}

fn default_edge_factor_capacity() -> usize {
    1024
}

fn default_turn_cost_factor_capacity() -> usize {
    256
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            zoom: default_zoom(),
            search: SearchSettings::default(),
            snap: SnapSettings::default(),
            cache: CacheSettings::default(),
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_settled: default_max_settled(),
            max_previous_edges: default_max_previous_edges(),
        }
    }
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            exact_tolerance_m: default_exact_tolerance_m(),
            default_offset_m: default_offset_m(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            edge_factor_capacity: default_edge_factor_capacity(),
            turn_cost_factor_capacity: default_turn_cost_factor_capacity(),
        }
    }
}

impl RoutingConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        check_zoom(self.zoom)?;
        let tolerance = self.snap.exact_tolerance_m;
        if tolerance.is_nan() || tolerance < 0.0 {
            return Err(Error::Config(format!(
                "snap.exact_tolerance_m must be >= 0, got {tolerance}"
            )));
        }
        let offset = self.snap.default_offset_m;
        if offset.is_nan() || offset <= 0.0 {
            return Err(Error::Config(format!(
                "snap.default_offset_m must be > 0, got {offset}"
            )));
        }
        if self.search.max_settled == 0 {
            return Err(Error::Config("search.max_settled must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = RoutingConfig::from_json_str("{}").unwrap();
        assert_eq!(config, RoutingConfig::default());
        assert_eq!(config.zoom, 14);
        assert_eq!(config.search.max_settled, 1 << 20);
        assert_eq!(config.cache.turn_cost_factor_capacity, 256);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config =
            RoutingConfig::from_json_str(r#"{"zoom": 12, "snap": {"default_offset_m": 250.0}}"#).unwrap();
        assert_eq!(config.zoom, 12);
        assert_eq!(config.snap.default_offset_m, 250.0);
        assert_eq!(config.snap.exact_tolerance_m, 1.0);
        assert_eq!(config.search.max_previous_edges, 8);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            RoutingConfig::from_json_str(r#"{"zoom": 20}"#),
            Err(Error::InvalidZoom { zoom: 20, .. })
        ));
        assert!(matches!(
            RoutingConfig::from_json_str(r#"{"search": {"max_settled": 0}}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            RoutingConfig::from_json_str("not json"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn config_loads_from_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routing.json");
        std::fs::write(&path, r#"{"cache": {"edge_factor_capacity": 16}}"#).unwrap();

        let config = RoutingConfig::from_path(&path).unwrap();
        assert_eq!(config.cache.edge_factor_capacity, 16);
    }
}
