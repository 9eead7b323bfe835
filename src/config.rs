use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

pub const DEFAULT_SEED: u64 = 42;

/// ≈150 m at Makkah's latitude.
pub const DEFAULT_JITTER_DEG: f64 = 0.0015;

/// One simulated zone: a centre coordinate and its sampling weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub weight: f64,
}

impl ZoneSpec {
    pub fn new(name: &str, lat: f64, lon: f64, weight: f64) -> Self {
        Self {
            name: name.to_string(),
            lat,
            lon,
            weight,
        }
    }
}

/// The six zones the dashboard buckets activity into.
pub fn default_zones() -> Vec<ZoneSpec> {
    vec![
        ZoneSpec::new("Tawaf", 21.4225, 39.8262, 0.25),
        ZoneSpec::new("Sa'i", 21.4215, 39.8280, 0.20),
        ZoneSpec::new("Mina", 21.4300, 39.8900, 0.30),
        ZoneSpec::new("Arafat", 21.3550, 39.9850, 0.10),
        ZoneSpec::new("Muzdalifah", 21.3850, 39.8920, 0.10),
        ZoneSpec::new("Other", 21.4190, 39.8200, 0.05),
    ]
}

/// Knobs for a pipeline run. The default reproduces the dashboard's fixed setup.
///
/// Loadable from TOML; every field is optional there:
///
/// ```toml
/// seed = 7
/// jitter_deg = 0.001
///
/// [[zones]]
/// name = "Tawaf"
/// lat = 21.4225
/// lon = 39.8262
/// weight = 1.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub seed: u64,
    pub jitter_deg: f64,
    pub zones: Vec<ZoneSpec>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            jitter_deg: DEFAULT_JITTER_DEG,
            zones: default_zones(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| PrepError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PrepError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)
            .map_err(|err| PrepError::Config(format!("reading {}: {err}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Structural checks only; zone weights are checked when the zone table is built.
    pub fn validate(&self) -> Result<()> {
        if !self.jitter_deg.is_finite() || self.jitter_deg <= 0.0 {
            return Err(PrepError::Config(format!(
                "jitter_deg must be a positive finite number, got {}",
                self.jitter_deg
            )));
        }
        if self.zones.is_empty() {
            return Err(PrepError::Config("at least one zone is required".into()));
        }
        Ok(())
    }
}
