use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::engine::aggressiveness::DEFAULT_SUCCESS_THRESHOLD;
use crate::engine::predictor::DEFAULT_PERSONALIZATION_FACTOR;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_personalization_factor")]
    pub personalization_factor: f64,
    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,
    #[serde(default = "default_prune_threshold")]
    pub prune_threshold: usize,
    #[serde(default = "default_prune_fraction")]
    pub prune_fraction: f64,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_personalization_factor() -> f64 {
    DEFAULT_PERSONALIZATION_FACTOR
}
fn default_success_threshold() -> u32 {
    DEFAULT_SUCCESS_THRESHOLD
}
fn default_prune_threshold() -> usize {
    1500
}
fn default_prune_fraction() -> f64 {
    0.3
}
fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nextkey")
        .to_string_lossy()
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            personalization_factor: default_personalization_factor(),
            success_threshold: default_success_threshold(),
            prune_threshold: default_prune_threshold(),
            prune_fraction: default_prune_fraction(),
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nextkey")
            .join("config.toml")
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    /// Reset values that would break the engine to their defaults.
    pub fn validate(&mut self) {
        if !self.personalization_factor.is_finite() || self.personalization_factor < 0.0 {
            self.personalization_factor = default_personalization_factor();
        }
        self.success_threshold = self.success_threshold.max(1);
        if !(0.0..=1.0).contains(&self.prune_fraction) {
            self.prune_fraction = default_prune_fraction();
        }
        if self.data_dir.trim().is_empty() {
            self.data_dir = default_data_dir();
        }
    }
}
