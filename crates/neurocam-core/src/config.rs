use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::domain::{Pattern, MAX_PATTERN_WIDTH};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CamConfig {
    pub geometry: GeometryConfig,
    pub matching: MatchingConfig,
    pub learning: LearningConfig,
    pub aging: AgingConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeometryConfig {
    /// Pattern width W in bits (1..=16)
    pub pattern_width: u8,
    /// Number of main banks B
    pub banks: usize,
    /// Slots per main bank K
    pub slots_per_bank: usize,
    /// Size of the round-robin learned pool (0 disables learning storage)
    pub learned_pool_size: usize,
    /// Ingress pipeline depth N (result latency in ticks)
    pub pipeline_depth: usize,
    /// History ring depth H
    pub history_depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchingConfig {
    /// Largest distance still counted as a fuzzy hit
    pub fuzzy_threshold: u8,
    /// Bits compared in partial mode
    pub partial_mask: u16,
    /// Confidence = gap << shift (3 gives the x8 scale)
    pub confidence_shift: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LearningConfig {
    /// Learn every missed query regardless of its mode
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgingConfig {
    /// Ticks between global recency decrements
    pub interval_ticks: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SeedProfile {
    /// Deterministic factory table
    Factory,
    /// No templates at power-up
    Empty,
}

impl Default for SeedProfile {
    fn default() -> Self {
        Self::Factory
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SeedConfig {
    #[serde(default)]
    pub profile: SeedProfile,
    /// Replaces the factory table when non-empty (linear slot order)
    #[serde(default)]
    pub custom: Vec<u16>,
}

impl Default for CamConfig {
    fn default() -> Self {
        Self {
            geometry: GeometryConfig::default(),
            matching: MatchingConfig::default(),
            learning: LearningConfig::default(),
            aging: AgingConfig::default(),
            seed: SeedConfig::default(),
        }
    }
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            pattern_width: 12,
            banks: 4,
            slots_per_bank: 4,
            learned_pool_size: 4,
            pipeline_depth: 4,
            history_depth: 8,
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 2,
            partial_mask: 0x0FFF,
            confidence_shift: 3,
        }
    }
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self { enabled: false }
    }
}

impl Default for AgingConfig {
    fn default() -> Self {
        Self { interval_ticks: 16 }
    }
}

impl CamConfig {
    /// 16-bit variant of the default geometry
    pub fn wide() -> Self {
        let mut config = Self::default();
        config.geometry.pattern_width = 16;
        config.matching.partial_mask = 0xFFFF;
        config
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: CamConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    /// Environment variables are prefixed with NEUROCAM_
    /// Example: NEUROCAM_FUZZY_THRESHOLD=3
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. User config file (if exists)
    /// 3. Default config file
    /// 4. Built-in defaults (lowest priority)
    pub fn load_layered(
        default_path: Option<&Path>,
        user_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut config = CamConfig::default();

        if let Some(path) = default_path {
            if path.exists() {
                config = Self::from_file(path)?;
            }
        }

        // user file replaces the whole document
        if let Some(path) = user_path {
            if path.exists() {
                config = Self::from_file(path)?;
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// `NEUROCAM_PARTIAL_MASK` goes through [`Pattern::parse`], so an
    /// unprefixed value is read as hex.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        use std::env;

        if let Ok(val) = env::var("NEUROCAM_FUZZY_THRESHOLD") {
            self.matching.fuzzy_threshold = val.parse().map_err(|_| {
                ConfigError::Validation("Invalid NEUROCAM_FUZZY_THRESHOLD".to_string())
            })?;
        }
        if let Ok(val) = env::var("NEUROCAM_PARTIAL_MASK") {
            self.matching.partial_mask = Pattern::parse(&val)
                .map(Pattern::bits)
                .ok_or_else(|| {
                    ConfigError::Validation("Invalid NEUROCAM_PARTIAL_MASK".to_string())
                })?;
        }
        if let Ok(val) = env::var("NEUROCAM_LEARNING_ENABLED") {
            self.learning.enabled = val.parse().map_err(|_| {
                ConfigError::Validation("Invalid NEUROCAM_LEARNING_ENABLED".to_string())
            })?;
        }
        if let Ok(val) = env::var("NEUROCAM_AGING_INTERVAL") {
            self.aging.interval_ticks = val.parse().map_err(|_| {
                ConfigError::Validation("Invalid NEUROCAM_AGING_INTERVAL".to_string())
            })?;
        }
        if let Ok(val) = env::var("NEUROCAM_HISTORY_DEPTH") {
            self.geometry.history_depth = val.parse().map_err(|_| {
                ConfigError::Validation("Invalid NEUROCAM_HISTORY_DEPTH".to_string())
            })?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.geometry;
        if g.pattern_width == 0 || g.pattern_width > MAX_PATTERN_WIDTH {
            return Err(ConfigError::Validation(format!(
                "geometry.pattern_width must be in [1, {}]",
                MAX_PATTERN_WIDTH
            )));
        }
        if g.banks == 0 {
            return Err(ConfigError::Validation(
                "geometry.banks must be > 0".to_string(),
            ));
        }
        if g.slots_per_bank == 0 {
            return Err(ConfigError::Validation(
                "geometry.slots_per_bank must be > 0".to_string(),
            ));
        }
        if g.pipeline_depth == 0 {
            return Err(ConfigError::Validation(
                "geometry.pipeline_depth must be > 0".to_string(),
            ));
        }
        if g.history_depth == 0 {
            return Err(ConfigError::Validation(
                "geometry.history_depth must be > 0".to_string(),
            ));
        }

        let m = &self.matching;
        if m.fuzzy_threshold > g.pattern_width {
            return Err(ConfigError::Validation(
                "matching.fuzzy_threshold must be <= pattern_width".to_string(),
            ));
        }
        if !Pattern(m.partial_mask).fits(g.pattern_width) {
            return Err(ConfigError::Validation(
                "matching.partial_mask must fit in pattern_width bits".to_string(),
            ));
        }
        if m.confidence_shift > 7 {
            return Err(ConfigError::Validation(
                "matching.confidence_shift must be in [0, 7]".to_string(),
            ));
        }

        if self.aging.interval_ticks == 0 {
            return Err(ConfigError::Validation(
                "aging.interval_ticks must be > 0".to_string(),
            ));
        }

        let main_capacity = g.banks * g.slots_per_bank;
        if self.seed.custom.len() > main_capacity {
            return Err(ConfigError::Validation(
                "seed.custom has more entries than main bank slots".to_string(),
            ));
        }
        if self
            .seed
            .custom
            .iter()
            .any(|&v| !Pattern(v).fits(g.pattern_width))
        {
            return Err(ConfigError::Validation(
                "seed.custom values must fit in pattern_width bits".to_string(),
            ));
        }

        Ok(())
    }

    /// Export configuration to TOML string
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = self
            .to_toml_string()
            .map_err(|e| ConfigError::Validation(format!("TOML serialization error: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }
}
