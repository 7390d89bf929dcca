//! Configuration for the density-matrix simulator.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with DENSIM_ prefix)
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values
//!
//! ```yaml
//! noise:
//!   probability: 0.001
//!   channels: APD
//!   application: direct
//! use_density_marker: true
//! seed: 7
//! report:
//!   threshold: 0.01
//!   max_states: 256
//! ```

use std::path::Path;

use densim_ir::{NoiseChannel, NoiseChannels};
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Complete simulator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Noise model applied after every gate.
    #[serde(default)]
    pub noise: NoiseConfig,

    /// Keep density-path nodes marked so their lower-left block is implicit.
    #[serde(default = "default_true")]
    pub use_density_marker: bool,

    /// Seed for the measurement RNG; entropy when unset.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Which basis states end up in the result.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Noise model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Probability shared by every channel.
    #[serde(default)]
    pub probability: f64,

    /// Channels applied, in order, to each touched qubit.
    #[serde(default)]
    pub channels: NoiseChannels,

    /// How the channels are applied to the state.
    #[serde(default)]
    pub application: NoiseApplication,

    /// Reuse noise results for repeated subgraphs.
    #[serde(default = "default_true")]
    pub memoize: bool,
}

/// Strategy for applying noise channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseApplication {
    /// Rewrite the blocks of every touched level in a single traversal.
    #[default]
    Direct,
    /// Sum `K ρ K†` over the Kraus operators of each channel and qubit.
    Sequential,
}

/// Result reporting settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Basis states with probability at or below this are left out.
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Number of basis states examined, starting from `|0…0⟩`.
    #[serde(default = "default_max_states")]
    pub max_states: usize,

    /// Examine all `2ⁿ` basis states, ignoring `max_states`.
    #[serde(default)]
    pub full_state: bool,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_threshold() -> f64 {
    0.01
}

fn default_max_states() -> usize {
    256
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            noise: NoiseConfig::default(),
            use_density_marker: default_true(),
            seed: None,
            report: ReportConfig::default(),
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            probability: 0.0,
            channels: NoiseChannels::default(),
            application: NoiseApplication::default(),
            memoize: default_true(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            max_states: default_max_states(),
            full_state: false,
        }
    }
}

impl SimulatorConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            SimError::Config(format!("cannot read {}: {e}", path.as_ref().display()))
        })?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml(contents: &str) -> SimResult<Self> {
        let config: SimulatorConfig =
            serde_yaml_ng::from_str(contents).map_err(|e| SimError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by the `DENSIM_*` environment variables.
    pub fn from_env() -> SimResult<Self> {
        let config = Self::default().merge_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with the following precedence:
    /// 1. Load from file if provided
    /// 2. Apply environment variable overrides
    pub fn load<P: AsRef<Path>>(config_file: Option<P>) -> SimResult<Self> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.merge_env()?;
        config.validate()?;
        Ok(config)
    }

    fn merge_env(self) -> SimResult<Self> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable source.
    ///
    /// `lookup` maps a variable name such as `DENSIM_SEED` to its value.
    /// Absent variables leave the corresponding fields unchanged; malformed
    /// ones are an error.
    pub fn merge_vars<F>(mut self, lookup: F) -> SimResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DENSIM_NOISE_PROBABILITY") {
            self.noise.probability = parse_var("DENSIM_NOISE_PROBABILITY", &v)?;
        }
        if let Some(v) = lookup("DENSIM_NOISE_CHANNELS") {
            self.noise.channels = parse_var("DENSIM_NOISE_CHANNELS", &v)?;
        }
        if let Some(v) = lookup("DENSIM_NOISE_SEQUENTIAL") {
            self.noise.application = if parse_flag("DENSIM_NOISE_SEQUENTIAL", &v)? {
                NoiseApplication::Sequential
            } else {
                NoiseApplication::Direct
            };
        }
        if let Some(v) = lookup("DENSIM_DENSITY_MARKER") {
            self.use_density_marker = parse_flag("DENSIM_DENSITY_MARKER", &v)?;
        }
        if let Some(v) = lookup("DENSIM_SEED") {
            self.seed = Some(parse_var("DENSIM_SEED", &v)?);
        }
        if let Some(v) = lookup("DENSIM_FULL_STATE") {
            self.report.full_state = parse_flag("DENSIM_FULL_STATE", &v)?;
        }
        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> SimResult<()> {
        let p = self.noise.probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(SimError::InvalidNoiseProbability(p));
        }
        // Amplitude damping decays at rate 2p.
        if self.noise.channels.contains(NoiseChannel::AmplitudeDamping) && 2.0 * p > 1.0 {
            return Err(SimError::InvalidNoiseProbability(p));
        }

        let threshold = self.report.threshold;
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(SimError::Config(format!(
                "report threshold must be positive, got {threshold}"
            )));
        }
        if self.report.max_states == 0 && !self.report.full_state {
            return Err(SimError::Config(
                "max_states must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Set the noise probability.
    #[must_use]
    pub fn with_noise_probability(mut self, probability: f64) -> Self {
        self.noise.probability = probability;
        self
    }

    /// Set the noise channels.
    #[must_use]
    pub fn with_channels(mut self, channels: NoiseChannels) -> Self {
        self.noise.channels = channels;
        self
    }

    /// Set the noise application strategy.
    #[must_use]
    pub fn with_application(mut self, application: NoiseApplication) -> Self {
        self.noise.application = application;
        self
    }

    /// Enable or disable the noise memo table.
    #[must_use]
    pub fn with_memoize(mut self, memoize: bool) -> Self {
        self.noise.memoize = memoize;
        self
    }

    /// Enable or disable the density marker.
    #[must_use]
    pub fn with_density_marker(mut self, enabled: bool) -> Self {
        self.use_density_marker = enabled;
        self
    }

    /// Fix the measurement RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replace the reporting settings.
    #[must_use]
    pub fn with_report(mut self, report: ReportConfig) -> Self {
        self.report = report;
        self
    }
}

fn parse_var<T>(key: &str, value: &str) -> SimResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| SimError::Config(format!("{key}={value}: {e}")))
}

fn parse_flag(key: &str, value: &str) -> SimResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SimError::Config(format!("{key}={value}: expected a boolean"))),
    }
}
