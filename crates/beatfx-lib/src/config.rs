use crate::error::HrvError;
use crate::metrics::spectral::MAX_INTERP_FS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How band powers are estimated from the RR series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SpectralMethod {
    /// Plain DFT over beat index, unit spacing (cycles/beat).
    #[default]
    Periodogram,
    /// Welch PSD over the RR series resampled at `interp_fs` Hz.
    Welch { interp_fs: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleEntropyConfig {
    /// Embedding dimension.
    pub m: usize,
    /// Tolerance as a fraction of SDRR.
    pub r_factor: f64,
}

impl Default for SampleEntropyConfig {
    fn default() -> Self {
        Self {
            m: 2,
            r_factor: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HiguchiConfig {
    pub k_max: usize,
}

impl Default for HiguchiConfig {
    fn default() -> Self {
        Self { k_max: 10 }
    }
}

/// Parameters for a full feature extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Lower plausibility bound for an RR interval (exclusive, ms).
    pub min_rr_ms: f64,
    /// Upper plausibility bound for an RR interval (exclusive, ms).
    pub max_rr_ms: f64,
    /// Minimum number of accepted intervals before features are computed.
    pub min_intervals: usize,
    /// Turn any undefined feature into an error instead of a tagged `NaN`.
    pub strict: bool,
    pub sample_entropy: SampleEntropyConfig,
    pub higuchi: HiguchiConfig,
    pub spectral: SpectralMethod,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            min_rr_ms: 250.0,
            max_rr_ms: 2000.0,
            min_intervals: 10,
            strict: false,
            sample_entropy: SampleEntropyConfig::default(),
            higuchi: HiguchiConfig::default(),
            spectral: SpectralMethod::default(),
        }
    }
}

impl FeatureConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: FeatureConfig = toml::from_str(text).context("parsing feature config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), HrvError> {
        let invalid = |msg: String| -> Result<(), HrvError> { Err(HrvError::InvalidConfig(msg)) };
        if !(self.min_rr_ms.is_finite() && self.max_rr_ms.is_finite()) {
            return invalid("RR bounds must be finite".into());
        }
        if self.min_rr_ms < 0.0 || self.min_rr_ms >= self.max_rr_ms {
            return invalid(format!(
                "RR window ({}, {}) is empty or negative",
                self.min_rr_ms, self.max_rr_ms
            ));
        }
        if self.min_intervals < 2 {
            return invalid("min_intervals must be at least 2".into());
        }
        if self.sample_entropy.m == 0 {
            return invalid("sample entropy dimension m must be positive".into());
        }
        if !(self.sample_entropy.r_factor >= 0.0) {
            return invalid("sample entropy r_factor must be non-negative".into());
        }
        if self.higuchi.k_max < 2 {
            return invalid("higuchi k_max must be at least 2".into());
        }
        if let SpectralMethod::Welch { interp_fs } = self.spectral {
            if !(interp_fs > 0.0 && interp_fs <= MAX_INTERP_FS) {
                return invalid(format!(
                    "welch interp_fs {interp_fs} must be in (0, {MAX_INTERP_FS}] Hz"
                ));
            }
        }
        Ok(())
    }
}
