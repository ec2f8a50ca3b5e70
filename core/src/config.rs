use crate::{
    error::{TelemetryError, TelemetryResult},
    fault::{FaultSignature, Regime},
    features::DEFAULT_WINDOW,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ── Generation ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub seed:              u64,
    pub duration_s:        f64,
    pub sample_rate_hz:    f64,
    pub normal_replicates: usize,
    pub fault_replicates:  usize,
    /// Replaces the default shape parameters of the named regimes.
    pub fault_overrides:   Vec<FaultSignature>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            seed:              42,
            duration_s:        300.0,
            sample_rate_hz:    1.0,
            normal_replicates: 3,
            fault_replicates:  2,
            fault_overrides:   Vec::new(),
        }
    }
}

impl GenerationConfig {
    pub fn replicates_for(&self, regime: Regime) -> usize {
        if regime.is_fault() { self.fault_replicates } else { self.normal_replicates }
    }
}

// ── Features ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub window: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self { window: DEFAULT_WINDOW }
    }
}

// ── Train/validation split ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub validation_fraction: f64,
    pub seed:                u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self { validation_fraction: 0.2, seed: 42 }
    }
}

// ── Random forest ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_estimators:      usize,
    /// None grows every tree until its leaves are pure.
    pub max_depth:         Option<usize>,
    pub min_samples_split: usize,
    /// None examines floor(sqrt(feature count)) features per split.
    pub max_features:      Option<usize>,
    pub bootstrap:         bool,
    pub seed:              u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators:      200,
            max_depth:         None,
            min_samples_split: 2,
            max_features:      None,
            bootstrap:         true,
            seed:              42,
        }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> TelemetryResult<()> {
        if self.n_estimators == 0 {
            return Err(TelemetryError::invalid("n_estimators", "forest needs at least one tree"));
        }
        if self.min_samples_split < 2 {
            return Err(TelemetryError::invalid(
                "min_samples_split",
                format!("must be at least 2, got {}", self.min_samples_split),
            ));
        }
        if self.max_features == Some(0) {
            return Err(TelemetryError::invalid("max_features", "must be at least 1"));
        }
        Ok(())
    }
}

// ── Health index ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub alarm_threshold:  f64,
    /// Trailing moving average per run. None leaves the projection raw.
    pub smoothing_window: Option<usize>,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self { alarm_threshold: 0.7, smoothing_window: None }
    }
}

// ── Paths ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir:    PathBuf,
    pub figures_dir: PathBuf,
    /// Defaults to `<data_dir>/pipeline.db`.
    pub registry:    Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir:    PathBuf::from("data"),
            figures_dir: PathBuf::from("figures"),
            registry:    None,
        }
    }
}

// ── Whole pipeline ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub generation: GenerationConfig,
    pub features:   FeatureConfig,
    pub split:      SplitConfig,
    pub forest:     ForestConfig,
    pub health:     HealthConfig,
    pub paths:      PathsConfig,
}

impl PipelineConfig {
    /// Load from a JSON file. Missing sections and fields keep defaults.
    /// In tests, use PipelineConfig::default_test().
    pub fn load(path: &Path) -> TelemetryResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        log::debug!("loaded pipeline config from {}", path.display());
        Ok(config)
    }

    /// Smaller forest, same data shape. Keeps debug-build tests fast.
    pub fn default_test() -> Self {
        Self {
            forest: ForestConfig { n_estimators: 25, ..ForestConfig::default() },
            ..Self::default()
        }
    }

    pub fn registry_path(&self) -> PathBuf {
        self.paths
            .registry
            .clone()
            .unwrap_or_else(|| self.paths.data_dir.join("pipeline.db"))
    }

    /// Fail fast on every parameter the pipeline would reject later.
    pub fn validate(&self) -> TelemetryResult<()> {
        crate::waveform::time_axis(self.generation.duration_s, self.generation.sample_rate_hz)?;
        for regime in Regime::ALL {
            if self.generation.replicates_for(regime) == 0 {
                return Err(TelemetryError::invalid(
                    "replicates",
                    format!("{regime}: at least one replicate is required"),
                ));
            }
        }
        for signature in &self.generation.fault_overrides {
            signature.validate()?;
        }
        if self.features.window == 0 {
            return Err(TelemetryError::invalid("window", "rolling window must be at least 1 sample"));
        }
        let f = self.split.validation_fraction;
        if !(f > 0.0 && f < 1.0) {
            return Err(TelemetryError::invalid(
                "validation_fraction",
                format!("must lie strictly between 0 and 1, got {f}"),
            ));
        }
        self.forest.validate()?;
        let t = self.health.alarm_threshold;
        if !(0.0..=1.0).contains(&t) {
            return Err(TelemetryError::invalid("alarm_threshold", format!("must lie in [0, 1], got {t}")));
        }
        if self.health.smoothing_window == Some(0) {
            return Err(TelemetryError::invalid("smoothing_window", "must be at least 1 sample"));
        }
        Ok(())
    }
}
