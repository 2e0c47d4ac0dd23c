use crate::errors::ConfigError;
use schema::{BattleFormat, BattleKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunables for a single battle, authored in RON.
///
/// ```ron
/// (
///     format: Doubles,
///     kind: Wild,
///     seed: Some(42),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    pub format: BattleFormat,
    pub kind: BattleKind,
    /// RNG seed. A random one is drawn when absent.
    pub seed: Option<u64>,
    pub roster_capacity: usize,
    /// Suspend after presentation-worthy phases until `acknowledge()` is called.
    pub await_acknowledgements: bool,
    pub critical_denominator: u32,
    pub high_critical_denominator: u32,
    pub capture: CaptureConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Checks a normal (non-critical) attempt must pass.
    pub shake_checks: u8,
    /// Scales the critical-capture chance; 0 disables critical captures.
    pub critical_multiplier: f64,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            format: BattleFormat::Singles,
            kind: BattleKind::Wild,
            seed: None,
            roster_capacity: 6,
            await_acknowledgements: false,
            critical_denominator: 24,
            high_critical_denominator: 8,
            capture: CaptureConfig::default(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            shake_checks: 3,
            critical_multiplier: 1.0,
        }
    }
}

impl BattleConfig {
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: BattleConfig = ron::de::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    /// Rejects values the engine cannot run with. Every battle constructor
    /// and snapshot restore goes through this.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.roster_capacity == 0 {
            return Err(ConfigError::Invalid("roster_capacity must be at least 1".into()));
        }
        if self.critical_denominator == 0 || self.high_critical_denominator == 0 {
            return Err(ConfigError::Invalid("critical denominators must be non-zero".into()));
        }
        if self.capture.shake_checks == 0 {
            return Err(ConfigError::Invalid("capture.shake_checks must be at least 1".into()));
        }
        let multiplier = self.capture.critical_multiplier;
        if multiplier.is_nan() || multiplier < 0.0 {
            return Err(ConfigError::Invalid(
                "capture.critical_multiplier must be a non-negative number".into(),
            ));
        }
        Ok(())
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_format(mut self, format: BattleFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_kind(mut self, kind: BattleKind) -> Self {
        self.kind = kind;
        self
    }
}
