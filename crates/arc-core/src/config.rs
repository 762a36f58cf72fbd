use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub gate: GateConfig,
    pub execution: ExecutionConfig,
    pub voice: VoiceConfig,
    pub notices: NoticeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gate: GateConfig::default(),
            execution: ExecutionConfig::default(),
            voice: VoiceConfig::default(),
            notices: NoticeConfig::default(),
        }
    }
}

/// Timings of the biometric approval gate.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GateConfig {
    pub scan_interval_ms: u64,
    pub scan_step: u8,
    pub verify_ms: u64,
    pub success_hold_ms: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            scan_interval_ms: 30,
            scan_step: 2,
            verify_ms: 1_500,
            success_hold_ms: 1_000,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ExecutionConfig {
    pub step_delay_ms: u64,
    pub reset_delay_ms: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: 800,
            reset_delay_ms: 2_000,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct VoiceConfig {
    /// Program looked up on `PATH` to decide whether voice input is offered.
    pub recognizer: Option<String>,
    pub mock_delay_ms: u64,
    pub listening_notice_ms: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            recognizer: None,
            mock_delay_ms: 2_500,
            listening_notice_ms: 2_000,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct NoticeConfig {
    pub default_ttl_ms: u64,
    pub capacity: usize,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: 4_000,
            capacity: 8,
        }
    }
}

impl Config {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Missing files fall back to defaults; unreadable or invalid ones do not.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(&'static str, bool); 5] = [
            ("gate.scan_interval_ms", self.gate.scan_interval_ms > 0),
            ("gate.scan_step", self.gate.scan_step > 0),
            ("execution.step_delay_ms", self.execution.step_delay_ms > 0),
            ("voice.mock_delay_ms", self.voice.mock_delay_ms > 0),
            ("notices.capacity", self.notices.capacity > 0),
        ];
        for (field, ok) in checks {
            if !ok {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero",
                });
            }
        }
        Ok(())
    }
}
