use crate::error::{AdvisorError, Result};
use crate::products::{OneAccountRules, StashRules};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaSettings {
    pub host: String,
    pub model: String,
    pub temperature: Option<f32>,
    /// Seconds before a generate call is abandoned.
    pub timeout_secs: u64,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".to_string(),
            model: "gpt-oss:20b".to_string(),
            temperature: None,
            timeout_secs: 120,
        }
    }
}

/// Runtime configuration. Every field has a default, so a config file only
/// needs the parts it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub one_account: OneAccountRules,
    pub stash: StashRules,
    /// Delay between records when a narrator is attached, in milliseconds.
    pub pacing_ms: u64,
    /// Tolerance used when auditing generated reports.
    pub audit_tolerance: f64,
    pub ollama: OllamaSettings,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            one_account: OneAccountRules::default(),
            stash: StashRules::default(),
            pacing_ms: 0,
            audit_tolerance: 0.005,
            ollama: OllamaSettings::default(),
        }
    }
}

impl AdvisorConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AdvisorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.one_account.validate()?;
        self.stash.validate()?;
        if !self.audit_tolerance.is_finite() || self.audit_tolerance < 0.0 {
            return Err(AdvisorError::InvalidRateTable(format!(
                "audit_tolerance must be a non-negative number, got {}",
                self.audit_tolerance
            )));
        }
        Ok(())
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
