//! Venue-code policy knobs, embedded as the `[codes]` table of the node
//! configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{CodeError, CodeFormat};

/// Tunables for issuance, sweeping and verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeConfig {
    /// Lifetime of an issued code, in seconds.
    #[serde(default = "default_code_ttl_secs")]
    pub code_ttl_secs: u64,

    /// Maximum deletes committed together by one sweep batch.
    #[serde(default = "default_sweep_batch_size")]
    pub sweep_batch_size: usize,

    /// Period of the background sweep, in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// How many of the newest records the verifier inspects.
    #[serde(default = "default_verify_lookback")]
    pub verify_lookback: usize,

    /// Extra upsert attempts after a write conflict.
    #[serde(default = "default_regenerate_retries")]
    pub regenerate_retries: u32,

    /// When set, explicit admin codes must be exactly this many digits.
    #[serde(default)]
    pub required_digits: Option<usize>,

    /// Quiet period before a keystroke-driven verification fires, in ms.
    #[serde(default = "default_verify_debounce_ms")]
    pub verify_debounce_ms: u64,

    /// Input length at which keystroke-driven verification fires.
    #[serde(default = "default_verify_trigger_len")]
    pub verify_trigger_len: usize,
}

fn default_code_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_sweep_batch_size() -> usize {
    500
}

fn default_sweep_interval_secs() -> u64 {
    60 * 60
}

fn default_verify_lookback() -> usize {
    10
}

fn default_regenerate_retries() -> u32 {
    3
}

fn default_verify_debounce_ms() -> u64 {
    500
}

fn default_verify_trigger_len() -> usize {
    5
}

impl CodeConfig {
    pub fn code_ttl(&self) -> Duration {
        Duration::from_secs(self.code_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn verify_debounce(&self) -> Duration {
        Duration::from_millis(self.verify_debounce_ms)
    }

    pub fn code_format(&self) -> CodeFormat {
        match self.required_digits {
            Some(len) => CodeFormat::Digits(len),
            None => CodeFormat::Any,
        }
    }

    /// Reject values that would make the subsystem misbehave.
    pub fn validate(&self) -> Result<(), CodeError> {
        if self.code_ttl_secs == 0 {
            return Err(CodeError::InvalidConfig("code_ttl_secs must be > 0".into()));
        }
        if self.sweep_batch_size == 0 {
            return Err(CodeError::InvalidConfig("sweep_batch_size must be > 0".into()));
        }
        if self.sweep_interval_secs == 0 {
            return Err(CodeError::InvalidConfig("sweep_interval_secs must be > 0".into()));
        }
        if self.verify_lookback == 0 {
            return Err(CodeError::InvalidConfig("verify_lookback must be > 0".into()));
        }
        if self.required_digits == Some(0) {
            return Err(CodeError::InvalidConfig("required_digits must be > 0".into()));
        }
        Ok(())
    }
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            code_ttl_secs: default_code_ttl_secs(),
            sweep_batch_size: default_sweep_batch_size(),
            sweep_interval_secs: default_sweep_interval_secs(),
            verify_lookback: default_verify_lookback(),
            regenerate_retries: default_regenerate_retries(),
            required_digits: None,
            verify_debounce_ms: default_verify_debounce_ms(),
            verify_trigger_len: default_verify_trigger_len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_observed_policy() {
        let config = CodeConfig::default();
        assert_eq!(config.code_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.sweep_batch_size, 500);
        assert_eq!(config.sweep_interval(), Duration::from_secs(3_600));
        assert_eq!(config.verify_lookback, 10);
        assert_eq!(config.code_format(), CodeFormat::Any);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config: CodeConfig = toml::from_str("").unwrap();
        assert_eq!(config, CodeConfig::default());
    }

    #[test]
    fn required_digits_selects_digit_format() {
        let config: CodeConfig = toml::from_str("required_digits = 5").unwrap();
        assert_eq!(config.code_format(), CodeFormat::Digits(5));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let config = CodeConfig {
            sweep_batch_size: 0,
            ..CodeConfig::default()
        };
        assert!(matches!(config.validate(), Err(CodeError::InvalidConfig(_))));
    }
}
