//! `deepchat set` / `deepchat unset` key handling.

use std::fmt;

use crate::core::config::Config;
use crate::core::providers::ProviderRegistry;

pub const SETTING_KEYS: &[&str] = &["default-provider", "temperature", "explain-code"];

#[derive(Debug, Clone, PartialEq)]
pub enum SettingError {
    UnknownKey(String),
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl fmt::Display for SettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingError::UnknownKey(key) => write!(
                f,
                "Unknown config key: {key} (expected one of: {})",
                SETTING_KEYS.join(", ")
            ),
            SettingError::InvalidValue { key, value, reason } => {
                write!(f, "Invalid value '{value}' for {key}: {reason}")
            }
        }
    }
}

impl std::error::Error for SettingError {}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Apply `key = value` to `config`, returning a confirmation line.
pub fn apply_set(config: &mut Config, key: &str, value: &str) -> Result<String, SettingError> {
    match key {
        "default-provider" => {
            let registry = ProviderRegistry::from_config(config);
            let provider = registry
                .find(value)
                .ok_or_else(|| SettingError::InvalidValue {
                    key: "default-provider",
                    value: value.to_string(),
                    reason: "no such provider".to_string(),
                })?;
            config.default_provider = Some(provider.id.clone());
            Ok(format!("Set default-provider to: {}", provider.id))
        }
        "temperature" => {
            let parsed: f32 = value.trim().parse().map_err(|_| SettingError::InvalidValue {
                key: "temperature",
                value: value.to_string(),
                reason: "not a number".to_string(),
            })?;
            if !(0.0..=2.0).contains(&parsed) {
                return Err(SettingError::InvalidValue {
                    key: "temperature",
                    value: value.to_string(),
                    reason: "must be between 0 and 2".to_string(),
                });
            }
            config.temperature = Some(parsed);
            Ok(format!("Set temperature to: {parsed}"))
        }
        "explain-code" => {
            let enabled = parse_bool(value).ok_or_else(|| SettingError::InvalidValue {
                key: "explain-code",
                value: value.to_string(),
                reason: "expected on or off".to_string(),
            })?;
            config.explain_code = Some(enabled);
            Ok(format!(
                "Set explain-code to: {}",
                if enabled { "on" } else { "off" }
            ))
        }
        other => Err(SettingError::UnknownKey(other.to_string())),
    }
}

pub fn apply_unset(config: &mut Config, key: &str) -> Result<String, SettingError> {
    match key {
        "default-provider" => config.default_provider = None,
        "temperature" => config.temperature = None,
        "explain-code" => config.explain_code = None,
        other => return Err(SettingError::UnknownKey(other.to_string())),
    }
    Ok(format!("Unset {key}"))
}
