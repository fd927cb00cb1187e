use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::providers::ProviderDescriptor;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    pub default_provider: Option<String>,
    /// Sampling temperature sent with every request
    pub temperature: Option<f32>,
    /// Fetch an AI explanation for each tagged code block in a response
    pub explain_code: Option<bool>,
    /// Where conversation history and the theme are stored
    pub data_dir: Option<PathBuf>,
    /// Additional providers, or replacements for built-in ones with the same id
    #[serde(default)]
    pub custom_providers: Vec<ProviderDescriptor>,
}

impl Config {
    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn explain_code(&self) -> bool {
        self.explain_code.unwrap_or(true)
    }
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
