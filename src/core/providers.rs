//! Provider descriptors and credential resolution.
//!
//! Each provider carries its endpoint, model, credential variable and the
//! shape its responses come back in, so callers never branch on provider
//! names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::api::{ApiError, ChatCompletionResponse, MessagesResponse};
use crate::core::builtin_providers::{load_builtin_providers, DEFAULT_PROVIDER_ID};
use crate::core::config::Config;

/// JSON shape of a provider's completion response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseFormat {
    /// `choices[0].message.content`
    #[default]
    ChatCompletions,
    /// `content[0].text`
    MessagesContent,
}

impl ResponseFormat {
    pub fn extract_text(self, body: &str) -> Result<String, ApiError> {
        match self {
            ResponseFormat::ChatCompletions => {
                let response: ChatCompletionResponse = serde_json::from_str(body)
                    .map_err(|e| ApiError::Malformed(e.to_string()))?;
                response
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
                    .ok_or_else(|| ApiError::Malformed("response has no choices".to_string()))
            }
            ResponseFormat::MessagesContent => {
                let response: MessagesResponse = serde_json::from_str(body)
                    .map_err(|e| ApiError::Malformed(e.to_string()))?;
                response
                    .content
                    .into_iter()
                    .next()
                    .and_then(|block| block.text)
                    .ok_or_else(|| ApiError::Malformed("response has no content".to_string()))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub id: String,
    pub display_name: String,
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the bearer token.
    pub api_key_env: String,
    #[serde(default)]
    pub response_format: ResponseFormat,
    /// Extra request headers, e.g. attribution headers for OpenRouter.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

/// A provider together with whatever credential could be found for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProvider {
    pub descriptor: ProviderDescriptor,
    pub api_key: Option<String>,
}

impl ResolvedProvider {
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn display_name(&self) -> &str {
        &self.descriptor.display_name
    }
}

pub trait CredentialSource {
    fn api_key(&self, provider: &ProviderDescriptor) -> Option<String>;
}

/// Reads credentials from the process environment.
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn api_key(&self, provider: &ProviderDescriptor) -> Option<String> {
        std::env::var(&provider.api_key_env)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: Vec<ProviderDescriptor>,
    default_id: String,
}

impl ProviderRegistry {
    /// Built-in providers, then custom ones from config. A custom provider
    /// with a built-in id replaces it.
    pub fn from_config(config: &Config) -> Self {
        let mut providers = load_builtin_providers();
        for custom in &config.custom_providers {
            match providers
                .iter_mut()
                .find(|p| p.id.eq_ignore_ascii_case(&custom.id))
            {
                Some(existing) => *existing = custom.clone(),
                None => providers.push(custom.clone()),
            }
        }

        let default_id = config
            .default_provider
            .as_deref()
            .filter(|id| providers.iter().any(|p| p.id.eq_ignore_ascii_case(id)))
            .unwrap_or(DEFAULT_PROVIDER_ID)
            .to_string();

        Self {
            providers,
            default_id,
        }
    }

    pub fn providers(&self) -> &[ProviderDescriptor] {
        &self.providers
    }

    pub fn find(&self, id: &str) -> Option<&ProviderDescriptor> {
        self.providers.iter().find(|p| p.id.eq_ignore_ascii_case(id))
    }

    pub fn default_provider(&self) -> &ProviderDescriptor {
        self.find(&self.default_id)
            .or_else(|| self.providers.first())
            .expect("provider table is never empty")
    }

    /// Look a provider up by id; unknown or missing ids fall back to the default.
    pub fn get_or_default(&self, id: Option<&str>) -> &ProviderDescriptor {
        id.and_then(|id| self.find(id))
            .unwrap_or_else(|| self.default_provider())
    }

    /// The provider after `id` in table order, wrapping around.
    pub fn next_after(&self, id: &str) -> &ProviderDescriptor {
        let position = self
            .providers
            .iter()
            .position(|p| p.id.eq_ignore_ascii_case(id))
            .unwrap_or(0);
        &self.providers[(position + 1) % self.providers.len()]
    }

    pub fn resolve<S: CredentialSource>(&self, source: &S, id: Option<&str>) -> ResolvedProvider {
        let descriptor = self.get_or_default(id).clone();
        let api_key = source.api_key(&descriptor);
        ResolvedProvider {
            descriptor,
            api_key,
        }
    }
}
