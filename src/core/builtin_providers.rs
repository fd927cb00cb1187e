//! Built-in provider configuration
//!
//! The provider table ships inside the binary as `builtin_providers.toml`.

use serde::Deserialize;

use crate::core::providers::ProviderDescriptor;

/// Provider used when neither the command line nor the config picks one.
pub const DEFAULT_PROVIDER_ID: &str = "deepseek";

#[derive(Debug, Deserialize)]
struct BuiltinProvidersConfig {
    providers: Vec<ProviderDescriptor>,
}

/// Load built-in providers from the embedded configuration
pub fn load_builtin_providers() -> Vec<ProviderDescriptor> {
    const CONFIG_CONTENT: &str = include_str!("../builtin_providers.toml");

    let config: BuiltinProvidersConfig =
        toml::from_str(CONFIG_CONTENT).expect("Failed to parse builtin_providers.toml");

    config.providers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::providers::ResponseFormat;

    fn find_builtin_provider(id: &str) -> Option<ProviderDescriptor> {
        load_builtin_providers()
            .into_iter()
            .find(|p| p.id.eq_ignore_ascii_case(id))
    }

    #[test]
    fn test_load_builtin_providers() {
        let providers = load_builtin_providers();
        let ids: Vec<&str> = providers.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["deepseek", "groq"]);
        assert!(ids.contains(&DEFAULT_PROVIDER_ID));
    }

    #[test]
    fn test_find_builtin_provider() {
        let provider = find_builtin_provider("GROQ").expect("groq is built in");
        assert_eq!(provider.display_name, "Groq (Llama-3)");
        assert_eq!(provider.model, "llama3-70b-8192");

        assert!(find_builtin_provider("claude").is_none());
    }

    #[test]
    fn test_openrouter_headers() {
        let provider = find_builtin_provider("deepseek").unwrap();
        assert_eq!(
            provider.headers.get("X-Title").map(String::as_str),
            Some("DeepChat")
        );
    }

    #[test]
    fn test_provider_properties() {
        for provider in load_builtin_providers() {
            assert!(!provider.id.is_empty());
            assert!(!provider.display_name.is_empty());
            assert!(!provider.api_key_env.is_empty());
            assert!(provider.endpoint.starts_with("https://"));
            assert_eq!(provider.response_format, ResponseFormat::ChatCompletions);
        }
    }
}
