use super::data::{path_display, Config, DEFAULT_TEMPERATURE};
use super::io::ConfigError;
use crate::core::providers::{ProviderDescriptor, ResponseFormat};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tempfile::TempDir;

fn custom_provider<'a>(config: &'a Config, id: &str) -> Option<&'a ProviderDescriptor> {
    config
        .custom_providers
        .iter()
        .find(|p| p.id.eq_ignore_ascii_case(id))
}

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent_config.toml");

    let config = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(config, Config::default());
    assert_eq!(config.temperature(), DEFAULT_TEMPERATURE);
    assert!(config.explain_code());
}

#[test]
fn test_save_and_load_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let config = Config {
        default_provider: Some("groq".to_string()),
        temperature: Some(0.3),
        explain_code: Some(false),
        data_dir: Some(PathBuf::from("/tmp/deepchat-data")),
        custom_providers: Vec::new(),
    };
    config
        .save_to_path(&config_path)
        .expect("Failed to save config");

    let loaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(loaded, config);
    assert_eq!(loaded.temperature(), 0.3);
    assert!(!loaded.explain_code());
}

#[test]
fn test_parse_error_names_the_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "default_provider = [unterminated").unwrap();

    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().starts_with("Failed to parse config at"));
}

#[test]
fn test_custom_providers_from_toml() {
    let config: Config = toml::from_str(
        r#"
default_provider = "local"

[[custom_providers]]
id = "local"
display_name = "Local Llama"
endpoint = "http://localhost:8080/v1/chat/completions"
model = "llama3"
api_key_env = "LOCAL_API_KEY"

[[custom_providers]]
id = "claude"
display_name = "Claude"
endpoint = "https://api.example.com/v1/messages"
model = "claude-test"
api_key_env = "CLAUDE_API_KEY"
response_format = "messages-content"

[custom_providers.headers]
anthropic-version = "2023-06-01"
"#,
    )
    .expect("valid config");

    assert_eq!(config.custom_providers.len(), 2);
    let local = custom_provider(&config, "LOCAL").expect("local provider");
    assert_eq!(local.response_format, ResponseFormat::ChatCompletions);
    assert!(local.headers.is_empty());

    let claude = custom_provider(&config, "claude").expect("claude provider");
    assert_eq!(claude.response_format, ResponseFormat::MessagesContent);
    assert_eq!(
        claude.headers.get("anthropic-version").map(String::as_str),
        Some("2023-06-01")
    );
}

#[test]
fn test_custom_provider_round_trip() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    let config = Config {
        custom_providers: vec![ProviderDescriptor {
            id: "mirror".to_string(),
            display_name: "Mirror".to_string(),
            endpoint: "https://mirror.example/v1/chat/completions".to_string(),
            model: "m-1".to_string(),
            api_key_env: "MIRROR_KEY".to_string(),
            response_format: ResponseFormat::ChatCompletions,
            headers: BTreeMap::new(),
        }],
        ..Config::default()
    };
    config.save_to_path(&config_path).unwrap();

    let contents = std::fs::read_to_string(&config_path).unwrap();
    assert!(!contents.contains("headers"));
    assert_eq!(Config::load_from_path(&config_path).unwrap(), config);
}

#[test]
fn test_data_dir_override() {
    let config = Config {
        data_dir: Some(PathBuf::from("/srv/deepchat")),
        ..Config::default()
    };
    assert_eq!(
        config.resolve_data_dir().unwrap(),
        PathBuf::from("/srv/deepchat")
    );
}

#[cfg(unix)]
#[test]
fn test_path_display_keeps_paths_outside_home() {
    assert_eq!(path_display("/etc/deepchat.toml"), "/etc/deepchat.toml");
}
