use super::*;
use std::collections::HashMap;
use tempfile::TempDir;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn api_keys_come_from_provider_env_vars() {
    let config = Config::from_sources(
        ConfigFile::default(),
        env_from(&[("OPENAI_API_KEY", "sk-openai"), ("GOOGLE_API_KEY", "g-key")]),
    );

    assert_eq!(config.api_key("openai"), Some("sk-openai"));
    assert_eq!(config.api_key("google"), Some("g-key"));
    assert_eq!(config.api_key("anthropic"), None);
    assert!(config.is_configured("OpenAI"));
    assert!(!config.is_configured("anthropic"));
    assert!(!config.is_configured("unknown"));
}

#[test]
fn blank_api_keys_count_as_missing() {
    let config = Config::from_sources(ConfigFile::default(), env_from(&[("OPENAI_API_KEY", "  ")]));
    assert!(!config.is_configured("openai"));
}

#[test]
fn default_models_fall_back_per_provider_then_globally() {
    let config = Config::from_sources(ConfigFile::default(), env_from(&[]));

    assert_eq!(config.default_model("openai"), "gpt-4");
    assert_eq!(config.default_model("anthropic"), "claude-3-5-sonnet-20241022");
    assert_eq!(config.default_model("google"), "gemini-2.0-flash-exp");
    assert_eq!(config.default_model("mystery"), FALLBACK_MODEL);
}

#[test]
fn config_file_overrides_provider_default_model() {
    let mut file = ConfigFile::default();
    file.set_default_model("Anthropic", "claude-3-opus-20240229");
    let config = Config::from_sources(file, env_from(&[("DEFAULT_MODEL", "global-model")]));

    assert_eq!(config.default_model("anthropic"), "claude-3-opus-20240229");
    assert_eq!(config.default_model("openai"), "gpt-4");
    assert_eq!(config.default_model("mystery"), "global-model");
}

#[test]
fn default_provider_prefers_environment_over_file() {
    let file = ConfigFile {
        default_provider: Some("google".to_string()),
        ..Default::default()
    };

    let from_file = Config::from_sources(file.clone(), env_from(&[]));
    assert_eq!(from_file.default_provider(), "google");

    let from_env = Config::from_sources(file, env_from(&[("DEFAULT_PROVIDER", "Anthropic")]));
    assert_eq!(from_env.default_provider(), "anthropic");

    let fallback = Config::from_sources(ConfigFile::default(), env_from(&[]));
    assert_eq!(fallback.default_provider(), FALLBACK_PROVIDER);
}

#[test]
fn base_url_overrides_are_read_per_provider() {
    let config = Config::from_sources(
        ConfigFile::default(),
        env_from(&[("ANTHROPIC_BASE_URL", "http://127.0.0.1:9000/v1")]),
    );
    assert_eq!(config.base_url("anthropic"), Some("http://127.0.0.1:9000/v1"));
    assert_eq!(config.base_url("openai"), None);
}

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent_config.toml");

    let config = ConfigFile::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(config, ConfigFile::default());
}

#[test]
fn test_config_persistence_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("sub").join("config.toml");

    let mut config = ConfigFile {
        default_provider: Some("anthropic".to_string()),
        ..Default::default()
    };
    config.set_default_model("openai", "gpt-4o");
    config.save_to_path(&config_path).expect("save failed");

    let mut loaded = ConfigFile::load_from_path(&config_path).expect("load failed");
    assert_eq!(loaded, config);

    loaded.default_provider = None;
    assert_eq!(loaded.unset_default_model("OPENAI"), Some("gpt-4o".to_string()));
    loaded.save_to_path(&config_path).expect("second save failed");

    let reloaded = ConfigFile::load_from_path(&config_path).expect("reload failed");
    assert_eq!(reloaded, ConfigFile::default());
}

#[test]
fn invalid_toml_reports_parse_error_with_path() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "default_provider = [").unwrap();

    let err = ConfigFile::load_from_path(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("config.toml"));
}
