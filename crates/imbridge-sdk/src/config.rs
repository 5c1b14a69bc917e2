use std::path::{Path, PathBuf};

use imbridge_core::BridgeConfig;
use serde::Deserialize;

use crate::error::SdkError;

#[derive(Debug, Deserialize)]
pub struct ImBridgeConfig {
    #[serde(default)]
    pub bridge: BridgeConfig,
    pub unit: UnitConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub sdk: SdkSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnitConfig {
    pub module_path: PathBuf,
    /// Precompiled-module cache. Defaults to `~/.imbridge/cache`.
    pub cache_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub path: PathBuf,
}

/// Defaults for the config handed to `initSDK` at login.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SdkSettings {
    #[serde(default = "default_platform_id")]
    pub platform_id: i32,
    #[serde(default = "default_api_addr")]
    pub api_addr: String,
    #[serde(default = "default_ws_addr")]
    pub ws_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: i32,
    #[serde(default = "default_true")]
    pub is_log_standard_output: bool,
    #[serde(default)]
    pub is_external_extensions: bool,
}

fn default_platform_id() -> i32 {
    5
}
fn default_api_addr() -> String {
    "http://127.0.0.1:10002".into()
}
fn default_ws_addr() -> String {
    "ws://127.0.0.1:10001".into()
}
fn default_log_level() -> i32 {
    5
}
fn default_true() -> bool {
    true
}

impl Default for SdkSettings {
    fn default() -> Self {
        Self {
            platform_id: default_platform_id(),
            api_addr: default_api_addr(),
            ws_addr: default_ws_addr(),
            log_level: default_log_level(),
            is_log_standard_output: true,
            is_external_extensions: false,
        }
    }
}

impl ImBridgeConfig {
    pub fn from_file(path: &Path) -> Result<Self, SdkError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)
            .map_err(|e| SdkError::Config(format!("Failed to parse {}: {e}", path.display())))?;
        config.unit.module_path = expand_home(&config.unit.module_path);
        config.unit.cache_dir = config.unit.cache_dir.as_deref().map(expand_home);
        config.store.path = expand_home(&config.store.path);
        Ok(config)
    }
}

/// Expand a leading `~` to the home directory.
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let toml_str = r#"
[unit]
module_path = "/srv/openIM.wasm"

[store]
path = "/srv/local.db"
"#;
        let config: ImBridgeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.unit.module_path, PathBuf::from("/srv/openIM.wasm"));
        assert_eq!(config.unit.cache_dir, None);
        assert!(config.bridge.try_parse);
        assert!(config.bridge.log_calls);
        assert_eq!(config.sdk, SdkSettings::default());
    }

    #[test]
    fn parses_full_config() {
        let toml_str = r#"
[bridge]
try_parse = false
log_calls = false

[unit]
module_path = "/srv/openIM.wasm"
cache_dir = "/var/cache/imbridge"

[store]
path = "/srv/local.db"

[sdk]
platform_id = 3
api_addr = "https://im.example.com/api"
ws_addr = "wss://im.example.com/msg_gateway"
log_level = 3
is_log_standard_output = false
is_external_extensions = true
"#;
        let config: ImBridgeConfig = toml::from_str(toml_str).unwrap();
        assert!(!config.bridge.try_parse);
        assert_eq!(config.unit.cache_dir, Some(PathBuf::from("/var/cache/imbridge")));
        assert_eq!(config.sdk.platform_id, 3);
        assert_eq!(config.sdk.ws_addr, "wss://im.example.com/msg_gateway");
        assert!(config.sdk.is_external_extensions);
        assert!(!config.sdk.is_log_standard_output);
    }

    #[test]
    fn missing_unit_section_is_an_error() {
        let toml_str = r#"
[store]
path = "/srv/local.db"
"#;
        assert!(toml::from_str::<ImBridgeConfig>(toml_str).is_err());
    }

    #[test]
    fn from_file_expands_home() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imbridge.toml");
        std::fs::write(
            &path,
            r#"
[unit]
module_path = "/srv/openIM.wasm"
cache_dir = "~/.imbridge/cache"

[store]
path = "/srv/local.db"
"#,
        )
        .unwrap();

        let config = ImBridgeConfig::from_file(&path).unwrap();
        if let Some(home) = dirs::home_dir() {
            assert_eq!(config.unit.cache_dir, Some(home.join(".imbridge/cache")));
        }
        assert_eq!(config.store.path, PathBuf::from("/srv/local.db"));
    }

    #[test]
    fn from_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[unit\nmodule_path = 1").unwrap();

        assert!(matches!(ImBridgeConfig::from_file(&path), Err(SdkError::Config(_))));
    }
}
