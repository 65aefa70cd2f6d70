//! Process configuration.
//!
//! Loaded from a YAML file with shell-style environment variable expansion,
//! so secrets like the bot token never have to live in the file itself.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tokio::fs;

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    /// Directory holding the per-state descriptor files.
    #[serde(default)]
    pub states_dir: Option<PathBuf>,
    #[serde(default)]
    pub dialog: DialogConfig,
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("environment variable '{0}' is not set")]
    MissingEnvVar(String),

    #[error("unclosed variable reference '${{' (missing '}}')")]
    UnclosedVarReference,
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        let expanded = expand_env_vars(&contents)?;
        Ok(serde_yaml::from_str(&expanded)?)
    }
}

/// Resolve a path relative to the config file directory.
///
/// Absolute paths pass through; relative paths are joined with the config
/// file's parent so behavior doesn't depend on the working directory.
pub fn resolve_path(config_path: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    config_dir.join(path)
}

// ============================================================================
// Defaults
// ============================================================================

/// Default states directory (relative to config file).
pub const DEFAULT_STATES_DIR: &str = "states";

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_eviction_poll() -> u64 {
    60
}

fn default_idle_timeout() -> u64 {
    600
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Session eviction tuning.
#[derive(Debug, Deserialize)]
pub struct DialogConfig {
    /// How often each session's watcher re-checks inactivity.
    #[serde(default = "default_eviction_poll")]
    pub eviction_poll_seconds: u64,
    /// Inactivity span after which a session is evicted.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            eviction_poll_seconds: default_eviction_poll(),
            idle_timeout_seconds: default_idle_timeout(),
        }
    }
}

/// Telegram channel configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Telegram bot token from BotFather. Also serves as the webhook path.
    pub bot_token: String,
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in a string.
///
/// Shell-compatible syntax: `${VAR}` (required), `${VAR:-default}`
/// (optional with default), `$$` for a literal `$` before `{`. A plain `$`
/// passes through unchanged; `${` without a closing `}` is an error.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 1..];

        if let Some(tail) = rest.strip_prefix('$') {
            out.push('$');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix('{') {
            let end = tail.find('}').ok_or(ConfigError::UnclosedVarReference)?;
            let reference = &tail[..end];
            let (name, default) = match reference.split_once(":-") {
                Some((name, default)) => (name, Some(default)),
                None => (reference, None),
            };
            match std::env::var(name) {
                Ok(value) => out.push_str(&value),
                Err(_) => match default {
                    Some(value) => out.push_str(value),
                    None => return Err(ConfigError::MissingEnvVar(name.to_string())),
                },
            }
            rest = &tail[end + 1..];
        } else {
            out.push('$');
        }
    }

    out.push_str(rest);
    Ok(out)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout_seconds, 30);
        assert_eq!(config.dialog.eviction_poll_seconds, 60);
        assert_eq!(config.dialog.idle_timeout_seconds, 600);
        assert!(config.states_dir.is_none());
        assert!(config.telegram.is_none());
    }

    #[tokio::test]
    async fn load_missing_file_returns_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load(tmp.path().join("missing.yaml")).await.unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(config.telegram.is_none());
    }

    #[tokio::test]
    async fn load_full_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
server:
  host: "127.0.0.1"
  port: 3000
states_dir: "custom-states"
dialog:
  eviction_poll_seconds: 5
  idle_timeout_seconds: 30
telegram:
  bot_token: "test_token"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).await.unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.states_dir, Some(PathBuf::from("custom-states")));
        assert_eq!(config.dialog.eviction_poll_seconds, 5);
        assert_eq!(config.dialog.idle_timeout_seconds, 30);
        assert_eq!(config.telegram.unwrap().bot_token, "test_token");
    }

    #[tokio::test]
    async fn load_partial_yaml_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  port: 9000").unwrap();

        let config = Config::load(file.path()).await.unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.dialog.idle_timeout_seconds, 600);
    }

    #[tokio::test]
    async fn load_invalid_yaml_fails() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "telegram: [unclosed").unwrap();
        assert!(Config::load(file.path()).await.is_err());
    }

    #[test]
    fn resolve_path_absolute_passes_through() {
        let resolved = resolve_path(Path::new("/etc/pizzabot.yaml"), Path::new("/var/states"));
        assert_eq!(resolved, PathBuf::from("/var/states"));
    }

    #[test]
    fn resolve_path_relative_joins_config_dir() {
        let resolved = resolve_path(Path::new("/etc/bot/pizzabot.yaml"), Path::new("states"));
        assert_eq!(resolved, PathBuf::from("/etc/bot/states"));
    }

    #[test]
    fn expand_required_var() {
        // SAFETY: Single-threaded test
        unsafe { std::env::set_var("PIZZABOT_TEST_TOKEN", "secret") };
        let out = expand_env_vars("token: ${PIZZABOT_TEST_TOKEN}").unwrap();
        assert_eq!(out, "token: secret");
        unsafe { std::env::remove_var("PIZZABOT_TEST_TOKEN") };
    }

    #[test]
    fn expand_missing_required_var_fails() {
        // SAFETY: Single-threaded test
        unsafe { std::env::remove_var("PIZZABOT_MISSING_VAR") };
        let err = expand_env_vars("token: ${PIZZABOT_MISSING_VAR}").unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(name) if name == "PIZZABOT_MISSING_VAR"));
    }

    #[test]
    fn expand_default_value() {
        // SAFETY: Single-threaded test
        unsafe { std::env::remove_var("PIZZABOT_UNSET") };
        let out = expand_env_vars("host: ${PIZZABOT_UNSET:-0.0.0.0}").unwrap();
        assert_eq!(out, "host: 0.0.0.0");
    }

    #[test]
    fn expand_escaped_and_literal_dollar() {
        let out = expand_env_vars("price: $$100, also $50").unwrap();
        assert_eq!(out, "price: $100, also $50");
    }

    #[test]
    fn expand_unclosed_reference_fails() {
        let err = expand_env_vars("token: ${UNCLOSED").unwrap_err();
        assert!(matches!(err, ConfigError::UnclosedVarReference));
    }
}
