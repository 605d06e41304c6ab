//! Shared configuration for the postview CLI.
//!
//! TOML file layered over built-in defaults and `POSTVIEW_*` environment
//! variables, plus translation to `postview_core::FeedConfig`. The CLI
//! applies its own flag overrides on top of what this crate resolves.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use postview_core::FeedConfig;

/// Environment variable prefix; nested keys are separated by `__`
/// (`POSTVIEW_API__BASE_URL`).
pub const ENV_PREFIX: &str = "POSTVIEW_";

const CACHE_FILE_NAME: &str = "data-cache.redb";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub feed: FeedSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub defaults: Defaults,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApiSettings {
    /// API root (e.g. "https://jsonplaceholder.typicode.com").
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FeedSettings {
    /// Posts per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Users loaded for the author filter.
    #[serde(default = "default_users_limit")]
    pub users_limit: u32,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            users_limit: default_users_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cache database file; the platform cache directory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_base_url() -> String {
    FeedConfig::default()
        .base_url
        .as_str()
        .trim_end_matches('/')
        .to_owned()
}
fn default_timeout() -> u64 {
    30
}
fn default_page_size() -> u32 {
    FeedConfig::default().page_size
}
fn default_users_limit() -> u32 {
    FeedConfig::default().users_limit
}
fn default_true() -> bool {
    true
}
fn default_output() -> String {
    "table".into()
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    /// Validate and convert to the runtime feed configuration.
    pub fn to_feed_config(&self) -> Result<FeedConfig, ConfigError> {
        let base_url: url::Url =
            self.api
                .base_url
                .parse()
                .map_err(|_| ConfigError::Validation {
                    field: "api.base_url".into(),
                    reason: format!("invalid URL: {}", self.api.base_url),
                })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation {
                field: "api.base_url".into(),
                reason: format!("expected an http(s) URL, got '{}'", base_url.scheme()),
            });
        }

        if self.api.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "api.timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        if self.feed.page_size == 0 {
            return Err(ConfigError::Validation {
                field: "feed.page_size".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.feed.users_limit == 0 {
            return Err(ConfigError::Validation {
                field: "feed.users_limit".into(),
                reason: "must be at least 1".into(),
            });
        }

        Ok(FeedConfig {
            base_url,
            page_size: self.feed.page_size,
            users_limit: self.feed.users_limit,
            timeout: Duration::from_secs(self.api.timeout),
            ..FeedConfig::default()
        })
    }

    /// Where the page cache lives for this configuration.
    pub fn cache_path(&self) -> PathBuf {
        self.cache.path.clone().unwrap_or_else(default_cache_path)
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "postview", "postview")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default location of the persistent page cache.
pub fn default_cache_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".cache").join(CACHE_FILE_NAME),
        |dirs| dirs.cache_dir().join(CACHE_FILE_NAME),
    )
}

fn home_fallback(kind: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(kind);
    p.push("postview");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load defaults, then `path` (if it exists), then `POSTVIEW_*` env vars.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it can't be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_translate_to_default_feed() {
        let feed = Config::default().to_feed_config().unwrap();
        assert_eq!(feed, FeedConfig::default());
    }

    #[test]
    fn file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                    [api]
                    base_url = "http://localhost:3000"

                    [feed]
                    page_size = 5
                "#,
            )?;

            let config = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(config.api.base_url, "http://localhost:3000");
            assert_eq!(config.api.timeout, 30);
            assert_eq!(config.feed.page_size, 5);
            assert_eq!(config.feed.users_limit, 10);
            assert!(config.cache.enabled);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[feed]\npage_size = 5\n")?;
            jail.set_env("POSTVIEW_FEED__PAGE_SIZE", "8");
            jail.set_env("POSTVIEW_CACHE__ENABLED", "false");

            let config = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(config.feed.page_size, 8);
            assert!(!config.cache.enabled);
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let config = load_config_from(Path::new("absent.toml")).unwrap();
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = Config::default();
        config.api.base_url = "ftp://example.com".into();
        assert!(matches!(
            config.to_feed_config(),
            Err(ConfigError::Validation { ref field, .. }) if field == "api.base_url"
        ));

        let mut config = Config::default();
        config.feed.page_size = 0;
        assert!(config.to_feed_config().is_err());

        let mut config = Config::default();
        config.api.base_url = "not a url".into();
        assert!(config.to_feed_config().is_err());
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.feed.users_limit = 4;
        config.cache.path = Some(dir.path().join("pages.redb"));
        config.defaults.output = "json".into();
        save_config_to(&config, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("users_limit = 4"));

        let parsed: Config = toml::from_str(&written).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.cache_path(), dir.path().join("pages.redb"));
    }

    #[test]
    fn cache_path_defaults_to_platform_dir() {
        let config = Config::default();
        assert!(config.cache_path().ends_with(CACHE_FILE_NAME));
    }
}
