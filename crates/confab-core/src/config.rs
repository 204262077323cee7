//! Configuration management for confab.
//!
//! Loads configuration from ${CONFAB_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::coordinator::DEFAULT_QUESTION;
use crate::directory::{DEFAULT_FALLBACK_TITLE, DEFAULT_TITLE_WORDS, TitleRules};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Returns the embedded default config template.
pub fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for confab configuration and data directories.
    //!
    //! CONFAB_HOME resolution order:
    //! 1. CONFAB_HOME environment variable (if set)
    //! 2. ~/.config/confab (default)

    use std::path::PathBuf;

    /// Returns the confab home directory.
    pub fn confab_home() -> PathBuf {
        if let Ok(home) = std::env::var("CONFAB_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map_or_else(|| PathBuf::from(".confab"), |h| h.join(".config").join("confab"))
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        confab_home().join("config.toml")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level filter used when `RUST_LOG` is unset. When absent, the caller
    /// picks a default for its mode.
    pub level: Option<String>,
    /// Log to daily files under `<home>/logs` instead of stderr.
    pub file: bool,
}

impl LogConfig {
    pub fn level_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.level.as_deref().unwrap_or(fallback)
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: None,
            file: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    /// 0 disables the timeout.
    pub request_timeout_secs: u64,
    pub title_words: usize,
    pub fallback_title: String,
    pub default_question: String,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            title_words: DEFAULT_TITLE_WORDS,
            fallback_title: DEFAULT_FALLBACK_TITLE.to_string(),
            default_question: DEFAULT_QUESTION.to_string(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Saves only the `base_url` field to a specific config file path.
    ///
    /// Creates the file from the default template if it doesn't exist.
    /// Preserves existing fields and comments using `toml_edit`.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the file cannot be updated.
    pub fn save_base_url_to(path: &Path, base_url: &str) -> Result<()> {
        use toml_edit::{DocumentMut, value};

        let base_url = base_url.trim();
        validate_url(base_url)?;

        let contents = if path.exists() {
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?
        } else {
            default_config_template().to_string()
        };

        let mut doc: DocumentMut = contents
            .parse()
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        doc["base_url"] = value(base_url);

        Self::write_config(path, &doc.to_string())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.request_timeout_secs))
        }
    }

    pub fn title_rules(&self) -> TitleRules {
        TitleRules {
            words: self.title_words,
            fallback: self.fallback_title.clone(),
        }
    }

    /// Resolves the base URL with precedence: explicit > config > default.
    ///
    /// `explicit` is the `--base-url` flag, which the CLI also fills from
    /// `CONFAB_BASE_URL`.
    ///
    /// # Errors
    /// Returns an error if the chosen URL is not a valid URL.
    pub fn resolve_base_url(&self, explicit: Option<&str>) -> Result<String> {
        let chosen = [explicit, Some(self.base_url.as_str())]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|url| !url.is_empty())
            .unwrap_or(DEFAULT_BASE_URL);
        validate_url(chosen)?;
        Ok(chosen.to_string())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

fn validate_url(url: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid base URL: {url}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let config: Config = toml::from_str(default_config_template()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "title_words = 2\nrequest_timeout_secs = 0\n[log]\nfile = true\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.title_words, 2);
        assert_eq!(config.request_timeout(), None);
        assert!(config.log.file);
        assert_eq!(config.log.level, None);
        assert_eq!(config.log.level_or("warn"), "warn");
        assert_eq!(config.fallback_title, "New Chat");

        let rules = config.title_rules();
        assert_eq!(rules.words, 2);
        assert_eq!(rules.fallback, "New Chat");
    }

    #[test]
    fn test_explicit_log_level_wins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[log]\nlevel = \"debug\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.log.level_or("warn"), "debug");
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "base_url = [").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config"));
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::init(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), default_config_template());
        assert!(Config::init(&path).is_err());
    }

    #[test]
    fn test_save_base_url_preserves_comments() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "# my settings\ntitle_words = 6\n").unwrap();

        Config::save_base_url_to(&path, "http://chat.internal:9000").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("# my settings"));
        assert!(contents.contains("title_words = 6"));
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.base_url, "http://chat.internal:9000");
        assert_eq!(config.title_words, 6);
    }

    #[test]
    fn test_save_base_url_rejects_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        assert!(Config::save_base_url_to(&path, "not a url").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_resolve_base_url_precedence() {
        let config = Config {
            base_url: "http://from-config:1".to_string(),
            ..Config::default()
        };
        assert_eq!(
            config.resolve_base_url(Some("http://flag:2")).unwrap(),
            "http://flag:2"
        );
        assert_eq!(
            config.resolve_base_url(Some("  ")).unwrap(),
            "http://from-config:1"
        );
        assert_eq!(config.resolve_base_url(None).unwrap(), "http://from-config:1");

        let empty = Config {
            base_url: String::new(),
            ..Config::default()
        };
        assert_eq!(empty.resolve_base_url(None).unwrap(), DEFAULT_BASE_URL);
        assert!(config.resolve_base_url(Some("::nope")).is_err());
    }
}
