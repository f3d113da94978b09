use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::feed::FeedParser;

// =============================================================================
// Reader defaults
// =============================================================================

/// Default user agent sent with feed requests
pub const DEFAULT_USER_AGENT: &str = "DotClear.org RepoBrowser/0.1";

/// Default feed request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Default package download timeout in seconds
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 10;

/// Default cache lifetime, as a relative-time expression
pub const DEFAULT_CACHE_TTL: &str = "-30 minutes";

/// Subdirectory of the cache directory holding feed entries
pub const CACHE_FILE_PREFIX: &str = "dcrepo";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid relative time expression: {0:?}")]
    InvalidRelativeTime(String),

    #[error("No core version configured; set coreVersion or enable dev mode")]
    MissingCoreVersion,
}

/// Repository client configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// Repository feed URL; without one, checks are no-ops
    pub feed_url: Option<String>,
    /// Version of the running core, used to gate incompatible modules
    pub core_version: Option<String>,
    /// Keep every module regardless of its minimum core version
    pub dev_mode: bool,
    pub download_timeout_seconds: u64,
    pub reader: ReaderConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            feed_url: None,
            core_version: None,
            dev_mode: false,
            download_timeout_seconds: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            reader: ReaderConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Load a JSON configuration file; missing fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Feed parser gated on the configured core version.
    ///
    /// Dev mode keeps every module, so it needs no core version.
    pub fn feed_parser(&self) -> Result<FeedParser, ConfigError> {
        match (&self.core_version, self.dev_mode) {
            (Some(version), _) if !version.is_empty() => {
                Ok(FeedParser::new(version.as_str(), self.dev_mode))
            }
            (_, true) => Ok(FeedParser::new("", true)),
            _ => Err(ConfigError::MissingCoreVersion),
        }
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_seconds)
    }
}

/// Feed reader configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ReaderConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    /// Cache root; must exist and be writable to be used
    pub cache_dir: Option<PathBuf>,
    /// Cache lifetime, e.g. "-30 minutes" or "1 hour"
    pub cache_ttl: String,
    /// Refresh a stale entry's timestamp when the origin is unreachable
    pub touch_on_fail: bool,
    /// Ignore cached entries on every fetch
    pub force_refresh: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            cache_dir: None,
            cache_ttl: DEFAULT_CACHE_TTL.to_string(),
            touch_on_fail: true,
            force_refresh: false,
        }
    }
}

impl ReaderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn cache_ttl(&self) -> Result<Duration, ConfigError> {
        parse_relative_time(&self.cache_ttl)
    }
}

/// Parse a relative-time expression such as "-30 minutes" or
/// "1 hour 15 min" into its magnitude.
///
/// The sign is accepted and ignored: "-30 minutes" and "30 minutes" both
/// mean thirty minutes.
pub fn parse_relative_time(expr: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidRelativeTime(expr.to_string());

    let trimmed = expr.trim();
    let unsigned = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('+'))
        .unwrap_or(trimmed);

    let tokens: Vec<&str> = unsigned.split_whitespace().collect();
    if tokens.is_empty() || tokens.len() % 2 != 0 {
        return Err(invalid());
    }

    let mut total = Duration::ZERO;
    for pair in tokens.chunks(2) {
        let amount: u64 = pair[0].parse().map_err(|_| invalid())?;
        let unit = unit_seconds(pair[1]).ok_or_else(invalid)?;
        let secs = amount.checked_mul(unit).ok_or_else(invalid)?;
        total = total
            .checked_add(Duration::from_secs(secs))
            .ok_or_else(invalid)?;
    }

    Ok(total)
}

fn unit_seconds(unit: &str) -> Option<u64> {
    match unit.to_ascii_lowercase().as_str() {
        "sec" | "secs" | "second" | "seconds" => Some(1),
        "min" | "mins" | "minute" | "minutes" => Some(60),
        "hour" | "hours" => Some(60 * 60),
        "day" | "days" => Some(24 * 60 * 60),
        "week" | "weeks" => Some(7 * 24 * 60 * 60),
        _ => None,
    }
}

/// Returns the default cache directory for dcrepo.
/// Uses $XDG_CACHE_HOME/dcrepo if XDG_CACHE_HOME is set,
/// otherwise falls back to ~/.cache/dcrepo,
/// or ./dcrepo if neither is available.
pub fn cache_dir() -> PathBuf {
    dir_with_env(
        std::env::var("XDG_CACHE_HOME").ok(),
        dirs::home_dir(),
        ".cache",
    )
}

/// Returns the path to the data directory for dcrepo.
/// Uses $XDG_DATA_HOME/dcrepo if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/dcrepo.
pub fn data_dir() -> PathBuf {
    dir_with_env(
        std::env::var("XDG_DATA_HOME").ok(),
        dirs::home_dir(),
        ".local/share",
    )
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("dcrepo.log")
}

fn dir_with_env(xdg_dir: Option<String>, home_dir: Option<PathBuf>, home_suffix: &str) -> PathBuf {
    let base = xdg_dir
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(home_suffix)))
        .unwrap_or_else(|| PathBuf::from("."));

    base.join("dcrepo")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn store_config_from_partial_object_uses_defaults_for_missing_fields() {
        let result = serde_json::from_value::<StoreConfig>(json!({
            "feedUrl": "https://repo.example.com/plugins.xml",
            "reader": {
                "timeoutSeconds": 12
            }
        }))
        .unwrap();

        assert_eq!(
            result.feed_url.as_deref(),
            Some("https://repo.example.com/plugins.xml")
        );
        assert_eq!(result.reader.timeout_seconds, 12);
        assert_eq!(result.reader.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(result.reader.cache_ttl, DEFAULT_CACHE_TTL);
        assert!(result.reader.touch_on_fail);
        assert!(!result.dev_mode);
    }

    #[test]
    fn store_config_from_full_object_parses_all_fields() {
        let result = serde_json::from_value::<StoreConfig>(json!({
            "feedUrl": "https://repo.example.com/themes.xml",
            "coreVersion": "2.20",
            "devMode": true,
            "downloadTimeoutSeconds": 60,
            "reader": {
                "userAgent": "Dotclear/2.20",
                "timeoutSeconds": 8,
                "cacheDir": "/var/cache/dotclear",
                "cacheTtl": "2 hours",
                "touchOnFail": false,
                "forceRefresh": true
            }
        }))
        .unwrap();

        assert_eq!(
            result,
            StoreConfig {
                feed_url: Some("https://repo.example.com/themes.xml".to_string()),
                core_version: Some("2.20".to_string()),
                dev_mode: true,
                download_timeout_seconds: 60,
                reader: ReaderConfig {
                    user_agent: "Dotclear/2.20".to_string(),
                    timeout_seconds: 8,
                    cache_dir: Some(PathBuf::from("/var/cache/dotclear")),
                    cache_ttl: "2 hours".to_string(),
                    touch_on_fail: false,
                    force_refresh: true,
                },
            }
        );
    }

    #[test]
    fn store_config_from_file_reads_json() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("dcrepo.json");
        std::fs::write(&path, r#"{"coreVersion": "2.19"}"#).unwrap();

        let config = StoreConfig::from_file(&path).unwrap();

        assert_eq!(config.core_version.as_deref(), Some("2.19"));
    }

    const GATED_FEED: &[u8] = br#"<modules xmlns:da="http://dotaddict.org/da/">
        <module id="current"><version>1.0</version><da:dcmin>2.19</da:dcmin></module>
        <module id="future"><version>1.0</version><da:dcmin>9.9</da:dcmin></module>
    </modules>"#;

    #[test]
    fn feed_parser_requires_core_version_outside_dev_mode() {
        let config = StoreConfig::default();

        assert_eq!(config.core_version, None);
        assert!(matches!(
            config.feed_parser(),
            Err(ConfigError::MissingCoreVersion)
        ));

        let blank = StoreConfig {
            core_version: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(
            blank.feed_parser(),
            Err(ConfigError::MissingCoreVersion)
        ));
    }

    #[test]
    fn feed_parser_gates_on_configured_core_version() {
        let config = StoreConfig {
            core_version: Some("2.20".to_string()),
            ..Default::default()
        };

        let modules = config.feed_parser().unwrap().parse(GATED_FEED).unwrap();

        assert_eq!(modules.keys().collect::<Vec<_>>(), vec!["current"]);
    }

    #[test]
    fn feed_parser_in_dev_mode_keeps_every_module() {
        let config = StoreConfig {
            dev_mode: true,
            ..Default::default()
        };

        let modules = config.feed_parser().unwrap().parse(GATED_FEED).unwrap();

        assert_eq!(
            modules.keys().collect::<Vec<_>>(),
            vec!["current", "future"]
        );
    }

    #[rstest]
    #[case("-30 minutes", 30 * 60)]
    #[case("30 minutes", 30 * 60)]
    #[case("+1 hour", 60 * 60)]
    #[case("1 hour 15 min", 75 * 60)]
    #[case("2 days", 2 * 24 * 60 * 60)]
    #[case("1 week", 7 * 24 * 60 * 60)]
    #[case("45 Seconds", 45)]
    #[case("0 minutes", 0)]
    fn parse_relative_time_accepts_expressions(#[case] expr: &str, #[case] secs: u64) {
        assert_eq!(
            parse_relative_time(expr).unwrap(),
            Duration::from_secs(secs)
        );
    }

    #[rstest]
    #[case("")]
    #[case("-")]
    #[case("30")]
    #[case("thirty minutes")]
    #[case("30 fortnights")]
    #[case("1 hour 15")]
    fn parse_relative_time_rejects_invalid_expressions(#[case] expr: &str) {
        assert!(matches!(
            parse_relative_time(expr),
            Err(ConfigError::InvalidRelativeTime(_))
        ));
    }

    #[test]
    fn dir_with_env_uses_xdg_dir_when_set() {
        let path = dir_with_env(
            Some("/tmp/test-cache".to_string()),
            Some(PathBuf::from("/home/user")),
            ".cache",
        );

        assert_eq!(path, PathBuf::from("/tmp/test-cache/dcrepo"));
    }

    #[test]
    fn dir_with_env_falls_back_to_home_suffix() {
        let path = dir_with_env(None, Some(PathBuf::from("/home/user")), ".cache");

        assert_eq!(path, PathBuf::from("/home/user/.cache/dcrepo"));
    }

    #[test]
    fn dir_with_env_falls_back_to_current_dir_when_no_dirs_available() {
        let path = dir_with_env(None, None, ".local/share");
        assert_eq!(path, PathBuf::from("./dcrepo"));
    }
}
