//! Configuration for the kiosk client.
//!
//! Read from `~/.config/kiosk/config.toml` at startup. A missing file is
//! replaced with a commented default; missing keys fall back field by field.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ratatui::style::Color;
use serde::{de, Deserialize, Deserializer};

use crate::query::QueryOptions;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub query: QueryConfig,
    pub theme: ThemeConfig,
}

/// Where and how to reach the backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9988/api".to_string(),
            timeout_secs: crate::api::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Process-wide cache defaults. Pages layer their own staleness windows on
/// top of these.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub stale_secs: u64,
    pub cache_secs: u64,
    pub retry: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            stale_secs: 0,
            cache_secs: 300,
            retry: 1,
        }
    }
}

impl QueryConfig {
    pub fn base_options(&self) -> QueryOptions {
        QueryOptions {
            stale_time: Duration::from_secs(self.stale_secs),
            cache_time: Duration::from_secs(self.cache_secs),
            retry: self.retry,
            ..QueryOptions::default()
        }
    }
}

/// TUI colors, as names ("Cyan") or hex ("#1E90FF").
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    #[serde(deserialize_with = "deserialize_color")]
    pub accent: Color,
    #[serde(deserialize_with = "deserialize_color")]
    pub border: Color,
    #[serde(deserialize_with = "deserialize_color")]
    pub headline: Color,
    #[serde(deserialize_with = "deserialize_color")]
    pub metadata: Color,
    #[serde(deserialize_with = "deserialize_color")]
    pub error: Color,
    #[serde(deserialize_with = "deserialize_color")]
    pub status_fg: Color,
    #[serde(deserialize_with = "deserialize_color")]
    pub status_bg: Color,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            accent: Color::Cyan,
            border: Color::DarkGray,
            headline: Color::White,
            metadata: Color::Yellow,
            error: Color::Red,
            status_fg: Color::White,
            status_bg: Color::DarkGray,
        }
    }
}

impl Config {
    /// Load from the default path, writing a commented default file first if
    /// none exists.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_config_path()?;
        if !path.exists() {
            Self::write_default_config(&path)?;
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// `~/.config/kiosk/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("kiosk").join("config.toml"))
    }

    fn write_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })
    }

    fn default_config_content() -> String {
        r##"# Kiosk configuration
#
# Colors accept named values (Black, Red, Green, Yellow, Blue, Magenta,
# Cyan, Gray, DarkGray, White, Reset) or hex codes ("#RRGGBB").

[api]
# Base URL of the news backend, including the /api prefix.
# Overridable per run with --api-url or the KIOSK_API_URL variable.
base_url = "http://localhost:9988/api"

# Request timeout in seconds.
timeout_secs = 10

[query]
# Seconds a fetched result counts as fresh before background revalidation.
stale_secs = 0

# Seconds an unused cache entry survives before eviction.
cache_secs = 300

# Extra attempts after a failed fetch.
retry = 1

[theme]
accent = "Cyan"
border = "DarkGray"
headline = "White"
metadata = "Yellow"
error = "Red"
status_fg = "White"
status_bg = "DarkGray"
"##
        .to_string()
    }
}

fn deserialize_color<'de, D>(deserializer: D) -> Result<Color, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_color(&s).map_err(de::Error::custom)
}

/// Parse a named color or a "#RRGGBB" hex code.
pub fn parse_color(s: &str) -> Result<Color, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() != 6 {
            return Err(format!("expected #RRGGBB, got: {s}"));
        }
        let value = u32::from_str_radix(hex, 16).map_err(|_| format!("invalid hex color: {s}"))?;
        return Ok(Color::Rgb(
            (value >> 16) as u8,
            (value >> 8) as u8,
            value as u8,
        ));
    }

    match s.to_lowercase().as_str() {
        "black" => Ok(Color::Black),
        "red" => Ok(Color::Red),
        "green" => Ok(Color::Green),
        "yellow" => Ok(Color::Yellow),
        "blue" => Ok(Color::Blue),
        "magenta" => Ok(Color::Magenta),
        "cyan" => Ok(Color::Cyan),
        "gray" | "grey" => Ok(Color::Gray),
        "darkgray" | "darkgrey" => Ok(Color::DarkGray),
        "white" => Ok(Color::White),
        "reset" => Ok(Color::Reset),
        _ => Err(format!("unknown color: {s}")),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_content_parses() {
        let config: Config = toml::from_str(&Config::default_config_content()).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:9988/api");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.query.retry, 1);
        assert_eq!(config.theme.accent, Color::Cyan);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = toml::from_str(
            r##"
[api]
base_url = "https://news.example.com/api"

[theme]
accent = "#1E90FF"
"##,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://news.example.com/api");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.theme.accent, Color::Rgb(0x1E, 0x90, 0xFF));
        assert_eq!(config.theme.border, Color::DarkGray);
    }

    #[test]
    fn test_empty_config_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.query.cache_secs, 300);
        assert_eq!(config.query.stale_secs, 0);
    }

    #[test]
    fn test_base_options_from_query_section() {
        let query = QueryConfig {
            stale_secs: 60,
            cache_secs: 600,
            retry: 0,
        };
        let options = query.base_options();
        assert_eq!(options.stale_time, Duration::from_secs(60));
        assert_eq!(options.cache_time, Duration::from_secs(600));
        assert_eq!(options.retry, 0);
        assert!(options.enabled);
    }

    #[test]
    fn test_parse_color_rejects_garbage() {
        assert!(parse_color("chartreuse-ish").is_err());
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("#GGGGGG").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[api]\nbase_url = \"http://10.0.0.5:9988/api\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api.base_url, "http://10.0.0.5:9988/api");
    }

    #[test]
    fn test_load_from_bad_toml_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[api\nbase_url = ").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
