use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Environment variable holding the Telegram bot token.
pub const BOT_TOKEN_ENV: &str = "WEATHER_BOT_TOKEN";
/// Environment variable holding the OpenWeather API key.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_LOG_FILE: &str = "openweather_bot.log";
pub const MAX_GEOCODE_LIMIT: u8 = 5;

/// Telegram credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub token: String,
}

/// OpenWeather credentials and request parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenWeatherConfig {
    pub api_key: String,
    pub base_url: String,
    pub units: String,
    pub lang: String,
    pub geocode_limit: u8,
    /// Days shown after today.
    pub forecast_days: usize,
    /// No timeout when absent.
    pub request_timeout_secs: Option<u64>,
}

impl Default for OpenWeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            units: "metric".to_string(),
            lang: "ru".to_string(),
            geocode_limit: MAX_GEOCODE_LIMIT,
            forecast_days: 3,
            request_timeout_secs: None,
        }
    }
}

impl OpenWeatherConfig {
    pub fn effective_geocode_limit(&self) -> u8 {
        self.geocode_limit.clamp(1, MAX_GEOCODE_LIMIT)
    }
}

/// Top-level configuration, built once at startup.
///
/// Example TOML:
/// ```toml
/// fail_fast = false
///
/// [telegram]
/// token = "..."
///
/// [openweather]
/// api_key = "..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Append-only diagnostics log; stderr when absent.
    pub log_file: Option<PathBuf>,

    /// Exit the process on an upstream failure instead of replying to the user.
    pub fail_fast: bool,

    pub telegram: TelegramConfig,
    pub openweather: OpenWeatherConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
            fail_fast: false,
            telegram: TelegramConfig::default(),
            openweather: OpenWeatherConfig::default(),
        }
    }
}

impl Config {
    /// Load config from the platform config file, or defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform config file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save config, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-bot")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Override secrets from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Override secrets from `lookup`; blank values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(token) = get(BOT_TOKEN_ENV) {
            self.telegram.token = token;
        }
        if let Some(key) = get(API_KEY_ENV) {
            self.openweather.api_key = key;
        }
    }

    /// Ensure both secrets are present.
    pub fn validate(&self) -> Result<()> {
        if self.telegram.token.trim().is_empty() {
            return Err(anyhow!(
                "No Telegram bot token configured.\n\
                 Hint: set {BOT_TOKEN_ENV} or run `weather-bot configure`."
            ));
        }

        if self.openweather.api_key.trim().is_empty() {
            return Err(anyhow!(
                "No OpenWeather API key configured.\n\
                 Hint: set {API_KEY_ENV} or run `weather-bot configure`."
            ));
        }

        Ok(())
    }
}
