use crate::error::{AgriSureError, Result};
use dialoguer::{Input, Password};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    pub weather: Option<WeatherConfig>,
    #[serde(default)]
    pub open_meteo: OpenMeteoConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    /// District-level yield table, one `<CROP> YIELD (Kg per ha)` column per crop
    pub yield_csv: PathBuf,
    /// District soil health scores
    pub soil_csv: PathBuf,
    /// Optional override for the built-in district alias table
    #[serde(default)]
    pub district_aliases: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".into(),
            user_agent: "agrisure-ai".into(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Clone, Deserialize, Serialize)]
pub struct WeatherConfig {
    pub api_key: String,
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_weather_base_url() -> String {
    "https://api.weatherapi.com/v1".into()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_enabled() -> bool {
    true
}

impl std::fmt::Debug for WeatherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("enabled", &self.enabled)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenMeteoConfig {
    pub base_url: String,
    pub forecast_days: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenMeteoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com/v1".into(),
            forecast_days: 16,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ForecastConfig {
    /// Positive observations needed before the requested crop is model-fitted
    pub min_points: usize,
    /// Observations needed for a crop to enter the priority list
    pub ranking_min_points: usize,
    /// Upper bound on concurrent model fits per request
    pub max_parallel_fits: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            min_points: 6,
            ranking_min_points: 5,
            max_parallel_fits: 4,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
        }
    }
}

impl Config {
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => p,
            None => Self::find_config_path()?,
        };

        if !config_path.exists() {
            return Err(AgriSureError::Config(format!(
                "Config file not found at {:?}. Run `agrisure init` to set up.",
                config_path
            )));
        }

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| AgriSureError::Config(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&config_str)
    }

    /// Parse a YAML document after substituting `${VAR}` references.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let content = Self::substitute_env_vars(content);

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| AgriSureError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.forecast.min_points == 0 || self.forecast.ranking_min_points == 0 {
            return Err(AgriSureError::Config(
                "forecast.min_points and forecast.ranking_min_points must be at least 1".into(),
            ));
        }
        if self.forecast.max_parallel_fits == 0 {
            return Err(AgriSureError::Config(
                "forecast.max_parallel_fits must be at least 1".into(),
            ));
        }
        if self.geocoder.user_agent.trim().is_empty() {
            return Err(AgriSureError::Config(
                "geocoder.user_agent must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Weather settings when a key is present and the source is enabled.
    pub fn active_weather(&self) -> Option<&WeatherConfig> {
        self.weather
            .as_ref()
            .filter(|w| w.enabled && !w.api_key.is_empty())
    }

    /// Search for config.yaml in standard locations.
    /// Returns the path of the first found config, or the XDG default path if none found.
    fn find_config_path() -> Result<PathBuf> {
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("agrisure").join("config.yaml");
            if xdg_config.exists() {
                return Ok(xdg_config);
            }
        }

        Self::default_config_path()
    }

    /// Returns true if a config file can be found in any standard location.
    pub fn exists(config_override: Option<&PathBuf>) -> bool {
        match config_override {
            Some(p) => p.exists(),
            None => Self::find_config_path()
                .map(|p| p.exists())
                .unwrap_or(false),
        }
    }

    /// Default path for writing new config files (~/.config/agrisure/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AgriSureError::Config("Cannot determine config directory".into()))?
            .join("agrisure");
        Ok(config_dir.join("config.yaml"))
    }

    /// Run interactive setup prompts and write config to disk.
    /// Returns the loaded Config and the path it was written to.
    pub fn setup_interactive() -> Result<(Self, PathBuf)> {
        println!();
        println!("Let's set up AgriSure!");
        println!();

        println!("Historical data");
        let yield_csv: String = Input::new()
            .with_prompt("  Yield CSV")
            .default("data/ICRISAT-District_Level_Data_30_Years.csv".into())
            .interact_text()
            .map_err(input_error)?;

        let soil_csv: String = Input::new()
            .with_prompt("  Soil health CSV")
            .default("data/SoilHealthScores_by_District_2.csv".into())
            .interact_text()
            .map_err(input_error)?;

        println!();

        println!("Reverse geocoding (Nominatim)");
        let geo_defaults = GeocoderConfig::default();
        let geocoder_url: String = Input::new()
            .with_prompt("  Base URL")
            .default(geo_defaults.base_url)
            .interact_text()
            .map_err(input_error)?;

        let user_agent: String = Input::new()
            .with_prompt("  User agent")
            .default(geo_defaults.user_agent)
            .interact_text()
            .map_err(input_error)?;

        println!();

        println!("WeatherAPI (leave API key blank to skip)");
        let api_key: String = Password::new()
            .with_prompt("  API key")
            .allow_empty_password(true)
            .interact()
            .map_err(input_error)?;

        let weather = if api_key.is_empty() {
            None
        } else {
            Some(WeatherConfig {
                api_key,
                base_url: default_weather_base_url(),
                timeout_secs: default_timeout_secs(),
                enabled: true,
            })
        };

        println!();

        let config = Config {
            data: DataConfig {
                yield_csv: PathBuf::from(yield_csv),
                soil_csv: PathBuf::from(soil_csv),
                district_aliases: None,
            },
            geocoder: GeocoderConfig {
                base_url: geocoder_url,
                user_agent,
                timeout_secs: default_timeout_secs(),
            },
            weather,
            open_meteo: OpenMeteoConfig::default(),
            forecast: ForecastConfig::default(),
            server: ServerConfig::default(),
        };

        let config_path = Self::default_config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(&config)
            .map_err(|e| AgriSureError::Config(format!("Failed to serialize config: {}", e)))?;

        let content = format!(
            "# AgriSure Configuration\n# Generated by `agrisure init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(&config_path, content)?;

        println!("Configuration saved to {}", config_path.display());
        println!();

        Ok((config, config_path))
    }

    fn substitute_env_vars(content: &str) -> String {
        let mut result = content.to_string();

        // Pattern is a literal and known to compile
        let Ok(re) = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}") else {
            return result;
        };

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        result
    }
}

fn input_error(e: dialoguer::Error) -> AgriSureError {
    AgriSureError::Config(format!("Input error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
data:
  yield_csv: data/yield.csv
  soil_csv: data/soil.csv
"#;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.forecast.min_points, 6);
        assert_eq!(config.forecast.ranking_min_points, 5);
        assert_eq!(config.geocoder.user_agent, "agrisure-ai");
        assert_eq!(config.server.port, 5000);
        assert!(config.active_weather().is_none());
    }

    #[test]
    fn substitutes_env_vars() {
        std::env::set_var("AGRISURE_TEST_WEATHER_KEY", "abc123");
        let yaml = format!(
            "{}weather:\n  api_key: ${{AGRISURE_TEST_WEATHER_KEY}}\n",
            MINIMAL
        );
        let config = Config::from_yaml(&yaml).unwrap();
        let weather = config.active_weather().unwrap();
        assert_eq!(weather.api_key, "abc123");
        assert_eq!(weather.timeout_secs, 10);
    }

    #[test]
    fn disabled_weather_is_inactive() {
        let yaml = format!("{}weather:\n  api_key: key\n  enabled: false\n", MINIMAL);
        let config = Config::from_yaml(&yaml).unwrap();
        assert!(config.active_weather().is_none());
    }

    #[test]
    fn rejects_zero_parallelism() {
        let yaml = format!(
            "{}forecast:\n  min_points: 6\n  ranking_min_points: 5\n  max_parallel_fits: 0\n",
            MINIMAL
        );
        assert!(matches!(
            Config::from_yaml(&yaml),
            Err(AgriSureError::Config(_))
        ));
    }

    #[test]
    fn debug_redacts_api_key() {
        let weather = WeatherConfig {
            api_key: "secret".into(),
            base_url: default_weather_base_url(),
            timeout_secs: 10,
            enabled: true,
        };
        let debug = format!("{:?}", weather);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
