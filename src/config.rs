//! Configuration management for the `MotoPlan` application
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::MotoPlanError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `MotoPlan` application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MotoPlanConfig {
    /// Credentials for the external services
    #[serde(default)]
    pub keys: ApiKeys,
    /// Service endpoints
    #[serde(default)]
    pub services: ServicesConfig,
    /// Route sampling and marker settings
    #[serde(default)]
    pub sampling: SamplingConfig,
    /// Saved-route store
    #[serde(default)]
    pub store: StoreConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// API keys, each optional until the operation that needs it runs
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ApiKeys {
    /// OpenRouteService key
    pub routing: Option<String>,
    /// OpenWeatherMap key
    pub weather: Option<String>,
    /// Gemini key
    pub insight: Option<String>,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |key: &Option<String>| key.as_ref().map(|_| "***");
        f.debug_struct("ApiKeys")
            .field("routing", &mask(&self.routing))
            .field("weather", &mask(&self.weather))
            .field("insight", &mask(&self.insight))
            .finish()
    }
}

/// External service endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,
    #[serde(default = "default_routing_url")]
    pub routing_url: String,
    #[serde(default = "default_weather_url")]
    pub weather_url: String,
    #[serde(default = "default_insight_url")]
    pub insight_url: String,
    /// Generative model used for ride summaries
    #[serde(default = "default_insight_model")]
    pub insight_model: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Route sampling and marker filter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Distance between weather samples in kilometers
    #[serde(default = "default_step_km")]
    pub step_km: f64,
    /// Temperature change (°C) that forces a marker
    #[serde(default = "default_temperature_delta")]
    pub temperature_delta: f64,
    /// Every Nth sample is shown regardless of change
    #[serde(default = "default_marker_every")]
    pub marker_every: usize,
}

/// Saved-route store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store directory location
    #[serde(default = "default_store_location")]
    pub location: String,
    /// Application namespace for saved routes
    #[serde(default = "default_app_id")]
    pub app_id: String,
    /// Fixed user id; an anonymous id is generated when unset
    pub user_id: Option<String>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

// Default value functions
fn default_geocoding_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_routing_url() -> String {
    "https://api.openrouteservice.org".to_string()
}

fn default_weather_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_insight_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_insight_model() -> String {
    "gemini-2.5-flash-preview-09-2025".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_user_agent() -> String {
    format!("MotoPlan/{}", crate::VERSION)
}

fn default_step_km() -> f64 {
    crate::sampler::DEFAULT_STEP_KM
}

fn default_temperature_delta() -> f64 {
    3.0
}

fn default_marker_every() -> usize {
    3
}

fn default_store_location() -> String {
    dirs::data_dir()
        .map(|dir| dir.join("motoplan").to_string_lossy().into_owned())
        .unwrap_or_else(|| ".motoplan".to_string())
}

fn default_app_id() -> String {
    "moto-local-dev".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            geocoding_url: default_geocoding_url(),
            routing_url: default_routing_url(),
            weather_url: default_weather_url(),
            insight_url: default_insight_url(),
            insight_model: default_insight_model(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            step_km: default_step_km(),
            temperature_delta: default_temperature_delta(),
            marker_every: default_marker_every(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            location: default_store_location(),
            app_id: default_app_id(),
            user_id: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl MotoPlanConfig {
    /// Load configuration from `config_path` (or the default location) and
    /// environment variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // MOTOPLAN_KEYS__ROUTING, MOTOPLAN_SAMPLING__STEP_KM, ...
        builder = builder.add_source(
            Environment::with_prefix("MOTOPLAN")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: MotoPlanConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("motoplan").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.services.timeout_seconds == 0 {
            self.services.timeout_seconds = default_timeout();
        }
        if self.services.user_agent.is_empty() {
            self.services.user_agent = default_user_agent();
        }
        if self.services.insight_model.is_empty() {
            self.services.insight_model = default_insight_model();
        }
        if self.sampling.marker_every == 0 {
            self.sampling.marker_every = default_marker_every();
        }
        if self.store.location.is_empty() {
            self.store.location = default_store_location();
        }
        if self.store.app_id.is_empty() {
            self.store.app_id = default_app_id();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }

        // Blank keys from the environment count as missing
        for key in [
            &mut self.keys.routing,
            &mut self.keys.weather,
            &mut self.keys.insight,
        ] {
            if key.as_deref().is_some_and(|k| k.trim().is_empty()) {
                *key = None;
            }
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.services.timeout_seconds > 300 {
            return Err(
                MotoPlanError::config("Service timeout cannot exceed 300 seconds").into(),
            );
        }

        if !(self.sampling.step_km > 0.0 && self.sampling.step_km <= 1000.0) {
            return Err(MotoPlanError::config(
                "Sampling step must be greater than 0 and at most 1000 km",
            )
            .into());
        }

        if self.sampling.temperature_delta < 0.0 {
            return Err(
                MotoPlanError::config("Marker temperature delta cannot be negative").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(MotoPlanError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(MotoPlanError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("geocoding", &self.services.geocoding_url),
            ("routing", &self.services.routing_url),
            ("weather", &self.services.weather_url),
            ("insight", &self.services.insight_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(MotoPlanError::config(format!(
                    "The {name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = MotoPlanConfig::default();
        assert_eq!(
            config.services.routing_url,
            "https://api.openrouteservice.org"
        );
        assert_eq!(config.services.timeout_seconds, 30);
        assert_eq!(config.sampling.step_km, 35.0);
        assert_eq!(config.sampling.temperature_delta, 3.0);
        assert_eq!(config.sampling.marker_every, 3);
        assert_eq!(config.store.app_id, "moto-local-dev");
        assert_eq!(config.logging.level, "info");
        assert!(config.keys.routing.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = MotoPlanConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_step() {
        let mut config = MotoPlanConfig::default();
        config.sampling.step_km = 0.0;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Sampling step"));
    }

    #[test]
    fn test_config_validation_base_url() {
        let mut config = MotoPlanConfig::default();
        config.services.weather_url = "api.openweathermap.org".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_keys_are_missing() {
        let mut config = MotoPlanConfig::default();
        config.keys.routing = Some("  ".to_string());
        config.keys.weather = Some("abc".to_string());
        config.apply_defaults();
        assert!(config.keys.routing.is_none());
        assert_eq!(config.keys.weather.as_deref(), Some("abc"));
    }

    #[test]
    fn test_keys_are_masked_in_debug_output() {
        let keys = ApiKeys {
            routing: Some("secret-routing-key".to_string()),
            weather: None,
            insight: None,
        };
        let debug = format!("{keys:?}");
        assert!(!debug.contains("secret-routing-key"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_load_from_file_with_partial_sections() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[keys]\nrouting = \"ors-test\"\n\n[sampling]\nstep_km = 50.0\n"
        )
        .unwrap();

        let config = MotoPlanConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.keys.routing.as_deref(), Some("ors-test"));
        assert_eq!(config.sampling.step_km, 50.0);
        assert_eq!(config.sampling.marker_every, 3);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = MotoPlanConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("motoplan"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
