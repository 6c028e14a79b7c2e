//! Configuration management for drivelog.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::export::ExportFormat;
use crate::location::{LocationRequest, ProviderKind, DEFAULT_GPSD_ADDRESS};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name.
const APP_DIR_NAME: &str = "drivelog";

/// Largest UTC offset accepted, in minutes.
const MAX_UTC_OFFSET_MINUTES: u32 = 14 * 60;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `DRIVELOG_`, sections split on `__`)
/// 2. TOML config file at `~/.config/drivelog/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Geolocation configuration.
    pub location: LocationConfig,
    /// Timestamp configuration.
    pub clock: ClockConfig,
    /// Export configuration.
    pub export: ExportConfig,
}

/// Geolocation-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Which provider answers position queries.
    pub provider: ProviderKind,
    /// How long a capture waits for a position, in milliseconds.
    pub timeout_ms: u64,
    /// Request the most accurate fix available.
    pub high_accuracy: bool,
    /// Address of the gpsd daemon (`host:port`).
    pub gpsd_address: String,
    /// Latitude reported by the fixed provider.
    pub fixed_latitude: Option<f64>,
    /// Longitude reported by the fixed provider.
    pub fixed_longitude: Option<f64>,
}

/// Timestamp-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Display name of the zone, for humans only.
    pub zone_name: String,
    /// Offset from UTC in minutes (negative west of Greenwich).
    pub utc_offset_minutes: i32,
    /// strftime layout for event timestamps.
    pub format: String,
}

/// Export-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory export files are written to.
    /// Defaults to the current directory.
    pub directory: Option<PathBuf>,
    /// Layout used when none is given on the command.
    pub format: ExportFormat,
    /// File name of the trip-grouped export.
    pub trips_file_name: String,
    /// File name of the flat event export.
    pub events_file_name: String,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            timeout_ms: 5000,
            high_accuracy: true,
            gpsd_address: DEFAULT_GPSD_ADDRESS.to_string(),
            fixed_latitude: None,
            fixed_longitude: None,
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            zone_name: "America/Sao_Paulo".to_string(),
            utc_offset_minutes: -180,
            format: "%d/%m/%Y, %H:%M:%S".to_string(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: None, // Resolved to the current directory at runtime
            format: ExportFormat::default(),
            trips_file_name: "relatorio_viagens.json".to_string(),
            events_file_name: "eventos.json".to_string(),
        }
    }
}

impl Config {
    /// Load configuration, reading `config_path` or the default file.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        Self::from_figment(Figment::new().merge(Toml::file(&config_file)))
    }

    /// Layer defaults under `figment` and environment overrides over it.
    fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(figment)
            .merge(Env::prefixed("DRIVELOG_").split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.location.timeout_ms == 0 {
            return Err(Error::config_validation(
                "timeout_ms must be greater than 0",
            ));
        }

        if self.location.provider == ProviderKind::Fixed {
            match (self.location.fixed_latitude, self.location.fixed_longitude) {
                (Some(lat), Some(lon))
                    if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) => {}
                (Some(_), Some(_)) => {
                    return Err(Error::config_validation(
                        "fixed_latitude/fixed_longitude are out of range",
                    ));
                }
                _ => {
                    return Err(Error::config_validation(
                        "fixed provider requires fixed_latitude and fixed_longitude",
                    ));
                }
            }
        }

        if self.clock.utc_offset_minutes.unsigned_abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(Error::config_validation(format!(
                "utc_offset_minutes ({}) must be within ±{MAX_UTC_OFFSET_MINUTES}",
                self.clock.utc_offset_minutes
            )));
        }

        if self.clock.format.trim().is_empty()
            || StrftimeItems::new(&self.clock.format).any(|item| matches!(item, Item::Error))
        {
            return Err(Error::config_validation(format!(
                "invalid timestamp format: {:?}",
                self.clock.format
            )));
        }

        for (key, name) in [
            ("trips_file_name", &self.export.trips_file_name),
            ("events_file_name", &self.export.events_file_name),
        ] {
            if name.trim().is_empty() || name.contains(['/', '\\']) {
                return Err(Error::config_validation(format!(
                    "{key} must be a plain file name, got {name:?}"
                )));
            }
        }

        Ok(())
    }

    /// Get the export directory, resolving defaults if not set.
    #[must_use]
    pub fn export_dir(&self) -> PathBuf {
        self.export
            .directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the location timeout as a Duration.
    #[must_use]
    pub fn location_timeout(&self) -> Duration {
        Duration::from_millis(self.location.timeout_ms)
    }

    /// Build the request every capture sends to the provider.
    #[must_use]
    pub fn location_request(&self) -> LocationRequest {
        LocationRequest {
            high_accuracy: self.location.high_accuracy,
            timeout: self.location_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.location.provider, ProviderKind::Gpsd);
        assert!(config.location.high_accuracy);
        assert_eq!(config.clock.zone_name, "America/Sao_Paulo");
        assert_eq!(config.export.format, ExportFormat::Trips);
    }

    #[test]
    fn test_default_location_config() {
        let location = LocationConfig::default();

        assert_eq!(location.timeout_ms, 5000);
        assert_eq!(location.gpsd_address, "127.0.0.1:2947");
        assert!(location.fixed_latitude.is_none());
        assert!(location.fixed_longitude.is_none());
    }

    #[test]
    fn test_default_clock_config() {
        let clock = ClockConfig::default();

        assert_eq!(clock.utc_offset_minutes, -180);
        assert_eq!(clock.format, "%d/%m/%Y, %H:%M:%S");
    }

    #[test]
    fn test_default_export_config() {
        let export = ExportConfig::default();

        assert!(export.directory.is_none());
        assert_eq!(export.trips_file_name, "relatorio_viagens.json");
        assert_eq!(export.events_file_name, "eventos.json");
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.location.timeout_ms = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("timeout_ms"));
    }

    #[test]
    fn test_validate_fixed_without_coordinates() {
        let mut config = Config::default();
        config.location.provider = ProviderKind::Fixed;
        config.location.fixed_latitude = Some(-23.5);

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("fixed provider requires"));
    }

    #[test]
    fn test_validate_fixed_out_of_range() {
        let mut config = Config::default();
        config.location.provider = ProviderKind::Fixed;
        config.location.fixed_latitude = Some(-123.5);
        config.location.fixed_longitude = Some(-46.6);

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("out of range"));
    }

    #[test]
    fn test_validate_offset_out_of_range() {
        let mut config = Config::default();
        config.clock.utc_offset_minutes = 15 * 60;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("utc_offset_minutes"));
    }

    #[test]
    fn test_validate_offset_at_integer_limits() {
        let mut config = Config::default();
        config.clock.utc_offset_minutes = i32::MIN;
        assert!(config.validate().is_err());

        config.clock.utc_offset_minutes = i32::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_offset_at_integer_limit_is_rejected() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("DRIVELOG_CLOCK__UTC_OFFSET_MINUTES", "-2147483648");

            let result = Config::load_from(Some(PathBuf::from("missing.toml")));
            assert!(matches!(result, Err(Error::ConfigValidation { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_validate_bad_time_format() {
        let mut config = Config::default();
        config.clock.format = "%Q".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("timestamp format"));
    }

    #[test]
    fn test_validate_file_name_with_separator() {
        let mut config = Config::default();
        config.export.events_file_name = "../eventos.json".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("events_file_name"));
    }

    #[test]
    fn test_export_dir_default() {
        let config = Config::default();
        assert_eq!(config.export_dir(), PathBuf::from("."));
    }

    #[test]
    fn test_export_dir_custom() {
        let mut config = Config::default();
        config.export.directory = Some(PathBuf::from("/custom/reports"));

        assert_eq!(config.export_dir(), PathBuf::from("/custom/reports"));
    }

    #[test]
    fn test_location_request() {
        let mut config = Config::default();
        config.location.timeout_ms = 1500;
        config.location.high_accuracy = false;

        let request = config.location_request();
        assert_eq!(request.timeout, Duration::from_millis(1500));
        assert!(!request.high_accuracy);
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("drivelog"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Loading from a nonexistent path should work (uses defaults)
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());
    }

    #[test]
    fn test_load_from_toml() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "drivelog.toml",
                r#"
                [location]
                provider = "fixed"
                fixed_latitude = -23.5
                fixed_longitude = -46.6
                timeout_ms = 2000

                [export]
                format = "events"
                "#,
            )?;

            let config = Config::load_from(Some(PathBuf::from("drivelog.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.location.provider, ProviderKind::Fixed);
            assert_eq!(config.location.fixed_latitude, Some(-23.5));
            assert_eq!(config.location.timeout_ms, 2000);
            assert_eq!(config.export.format, ExportFormat::Events);
            assert_eq!(config.clock, ClockConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("drivelog.toml", "[location]\ntimeout_ms = 2000\n")?;
            jail.set_env("DRIVELOG_LOCATION__TIMEOUT_MS", "750");
            jail.set_env("DRIVELOG_LOCATION__PROVIDER", "none");

            let config = Config::load_from(Some(PathBuf::from("drivelog.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.location.timeout_ms, 750);
            assert_eq!(config.location.provider, ProviderKind::None);
            Ok(())
        });
    }

    #[test]
    fn test_config_serialize() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("timeout_ms"));
        assert!(json.contains("relatorio_viagens.json"));
    }

    #[test]
    fn test_location_config_deserialize() {
        let json = r#"{"provider": "none", "timeout_ms": 100}"#;
        let location: LocationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(location.provider, ProviderKind::None);
        assert_eq!(location.timeout_ms, 100);
        assert!(location.high_accuracy);
    }
}
