use config::{Config, ConfigError, Environment, File};
use forecast_core::ForecastConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Prefix of environment overrides, e.g. `PROJECT_FORECASTS__SEMESTERS=2`
pub const ENV_PREFIX: &str = "PROJECT_FORECASTS";

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Directory holding the cleaning-client JSON exports
    pub source_dir: PathBuf,
    pub cache_dir: PathBuf,
    /// Horizon of the generation pass; `forecast.default_horizon` when unset
    #[serde(default)]
    pub semesters: Option<usize>,
    #[serde(default)]
    pub forecast: ForecastConfig,
}

impl Settings {
    /// Defaults, then `config/forecasts.*` if present, then the environment
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Like [`Settings::new`], with an extra required file layered on top
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(file, Environment::with_prefix(ENV_PREFIX))
    }

    pub(crate) fn load_with(file: Option<&Path>, environment: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("source_dir", "data")?
            .set_default("cache_dir", "cache")?
            .add_source(File::with_name("config/forecasts").required(false));

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: Settings = builder
            .add_source(environment.separator("__").try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Semesters forecast by the generation pass
    pub fn horizon(&self) -> usize {
        self.semesters.unwrap_or(self.forecast.default_horizon)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.semesters == Some(0) {
            return Err(ConfigError::Message(
                "semesters must be at least 1".to_string(),
            ));
        }
        self.forecast
            .validate()
            .map_err(|err| ConfigError::Message(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Map;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load_with(None, env(&[])).unwrap();
        assert_eq!(settings.source_dir, PathBuf::from("data"));
        assert_eq!(settings.cache_dir, PathBuf::from("cache"));
        assert_eq!(settings.semesters, None);
        assert_eq!(settings.horizon(), 1);
        assert_eq!(settings.forecast, ForecastConfig::default());
    }

    #[test]
    fn test_environment_overrides() {
        let settings = Settings::load_with(
            None,
            env(&[
                ("PROJECT_FORECASTS__SEMESTERS", "3"),
                ("PROJECT_FORECASTS__CACHE_DIR", "/tmp/forecasts"),
                ("PROJECT_FORECASTS__FORECAST__NOISE_PCT", "0.05"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.horizon(), 3);
        assert_eq!(settings.cache_dir, PathBuf::from("/tmp/forecasts"));
        assert_eq!(settings.forecast.noise_pct, 0.05);
        assert_eq!(settings.forecast.floor_factor, 0.85);
    }

    #[test]
    fn test_file_layer() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "semesters = 2").unwrap();
        writeln!(file, "[forecast]").unwrap();
        writeln!(file, "noise_pct = 0.0").unwrap();
        writeln!(file, "reference_date = \"2024-03-10\"").unwrap();

        let settings = Settings::load_with(Some(file.path()), env(&[])).unwrap();
        assert_eq!(settings.horizon(), 2);
        assert_eq!(settings.forecast.noise_pct, 0.0);
        assert_eq!(
            settings.forecast.reference_date,
            chrono::NaiveDate::from_ymd_opt(2024, 3, 10)
        );
    }

    #[test]
    fn test_horizon_falls_back_to_engine_default() {
        let settings = Settings::load_with(
            None,
            env(&[("PROJECT_FORECASTS__FORECAST__DEFAULT_HORIZON", "4")]),
        )
        .unwrap();
        assert_eq!(settings.semesters, None);
        assert_eq!(settings.horizon(), 4);

        let settings = Settings::load_with(
            None,
            env(&[
                ("PROJECT_FORECASTS__FORECAST__DEFAULT_HORIZON", "4"),
                ("PROJECT_FORECASTS__SEMESTERS", "2"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.horizon(), 2);
    }

    #[test]
    fn test_zero_semesters_rejected() {
        let result = Settings::load_with(None, env(&[("PROJECT_FORECASTS__SEMESTERS", "0")]));
        assert!(result.is_err());
    }
}
