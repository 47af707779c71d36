use anyhow::{ensure, Result};
use chrono::{Duration, FixedOffset};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::analysis::{
    ThermalModel, DEFAULT_RESAMPLE_INTERVAL_MINUTES, DEFAULT_TEMPERATURE_COEFFICIENT,
};
use crate::domain::SystemId;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub enable_cors: bool,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 { 30 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            enable_cors: false,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig { pub token: String }

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub resample_interval_minutes: i64,
    pub temperature_coefficient: f64,
    pub cell_temperature: ThermalModel,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            resample_interval_minutes: DEFAULT_RESAMPLE_INTERVAL_MINUTES,
            temperature_coefficient: DEFAULT_TEMPERATURE_COEFFICIENT,
            cell_temperature: ThermalModel::default(),
        }
    }
}

/// Longest accepted resampling bucket (one day)
pub const MAX_RESAMPLE_INTERVAL_MINUTES: i64 = 24 * 60;

impl AnalysisConfig {
    /// Bucket width, clamped to `1..=MAX_RESAMPLE_INTERVAL_MINUTES`
    pub fn resample_interval(&self) -> Duration {
        Duration::minutes(self.resample_interval_minutes.clamp(1, MAX_RESAMPLE_INTERVAL_MINUTES))
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            (1..=MAX_RESAMPLE_INTERVAL_MINUTES).contains(&self.resample_interval_minutes),
            "analysis.resample_interval_minutes must be in 1..={}, got {}",
            MAX_RESAMPLE_INTERVAL_MINUTES,
            self.resample_interval_minutes
        );
        ensure!(
            self.temperature_coefficient.is_finite(),
            "analysis.temperature_coefficient must be finite"
        );
        let finite = match self.cell_temperature {
            ThermalModel::Sapm(m) => [m.a, m.b, m.delta_t].iter().all(|v| v.is_finite()),
            ThermalModel::Faiman(m) => [m.u0, m.u1].iter().all(|v| v.is_finite()),
        };
        ensure!(finite, "analysis.cell_temperature parameters must be finite");
        Ok(())
    }
}

/// One electrical CSV file and the installation it belongs to
#[derive(Debug, Clone, Deserialize)]
pub struct ElectricalCsv {
    pub system_id: SystemId,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// UTC offset of the naive timestamps in imported CSV files
    pub timezone_offset_hours: i32,
    pub seed_reference_systems: bool,
    pub meteorological_csv: Option<PathBuf>,
    pub electrical_csv: Vec<ElectricalCsv>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            timezone_offset_hours: 0,
            seed_reference_systems: true,
            meteorological_csv: None,
            electrical_csv: Vec::new(),
        }
    }
}

impl DataConfig {
    pub fn timezone_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.timezone_offset_hours * 3600).ok_or_else(|| {
            anyhow::anyhow!(
                "data.timezone_offset_hours out of range: {}",
                self.timezone_offset_hours
            )
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DbConfig { pub url: Option<String> }

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// EnvFilter directive; `RUST_LOG` takes precedence
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,hyper=warn,tower_http=info,sqlx=warn".to_string(),
            json: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("PVM__").split("__"));
        let cfg: Self = figment.extract()?;
        cfg.analysis.validate()?;
        cfg.data.timezone_offset()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FaimanCellTemperature;

    #[test]
    fn test_analysis_section_from_toml() {
        let cfg: AnalysisConfig = Figment::new()
            .merge(Toml::string(
                r#"
                resample_interval_minutes = 15
                [cell_temperature]
                model = "faiman"
                u0 = 25.0
                u1 = 6.84
                "#,
            ))
            .extract()
            .unwrap();

        assert_eq!(cfg.resample_interval(), Duration::minutes(15));
        assert_eq!(cfg.temperature_coefficient, -0.005);
        assert_eq!(
            cfg.cell_temperature,
            ThermalModel::Faiman(FaimanCellTemperature { u0: 25.0, u1: 6.84 })
        );
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_invalid_analysis_values_are_rejected() {
        let cfg = AnalysisConfig {
            resample_interval_minutes: 0,
            ..AnalysisConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = AnalysisConfig {
            temperature_coefficient: f64::NAN,
            ..AnalysisConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_oversized_interval_is_rejected_without_panic() {
        let cfg = AnalysisConfig {
            resample_interval_minutes: i64::MAX / 2,
            ..AnalysisConfig::default()
        };
        assert!(cfg.validate().is_err());
        assert_eq!(cfg.resample_interval(), Duration::days(1));

        let cfg = AnalysisConfig {
            resample_interval_minutes: MAX_RESAMPLE_INTERVAL_MINUTES,
            ..AnalysisConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_data_section_defaults() {
        let data: DataConfig = Figment::new()
            .merge(Toml::string(
                r#"
                timezone_offset_hours = 1
                [[electrical_csv]]
                system_id = 2
                path = "data/system2.csv"
                "#,
            ))
            .extract()
            .unwrap();

        assert!(data.seed_reference_systems);
        assert_eq!(data.electrical_csv[0].system_id, 2);
        assert_eq!(data.timezone_offset().unwrap().local_minus_utc(), 3600);

        let bad = DataConfig {
            timezone_offset_hours: 30,
            ..DataConfig::default()
        };
        assert!(bad.timezone_offset().is_err());
    }
}
