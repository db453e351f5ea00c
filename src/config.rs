use std::env;
use std::path::PathBuf;

use crate::dataset::DatasetSource;

#[derive(Debug, Clone)]
pub struct Config {
    pub measurements_path: PathBuf,
    pub station_metadata_path: Option<PathBuf>,
    pub station_metadata_sheet: Option<String>,
    pub server_host: String,
    pub server_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Config {
            measurements_path: env::var("MEASUREMENTS_PATH")?.into(),
            station_metadata_path: optional_var("STATION_METADATA_PATH").map(PathBuf::from),
            station_metadata_sheet: optional_var("STATION_METADATA_SHEET"),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// The extended (basin → station) variant is on when a metadata file is configured
    pub fn has_metadata(&self) -> bool {
        self.station_metadata_path.is_some()
    }

    pub fn dataset_source(&self) -> DatasetSource {
        DatasetSource {
            measurements_path: self.measurements_path.clone(),
            metadata_path: self.station_metadata_path.clone(),
            metadata_sheet: self.station_metadata_sheet.clone(),
        }
    }
}

/// Unset and blank variables both count as absent
fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_addr_and_source() {
        let config = Config {
            measurements_path: PathBuf::from("data/df_anual_preprocesado.csv"),
            station_metadata_path: Some(PathBuf::from("data/estaciones.xlsx")),
            station_metadata_sheet: None,
            server_host: "127.0.0.1".to_string(),
            server_port: 9000,
        };

        assert_eq!(config.server_addr(), "127.0.0.1:9000");
        assert!(config.has_metadata());
        let source = config.dataset_source();
        assert_eq!(source.measurements_path, PathBuf::from("data/df_anual_preprocesado.csv"));
        assert_eq!(source.metadata_path, Some(PathBuf::from("data/estaciones.xlsx")));
    }

    #[test]
    fn test_without_metadata_path() {
        let config = Config {
            measurements_path: PathBuf::from("data/df_anual_preprocesado.csv"),
            station_metadata_path: None,
            station_metadata_sheet: Some("Hoja1".to_string()),
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
        };

        assert!(!config.has_metadata());
        assert_eq!(config.dataset_source().metadata_path, None);
    }
}
