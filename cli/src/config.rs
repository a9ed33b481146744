use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::debug;

use platewise_core::config::AnalysisConfig;
use platewise_core::session::DailyLog;

/// Environment variable naming the food dataset CSV.
pub const DATASET_ENV: &str = "PLATEWISE_DATASET";

pub struct Config {
    /// Saved session log.
    pub log_path: PathBuf,
    /// Optional `AnalysisConfig` overrides.
    pub config_path: PathBuf,
    /// Dataset to load; `None` probes the default locations.
    pub dataset_path: Option<PathBuf>,
}

impl Config {
    pub fn load(dataset_flag: Option<PathBuf>) -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "platewise").context("Could not determine home directory")?;
        let dataset = resolve_dataset(dataset_flag, std::env::var_os(DATASET_ENV));
        Self::in_dir(proj_dirs.data_dir().to_path_buf(), dataset)
    }

    pub fn in_dir(data_dir: PathBuf, dataset_path: Option<PathBuf>) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        debug!(data_dir = %data_dir.display(), dataset = ?dataset_path, "resolved paths");
        Ok(Config {
            log_path: data_dir.join("daily_log.csv"),
            config_path: data_dir.join("config.json"),
            dataset_path,
        })
    }

    pub fn analysis_config(&self) -> Result<AnalysisConfig> {
        AnalysisConfig::load(&self.config_path)
    }

    pub fn load_log(&self) -> Result<DailyLog> {
        DailyLog::load(&self.log_path)
    }

    pub fn save_log(&self, log: &DailyLog) -> Result<()> {
        log.save(&self.log_path)
    }
}

/// The `--dataset` flag wins over the environment; empty values are ignored.
fn resolve_dataset(flag: Option<PathBuf>, env: Option<OsString>) -> Option<PathBuf> {
    flag.or_else(|| env.filter(|v| !v.is_empty()).map(PathBuf::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use platewise_core::dataset::sample_table;
    use platewise_core::models::Nutrient;

    #[test]
    fn test_resolve_dataset_precedence() {
        let flag = Some(PathBuf::from("flag.csv"));
        let env = Some(OsString::from("env.csv"));
        assert_eq!(
            resolve_dataset(flag.clone(), env.clone()),
            Some(PathBuf::from("flag.csv"))
        );
        assert_eq!(resolve_dataset(None, env), Some(PathBuf::from("env.csv")));
        assert_eq!(resolve_dataset(None, Some(OsString::new())), None);
        assert_eq!(resolve_dataset(None, None), None);
    }

    #[test]
    fn test_in_dir_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("platewise");
        let config = Config::in_dir(data_dir.clone(), None).unwrap();
        assert!(data_dir.is_dir());
        assert_eq!(config.log_path, data_dir.join("daily_log.csv"));
        assert_eq!(config.config_path, data_dir.join("config.json"));
    }

    #[test]
    fn test_log_persists_between_loads() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::in_dir(dir.path().to_path_buf(), None).unwrap();
        assert!(config.load_log().unwrap().is_empty());

        let ts = NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let mut log = DailyLog::new();
        log.add(&sample_table()[2], 1.0, ts).unwrap();
        config.save_log(&log).unwrap();

        let back = config.load_log().unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back.entries()[0].name, "Apple, raw");
    }

    #[test]
    fn test_analysis_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::in_dir(dir.path().to_path_buf(), None).unwrap();
        assert_eq!(config.analysis_config().unwrap(), AnalysisConfig::default());

        std::fs::write(&config.config_path, r#"{"targets": {"calories": 1800}}"#).unwrap();
        let settings = config.analysis_config().unwrap();
        assert!((settings.target(Nutrient::Calories).unwrap() - 1800.0).abs() < f64::EPSILON);

        std::fs::write(&config.config_path, "{").unwrap();
        assert!(config.analysis_config().is_err());
    }
}
