// ⚙️ Study configuration
//
// Loaded from TOML; every field has a default so an empty file (or no
// file at all) describes the standard study.

use crate::codebook::CodebookWindow;
use crate::democracy::SentinelSet;
use crate::error::{Result, StudyError};
use crate::join::{JoinConfig, ScoreKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPaths {
    pub war_register: PathBuf,
    pub codebook: PathBuf,
    pub democracy_index: PathBuf,
}

impl Default for InputPaths {
    fn default() -> Self {
        InputPaths {
            war_register: PathBuf::from("09905-0002-Data.txt"),
            codebook: PathBuf::from("09905-Codebook.txt"),
            democracy_index: PathBuf::from("20440-0001-Data.tsv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    pub inputs: InputPaths,
    pub codebook_window: CodebookWindow,
    /// Restoration lags, one pair of scenarios per lag
    pub lags: Vec<i64>,
    /// Score codes meaning "not applicable" (blank is always one)
    pub sentinels: Vec<String>,
}

impl Default for StudyConfig {
    fn default() -> Self {
        StudyConfig {
            inputs: InputPaths::default(),
            codebook_window: CodebookWindow::default(),
            lags: vec![5, 10, 20],
            sentinels: SentinelSet::default().values().to_vec(),
        }
    }
}

impl StudyConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: StudyConfig = toml::from_str(content)
            .map_err(|e| StudyError::Config(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| StudyError::io(path, e))?;
        StudyConfig::from_toml(&content)
    }

    pub fn validate(&self) -> Result<()> {
        self.codebook_window.validate()?;

        if self.lags.is_empty() {
            return Err(StudyError::Config("at least one lag is required".to_string()));
        }
        if let Some(lag) = self.lags.iter().find(|&&lag| lag < 0) {
            return Err(StudyError::Config(format!("lag must not be negative: {}", lag)));
        }
        Ok(())
    }

    pub fn sentinel_set(&self) -> SentinelSet {
        SentinelSet::new(self.sentinels.iter().cloned())
    }

    /// Democracy and liberty scenario for every lag, lag order first
    pub fn scenarios(&self) -> Vec<JoinConfig> {
        self.lags
            .iter()
            .flat_map(|&lag| ScoreKind::ALL.iter().map(move |&score| JoinConfig::new(lag, score)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_standard_study() {
        let config = StudyConfig::from_toml("").unwrap();

        assert_eq!(config, StudyConfig::default());
        assert_eq!(config.lags, vec![5, 10, 20]);
        assert_eq!(config.codebook_window, CodebookWindow::new(1317, 1467));
        assert!(config.sentinel_set().is_sentinel("-77"));
    }

    #[test]
    fn test_partial_config() {
        let config = StudyConfig::from_toml(
            r#"
            lags = [10]

            [inputs]
            democracy_index = "data/polity.tsv"

            [codebook_window]
            first_line = 3
            last_line = 40
            "#,
        )
        .unwrap();

        assert_eq!(config.lags, vec![10]);
        assert_eq!(config.inputs.democracy_index, PathBuf::from("data/polity.tsv"));
        assert_eq!(config.inputs.codebook, PathBuf::from("09905-Codebook.txt"));
        assert_eq!(config.codebook_window.first_line, 3);
    }

    #[test]
    fn test_scenarios_cover_both_scores() {
        let config = StudyConfig {
            lags: vec![5, 20],
            ..StudyConfig::default()
        };
        let names: Vec<String> = config.scenarios().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["democ5", "liberty5", "democ20", "liberty20"]);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        assert!(StudyConfig::from_toml("lags = []").is_err());
        assert!(StudyConfig::from_toml("lags = [-5]").is_err());
        assert!(StudyConfig::from_toml("lags = \"five\"").is_err());
        assert!(StudyConfig::from_toml(
            "[codebook_window]\nfirst_line = 9\nlast_line = 2"
        )
        .is_err());
    }
}
