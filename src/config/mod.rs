//! User settings, stored as JSON in the platform config directory

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::claude::ClaudeModel;
use crate::grading::Language;
use crate::practice::RankingMode;
use crate::theme::Theme;

/// Environment variable that overrides the data directory
pub const DATA_DIR_ENV: &str = "DISCURSIVA_DATA_DIR";

/// Name of the log file written while the TUI owns the terminal
pub const LOG_FILE: &str = "discursiva.log";

/// Settings read at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model used to grade answers
    pub model: ClaudeModel,

    /// Language of the grading prompt and of the feedback sections
    pub language: Language,

    /// Score the practice order is built from
    pub ranking: RankingMode,

    /// Where cards, history and accounts live (platform data dir if unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Built-in theme, by display name
    pub theme: String,

    /// Full palette that replaces the named theme
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_theme: Option<Theme>,

    /// h/j/k/l and g/G navigation
    pub vim_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ClaudeModel::default(),
            language: Language::default(),
            ranking: RankingMode::default(),
            data_dir: None,
            theme: "Tokyo Night".to_string(),
            custom_theme: None,
            vim_mode: true,
        }
    }
}

impl Config {
    /// Read the config file, writing the defaults on first run
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config from {:?}", config_path))?;
            serde_json::from_str(&contents).with_context(|| format!("{:?} is not a valid config file", config_path))
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config to {:?}", config_path))?;

        Ok(())
    }

    /// `config.json` in the platform config directory
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "discursiva")
            .context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.json"))
    }

    /// Resolve the data directory: environment, then config, then platform default
    pub fn data_dir(&self) -> Result<PathBuf> {
        let env = std::env::var_os(DATA_DIR_ENV).map(PathBuf::from);
        Self::resolve_data_dir(env, self.data_dir.clone())
    }

    fn resolve_data_dir(env: Option<PathBuf>, configured: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(dir) = env.filter(|p| !p.as_os_str().is_empty()).or(configured) {
            return Ok(dir);
        }
        let proj_dirs = ProjectDirs::from("", "", "discursiva")
            .context("Failed to determine data directory")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    /// Path of the TUI log file inside `data_dir`
    pub fn log_path(data_dir: &Path) -> PathBuf {
        data_dir.join(LOG_FILE)
    }

    /// Get the active theme: custom overrides, then the named theme
    pub fn active_theme(&self) -> Theme {
        self.custom_theme
            .clone()
            .or_else(|| Theme::by_name(&self.theme))
            .unwrap_or_else(Theme::tokyo_night)
    }
}
