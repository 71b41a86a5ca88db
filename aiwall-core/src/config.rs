use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ACCESS_KEY_ENV: &str = "AIWALL_ACCESS_KEY";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// User configuration, read from `config.toml` in the per-user config dir.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Unsplash "Client-ID" credential
    pub access_key: Option<String>,
    pub api_url: String,
    pub orientation: String,
    pub count: u32,
    pub dpr: u32,
    pub screen_width: u32,
    pub screen_height: u32,
    /// Where composed wallpapers are written before being handed to the desktop
    pub output_dir: Option<PathBuf>,

    #[serde(skip)]
    pub config_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_key: None,
            api_url: "https://api.unsplash.com/photos/random".to_string(),
            orientation: "portrait".to_string(),
            count: 30,
            dpr: 5,
            screen_width: 1080,
            screen_height: 1920,
            output_dir: None,
            config_dir: PathBuf::new(),
        }
    }
}

/// Everything the search client needs to talk to the photo API.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub api_url: String,
    pub access_key: String,
    pub orientation: String,
    pub count: u32,
    pub dpr: u32,
}

impl SearchConfig {
    pub fn new(api_url: impl Into<String>, access_key: impl Into<String>) -> Self {
        let defaults = Config::default();
        Self {
            api_url: api_url.into(),
            access_key: access_key.into(),
            orientation: defaults.orientation,
            count: defaults.count,
            dpr: defaults.dpr,
        }
    }
}

impl Config {
    pub fn new() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("com", "aiwall", "aiwall")
            .context("Failed to get project directories")?;
        let config_dir = proj_dirs.config_dir().to_path_buf();

        // Create directories if they don't exist
        fs::create_dir_all(&config_dir)?;

        let mut config = Self::load_from_dir(&config_dir)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load `config.toml` from `config_dir`, falling back to defaults if it is missing
    pub fn load_from_dir(config_dir: &Path) -> Result<Self> {
        let config_file = config_dir.join(CONFIG_FILE_NAME);
        let mut config = if config_file.exists() {
            let content = fs::read_to_string(&config_file)
                .with_context(|| format!("Failed to read {}", config_file.display()))?;
            Self::parse(&content)
                .with_context(|| format!("Failed to parse {}", config_file.display()))?
        } else {
            log::debug!("No config file at {}, using defaults", config_file.display());
            Self::default()
        };
        config.config_dir = config_dir.to_path_buf();
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(ACCESS_KEY_ENV) {
            if !key.trim().is_empty() {
                self.access_key = Some(key.trim().to_string());
            }
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.config_dir.join("wallpapers"))
    }

    pub fn search_config(&self) -> Result<SearchConfig> {
        let access_key = self
            .access_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .with_context(|| {
                format!(
                    "No Unsplash access key configured; set {} or access_key in {}",
                    ACCESS_KEY_ENV,
                    self.config_dir.join(CONFIG_FILE_NAME).display()
                )
            })?;

        Ok(SearchConfig {
            api_url: self.api_url.clone(),
            access_key,
            orientation: self.orientation.clone(),
            count: self.count,
            dpr: self.dpr,
        })
    }
}
