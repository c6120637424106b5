use std::{
    env::{self, VarError},
    fs::File,
    path::{Path, PathBuf},
    time::Duration,
};

use platform_dirs::AppDirs;
use serde::{Deserialize, Serialize};

use crate::{error::Error, util::mkdir_if_not_exists};

const APP_NAME: &str = "MovieDash";
const CONFIG_FILENAME: &str = "config.json";
const PROXY_ENV_VAR: &str = "HTTPS_PROXY";
const API_KEY_ENV_VAR: &str = "TMDB_API_KEY";

pub const POSTER_SIZE: &str = "w500";
pub const BACKDROP_SIZE: &str = "w780";
pub const LOGO_SIZE: &str = "w92";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: String,
    pub language: String,
    pub region: String,
    pub api_base: String,
    pub image_base: String,
    pub timeout_secs: u64,
    pub lookup_threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language: "pt-BR".to_string(),
            region: "BR".to_string(),
            api_base: "https://api.themoviedb.org/3".to_string(),
            image_base: "https://image.tmdb.org/t/p".to_string(),
            timeout_secs: 10,
            lookup_threads: 8,
        }
    }
}

impl Config {
    fn app_dirs() -> Option<AppDirs> {
        const USE_XDG_ON_MACOS: bool = false;

        AppDirs::new(Some(APP_NAME), USE_XDG_ON_MACOS)
    }

    pub fn config_dir() -> Option<PathBuf> {
        Self::app_dirs().map(|dirs| dirs.config_dir)
    }

    /// Where the favorites, seen list and last view are kept.
    pub fn data_dir() -> Option<PathBuf> {
        Self::app_dirs().map(|dirs| dirs.data_dir)
    }

    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join(CONFIG_FILENAME))
    }

    pub fn load() -> Option<Config> {
        let path = Self::config_path()?;
        if !path.exists() {
            return None;
        }
        log::info!("loading config: {:?}", &path);
        match Self::load_from(&path) {
            Ok(config) => Some(config),
            Err(err) => {
                log::error!("failed to read config, using defaults: {}", err);
                None
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Config, Error> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    pub fn save(&self) -> Result<(), Error> {
        let path = Self::config_path()
            .ok_or_else(|| Error::ConfigError("no config directory".to_string()))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Error> {
        if let Some(dir) = path.parent() {
            mkdir_if_not_exists(dir)?;
        }
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// The `TMDB_API_KEY` environment variable wins over the config file.
    pub fn api_key(&self) -> Option<String> {
        env::var(API_KEY_ENV_VAR)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| Some(self.api_key.clone()).filter(|key| !key.trim().is_empty()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn image_url(&self, size: &str, path: &str) -> String {
        format!("{}/{}{}", self.image_base.trim_end_matches('/'), size, path)
    }

    pub fn proxy() -> Option<String> {
        env::var(PROXY_ENV_VAR).map_or_else(
            |err| match err {
                VarError::NotPresent => None,
                VarError::NotUnicode(_) => {
                    log::error!("proxy URL is not a valid unicode");
                    None
                }
            },
            Some,
        )
    }
}
