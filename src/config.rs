use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const CONFIG_FILE_NAME: &str = ".jira_master.toml";

const DEFAULT_CONFIG: &str = r#"
jira_host = "" # e.g. https://jira.example.com
jira_token = "" # e.g. 1234567890
"#;

/// Settings handed to the client factory and the resolver.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jira_base_url: String,
    pub jira_token: String,
}

impl From<StoredConfig> for AppConfig {
    fn from(stored: StoredConfig) -> Self {
        Self {
            jira_base_url: stored.jira_host.unwrap_or_default().trim().to_string(),
            jira_token: stored.jira_token.unwrap_or_default().trim().to_string(),
        }
    }
}

/// On-disk shape of `.jira_master.toml`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira_token: Option<String>,
}

#[derive(Debug)]
pub enum ConfigLoad {
    Loaded { path: PathBuf, config: StoredConfig },
    /// No config existed; a template was written to this path.
    Bootstrapped(PathBuf),
}

impl StoredConfig {
    pub fn read(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path).map_err(|err| {
            AppError::Configuration(format!("failed to read {}: {err}", path.display()))
        })?;
        toml::from_str(&contents).map_err(|err| {
            AppError::Configuration(format!("invalid config file {}: {err}", path.display()))
        })
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = toml::to_string_pretty(self)
            .map_err(|err| AppError::Configuration(format!("failed to write config: {err}")))?;
        fs::write(path, data)?;
        Ok(())
    }

    /// Loads the config used by `config` subcommands. A missing file yields
    /// defaults along with the path it would be saved to.
    pub fn load_for_edit(explicit: Option<&Path>) -> AppResult<(PathBuf, Self)> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match locate(&config_search_paths()?) {
                Some(path) => path,
                None => default_config_path()?,
            },
        };
        if path.is_file() {
            let config = Self::read(&path)?;
            Ok((path, config))
        } else {
            Ok((path, Self::default()))
        }
    }
}

pub fn config_directory() -> AppResult<PathBuf> {
    dirs::config_dir().ok_or_else(|| {
        AppError::Configuration("unable to determine user config directory".to_string())
    })
}

pub fn default_config_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}

/// Home directory first, then the user config directory.
pub fn config_search_paths() -> AppResult<Vec<PathBuf>> {
    let mut paths = Vec::new();
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(CONFIG_FILE_NAME));
    }
    paths.push(default_config_path()?);
    Ok(paths)
}

fn locate(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|path| path.is_file()).cloned()
}

/// Reads the config from `explicit` or the default search path, writing a
/// template when nothing is found.
pub fn load_or_bootstrap(explicit: Option<&Path>) -> AppResult<ConfigLoad> {
    match explicit {
        Some(path) => load_from(&[path.to_path_buf()], path),
        None => load_from(&config_search_paths()?, &default_config_path()?),
    }
}

pub fn load_from(candidates: &[PathBuf], bootstrap_path: &Path) -> AppResult<ConfigLoad> {
    match locate(candidates) {
        Some(path) => {
            let config = StoredConfig::read(&path)?;
            Ok(ConfigLoad::Loaded { path, config })
        }
        None => {
            write_default_template(bootstrap_path)?;
            Ok(ConfigLoad::Bootstrapped(bootstrap_path.to_path_buf()))
        }
    }
}

fn write_default_template(path: &Path) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, DEFAULT_CONFIG)?;
    Ok(())
}
