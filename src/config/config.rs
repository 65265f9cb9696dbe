use crate::core::logging::DEFAULT_LOG_FILTER;
use crate::transfer::cipher::ExportCipher;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_APP_NAME: &str = "passerelle";
pub const DEFAULT_BACKUPS: usize = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid encryption \"{0}\" (expected aead, xor or none)")]
    InvalidEncryption(String),
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct FileConfig {
    pub vault_path: Option<String>,
    pub backups: Option<usize>,
    pub app_name: Option<String>,
    pub username: Option<String>,
    pub export_dir: Option<String>,
    /// `aead`, `xor` or `none`.
    pub encryption: Option<String>,
    pub log: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub vault_path: PathBuf,
    pub backups: usize,
    pub app_name: String,
    pub username: Option<String>,
    pub export_dir: PathBuf,
    pub default_encryption: ExportCipher,
    pub log_filter: String,
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Precedence: explicit path > environment > config file > default.
    pub fn create(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let (_, file_cfg) = load_file_config_with_path()?;

        let vault_path = path
            .or_else(|| env_string("PASSERELLE_VAULT_PATH").map(PathBuf::from))
            .or_else(|| file_cfg.vault_path.as_ref().map(PathBuf::from))
            .unwrap_or_else(default_vault_path);

        let backups = env_string("PASSERELLE_BACKUPS")
            .and_then(|s| s.parse::<usize>().ok())
            .or(file_cfg.backups)
            .unwrap_or(DEFAULT_BACKUPS);

        let app_name = env_string("PASSERELLE_APP_NAME")
            .or(file_cfg.app_name)
            .unwrap_or_else(|| DEFAULT_APP_NAME.to_string());

        let username = env_string("PASSERELLE_USERNAME").or(file_cfg.username);

        let export_dir = env_string("PASSERELLE_EXPORT_DIR")
            .or(file_cfg.export_dir)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let default_encryption = match env_string("PASSERELLE_ENCRYPTION").or(file_cfg.encryption) {
            Some(raw) => raw
                .parse::<ExportCipher>()
                .map_err(|_| ConfigError::InvalidEncryption(raw))?,
            None => ExportCipher::None,
        };

        let log_filter = env_string("PASSERELLE_LOG")
            .or_else(|| env_string("RUST_LOG"))
            .or(file_cfg.log)
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Config {
            vault_path,
            backups,
            app_name,
            username,
            export_dir,
            default_encryption,
            log_filter,
        })
    }
}

pub fn config_file_path() -> PathBuf {
    let cfg_dir = env_string("PASSERELLE_CONFIG_DIR")
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    cfg_dir.join("passerelle").join("config.toml")
}

/// A missing file yields the defaults; a malformed one is an error.
pub fn load_file_config_with_path() -> Result<(PathBuf, FileConfig), ConfigError> {
    let path = config_file_path();
    let cfg = read_file_config(&path)?;
    Ok((path, cfg))
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(FileConfig::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    toml::from_str::<FileConfig>(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn default_vault_path() -> PathBuf {
    if let Some(base) = env_string("PASSERELLE_DATA_DIR") {
        return PathBuf::from(base).join("passerelle").join("vault.psrl");
    }
    if let Some(mut p) = dirs::data_dir() {
        p.push("passerelle");
        p.push("vault.psrl");
        return p;
    }
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(&home).join(".passerelle").join("vault.psrl")
}
