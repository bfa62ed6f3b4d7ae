use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::currency::{LocaleConfig, DEFAULT_EXCHANGE_RATE};
use crate::utils::{
    app_data_dir, config_backup_dir_in, config_file_in, ensure_dir, store_file_in, write_atomic,
};

const BACKUP_EXTENSION: &str = "json";
const BACKUP_PREFIX: &str = "config_";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";

pub const DEFAULT_DELETE_BATCH_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("configuration backup `{0}` not found")]
    BackupNotFound(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub locale: LocaleConfig,
    pub default_exchange_rate: f64,
    #[serde(default)]
    pub theme: ThemePreference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_company: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
    #[serde(default = "default_batch_size")]
    pub delete_batch_size: usize,
}

fn default_batch_size() -> usize {
    DEFAULT_DELETE_BATCH_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: LocaleConfig::default(),
            default_exchange_rate: DEFAULT_EXCHANGE_RATE,
            theme: ThemePreference::Dark,
            selected_company: None,
            store_path: None,
            delete_batch_size: DEFAULT_DELETE_BATCH_SIZE,
        }
    }
}

impl Config {
    /// Configured store file, or `store.json` under `base`.
    pub fn resolved_store_path(&self, base: &Path) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(|| store_file_in(base))
    }
}

pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
    backups_dir: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        ensure_dir(&base)?;
        let backups_dir = config_backup_dir_in(&base);
        ensure_dir(&backups_dir)?;
        Ok(Self {
            path: config_file_in(&base),
            backups_dir,
            base,
        })
    }

    pub fn load(&self) -> Result<Config, ConfigError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)?;
        info!(path = %self.path.display(), "saved configuration");
        Ok(())
    }

    /// Writes a timestamped copy of `config` and returns the backup file name.
    pub fn backup(&self, config: &Config, note: Option<&str>) -> Result<String, ConfigError> {
        ensure_dir(&self.backups_dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut name = format!("{BACKUP_PREFIX}{timestamp}");
        if let Some(label) = sanitize_note(note) {
            name.push('_');
            name.push_str(&label);
        }
        name.push_str(&format!(".{}", BACKUP_EXTENSION));
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.backups_dir.join(&name), &json)?;
        Ok(name)
    }

    pub fn restore(&self, backup_name: &str) -> Result<Config, ConfigError> {
        let path = self.backups_dir.join(backup_name);
        if !path.exists() {
            return Err(ConfigError::BackupNotFound(backup_name.to_string()));
        }
        let data = fs::read_to_string(&path)?;
        let config: Config = serde_json::from_str(&data)?;
        self.save(&config)?;
        Ok(config)
    }

    /// Backup file names, newest first.
    pub fn list_backups(&self) -> Result<Vec<String>, ConfigError> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(name.to_string());
            }
        }
        entries.sort_by(|a, b| parse_timestamp(b).cmp(&parse_timestamp(a)).then(b.cmp(a)));
        Ok(entries)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }
}

fn sanitize_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.' | '_'))
            && !sanitized.is_empty()
            && !last_dash
        {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-').to_string();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Reads the `YYYYMMDD_HHMM` stamp that follows the prefix; notes never contain `_`.
fn parse_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let rest = name.strip_prefix(BACKUP_PREFIX)?;
    let stamp = rest.get(..13)?;
    NaiveDateTime::parse_from_str(stamp, "%Y%m%d_%H%M")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.delete_batch_size, 100);
        assert_eq!(config.default_exchange_rate, 58.5);
    }

    #[test]
    fn notes_are_slugged() {
        assert_eq!(sanitize_note(Some(" Antes de importar! ")), Some("antes-de-importar".into()));
        assert_eq!(sanitize_note(Some("   ")), None);
        assert_eq!(sanitize_note(None), None);
    }

    #[test]
    fn timestamp_survives_a_note_suffix() {
        let parsed = parse_timestamp("config_20240105_0930_pre-import.json").unwrap();
        assert_eq!(parsed.format("%Y-%m-%d %H:%M").to_string(), "2024-01-05 09:30");
        assert!(parse_timestamp("notes.json").is_none());
    }
}
