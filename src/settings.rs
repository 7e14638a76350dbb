use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WalletError};
use crate::importer::{ImportOptions, Separator};
use crate::models::DEFAULT_CURRENCY;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to `categories.json`.
    #[serde(default = "default_rules_path")]
    pub rules_path: String,
    #[serde(default = "default_currency")]
    pub default_currency: String,
    /// Fixed CSV column separator; detected per file when unset.
    #[serde(default)]
    pub separator: Option<char>,
    /// Total budget that category budget percentages refer to.
    #[serde(default)]
    pub reference_budget: Option<f64>,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_rules_path() -> String {
    config_dir().join("categories.json").to_string_lossy().to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rules_path: default_rules_path(),
            default_currency: default_currency(),
            separator: None,
            reference_budget: None,
        }
    }
}

impl Settings {
    pub fn import_options(&self) -> Result<ImportOptions> {
        let separator = match self.separator {
            Some(c) => Separator::from_char(c)?,
            None => Separator::Detect,
        };
        Ok(ImportOptions {
            format: None,
            separator,
            default_currency: self.default_currency.clone(),
        })
    }
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("wallet-parser")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

/// Missing or unreadable files give the defaults.
pub fn load_settings_from(path: &Path) -> Settings {
    if path.exists() {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(&settings_path(), settings)
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| WalletError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
