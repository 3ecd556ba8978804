use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::categorizer::{
    CategorizeOptions, DEFAULT_CATEGORY, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MARKER,
};
use crate::error::{ProdcatError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_description_column")]
    pub description_column: String,
    #[serde(default = "default_category_column")]
    pub category_column: String,
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "default_generic_marker")]
    pub generic_marker: String,
    #[serde(default = "default_default_category")]
    pub default_category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_file: Option<String>,
}

fn default_description_column() -> String {
    "Product description".to_string()
}

fn default_category_column() -> String {
    "Product category".to_string()
}

fn default_confidence_threshold() -> f64 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

fn default_generic_marker() -> String {
    DEFAULT_MARKER.to_string()
}

fn default_default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            description_column: default_description_column(),
            category_column: default_category_column(),
            confidence_threshold: default_confidence_threshold(),
            generic_marker: default_generic_marker(),
            default_category: default_default_category(),
            reference_file: None,
            rules_file: None,
        }
    }
}

impl Settings {
    /// Pipeline options seeded from these settings; CLI flags override the
    /// returned fields.
    pub fn categorize_options(&self) -> CategorizeOptions {
        CategorizeOptions {
            description_column: self.description_column.clone(),
            category_column: self.category_column.clone(),
            confidence_threshold: self.confidence_threshold,
            reference_file: self.reference_file.as_deref().map(|p| PathBuf::from(expand_home(p))),
            generic_marker: self.generic_marker.clone(),
            default_category: self.default_category.clone(),
        }
    }

    pub fn rules_path(&self) -> Option<PathBuf> {
        self.rules_file.as_deref().map(|p| PathBuf::from(expand_home(p)))
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("prodcat")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Settings from the default location. See [`load_settings_from`].
pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

/// A missing file gives the defaults; a corrupt one does too, with a warning.
pub fn load_settings_from(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    let content = std::fs::read_to_string(path).unwrap_or_default();
    match serde_json::from_str(&content) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings file");
            Settings::default()
        }
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(settings, &settings_path())
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| ProdcatError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

pub fn expand_home(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
