use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use which::which;

use crate::{
    storage::{to_pretty_json, write_atomically},
    PaError, PathOverrides, Result, DEFAULT_MIN_TITLE_LENGTH,
};

/// Window used by the birthday query when none is configured
pub const DEFAULT_BIRTHDAY_WINDOW_DAYS: i64 = 7;

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// JSON file holding the contact list
    pub contacts_path: PathBuf,

    /// JSON file holding the note list
    pub notes_path: PathBuf,

    /// Shortest accepted note title, in characters
    pub min_title_length: usize,

    /// Default window for the birthday query, in days
    pub birthday_window_days: i64,

    /// Editor used by `edit-note --editor`
    pub editor_command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("data"));

        Self {
            contacts_path: data_dir.join("contacts_data.json"),
            notes_path: data_dir.join("notes.json"),
            min_title_length: DEFAULT_MIN_TITLE_LENGTH,
            birthday_window_days: DEFAULT_BIRTHDAY_WINDOW_DAYS,
            editor_command: None,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "pabook")
}

impl Config {
    /// Platform location of the configuration file.
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Reads the configuration at `path`, or the defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(
                "No configuration at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content).map_err(|e| PaError::ConfigError {
            message: format!("Failed to parse {}: {}", path.display(), e),
        })?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = to_pretty_json(self)?;
        write_atomically(path, json.as_bytes())?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Applies a `key=value` assignment.
    pub fn set(&mut self, assignment: &str) -> Result<()> {
        let (key, value) = assignment
            .split_once('=')
            .map(|(k, v)| (k.trim(), v.trim()))
            .ok_or_else(|| PaError::ConfigError {
                message: format!("Expected key=value, got '{}'", assignment),
            })?;

        match key {
            "contacts_path" => self.contacts_path = PathBuf::from(value),
            "notes_path" => self.notes_path = PathBuf::from(value),
            "min_title_length" => self.min_title_length = parse_number(key, value)?,
            "birthday_window_days" => {
                let days: i64 = parse_number(key, value)?;
                if days < 0 {
                    return Err(PaError::ConfigError {
                        message: "birthday_window_days cannot be negative".to_string(),
                    });
                }
                self.birthday_window_days = days;
            }
            "editor_command" => {
                self.editor_command = (!value.is_empty()).then(|| value.to_string())
            }
            _ => {
                return Err(PaError::ConfigError {
                    message: format!("Unknown configuration key '{}'", key),
                })
            }
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Lets command line paths win over the configured ones.
    pub fn apply_overrides(&mut self, overrides: &PathOverrides) {
        if let Some(path) = &overrides.contacts_file {
            self.contacts_path = path.clone();
        }
        if let Some(path) = &overrides.notes_file {
            self.notes_path = path.clone();
        }
    }

    /// Editor for `edit-note --editor`.
    ///
    /// Resolution order: the configured `editor_command`, `$VISUAL`,
    /// `$EDITOR`, then a platform editor. Blank values are skipped.
    pub fn get_editor_command(&self) -> String {
        self.editor_command
            .as_deref()
            .and_then(non_blank)
            .or_else(|| env_editor("VISUAL"))
            .or_else(|| env_editor("EDITOR"))
            .unwrap_or_else(platform_editor)
    }
}

/// Terminal editors tried in order when nothing is configured
const FALLBACK_EDITORS: &[&str] = &["nano", "vim", "vi"];

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn env_editor(var: &str) -> Option<String> {
    std::env::var(var).ok().as_deref().and_then(non_blank)
}

fn platform_editor() -> String {
    if cfg!(windows) {
        return "notepad".to_string();
    }
    // -W waits until the document is closed
    if cfg!(target_os = "macos") {
        return "open -W -t".to_string();
    }
    FALLBACK_EDITORS
        .iter()
        .find(|editor| which(editor).is_ok())
        .unwrap_or(&"vi")
        .to_string()
}

fn parse_number<N: std::str::FromStr>(key: &str, value: &str) -> Result<N> {
    value.parse().map_err(|_| PaError::ConfigError {
        message: format!("{} expects a whole number, got '{}'", key, value),
    })
}
