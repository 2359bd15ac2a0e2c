//! Persistent settings.
//!
//! Stored as JSON in the platform config directory:
//! - Linux: ~/.config/revitconnect/config.json
//! - macOS: ~/Library/Application Support/com.DatenExport.RevitConnect/config.json
//! - Windows: %APPDATA%\DatenExport\RevitConnect\config\config.json

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::export::{CsvFlavor, DuplicatePolicy, ExportOptions};

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "DatenExport";
const APP_NAME: &str = "RevitConnect";
const CONFIG_FILENAME: &str = "config.json";
const API_BASE_PATH: &str = "/api/Revit/";

pub const DEFAULT_EXPORT_FILENAME: &str = "revitExport.csv";
pub const DEFAULT_COPY_FILENAME: &str = "revit_export.csv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Config {
    pub api_address: String,
    pub api_port: String,
    pub api_secret: String,
    #[serde(default)]
    pub export: ExportSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ExportSettings {
    /// Directory of the export file; the per-machine data directory when unset.
    pub output_dir: Option<PathBuf>,
    pub file_name: Option<String>,
    pub flavor: CsvFlavor,
    pub duplicates: DuplicatePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_address: "127.0.0.1".to_string(),
            api_port: "5094".to_string(),
            api_secret: String::new(),
            export: ExportSettings::default(),
        }
    }
}

impl Config {
    /// Loads `path`, or the default location when `None`. A missing file
    /// yields defaults, which are written back so the user has a file to edit.
    pub fn load_or_init(path: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path()?,
        };

        match fs::read_to_string(&path) {
            Ok(content) => {
                let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                    path: path.clone(),
                    source,
                })?;
                tracing::debug!(path = %path.display(), "loaded config");
                Ok((config, path))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no config found, writing defaults");
                let config = Self::default();
                config.save(&path)?;
                Ok((config, path))
            }
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Base URL of the remote panel API.
    #[must_use]
    pub fn panel_base_url(&self) -> String {
        format!(
            "http://{}:{}{API_BASE_PATH}",
            self.api_address, self.api_port
        )
    }

    #[must_use]
    pub fn is_linked(&self) -> bool {
        !self.api_secret.is_empty()
    }

    #[must_use]
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            flavor: self.export.flavor,
            duplicates: self.export.duplicates,
        }
    }

    /// Where the export lands unless overridden on the command line.
    pub fn export_path(&self) -> Result<PathBuf, ConfigError> {
        let dir = match &self.export.output_dir {
            Some(dir) => dir.clone(),
            None => data_dir()?,
        };
        let file_name = self
            .export
            .file_name
            .as_deref()
            .unwrap_or(DEFAULT_EXPORT_FILENAME);
        Ok(dir.join(file_name))
    }

    /// What `--show-config` prints: the file location, the panel endpoint
    /// and the settings with the secret masked.
    pub fn describe(&self, path: &Path) -> Result<String, ConfigError> {
        let settings = serde_json::to_string_pretty(&self.redacted())?;
        Ok(format!(
            "# {}\n# panel: {}\n{settings}\n",
            path.display(),
            self.panel_base_url()
        ))
    }

    /// Copy safe to print: the secret is masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.is_linked() {
            copy.api_secret = "********".to_string();
        }
        copy
    }
}

fn project_dirs() -> Result<ProjectDirs, ConfigError> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME).ok_or(ConfigError::NoConfigDir)
}

/// Default location of the config file.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(project_dirs()?.config_dir().join(CONFIG_FILENAME))
}

/// Data directory holding exports and the UI log file.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    Ok(project_dirs()?.data_local_dir().to_path_buf())
}
