//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/arbor/arbor.toml`
//! 3. Local config: `<dir>/.arbor.toml`
//! 4. Environment variables: `ARBOR_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{DataSource, DocumentHandle, DomainError};

pub const DEFAULT_WEBSERVICE_URL: &str = "http://127.0.0.1:3000/api/";

/// Unified configuration for arbor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Backend a bare document reference points at
    pub data_source: DataSource,
    /// Base URL of the remote document service
    pub webservice_url: String,
    /// Document opened when no `--source` is given (path or `Id: N Name: X`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    /// Print confirmation messages after successful operations
    pub show_messages: bool,
    /// HTTP timeout; unset waits indefinitely
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_source: DataSource::Files,
            webservice_url: DEFAULT_WEBSERVICE_URL.into(),
            document: None,
            show_messages: true,
            request_timeout_secs: None,
        }
    }
}

/// Raw settings for intermediate parsing: `None` means "not specified here".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_source: Option<DataSource>,
    pub webservice_url: Option<String>,
    pub document: Option<String>,
    pub show_messages: Option<bool>,
    pub request_timeout_secs: Option<u64>,
}

/// Get the XDG config directory for arbor.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "arbor").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("arbor.toml"))
}

/// Get the path to the local config file in `dir`.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".arbor.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Default document handle, if one is configured.
    pub fn document_handle(&self) -> Result<Option<DocumentHandle>, DomainError> {
        self.document
            .as_deref()
            .map(|raw| DocumentHandle::parse(raw, self.data_source))
            .transpose()
    }

    /// Expand `~`, `$VAR` and `${VAR}` in path-like fields.
    fn expand_paths(&mut self) {
        if let Some(document) = &self.document {
            if let Ok(expanded) = shellexpand::full(document) {
                self.document = Some(expanded.into_owned());
            }
        }
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_source: overlay.data_source.unwrap_or(self.data_source),
            webservice_url: overlay
                .webservice_url
                .clone()
                .unwrap_or_else(|| self.webservice_url.clone()),
            document: overlay.document.clone().or_else(|| self.document.clone()),
            show_messages: overlay.show_messages.unwrap_or(self.show_messages),
            request_timeout_secs: overlay.request_timeout_secs.or(self.request_timeout_secs),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.arbor.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Load from an explicit list of files, skipping the global config and
    /// environment. Later files win.
    pub fn load_from_files(paths: &[&Path]) -> Result<Self, ApplicationError> {
        let mut current = Self::default();
        for path in paths {
            current = current.merge_with(&load_raw_settings(path)?);
        }
        current.expand_paths();
        Ok(current)
    }

    /// Apply ARBOR_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("ARBOR").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("data_source") {
            settings.data_source =
                val.parse::<DataSource>()
                    .map_err(|e| ApplicationError::Config {
                        message: format!("ARBOR_DATA_SOURCE: {e}"),
                    })?;
        }
        if let Ok(val) = config.get_string("webservice_url") {
            settings.webservice_url = val;
        }
        if let Ok(val) = config.get_string("document") {
            settings.document = Some(val);
        }
        if let Ok(val) = config.get_bool("show_messages") {
            settings.show_messages = val;
        }
        if let Ok(val) = config.get_string("request_timeout_secs") {
            let secs = val.trim().parse::<u64>().map_err(|e| ApplicationError::Config {
                message: format!("ARBOR_REQUEST_TIMEOUT_SECS: {e}"),
            })?;
            settings.request_timeout_secs = Some(secs);
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# arbor configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/arbor/arbor.toml
#   Local:  <dir>/.arbor.toml
#   Env:    ARBOR_* environment variables

# Where bare document references point: "files" or "web_service"
# data_source = "files"

# Base URL of the XML document service
# webservice_url = "http://127.0.0.1:3000/api/"

# Document used when --source is omitted
# document = "~/trees/notes.xml"
# document = "Id: 3 Name: notes"

# Print a confirmation after each successful command
# show_messages = true

# HTTP timeout in seconds (unset: wait indefinitely)
# request_timeout_secs = 30
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_default_settings_when_created_then_points_at_local_service() {
        let settings = Settings::default();
        assert_eq!(settings.data_source, DataSource::Files);
        assert_eq!(settings.webservice_url, "http://127.0.0.1:3000/api/");
        assert!(settings.show_messages);
        assert_eq!(settings.request_timeout_secs, None);
    }

    #[test]
    fn given_overlay_when_merging_then_only_specified_fields_change() {
        let base = Settings {
            document: Some("a.xml".into()),
            ..Settings::default()
        };
        let overlay = RawSettings {
            data_source: Some(DataSource::WebService),
            request_timeout_secs: Some(5),
            ..RawSettings::default()
        };

        let result = base.merge_with(&overlay);

        assert_eq!(result.data_source, DataSource::WebService);
        assert_eq!(result.request_timeout_secs, Some(5));
        assert_eq!(result.document.as_deref(), Some("a.xml"));
        assert_eq!(result.webservice_url, DEFAULT_WEBSERVICE_URL);
    }

    #[test]
    fn given_tilde_in_document_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            document: Some("~/trees/a.xml".into()),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let document = settings.document.expect("document kept");
        assert!(document.starts_with(&home), "not expanded: {document}");
    }

    #[test]
    fn given_remote_document_when_resolving_handle_then_returns_remote() {
        let settings = Settings {
            document: Some("Id: 9 Name: plan".into()),
            ..Settings::default()
        };
        let handle = settings.document_handle().unwrap().unwrap();
        assert!(handle.is_remote());
    }

    #[test]
    fn given_settings_when_serialized_then_omits_unset_options() {
        let toml = Settings::default().to_toml().unwrap();
        assert!(toml.contains("data_source = \"files\""));
        assert!(!toml.contains("request_timeout_secs"));
    }

    #[test]
    fn given_template_when_parsed_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(raw.webservice_url.is_none());
    }
}
