//! Project configuration, loaded once at startup from `.ticketflow.yaml`.
//!
//! Every field has a default so a repository that has never run `tf init`
//! still behaves sensibly; `init` writes the defaults out explicitly so
//! they're visible and editable.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

pub const CONFIG_FILE_NAME: &str = ".ticketflow.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no {CONFIG_FILE_NAME} found in {path}")]
    NotFound { path: PathBuf },

    #[error("invalid {CONFIG_FILE_NAME}: {reason}")]
    Invalid { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::NotFound { .. } => ErrorCode::ConfigNotFound,
            ConfigError::Invalid { .. } => ErrorCode::ConfigInvalid,
            ConfigError::Io(_) => ErrorCode::PermissionDenied,
        }
    }

    pub fn suggestions(&self) -> Vec<String> {
        match self {
            ConfigError::NotFound { .. } => vec!["run 'tf init' to create one".into()],
            ConfigError::Invalid { .. } => {
                vec![format!("check the syntax of {CONFIG_FILE_NAME}")]
            }
            ConfigError::Io(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    pub default_branch: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        GitConfig {
            default_branch: "main".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorktreeConfig {
    pub enabled: bool,
    pub base_dir: String,
    pub init_commands: Vec<String>,
}

impl Default for WorktreeConfig {
    fn default() -> Self {
        WorktreeConfig {
            enabled: true,
            base_dir: ".worktrees".to_string(),
            init_commands: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketsConfig {
    pub dir: String,
    pub todo_dir: String,
    pub doing_dir: String,
    pub done_dir: String,
    pub template: String,
}

impl Default for TicketsConfig {
    fn default() -> Self {
        TicketsConfig {
            dir: "tickets".to_string(),
            todo_dir: "todo".to_string(),
            doing_dir: "doing".to_string(),
            done_dir: "done".to_string(),
            template: String::new(),
        }
    }
}

impl TicketsConfig {
    pub fn todo_path(&self, root: &Path) -> PathBuf {
        root.join(&self.dir).join(&self.todo_dir)
    }

    pub fn doing_path(&self, root: &Path) -> PathBuf {
        root.join(&self.dir).join(&self.doing_dir)
    }

    pub fn done_path(&self, root: &Path) -> PathBuf {
        root.join(&self.dir).join(&self.done_dir)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Text
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub default_format: OutputFormat,
    pub json_pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            default_format: OutputFormat::Text,
            json_pretty: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    pub git: u64,
    pub init_commands: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        TimeoutsConfig {
            git: 30,
            init_commands: 120,
        }
    }
}

/// The fully parsed contents of `.ticketflow.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub git: GitConfig,
    pub worktree: WorktreeConfig,
    pub tickets: TicketsConfig,
    pub output: OutputConfig,
    pub timeouts: TimeoutsConfig,
}

impl Config {
    /// Load `.ticketflow.yaml` from `root`. Missing file is `NotFound`, not a
    /// silent default — callers that want defaults-if-absent should check
    /// existence themselves (e.g. `tf init`).
    pub fn load(root: &Path) -> Result<Config, ConfigError> {
        let path = root.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Err(ConfigError::NotFound { path: root.to_path_buf() });
        }
        let raw = std::fs::read_to_string(&path)?;
        serde_yaml::from_str(&raw).map_err(|e| ConfigError::Invalid {
            reason: e.to_string(),
        })
    }

    /// Serialize with the same shape `init` writes, for round-tripping.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Invalid {
            reason: e.to_string(),
        })
    }

    pub fn write(&self, root: &Path) -> Result<(), ConfigError> {
        let path = root.join(CONFIG_FILE_NAME);
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }
}
