//! Configuration management for promptops.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Config files (.promptops/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources win. Remote credentials are only checked when a client is
//! about to be built (see [`AppConfig::validate_remote`]).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Default base URL of the prompt service API.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8787/api/v3";

/// Default request timeout ceiling, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .promptops/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Base URL of the prompt service API
    pub base_url: String,

    /// Remote project identifier
    pub project_id: Option<String>,

    /// Bearer credential for the prompt service
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Request timeout ceiling in seconds
    pub timeout_secs: u64,

    /// Directory holding local prompt documents, relative to the workspace
    pub prompts_dir: PathBuf,

    /// File extension of local prompt documents
    pub extension: String,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    remote: Option<RemoteConfig>,
    prompts: Option<PromptsConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RemoteConfig {
    #[serde(rename = "baseUrl")]
    base_url: Option<String>,
    #[serde(rename = "projectId")]
    project_id: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
    #[serde(rename = "timeoutSecs")]
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PromptsConfig {
    dir: Option<String>,
    extension: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: None,
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            prompts_dir: PathBuf::from("prompts"),
            extension: "promptl".to_string(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file, environment variables and defaults.
    ///
    /// Environment variables:
    /// - `PROMPTOPS_WORKSPACE`: Override workspace path
    /// - `PROMPTOPS_CONFIG`: Path to config file
    /// - `PROMPTOPS_BASE_URL`: Prompt service base URL
    /// - `PROMPTOPS_PROJECT_ID`: Remote project identifier
    /// - `PROMPTOPS_API_KEY`: Bearer credential
    /// - `PROMPTOPS_TIMEOUT_SECS`: Request timeout ceiling
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use promptops_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Like [`AppConfig::load`], but with the workspace and config file
    /// chosen up front (e.g. from command-line flags) so the right YAML
    /// file is merged.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) =
            workspace.or_else(|| std::env::var("PROMPTOPS_WORKSPACE").ok().map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("PROMPTOPS_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.promptops_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(base_url) = std::env::var("PROMPTOPS_BASE_URL") {
            config.base_url = base_url;
        }

        if let Ok(project_id) = std::env::var("PROMPTOPS_PROJECT_ID") {
            config.project_id = Some(project_id);
        }

        if let Ok(api_key) = std::env::var("PROMPTOPS_API_KEY") {
            config.api_key = Some(api_key);
        }

        if let Ok(timeout) = std::env::var("PROMPTOPS_TIMEOUT_SECS") {
            config.timeout_secs = timeout.parse().map_err(|_| {
                AppError::Config(format!("PROMPTOPS_TIMEOUT_SECS is not a number: {}", timeout))
            })?;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        Ok(self.merge_file(config_file))
    }

    fn merge_file(&self, config_file: ConfigFile) -> Self {
        let mut result = self.clone();

        if let Some(remote) = config_file.remote {
            if let Some(base_url) = remote.base_url {
                result.base_url = base_url;
            }
            if let Some(project_id) = remote.project_id {
                result.project_id = Some(project_id);
            }
            if let Some(timeout) = remote.timeout_secs {
                result.timeout_secs = timeout;
            }
            if let Some(env_var) = remote.api_key_env {
                if let Ok(key) = std::env::var(&env_var) {
                    result.api_key = Some(key);
                } else {
                    tracing::debug!("apiKeyEnv {} is not set", env_var);
                }
            }
        }

        if let Some(prompts) = config_file.prompts {
            if let Some(dir) = prompts.dir {
                result.prompts_dir = PathBuf::from(dir);
            }
            if let Some(extension) = prompts.extension {
                result.extension = extension.trim_start_matches('.').to_string();
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        result
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the environment and config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        base_url: Option<String>,
        project_id: Option<String>,
        api_key: Option<String>,
        timeout_secs: Option<u64>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(base_url) = base_url {
            self.base_url = base_url;
        }

        if let Some(project_id) = project_id {
            self.project_id = Some(project_id);
        }

        if let Some(api_key) = api_key {
            self.api_key = Some(api_key);
        }

        if let Some(timeout_secs) = timeout_secs {
            self.timeout_secs = timeout_secs;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .promptops directory.
    pub fn promptops_dir(&self) -> PathBuf {
        self.workspace.join(".promptops")
    }

    /// Absolute directory holding the local prompt documents.
    pub fn prompts_path(&self) -> PathBuf {
        if self.prompts_dir.is_absolute() {
            self.prompts_dir.clone()
        } else {
            self.workspace.join(&self.prompts_dir)
        }
    }

    /// Check everything a remote client needs, before any network attempt.
    pub fn validate_remote(&self) -> AppResult<()> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {}
            _ => {
                return Err(AppError::Config(
                    "API key is not set. Export PROMPTOPS_API_KEY or set remote.apiKeyEnv"
                        .to_string(),
                ))
            }
        }

        match self.project_id.as_deref() {
            Some(id) if !id.trim().is_empty() => {}
            _ => {
                return Err(AppError::Config(
                    "Project id is not set. Export PROMPTOPS_PROJECT_ID or set remote.projectId"
                        .to_string(),
                ))
            }
        }

        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "Invalid base URL: {}. Expected an http(s) URL",
                self.base_url
            )));
        }

        if self.timeout_secs == 0 {
            return Err(AppError::Config(
                "Timeout must be greater than zero seconds".to_string(),
            ));
        }

        Ok(())
    }
}
