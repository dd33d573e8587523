//! Configuration and session storage

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::auth::{SessionStore, StoredToken};

/// Backend used when neither the config file nor the environment names one
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8001";

/// Environment variable overriding the backend base URL
pub const BACKEND_URL_ENV: &str = "DEBRA_BACKEND_URL";

/// Application configuration
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the REST backend (without the `/api` suffix)
    pub backend_url: Option<String>,
    /// Bearer token from the last login
    pub auth_token: Option<StoredToken>,
    /// Logged-in user (JSON stored as string for TOML compat)
    pub user_data: Option<String>,
}

impl Config {
    /// Get config directory path
    fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "debra", "debra-cli")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Get config file path
    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Directory for log files written while the TUI owns the terminal
    pub fn data_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "debra", "debra-cli")
            .context("Could not determine data directory")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    /// Load configuration from disk.
    ///
    /// A file that no longer parses is treated as a logged-out session: the
    /// backend URL is kept when it can still be read and the file is rewritten.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        match Self::parse(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("{:#}; clearing stored session", e);
                let config = Self::recover(&content);
                if let Err(e) = config.save() {
                    tracing::warn!("Could not rewrite config file: {:#}", e);
                }
                Ok(config)
            }
        }
    }

    fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Whatever survives of a config file that failed to parse.
    fn recover(content: &str) -> Self {
        let backend_url = content
            .parse::<toml::Table>()
            .ok()
            .and_then(|table| match table.get("backend_url") {
                Some(toml::Value::String(url)) => Some(url.clone()),
                _ => None,
            });
        Self {
            backend_url,
            ..Default::default()
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir).context("Failed to create config directory")?;

        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, content).context("Failed to write config file")?;

        // Set restrictive permissions on config file (contains the bearer token)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&path, perms).context("Failed to set config permissions")?;
        }

        Ok(())
    }

    /// Effective backend URL: explicit override, then environment, then file.
    pub fn backend_url(&self, cli_override: Option<&str>) -> String {
        cli_override
            .map(String::from)
            .or_else(|| std::env::var(BACKEND_URL_ENV).ok())
            .or_else(|| self.backend_url.clone())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
            .trim_end_matches('/')
            .to_string()
    }
}

impl SessionStore for Config {
    fn get_auth_token(&self) -> Option<StoredToken> {
        self.auth_token.clone()
    }

    fn get_user_data(&self) -> Option<String> {
        self.user_data.clone()
    }

    fn set_session(&mut self, token: StoredToken, user_data: String) {
        self.auth_token = Some(token);
        self.user_data = Some(user_data);
    }

    fn clear_session(&mut self) {
        self.auth_token = None;
        self.user_data = None;
    }
}
