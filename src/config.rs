// Configuration loading and parsing (config/draftroom.toml).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire draftroom.toml file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    server: ServerConfig,
    session: SessionConfig,
    #[serde(default)]
    database: DatabaseSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the resource endpoints, e.g. "http://localhost:8080".
    pub api_url: String,
    /// WebSocket URL of the live draft connection, e.g.
    /// "ws://localhost:8080/ws".
    pub ws_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Display name used when joining a draft.
    pub display_name: String,
    /// Passkey for the draft being joined.
    pub passkey: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DatabaseSection {
    /// Optional explicit path for the local store. When omitted, the
    /// platform data directory is used.
    path: Option<String>,
}

/// The assembled application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub db_path: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/draftroom.toml` relative
/// to `base_dir`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("draftroom.toml");
    let text = std::fs::read_to_string(&path)
        .map_err(|_| ConfigError::FileNotFound { path: path.clone() })?;

    let file: ConfigFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let db_path = file.database.path.unwrap_or_else(default_db_path);

    let config = Config {
        server: file.server,
        session: file.session,
        db_path,
    };

    validate(&config)?;
    Ok(config)
}

/// Convenience wrapper: loads config relative to the current working
/// directory.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    load_config_from(&cwd)
}

/// Default local-store location under the platform data directory,
/// falling back to the working directory when none is available.
fn default_db_path() -> String {
    directories::ProjectDirs::from("", "", "draftroom")
        .map(|dirs| {
            let dir = dirs.data_dir();
            let _ = std::fs::create_dir_all(dir);
            dir.join("draftroom.sqlite3").to_string_lossy().into_owned()
        })
        .unwrap_or_else(|| "draftroom.sqlite3".to_string())
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if !config.server.api_url.starts_with("http://") && !config.server.api_url.starts_with("https://")
    {
        return Err(ConfigError::ValidationError {
            field: "server.api_url".into(),
            message: format!("must be an http(s) URL, got `{}`", config.server.api_url),
        });
    }
    if !config.server.ws_url.starts_with("ws://") && !config.server.ws_url.starts_with("wss://") {
        return Err(ConfigError::ValidationError {
            field: "server.ws_url".into(),
            message: format!("must be a ws(s) URL, got `{}`", config.server.ws_url),
        });
    }
    if config.session.display_name.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "session.display_name".into(),
            message: "must not be empty".into(),
        });
    }
    Ok(())
}
