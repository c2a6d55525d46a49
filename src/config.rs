//! Configuration management for zk-shell.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::logging;
use crate::store::{Auth, ClientConfig, DEFAULT_SERVER};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ensemble addresses (`host:port`).
    pub servers: Vec<String>,
    /// Credential applied to every new session.
    pub auth: Option<AuthSection>,
    /// Logging configuration.
    pub logging: LoggingSection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            servers: vec![DEFAULT_SERVER.to_string()],
            auth: None,
            logging: LoggingSection::default(),
        }
    }
}

/// Authentication section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSection {
    /// Scheme name.
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Scheme-specific secret, `user:password` for digest.
    pub secret: String,
}

fn default_scheme() -> String {
    "digest".to_string()
}

/// Logging configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Explicit filter (error, warn, info, debug, trace, or directives).
    pub level: Option<String>,
    /// Verbose logging when no explicit level is set.
    pub verbose: bool,
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Default config file location, `$HOME/.config/zk-shell.json`.
    pub fn default_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(PathBuf::from(home).join(".config").join("zk-shell.json"))
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(servers) = std::env::var("ZK_SHELL_SERVERS") {
            if !servers.is_empty() {
                self.servers = split_servers(&servers);
            }
        }

        if let Ok(level) = std::env::var("ZK_SHELL_LOG_LEVEL") {
            self.logging.level = Some(level);
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = Some(level);
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(ref servers) = args.servers {
            self.servers = split_servers(servers);
        }

        if let (Some(user), Some(password)) = (&args.user, &args.password) {
            if !user.is_empty() && !password.is_empty() {
                let auth = Auth::digest(user, password);
                self.auth = Some(AuthSection {
                    scheme: auth.scheme,
                    secret: auth.secret,
                });
            }
        }

        if args.verbose {
            self.logging.verbose = true;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = Some(level.clone());
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults. Without
    /// `-c`, the default file is read only if it exists.
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => match Config::default_path().filter(|p| p.is_file()) {
                Some(path) => Config::from_file(&path)?,
                None => Config::default(),
            },
        };

        config.apply_env();
        config.apply_args(args);

        Ok(config)
    }

    /// Build the configuration used to establish sessions.
    pub fn to_client_config(&self) -> ClientConfig {
        let config = ClientConfig::new(self.servers.clone(), self.logging.verbose);
        match self.auth {
            Some(ref auth) => config.with_auth(Auth::new(&auth.scheme, &auth.secret)),
            None => config,
        }
    }

    /// Get the log filter string.
    pub fn log_filter(&self) -> &str {
        match self.logging.level {
            Some(ref level) => level.as_str(),
            None if self.logging.verbose => logging::VERBOSE_FILTER,
            None => logging::DEFAULT_FILTER,
        }
    }
}

fn split_servers(list: &str) -> Vec<String> {
    list.split(',').map(|s| s.trim().to_string()).collect()
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.servers, vec!["127.0.0.1:2181"]);
        assert!(config.auth.is_none());
        assert_eq!(config.log_filter(), logging::DEFAULT_FILTER);
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "servers": ["zk1:2181", "zk2:2181"],
            "auth": { "secret": "admin:pw" },
            "logging": { "verbose": true }
        }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.servers, vec!["zk1:2181", "zk2:2181"]);
        let auth = config.auth.clone().unwrap();
        assert_eq!(auth.scheme, "digest");
        assert_eq!(auth.secret, "admin:pw");
        assert_eq!(config.log_filter(), logging::VERBOSE_FILTER);
    }

    #[test]
    fn test_config_partial_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{ "logging": { "level": "info" } }"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.servers, vec![DEFAULT_SERVER]);
        assert_eq!(config.log_filter(), "info");
    }

    #[test]
    fn test_config_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ servers: ").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn test_missing_explicit_file() {
        let args = Args {
            config: Some(PathBuf::from("/nonexistent/zk-shell.json")),
            ..Args::default()
        };
        assert!(matches!(Config::load(&args), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        let args = Args {
            servers: Some("a:1, b:2".to_string()),
            user: Some("alice".to_string()),
            password: Some("pw".to_string()),
            verbose: true,
            ..Args::default()
        };

        config.apply_args(&args);

        assert_eq!(config.servers, vec!["a:1", "b:2"]);
        assert_eq!(
            config.auth,
            Some(AuthSection {
                scheme: "digest".to_string(),
                secret: "alice:pw".to_string(),
            })
        );
        assert_eq!(config.log_filter(), logging::VERBOSE_FILTER);
    }

    #[test]
    fn test_user_without_password_ignored() {
        let mut config = Config::default();
        let args = Args {
            user: Some("alice".to_string()),
            ..Args::default()
        };
        config.apply_args(&args);
        assert!(config.auth.is_none());
    }

    #[test]
    fn test_log_level_beats_verbose() {
        let mut config = Config::default();
        let args = Args {
            verbose: true,
            log_level: Some("error".to_string()),
            ..Args::default()
        };
        config.apply_args(&args);
        assert_eq!(config.log_filter(), "error");
    }

    #[test]
    fn test_to_client_config() {
        let mut config = Config::default();
        config.auth = Some(AuthSection {
            scheme: "digest".to_string(),
            secret: "u:p".to_string(),
        });

        let client = config.to_client_config();
        assert_eq!(client.servers(), [DEFAULT_SERVER]);
        assert_eq!(client.auth(), Some(&Auth::digest("u", "p")));
        assert!(!client.verbose());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("\"servers\""));
        assert!(json.contains("\"logging\""));
    }
}
