//! Configuration file support for workdesk
//!
//! Reads from .workdesk/config.toml, then applies `WORKDESK_*` environment
//! overrides on top.

use crate::store::{RecordStore, RestStore, SqliteStore, StoreError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const CONFIG_DIR: &str = ".workdesk";

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    /// Record store settings
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Write endpoint settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Directory holding `.workdesk/`, when a config file was found
    #[serde(skip)]
    pub root: Option<PathBuf>,
}

/// Which record store implementation to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Hosted PostgREST-style API at `remote.url`
    Rest,
    /// Local SQLite file at `remote.db_path`
    Sqlite,
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(Backend::Rest),
            "sqlite" => Ok(Backend::Sqlite),
            other => Err(format!("unknown backend `{}` (expected rest or sqlite)", other)),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RemoteConfig {
    /// Explicit backend. When unset: `rest` if `url` is set, else `sqlite`.
    #[serde(default)]
    pub backend: Option<Backend>,

    /// Base URL of the hosted API, e.g. "https://xyz.example.co"
    #[serde(default)]
    pub url: Option<String>,

    /// Public client key used for reads and everyday writes
    #[serde(default)]
    pub anon_key: Option<String>,

    /// Privileged key; also the bearer secret for `POST /seed`
    #[serde(default)]
    pub service_key: Option<String>,

    /// Owner every row is scoped to
    /// Default: "local"
    #[serde(default = "default_owner_id")]
    pub owner_id: String,

    /// SQLite file for the `sqlite` backend
    /// Default: .workdesk/workdesk.db
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

fn default_owner_id() -> String {
    "local".to_string()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            backend: None,
            url: None,
            anon_key: None,
            service_key: None,
            owner_id: default_owner_id(),
            db_path: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    /// Bearer secret for `POST /updates` and `POST /briefings`
    #[serde(default)]
    pub token: Option<String>,

    /// Default: 3000
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            token: None,
            port: default_port(),
        }
    }
}

/// Error type for turning configuration into a store
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("remote.url is not set (or set WORKDESK_REMOTE_URL)")]
    MissingUrl,

    #[error("invalid {var}: {message}")]
    InvalidEnv { var: &'static str, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load config from .workdesk/config.toml plus environment overrides.
    /// A missing or malformed file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = std::env::current_dir()
            .ok()
            .and_then(|dir| Self::find_config_path(&dir))
            .map(|path| Self::from_file(&path))
            .unwrap_or_default();
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Parse one config file; unreadable or malformed files give defaults
    pub fn from_file(path: &Path) -> Self {
        let mut config = match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read config");
                Self::default()
            }
        };
        // .workdesk/config.toml -> project root
        config.root = path.parent().and_then(Path::parent).map(Path::to_path_buf);
        config
    }

    /// Find config.toml by walking up directory tree
    pub fn find_config_path(start: &Path) -> Option<PathBuf> {
        let mut dir = start;

        loop {
            let config_path = dir.join(CONFIG_DIR).join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        None
    }

    /// Apply `WORKDESK_*` overrides; `lookup` reads one variable
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = non_empty(lookup("WORKDESK_BACKEND")) {
            let backend = backend.parse().map_err(|message| ConfigError::InvalidEnv {
                var: "WORKDESK_BACKEND",
                message,
            })?;
            self.remote.backend = Some(backend);
        }
        if let Some(url) = non_empty(lookup("WORKDESK_REMOTE_URL")) {
            self.remote.url = Some(url);
        }
        if let Some(key) = non_empty(lookup("WORKDESK_ANON_KEY")) {
            self.remote.anon_key = Some(key);
        }
        if let Some(key) = non_empty(lookup("WORKDESK_SERVICE_KEY")) {
            self.remote.service_key = Some(key);
        }
        if let Some(owner) = non_empty(lookup("WORKDESK_OWNER_ID")) {
            self.remote.owner_id = owner;
        }
        if let Some(path) = non_empty(lookup("WORKDESK_DB_PATH")) {
            self.remote.db_path = Some(PathBuf::from(path));
        }
        if let Some(token) = non_empty(lookup("WORKDESK_API_TOKEN")) {
            self.api.token = Some(token);
        }
        Ok(())
    }

    pub fn backend(&self) -> Backend {
        match self.remote.backend {
            Some(backend) => backend,
            None if self.remote.url.is_some() => Backend::Rest,
            None => Backend::Sqlite,
        }
    }

    /// SQLite file used by the `sqlite` backend
    pub fn db_path(&self) -> PathBuf {
        match &self.remote.db_path {
            Some(path) => path.clone(),
            None => {
                let root = self.root.clone().unwrap_or_else(|| PathBuf::from("."));
                root.join(CONFIG_DIR).join("workdesk.db")
            }
        }
    }

    /// Store used by the dashboard, authenticated with the client key
    pub fn build_store(&self) -> Result<Arc<dyn RecordStore>, ConfigError> {
        self.open(false)
    }

    /// Store used by `POST /seed`, authenticated with the service key
    pub fn build_service_store(&self) -> Result<Arc<dyn RecordStore>, ConfigError> {
        self.open(true)
    }

    fn open(&self, privileged: bool) -> Result<Arc<dyn RecordStore>, ConfigError> {
        let owner = self.remote.owner_id.as_str();
        match self.backend() {
            Backend::Rest => {
                let url = self.remote.url.as_deref().ok_or(ConfigError::MissingUrl)?;
                let anon = self.remote.anon_key.as_deref().unwrap_or_default();
                let bearer = if privileged {
                    self.remote.service_key.as_deref()
                } else {
                    None
                };
                Ok(Arc::new(RestStore::new(url, anon, bearer, owner)))
            }
            Backend::Sqlite => Ok(Arc::new(SqliteStore::open_at(self.db_path(), owner)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend(), Backend::Sqlite);
        assert_eq!(config.remote.owner_id, "local");
        assert_eq!(config.api.port, 3000);
        assert!(config.api.token.is_none());
        assert_eq!(config.db_path(), PathBuf::from(".").join(".workdesk").join("workdesk.db"));
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[remote]
url = "https://xyz.example.co"
anon_key = "anon"
owner_id = "me"

[api]
token = "secret"
port = 8080
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.backend(), Backend::Rest);
        assert_eq!(config.remote.owner_id, "me");
        assert_eq!(config.api.token.as_deref(), Some("secret"));
        assert_eq!(config.api.port, 8080);
    }

    #[test]
    fn test_explicit_backend_wins() {
        let toml = r#"
[remote]
backend = "sqlite"
url = "https://xyz.example.co"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.backend(), Backend::Sqlite);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config: Config = toml::from_str("[api]\ntoken = \"from-file\"\n").unwrap();
        config
            .apply_env(env(&[
                ("WORKDESK_API_TOKEN", "from-env"),
                ("WORKDESK_BACKEND", "REST"),
                ("WORKDESK_OWNER_ID", ""),
            ]))
            .unwrap();
        assert_eq!(config.api.token.as_deref(), Some("from-env"));
        assert_eq!(config.backend(), Backend::Rest);
        // blank values are ignored
        assert_eq!(config.remote.owner_id, "local");
    }

    #[test]
    fn test_bad_backend_env_is_an_error() {
        let mut config = Config::default();
        let err = config.apply_env(env(&[("WORKDESK_BACKEND", "mongo")])).unwrap_err();
        assert!(err.to_string().contains("WORKDESK_BACKEND"));
    }

    #[test]
    fn test_rest_without_url_is_an_error() {
        let mut config = Config::default();
        config.remote.backend = Some(Backend::Rest);
        assert!(matches!(config.build_store(), Err(ConfigError::MissingUrl)));
    }

    #[test]
    fn test_find_config_walks_up() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::create_dir_all(dir.path().join(CONFIG_DIR)).unwrap();
        let path = dir.path().join(CONFIG_DIR).join("config.toml");
        std::fs::write(&path, "[api]\nport = 4100\n").unwrap();

        let found = Config::find_config_path(&nested).unwrap();
        assert_eq!(found, path);

        let config = Config::from_file(&found);
        assert_eq!(config.api.port, 4100);
        assert_eq!(config.root.as_deref(), Some(dir.path()));
        assert_eq!(config.db_path(), dir.path().join(CONFIG_DIR).join("workdesk.db"));
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api\nport = ").unwrap();
        let config = Config::from_file(&path);
        assert_eq!(config.api.port, 3000);
    }

    #[test]
    fn test_sqlite_store_from_config() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config
            .apply_env(env(&[("WORKDESK_DB_PATH", dir.path().join("x.db").to_str().unwrap())]))
            .unwrap();
        assert!(config.build_store().is_ok());
    }
}
