//! Configuration loading
//!
//! Each setting resolves in priority order:
//! 1. Command-line argument
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default
//!
//! Tiers 1 and 2 are handled by clap (`env = ...`); [`ConfigArgs::resolve`]
//! layers the TOML file and defaults underneath. The result is immutable for
//! the life of the process.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{Error, Result};

pub const DEFAULT_STORE_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_DATABASE: &str = "TPintegrador2";
pub const DEFAULT_MADURADORES_COLLECTION: &str = "maduradores";
pub const DEFAULT_LOTES_COLLECTION: &str = "lotes";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://127.0.0.1:5500", "http://localhost:5500"];

/// Storage connection settings
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// `mongodb://`, `mongodb+srv://` or `sqlite:` URI
    pub uri: String,
    pub database: String,
    pub maduradores_collection: String,
    pub lotes_collection: String,
    /// Bound on connecting / server selection / pool checkout
    pub timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_STORE_URI.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            maduradores_collection: DEFAULT_MADURADORES_COLLECTION.to_string(),
            lotes_collection: DEFAULT_LOTES_COLLECTION.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Fully resolved configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub server: ServerConfig,
}

/// TOML config file contents; every key optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub store: TomlStore,
    pub server: TomlServer,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlStore {
    pub uri: Option<String>,
    pub database: Option<String>,
    pub maduradores_collection: Option<String>,
    pub lotes_collection: Option<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlServer {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub cors_origins: Option<Vec<String>>,
}

impl TomlConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Command-line / environment configuration tiers
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// TOML config file
    #[arg(long = "config", env = "BREWLOG_CONFIG")]
    pub config_file: Option<PathBuf>,

    /// Store connection URI (mongodb://, mongodb+srv:// or sqlite:)
    #[arg(long = "mongo-uri", env = "MONGO_URI")]
    pub store_uri: Option<String>,

    /// Database name
    #[arg(long = "mongo-db", env = "MONGO_DB")]
    pub database: Option<String>,

    /// Collection holding madurador records
    #[arg(long, env = "MONGO_COLLECTION_MADURADORES")]
    pub maduradores_collection: Option<String>,

    /// Collection holding lote records
    #[arg(long, env = "MONGO_COLLECTION_LOTES")]
    pub lotes_collection: Option<String>,

    /// Store connection timeout in milliseconds
    #[arg(long = "mongo-timeout-ms", env = "MONGO_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Address to bind the HTTP listener to
    #[arg(long, env = "BREWLOG_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "BREWLOG_PORT")]
    pub port: Option<u16>,

    /// Allowed CORS origin (repeatable)
    #[arg(long = "cors-origin", env = "BREWLOG_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,
}

impl ConfigArgs {
    /// Layer CLI/env values over the TOML file (if any) over defaults
    pub fn resolve(&self) -> Result<AppConfig> {
        let toml = match &self.config_file {
            Some(path) => TomlConfig::load(path)?,
            None => TomlConfig::default(),
        };
        self.resolve_with(toml)
    }

    pub fn resolve_with(&self, toml: TomlConfig) -> Result<AppConfig> {
        let defaults = AppConfig::default();

        let timeout_ms = self.timeout_ms.or(toml.store.timeout_ms);
        let timeout = match timeout_ms {
            Some(0) => return Err(Error::Config("timeout must be greater than zero".to_string())),
            Some(ms) => Duration::from_millis(ms),
            None => defaults.store.timeout,
        };

        let store = StoreConfig {
            uri: pick(&self.store_uri, toml.store.uri, defaults.store.uri),
            database: pick(&self.database, toml.store.database, defaults.store.database),
            maduradores_collection: pick(
                &self.maduradores_collection,
                toml.store.maduradores_collection,
                defaults.store.maduradores_collection,
            ),
            lotes_collection: pick(
                &self.lotes_collection,
                toml.store.lotes_collection,
                defaults.store.lotes_collection,
            ),
            timeout,
        };

        let cors_origins = if !self.cors_origins.is_empty() {
            self.cors_origins.clone()
        } else {
            toml.server.cors_origins.unwrap_or(defaults.server.cors_origins)
        };

        let server = ServerConfig {
            host: pick(&self.host, toml.server.host, defaults.server.host),
            port: self.port.or(toml.server.port).unwrap_or(defaults.server.port),
            cors_origins,
        };

        if store.maduradores_collection == store.lotes_collection {
            return Err(Error::Config(format!(
                "madurador and lote collections must differ (both '{}')",
                store.lotes_collection
            )));
        }

        Ok(AppConfig { store, server })
    }
}

fn pick(arg: &Option<String>, file: Option<String>, default: String) -> String {
    arg.clone().or(file).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = ConfigArgs::default().resolve().unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.store.timeout, Duration::from_millis(10_000));
        assert_eq!(config.server.bind_addr(), "127.0.0.1:8000");
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let toml = TomlConfig::parse(
            r#"
            [store]
            uri = "sqlite://records.db"
            timeout_ms = 2500

            [server]
            port = 9000
            cors_origins = ["http://example.test"]
            "#,
        )
        .unwrap();

        let config = ConfigArgs::default().resolve_with(toml).unwrap();
        assert_eq!(config.store.uri, "sqlite://records.db");
        assert_eq!(config.store.database, DEFAULT_DATABASE);
        assert_eq!(config.store.timeout, Duration::from_millis(2500));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.cors_origins, vec!["http://example.test"]);
    }

    #[test]
    fn test_args_override_toml() {
        let toml = TomlConfig::parse("[store]\ndatabase = \"from_file\"\n").unwrap();
        let args = ConfigArgs {
            database: Some("from_args".to_string()),
            ..Default::default()
        };
        let config = args.resolve_with(toml).unwrap();
        assert_eq!(config.store.database, "from_args");
    }

    #[test]
    fn test_rejects_zero_timeout_and_shared_collection() {
        let args = ConfigArgs {
            timeout_ms: Some(0),
            ..Default::default()
        };
        assert!(matches!(args.resolve(), Err(Error::Config(_))));

        let args = ConfigArgs {
            lotes_collection: Some(DEFAULT_MADURADORES_COLLECTION.to_string()),
            ..Default::default()
        };
        assert!(matches!(args.resolve(), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let args = ConfigArgs {
            config_file: Some(PathBuf::from("/nonexistent/brewlog.toml")),
            ..Default::default()
        };
        assert!(matches!(args.resolve(), Err(Error::Config(_))));
    }
}
