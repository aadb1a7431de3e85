//! Server configuration (`tasklane.toml` plus `TASKLANE_*` overrides).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Config file looked up in the working directory when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = "tasklane.toml";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub keyvalue: KeyValueSettings,
    #[serde(default)]
    pub mailer: MailerSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSettings {
    #[serde(default = "default_interface")]
    pub interface: String,
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_jwt_ttl")]
    pub jwt_ttl_secs: u64,
    #[serde(default = "default_max_items_per_page")]
    pub max_items_per_page: i64,
    #[serde(default = "default_true")]
    pub enable_registration: bool,
    #[serde(default = "default_true")]
    pub enable_link_sharing: bool,
    #[serde(default)]
    pub enable_metrics: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            jwt_secret: String::new(),
            jwt_ttl_secs: default_jwt_ttl(),
            max_items_per_page: default_max_items_per_page(),
            enable_registration: true,
            enable_link_sharing: true,
            enable_metrics: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KeyValueType {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyValueSettings {
    #[serde(default, rename = "type")]
    pub kind: KeyValueType,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
}

impl Default for KeyValueSettings {
    fn default() -> Self {
        Self {
            kind: KeyValueType::Memory,
            redis_url: default_redis_url(),
        }
    }
}

/// Mail delivery is not built in; enabling it only switches new accounts to
/// email confirmation.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MailerSettings {
    #[serde(default)]
    pub enabled: bool,
}

fn default_interface() -> String {
    "0.0.0.0:3456".into()
}

fn default_jwt_ttl() -> u64 {
    60 * 60 * 24 * 3
}

fn default_max_items_per_page() -> i64 {
    50
}

fn default_true() -> bool {
    true
}

fn default_database_path() -> PathBuf {
    PathBuf::from("tasklane.db")
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".into()
}

impl Config {
    /// Read the config file (when present), then apply environment overrides.
    /// An explicit `path` must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(CONFIG_FILE_NAME).exists() => Self::from_file(Path::new(CONFIG_FILE_NAME))?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        config.ensure_jwt_secret()?;
        Ok(config)
    }

    /// Reject settings no request could be served with.
    pub fn validate(&self) -> Result<()> {
        if self.service.max_items_per_page < 1 {
            anyhow::bail!(
                "service.max_items_per_page must be at least 1, got {}",
                self.service.max_items_per_page
            );
        }
        Ok(())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    /// Override fields from `TASKLANE_*` variables looked up through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| var(key).filter(|v| !v.is_empty());

        if let Some(v) = get("TASKLANE_INTERFACE") {
            self.service.interface = v;
        }
        if let Some(port) = get("TASKLANE_PORT") {
            let port: u16 = port.parse().context("TASKLANE_PORT must be a port number")?;
            let host = self
                .service
                .interface
                .rsplit_once(':')
                .map_or("0.0.0.0", |(host, _)| host);
            self.service.interface = format!("{host}:{port}");
        }
        if let Some(v) = get("TASKLANE_JWT_SECRET") {
            self.service.jwt_secret = v;
        }
        if let Some(v) = get("TASKLANE_JWT_TTL_SECS") {
            self.service.jwt_ttl_secs = v.parse().context("TASKLANE_JWT_TTL_SECS must be a number")?;
        }
        if let Some(v) = get("TASKLANE_MAX_ITEMS_PER_PAGE") {
            self.service.max_items_per_page = v.parse().context("TASKLANE_MAX_ITEMS_PER_PAGE must be a number")?;
        }
        if let Some(v) = get("TASKLANE_ENABLE_REGISTRATION") {
            self.service.enable_registration = parse_bool("TASKLANE_ENABLE_REGISTRATION", &v)?;
        }
        if let Some(v) = get("TASKLANE_ENABLE_LINK_SHARING") {
            self.service.enable_link_sharing = parse_bool("TASKLANE_ENABLE_LINK_SHARING", &v)?;
        }
        if let Some(v) = get("TASKLANE_ENABLE_METRICS") {
            self.service.enable_metrics = parse_bool("TASKLANE_ENABLE_METRICS", &v)?;
        }
        if let Some(v) = get("TASKLANE_DATABASE_PATH") {
            self.database.path = PathBuf::from(v);
        }
        if let Some(v) = get("TASKLANE_KEYVALUE_TYPE") {
            self.keyvalue.kind = match v.as_str() {
                "memory" => KeyValueType::Memory,
                "redis" => KeyValueType::Redis,
                other => anyhow::bail!("unknown key-value store type: {other}"),
            };
        }
        if let Some(v) = get("TASKLANE_REDIS_URL") {
            self.keyvalue.redis_url = v;
        }
        if let Some(v) = get("TASKLANE_MAILER_ENABLED") {
            self.mailer.enabled = parse_bool("TASKLANE_MAILER_ENABLED", &v)?;
        }
        Ok(())
    }

    fn ensure_jwt_secret(&mut self) -> Result<()> {
        if self.service.jwt_secret.is_empty() {
            tracing::warn!("no JWT secret configured; using a random one, tokens will not survive a restart");
            self.service.jwt_secret = tasklane_api::crypto::generate_token()?;
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => anyhow::bail!("{key} must be true or false, got {other}"),
    }
}
