//! Runtime settings from environment variables (a `.env` file is loaded by the server first).

use crate::error::ConfigError;
use regex::Regex;
use std::net::SocketAddr;
use std::str::FromStr;

/// Which storage collaborator backs the repositories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    Memory,
}

impl FromStr for StorageKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageKind::Postgres),
            "memory" => Ok(StorageKind::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    /// Prefix of the alert headers (`X-{app_name}-alert`).
    pub app_name: String,
    /// Alert headers carry message keys instead of English messages.
    pub enable_translation: bool,
    pub bind_addr: SocketAddr,
    pub storage: StorageKind,
    pub database_url: String,
    /// Schema holding the entity tables.
    pub db_schema: String,
    pub max_connections: u32,
    pub body_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            app_name: "myApp".into(),
            enable_translation: true,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            storage: StorageKind::Postgres,
            database_url: "postgres://localhost/myapp".into(),
            db_schema: "public".into(),
            max_connections: 5,
            body_limit: 1024 * 1024,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut s = Settings::default();
        if let Some(v) = lookup("APP_NAME") {
            s.app_name = v;
        }
        if let Some(v) = lookup("APP_ENABLE_TRANSLATION") {
            s.enable_translation = parse_bool("APP_ENABLE_TRANSLATION", &v)?;
        }
        if let Some(v) = lookup("BIND_ADDR") {
            s.bind_addr = v.parse().map_err(|_| invalid("BIND_ADDR", &v, "expected host:port"))?;
        }
        if let Some(v) = lookup("STORAGE") {
            s.storage = v.parse().map_err(|_| invalid("STORAGE", &v, "expected postgres or memory"))?;
        }
        if let Some(v) = lookup("DATABASE_URL") {
            s.database_url = v;
        }
        if let Some(v) = lookup("DB_SCHEMA") {
            s.db_schema = v;
        }
        if let Some(v) = lookup("DB_MAX_CONNECTIONS") {
            s.max_connections = parse_positive("DB_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = lookup("BODY_LIMIT_BYTES") {
            s.body_limit = parse_positive("BODY_LIMIT_BYTES", &v)?;
        }
        s.validate()?;
        Ok(s)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let app_name = Regex::new(r"^[A-Za-z0-9_-]+$").map_err(|_| invalid("APP_NAME", &self.app_name, "bad pattern"))?;
        if !app_name.is_match(&self.app_name) {
            return Err(invalid("APP_NAME", &self.app_name, "only letters, digits, '-' and '_' allowed"));
        }
        let ident = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").map_err(|_| invalid("DB_SCHEMA", &self.db_schema, "bad pattern"))?;
        if !ident.is_match(&self.db_schema) {
            return Err(invalid("DB_SCHEMA", &self.db_schema, "must be a plain SQL identifier"));
        }
        Ok(())
    }
}

fn invalid(key: &'static str, value: &str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason,
    }
}

fn parse_bool(key: &'static str, v: &str) -> Result<bool, ConfigError> {
    match v.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, v, "expected a boolean")),
    }
}

fn parse_positive<T>(key: &'static str, v: &str) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    match v.trim().parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(invalid(key, v, "expected a positive integer")),
    }
}
