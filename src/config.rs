use anyhow::{Context, Result};
use std::env;

use crate::domain::locale::Locale;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // CORS
    pub cors_allow_origins: Vec<String>,

    /// Locale used for label accessors when a request does not specify one
    pub default_locale: Locale,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let env = Environment::from_str(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        // Database
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        // CORS
        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let default_locale = env::var("DEFAULT_LOCALE")
            .ok()
            .map(|s| Locale::from_str(&s))
            .unwrap_or(Locale::En);

        Ok(Settings {
            env,
            server_addr,
            database_url,
            database_max_connections,
            cors_allow_origins,
            default_locale,
        })
    }
}
