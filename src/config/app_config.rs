use std::{env, path::PathBuf, str::FromStr};

use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub session: SessionConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_size: usize,
    /// Base used for absolute links in responses. Falls back to the request's
    /// `Host` header when unset.
    pub public_url: Option<String>,
}

/// Where the product catalog lives.
#[derive(Debug, Clone)]
pub enum CatalogConfig {
    Postgres(DatabaseConfig),
    Memory { seed_file: Option<PathBuf> },
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub ttl_minutes: i64,
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 1440,
            secure_cookie: false,
        }
    }
}

impl SessionConfig {
    /// Upper bound on the inactivity window: one year.
    pub const MAX_TTL_MINUTES: i64 = 366 * 24 * 60;

    pub fn new(ttl_minutes: i64, secure_cookie: bool) -> Result<Self> {
        if !(1..=Self::MAX_TTL_MINUTES).contains(&ttl_minutes) {
            return Err(AppError::ConfigError(format!(
                "SESSION_TTL_MINUTES must be between 1 and {}, got {}",
                Self::MAX_TTL_MINUTES,
                ttl_minutes
            )));
        }

        Ok(Self {
            ttl_minutes,
            secure_cookie,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let catalog = match optional_var("DB_URL") {
            Some(url) => CatalogConfig::Postgres(DatabaseConfig {
                url,
                max_connections: parse_var("DB_MAX_CONNECTIONS", 20)?,
            }),
            None => CatalogConfig::Memory {
                seed_file: optional_var("CATALOG_SEED_FILE").map(PathBuf::from),
            },
        };

        Ok(Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("PORT", 3000)?,
                max_body_size: parse_var("MAX_BODY_SIZE", 1_048_576)?,
                public_url: optional_var("PUBLIC_URL")
                    .map(|url| url.trim_end_matches('/').to_string()),
            },
            catalog,
            session: SessionConfig::new(
                parse_var("SESSION_TTL_MINUTES", 1440)?,
                parse_var("SESSION_SECURE_COOKIE", false)?,
            )?,
            cors: CorsConfig {
                allowed_origins: optional_var("FRONTEND_URL")
                    .map(|origins| {
                        origins
                            .split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or_default(),
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T> {
    match optional_var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::ConfigError(format!("Invalid {} value", key))),
        None => Ok(default),
    }
}
