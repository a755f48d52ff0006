/// Configuration for the Tablero server, read from environment variables
/// with working defaults for local development.
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub bind_address: String,
    pub jwt_secret: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
}

fn default_port() -> u16 {
    5001
}

const DEFAULT_SECRET: &str = "default-secret-key";

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("Invalid value for {}: {:?}, using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

impl Config {
    pub fn from_env() -> Self {
        let jwt_secret =
            std::env::var("TABLERO_JWT_SECRET").unwrap_or_else(|_| DEFAULT_SECRET.to_string());
        if jwt_secret == DEFAULT_SECRET {
            log::warn!("TABLERO_JWT_SECRET not set, using the built-in development secret");
        }
        Self {
            port: env_or("TABLERO_PORT", default_port()),
            bind_address: std::env::var("TABLERO_BIND").unwrap_or_else(|_| "0.0.0.0".to_string()),
            jwt_secret,
            // 15 minutes for access tokens, 30 days for refresh tokens.
            access_ttl_secs: env_or("TABLERO_ACCESS_TTL_SECS", 15 * 60),
            refresh_ttl_secs: env_or("TABLERO_REFRESH_TTL_SECS", 30 * 24 * 3600),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: "0.0.0.0".to_string(),
            jwt_secret: DEFAULT_SECRET.to_string(),
            access_ttl_secs: 15 * 60,
            refresh_ttl_secs: 30 * 24 * 3600,
        }
    }
}
