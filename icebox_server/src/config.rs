use std::env;

use chrono::Duration;
use icebox_common::{parse_boolean_flag, Secret};
use log::*;

const DEFAULT_ICEBOX_HOST: &str = "127.0.0.1";
const DEFAULT_ICEBOX_PORT: u16 = 8360;
const DEFAULT_TOKEN_EXPIRY: Duration = Duration::hours(24);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// Drivers only see orders younger than this many days.
    pub availability_window_days: i64,
    /// When running behind a reverse proxy, log the `X-Forwarded-For` header as the client
    /// address instead of the peer address.
    pub use_x_forwarded_for: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_ICEBOX_HOST.to_string(),
            port: DEFAULT_ICEBOX_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            availability_window_days: icebox_engine::DEFAULT_AVAILABILITY_WINDOW_DAYS,
            use_x_forwarded_for: false,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("ICEBOX_HOST").ok().unwrap_or_else(|| DEFAULT_ICEBOX_HOST.into());
        let port = env::var("ICEBOX_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for ICEBOX_PORT. {e} Using the default, {DEFAULT_ICEBOX_PORT}, \
                         instead."
                    );
                    DEFAULT_ICEBOX_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_ICEBOX_PORT);
        let database_url = env::var("ICEBOX_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ ICEBOX_DATABASE_URL is not set. Please set it to the URL for the Icebox database.");
            String::default()
        });
        let availability_window_days = env::var("ICEBOX_AVAILABILITY_WINDOW_DAYS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(icebox_engine::DEFAULT_AVAILABILITY_WINDOW_DAYS);
        let use_x_forwarded_for = parse_boolean_flag(env::var("ICEBOX_USE_X_FORWARDED_FOR").ok(), false);
        let auth = AuthConfig::from_env_or_default();
        Self { host, port, database_url, auth, availability_window_days, use_x_forwarded_for }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
    pub token_expiry: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: Secret::new(random_secret()), token_expiry: DEFAULT_TOKEN_EXPIRY }
    }
}

impl AuthConfig {
    pub fn from_env_or_default() -> Self {
        let jwt_secret = match env::var("ICEBOX_JWT_SECRET") {
            Ok(s) if !s.trim().is_empty() => Secret::new(s),
            _ => {
                warn!(
                    "🪛️ ICEBOX_JWT_SECRET is not set. A random secret will be used, which means that all driver \
                     sessions will be invalidated when the server restarts."
                );
                Secret::new(random_secret())
            },
        };
        let token_expiry = env::var("ICEBOX_TOKEN_EXPIRY_HOURS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Duration::hours)
            .unwrap_or(DEFAULT_TOKEN_EXPIRY);
        Self { jwt_secret, token_expiry }
    }
}

fn random_secret() -> String {
    (0..32).map(|_| format!("{:02x}", rand::random::<u8>())).collect()
}
