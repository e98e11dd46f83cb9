//! Server configuration from environment variables
//!
//! | Variable | Default |
//! |---|---|
//! | `BOARD_HOST` | `0.0.0.0` |
//! | `BOARD_PORT` | `3000` |
//! | `BOARD_DATA_DIR` | `data` |
//! | `BOARD_PUBLIC_URL` | `http://localhost:3000` |
//! | `BOARD_ADMIN_EMAIL` | empty (review mails disabled) |
//! | `BOARD_VIEWER_BUFFER` | `64` |
//! | `BOARD_BCRYPT_COST` | bcrypt default |
//! | `EMAIL_API_URL`, `EMAIL_API_KEY`, `EMAIL_FROM` | see [`EmailConfig`] |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::board::DEFAULT_VIEWER_BUFFER;
use crate::identity::IdentityConfig;
use crate::notify::EmailConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub public_url: String,
    pub admin_email: String,
    pub viewer_buffer: usize,
    pub bcrypt_cost: u32,
    pub email: EmailConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            data_dir: PathBuf::from("data"),
            public_url: "http://localhost:3000".to_string(),
            admin_email: String::new(),
            viewer_buffer: DEFAULT_VIEWER_BUFFER,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            email: EmailConfig::default(),
        }
    }
}

impl Config {
    /// Read the environment (after loading `.env` if present)
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Self {
            host: env::var("BOARD_HOST").unwrap_or(defaults.host),
            port: parse_var("BOARD_PORT", defaults.port),
            data_dir: env::var("BOARD_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            public_url: env::var("BOARD_PUBLIC_URL").unwrap_or(defaults.public_url),
            admin_email: env::var("BOARD_ADMIN_EMAIL").unwrap_or(defaults.admin_email),
            viewer_buffer: parse_var("BOARD_VIEWER_BUFFER", defaults.viewer_buffer),
            bcrypt_cost: parse_var("BOARD_BCRYPT_COST", defaults.bcrypt_cost),
            email: EmailConfig::from_env(),
        }
    }

    /// `host:port` to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn identity(&self) -> IdentityConfig {
        IdentityConfig {
            public_url: self.public_url.clone(),
            admin_email: self.admin_email.clone(),
            bcrypt_cost: self.bcrypt_cost,
        }
    }
}

/// Parse `key`, falling back to `default` when unset or invalid
fn parse_var<T: FromStr + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, default = %default, "Invalid value, using default");
                default
            }
        },
        Err(_) => default,
    }
}
