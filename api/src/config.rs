//! Server configuration read from environment variables.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PORT` | 8080 | Port to listen on |
//! | `HOST` | 0.0.0.0 | Address to bind |
//! | `DATA_DIR` | ./data | Directory scanned for `*.json` person files |
//! | `CORS_ALLOWED_ORIGINS` | http://localhost:5173 | Comma-separated allowed origins |
//!
//! Invalid values are logged and replaced by their default.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub host: IpAddr,
    pub data_dir: PathBuf,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            cors_allowed_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(port_str) => match port_str.parse::<u16>() {
                Ok(port_num) => {
                    info!("Using port {} from environment variable PORT.", port_num);
                    port_num
                }
                Err(_) => {
                    warn!(
                        "Invalid PORT value '{}' in environment variable. Using default port {}.",
                        port_str, defaults.port
                    );
                    defaults.port
                }
            },
            None => defaults.port,
        };

        let host = match lookup("HOST") {
            Some(host_str) => host_str.parse::<IpAddr>().unwrap_or_else(|_| {
                warn!(
                    "Invalid HOST value '{}'. Using default host {}.",
                    host_str, defaults.host
                );
                defaults.host
            }),
            None => defaults.host,
        };

        let data_dir = lookup("DATA_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let cors_allowed_origins = match lookup("CORS_ALLOWED_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.cors_allowed_origins,
        };

        Self {
            port,
            host,
            data_dir,
            cors_allowed_origins,
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
