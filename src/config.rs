use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected 'pretty' or 'json', got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct Config {
    #[validate(length(min = 1))]
    pub server_address: String,
    pub log_format: LogFormat,
    #[validate(range(min = 1, max = 10000))]
    pub max_batch_size: usize,
    #[validate(range(min = 1, max = 26))]
    pub max_version_count: u32,
    #[validate(range(min = 1024))]
    pub body_limit_bytes: usize,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Default for Config {
    fn default() -> Self {
        Self {
            server_address: "0.0.0.0:8080".to_string(),
            log_format: LogFormat::Pretty,
            max_batch_size: 200,
            max_version_count: 26,
            body_limit_bytes: 2 * 1024 * 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        let defaults = Config::default();

        let config = Self {
            server_address: env::var("SERVER_ADDRESS").unwrap_or(defaults.server_address),
            log_format: get_env_parse_or("LOG_FORMAT", defaults.log_format)?,
            max_batch_size: get_env_parse_or("MAX_BATCH_SIZE", defaults.max_batch_size)?,
            max_version_count: get_env_parse_or("MAX_VERSION_COUNT", defaults.max_version_count)?,
            body_limit_bytes: get_env_parse_or("BODY_LIMIT_BYTES", defaults.body_limit_bytes)?,
        };
        config
            .validate()
            .map_err(|e| Error::Config(format!("Invalid configuration: {}", e)))?;
        Ok(config)
    }
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
