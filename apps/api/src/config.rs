use std::{
    env,
    net::{AddrParseError, SocketAddr},
};

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
/// One week; clients restore sessions from the stored token, so short TTLs
/// would sign users out between app launches.
pub const DEFAULT_TOKEN_TTL_SECONDS: u64 = 604_800;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid TASKDECK_BIND_ADDR: {0}")]
    InvalidBindAddr(#[from] AddrParseError),
    #[error("invalid {name}: {value}")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub service_name: String,
    pub bind_addr: SocketAddr,
    pub build_sha: String,
    pub token_signing_key: String,
    pub token_issuer: String,
    pub token_ttl_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env::var("TASKDECK_BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse()?;
        let service_name =
            env::var("TASKDECK_SERVICE_NAME").unwrap_or_else(|_| "taskdeck-api".to_string());
        let build_sha = env::var("TASKDECK_BUILD_SHA").unwrap_or_else(|_| "dev".to_string());
        let token_signing_key = env::var("TASKDECK_TOKEN_SIGNING_KEY")
            .unwrap_or_else(|_| "taskdeck-dev-signing-key".to_string());
        let token_issuer =
            env::var("TASKDECK_TOKEN_ISSUER").unwrap_or_else(|_| "taskdeck".to_string());
        let token_ttl_seconds = parse_u64_env("TASKDECK_TOKEN_TTL_SECONDS", DEFAULT_TOKEN_TTL_SECONDS)?;

        Ok(Self {
            service_name,
            bind_addr,
            build_sha,
            token_signing_key,
            token_issuer,
            token_ttl_seconds,
        })
    }
}

fn parse_u64_env(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value: raw }),
        Err(_) => Ok(default),
    }
}
