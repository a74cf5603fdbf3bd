//! Process configuration, read from the environment.
//!
//! A `.env` file in the working directory is loaded first when present, so
//! local runs only need `JWT_SECRET` in it.

use std::{collections::HashMap, net::SocketAddr, ops::RangeInclusive, path::PathBuf};

/// Tokens live between an hour and a year.
const TOKEN_TTL_RANGE: RangeInclusive<i64> = 1..=24 * 365;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bind_addr: SocketAddr,
    pub public_base_url: String,
    pub allowed_origin: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub sweep_uploads_on_start: bool,
    pub log_level: String,
    pub log_json: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_vars(std::env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let jwt_secret = get("JWT_SECRET")
            .ok_or(ConfigError::Missing("JWT_SECRET"))?
            .to_string();

        Ok(Self {
            database_url: get("DATABASE_URL")
                .unwrap_or("sqlite://travelog.db?mode=rwc")
                .to_string(),
            jwt_secret,
            token_ttl_hours: parse_in(
                get("TOKEN_TTL_HOURS"),
                "TOKEN_TTL_HOURS",
                24,
                TOKEN_TTL_RANGE,
            )?,
            bind_addr: parse(
                get("BIND_ADDR"),
                "BIND_ADDR",
                SocketAddr::from(([0, 0, 0, 0], 5050)),
            )?,
            public_base_url: get("PUBLIC_BASE_URL")
                .unwrap_or("http://localhost:5050")
                .trim_end_matches('/')
                .to_string(),
            allowed_origin: get("ALLOWED_ORIGIN")
                .unwrap_or("http://localhost:5173")
                .to_string(),
            upload_dir: PathBuf::from(get("UPLOAD_DIR").unwrap_or("uploads")),
            max_upload_bytes: parse(get("MAX_UPLOAD_BYTES"), "MAX_UPLOAD_BYTES", 16 * 1024 * 1024)?,
            sweep_uploads_on_start: parse_bool(
                get("SWEEP_UPLOADS_ON_START"),
                "SWEEP_UPLOADS_ON_START",
                true,
            )?,
            log_level: get("LOG_LEVEL").unwrap_or("info").to_string(),
            log_json: parse_bool(get("LOG_JSON"), "LOG_JSON", false)?,
        })
    }
}

fn parse<T: std::str::FromStr>(
    raw: Option<&str>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}

fn parse_in<T>(
    raw: Option<&str>,
    key: &'static str,
    default: T,
    range: RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd,
{
    let value = parse(raw, key, default)?;
    if !range.contains(&value) {
        return Err(ConfigError::Invalid {
            key,
            value: raw.unwrap_or_default().to_string(),
        });
    }
    Ok(value)
}

fn parse_bool(raw: Option<&str>, key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(ConfigError::Invalid {
            key,
            value: other.to_string(),
        }),
    }
}
