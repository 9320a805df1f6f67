use std::env;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub admin_token: Option<String>,
    pub cors_allow_any: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") | Err(_) => LogFormat::Compact,
            Ok(other) => {
                return Err(AppError::Internal(format!(
                    "invalid LOG_FORMAT: {other}, expected compact or json"
                )));
            }
        };

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format,
            admin_token: env::var("ADMIN_TOKEN").ok().filter(|token| !token.is_empty()),
            cors_allow_any: parse_or_default("CORS_ALLOW_ANY", false)?,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
