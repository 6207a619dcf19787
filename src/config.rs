use std::env;
use std::path::PathBuf;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub store_path: PathBuf,
    pub store_in_memory: bool,
    pub seed_demo_data: bool,
    pub reminder_lead_minutes: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let reminder_lead_minutes = parse_or_default("REMINDER_LEAD_MINUTES", 30)?;
        if reminder_lead_minutes < 0 {
            return Err(AppError::Internal(
                "invalid REMINDER_LEAD_MINUTES: must be >= 0".to_string(),
            ));
        }

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            store_path: env::var("STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("dispatch-store.json")),
            store_in_memory: parse_or_default("STORE_IN_MEMORY", false)?,
            seed_demo_data: parse_or_default("SEED_DEMO_DATA", true)?,
            reminder_lead_minutes,
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
