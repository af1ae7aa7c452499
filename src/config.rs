use crate::error::{AppError, Result};

pub const DATA_FILE: &str = "summaries.json";

/// Session identifiers are caller-chosen strings; cap their length so a
/// misbehaving client cannot grow map keys without bound.
pub const MAX_SESSION_ID_LEN: usize = 128;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    /// Path of the finished-summaries document (DATA_FILE)
    pub data_file: String,
    pub api_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            data_file: std::env::var("DATA_FILE").unwrap_or_else(|_| DATA_FILE.to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "5003".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
        })
    }
}
