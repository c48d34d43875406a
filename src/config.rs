use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_LLM_MODEL: &str = "gemini-2.5-pro";
const DEFAULT_LLM_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const DEFAULT_LLM_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub llm: LlmSettings,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub api_endpoint: String,
    pub timeout: Duration,
    pub mock: bool,
}

impl LlmSettings {
    pub fn from_env() -> Self {
        Self {
            api_key: env_string("LLM_API_KEY").or_else(|| env_string("GEMINI_API_KEY")),
            model: env_string("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            api_endpoint: env_string("LLM_API_ENDPOINT")
                .or_else(|| env_string("LLM_BASE_URL"))
                .unwrap_or_else(|| DEFAULT_LLM_ENDPOINT.to_string()),
            timeout: Duration::from_millis(
                env_string("LLM_TIMEOUT")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_LLM_TIMEOUT_MS),
            ),
            mock: env_bool("LLM_MOCK").unwrap_or(false),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|v| !v.trim().is_empty())
    }
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            host,
            port,
            log_level,
            database_url: env_string("DATABASE_URL"),
            llm: LlmSettings::from_env(),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Directory holding the client progress blob.
pub fn progress_dir() -> PathBuf {
    env_string("PROGRESS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("daily-word")
        })
}

pub(crate) fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    let value = env_string(key)?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
