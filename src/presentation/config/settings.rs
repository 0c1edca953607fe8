use super::Environment;

#[derive(Debug, Clone)]
pub struct Settings {
    pub environment: Environment,
    pub server: ServerSettings,
    pub engine: EngineSettings,
    pub llm: LlmSettings,
    pub images: ImageSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Retention and sweep cadence for finished runs. A finished run stays
/// pollable for the retention window, then the sweeper drops it.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub retention_secs: u64,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct ImageSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub json_format: bool,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            environment: std::env::var("APP_ENV")
                .ok()
                .and_then(|v| Environment::try_from(v).ok())
                .unwrap_or(Environment::Local),
            server: ServerSettings {
                host: env_or("SERVER_HOST", "0.0.0.0"),
                port: env_parsed("SERVER_PORT", 8000),
            },
            engine: EngineSettings {
                retention_secs: env_parsed("PIPELINE_RETENTION_SECS", 3600),
                sweep_interval_secs: env_parsed("PIPELINE_SWEEP_INTERVAL_SECS", 60),
            },
            llm: LlmSettings {
                base_url: env_or("LLM_BASE_URL", "https://api.openai.com/v1"),
                api_key: env_or("LLM_API_KEY", ""),
                model: env_or("LLM_MODEL", "gpt-4o-mini"),
            },
            images: ImageSettings {
                base_url: env_or("IMAGE_BASE_URL", "https://api.openai.com/v1"),
                api_key: env_or("IMAGE_API_KEY", ""),
                model: env_or("IMAGE_MODEL", "flux_2_pro"),
            },
            logging: LoggingSettings {
                json_format: std::env::var("LOG_FORMAT")
                    .map(|v| v.to_lowercase() == "json")
                    .unwrap_or(false),
            },
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
