use crate::error::{AppError, Result};
use std::{env, str::FromStr, time::Duration};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub storage: StorageConfig,
    pub openai: OpenAiConfig,
    pub sessions: SessionConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub assets_url: String,
    pub region: String,
    /// Alternative S3-compatible endpoint (MinIO, LocalStack); path-style
    /// addressing is used when set.
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub ttl: Duration,
    pub max_sessions: usize,
    pub sweep_interval: Duration,
}

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_or("PORT", 3000)?,
                max_body_size: parse_or("MAX_BODY_SIZE", 25 * 1024 * 1024)?,
            },
            database: DatabaseConfig {
                url: env::var("DB_URL")?,
                max_connections: parse_or("DB_MAX_CONNECTIONS", 20)?,
                acquire_timeout: Duration::from_secs(parse_or("DB_ACQUIRE_TIMEOUT_SECS", 5)?),
            },
            cors: CorsConfig {
                allowed_origins: env::var("FRONTEND_URL")?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
            },
            storage: StorageConfig {
                bucket: env::var("S3_BUCKET")
                    .map_err(|_| AppError::ConfigError("S3_BUCKET not set".to_string()))?,
                assets_url: env::var("ASSETS_URL")
                    .map_err(|_| AppError::ConfigError("ASSETS_URL not set".to_string()))?
                    .trim_end_matches('/')
                    .to_string(),
                region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                endpoint: env::var("S3_ENDPOINT").ok().filter(|e| !e.is_empty()),
            },
            openai: OpenAiConfig {
                api_key: env::var("OPENAI_API_KEY")
                    .map_err(|_| AppError::ConfigError("OPENAI_API_KEY not set".to_string()))?,
                base_url: env::var("OPENAI_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string()),
                model: env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string()),
            },
            sessions: SessionConfig {
                ttl: Duration::from_secs(parse_or("FORM_SESSION_TTL_SECS", 1800)?),
                max_sessions: parse_or("FORM_SESSION_MAX", 10_000)?,
                sweep_interval: Duration::from_secs(parse_or("FORM_SESSION_SWEEP_SECS", 60)?),
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::ConfigError(format!("Invalid {} value", key))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_falls_back_and_rejects_garbage() {
        assert_eq!(parse_or("PRODUCT_ADMIN_TEST_UNSET_KEY", 42u32).unwrap(), 42);

        // SAFETY: the key is unique to this test.
        unsafe { env::set_var("PRODUCT_ADMIN_TEST_BAD_KEY", "ten") };
        let err = parse_or::<u32>("PRODUCT_ADMIN_TEST_BAD_KEY", 1).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(ref msg) if msg.contains("PRODUCT_ADMIN_TEST_BAD_KEY")));

        unsafe { env::set_var("PRODUCT_ADMIN_TEST_GOOD_KEY", " 7 ") };
        assert_eq!(parse_or::<u64>("PRODUCT_ADMIN_TEST_GOOD_KEY", 1).unwrap(), 7);
    }
}
