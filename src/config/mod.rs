mod app_config;
mod s3_config;

pub use app_config::{
    AppConfig, CorsConfig, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL, DatabaseConfig,
    OpenAiConfig, ServerConfig, SessionConfig, StorageConfig,
};
pub use s3_config::*;
