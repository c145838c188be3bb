//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, AresConfig, LogFormat, LoggingConfig, OpenAiConfig, ProvidersConfig, QdrantConfig,
    ServerConfig,
};
