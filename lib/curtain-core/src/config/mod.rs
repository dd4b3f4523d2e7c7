mod config;
mod config_serializer;

pub use config::{Config, ConfigError, DEFAULT_RESIZE_DEBOUNCE_MS};
pub use config_serializer::serialize_config;
