mod config;
mod error;
mod field_map;
mod manifest;

pub const CONFIG_FILE_NAME: &str = "Atomic.toml";
pub const DEFAULT_LOG_DIR: &str = ".atomic/logs";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

pub use config::{
    AtomicConfig, Settings, discover_config, find_config_file, load_config, parse_config,
};
pub use error::ConfigError;
pub use field_map::FieldMapTransform;

pub type Result<T> = std::result::Result<T, ConfigError>;
