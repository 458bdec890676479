pub mod app_config;
pub mod model;

pub use app_config::{AppConfig, ConfigError, EnvOverrides, RunMode, load_config, setup_tls_connector};
pub use model::{Config, NetworkConfig, ProbeSettings};
