use std::env;
use std::path::PathBuf;

use thiserror::Error;

use super::model::{Config, ProbeSettings};
use crate::endpoint::EndpointAddress;

/// How the binary drives the prober.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One parallel pass, printed as a JSON batch response.
    Batch,
    /// Repeated sequential passes with jitter until stopped.
    Periodic,
}

impl RunMode {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "batch" => Ok(RunMode::Batch),
            "periodic" => Ok(RunMode::Periodic),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("No networks configured")]
    NoNetworks,

    #[error("Unknown network '{name}', configured: {known:?}")]
    UnknownNetwork { name: String, known: Vec<String> },

    #[error("Invalid PROBE_MODE '{0}', expected 'batch' or 'periodic'")]
    InvalidMode(String),

    #[error("Invalid PROBE_PASSES '{0}', expected a positive integer")]
    InvalidPasses(String),
}

pub struct AppConfig {
    pub settings: ProbeSettings,
    pub network: String,
    pub endpoints: Vec<EndpointAddress>,
    pub mode: RunMode,
    /// Periodic mode only: stop after this many passes.
    pub passes: Option<u32>,
}

/// Overrides read from the environment, kept separate so they can be tested
/// without touching the process environment.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    pub network: Option<String>,
    pub mode: Option<String>,
    pub passes: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            network: env::var("PROBE_NETWORK").ok(),
            mode: env::var("PROBE_MODE").ok(),
            passes: env::var("PROBE_PASSES").ok(),
        }
    }
}

/// Load the application configuration from a YAML file and environment variables.
/// The file is named by `CONFIG_FILE` (default `config.yml`); `PROBE_NETWORK`,
/// `PROBE_MODE` and `PROBE_PASSES` select what to probe and how.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let config_file_location =
        PathBuf::from(env::var("CONFIG_FILE").unwrap_or_else(|_| "config.yml".to_string()));
    let config_str =
        std::fs::read_to_string(&config_file_location).map_err(|source| ConfigError::Read {
            path: config_file_location.clone(),
            source,
        })?;

    let config: Config = serde_yaml::from_str(&config_str)?;
    log::info!("Loaded configuration from {}", config_file_location.display());

    AppConfig::from_parts(config, EnvOverrides::from_env())
}

impl AppConfig {
    pub fn from_parts(config: Config, overrides: EnvOverrides) -> Result<Self, ConfigError> {
        let Config {
            probe: settings,
            mut networks,
        } = config;

        // BTreeMap: the first key is the alphabetically smallest name.
        let network = match overrides.network {
            Some(name) => name,
            None => networks.keys().next().cloned().ok_or(ConfigError::NoNetworks)?,
        };
        let endpoints = match networks.remove(&network) {
            Some(network) => network.endpoints,
            None => {
                return Err(ConfigError::UnknownNetwork {
                    name: network,
                    known: networks.into_keys().collect(),
                });
            }
        };

        let mode = overrides
            .mode
            .as_deref()
            .map(RunMode::parse)
            .transpose()?
            .unwrap_or(RunMode::Periodic);

        let passes = match overrides.passes {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => Some(n),
                _ => return Err(ConfigError::InvalidPasses(raw)),
            },
            None => None,
        };

        log::info!(
            "Probing network '{}' ({} endpoints) in {:?} mode",
            network,
            endpoints.len(),
            mode
        );

        Ok(AppConfig {
            settings,
            network,
            endpoints,
            mode,
            passes,
        })
    }
}

/// Setup the TLS connector used for secure WebSocket probes.
/// Invalid certificates are only accepted when `insecure` is set.
pub fn setup_tls_connector(insecure: bool) -> Result<native_tls::TlsConnector, native_tls::Error> {
    let mut builder = native_tls::TlsConnector::builder();
    builder.danger_accept_invalid_certs(insecure);
    builder.build()
}
