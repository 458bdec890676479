use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

use crate::endpoint::EndpointAddress;

const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_CONCURRENCY: usize = 10;
const DEFAULT_MAX_JITTER_MS: u64 = 5_000;

/// Knobs shared by the adapters and both schedulers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProbeSettings {
    /// Budget for one probe, handshake included.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Worker pool size of a batch run.
    #[serde(default = "default_concurrency")]
    pub concurrency: NonZeroUsize,

    /// Upper bound of the random delay between two periodic passes.
    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,

    /// Accept self-signed or otherwise invalid certificates.
    #[serde(default)]
    pub insecure_tls: bool,
}

impl ProbeSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn max_jitter(&self) -> Duration {
        Duration::from_millis(self.max_jitter_ms)
    }
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            concurrency: default_concurrency(),
            max_jitter_ms: default_max_jitter_ms(),
            insecure_tls: false,
        }
    }
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_concurrency() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_CONCURRENCY).unwrap_or(NonZeroUsize::MIN)
}

fn default_max_jitter_ms() -> u64 {
    DEFAULT_MAX_JITTER_MS
}

/// A named set of endpoints, e.g. the public RPC nodes of one chain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NetworkConfig {
    pub endpoints: Vec<EndpointAddress>,
}

/// Contents of the YAML configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub probe: ProbeSettings,

    #[serde(default)]
    pub networks: BTreeMap<String, NetworkConfig>,
}
