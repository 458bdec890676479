//! Latency prober for JSON-RPC nodes.
//!
//! Endpoints reachable over HTTP(S) or WebSocket are probed with a read-only
//! JSON-RPC call, either once in parallel ([`batch`]) or repeatedly with a
//! random pause between passes ([`periodic`]). The resulting records can be
//! reduced to per-endpoint percentiles with [`stats`].

pub mod batch;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http_probe;
pub mod payload;
pub mod periodic;
pub mod probe;
pub mod report;
pub mod stats;
pub mod ws_probe;

pub use endpoint::{EndpointAddress, Scheme, TransportKind};
pub use error::{EntryError, ProbeErrorKind, ProbeFailure};
pub use probe::{ProbeOutcome, Prober, ResultRecord, RoundTrip};
