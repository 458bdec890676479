use std::fmt;

use serde::{Deserialize, Serialize};

/// URL schemes a probe can be dispatched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Https,
    Http,
    Wss,
    Ws,
}

/// The two transports a probe can run over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// One-shot HTTP POST of the probe payload.
    RequestResponse,
    /// WebSocket connection carrying the probe payload as a single message.
    PersistentConnection,
}

impl Scheme {
    const PREFIXES: [(&'static str, Scheme); 4] = [
        ("https://", Scheme::Https),
        ("http://", Scheme::Http),
        ("wss://", Scheme::Wss),
        ("ws://", Scheme::Ws),
    ];

    /// Classifies an address by its scheme prefix. Matching is case sensitive.
    pub fn from_address(address: &str) -> Option<Self> {
        Self::PREFIXES
            .iter()
            .find(|(prefix, _)| address.starts_with(prefix))
            .map(|(_, scheme)| *scheme)
    }

    pub fn transport(self) -> TransportKind {
        match self {
            Scheme::Https | Scheme::Http => TransportKind::RequestResponse,
            Scheme::Wss | Scheme::Ws => TransportKind::PersistentConnection,
        }
    }

    pub fn is_secure(self) -> bool {
        matches!(self, Scheme::Https | Scheme::Wss)
    }
}

/// An endpoint address exactly as the caller supplied it.
///
/// The string is kept verbatim so that results can be matched back to the
/// caller's input, even when the address turns out to be unusable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointAddress(String);

impl EndpointAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn scheme(&self) -> Option<Scheme> {
        Scheme::from_address(&self.0)
    }

    /// `None` when the address does not start with a recognised scheme.
    pub fn transport(&self) -> Option<TransportKind> {
        self.scheme().map(Scheme::transport)
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EndpointAddress {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EndpointAddress {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_all_recognised_schemes() {
        let cases = [
            ("https://rpc.example.org", Scheme::Https, TransportKind::RequestResponse),
            ("http://127.0.0.1:9933", Scheme::Http, TransportKind::RequestResponse),
            ("wss://kusama-rpc.example.org/ws", Scheme::Wss, TransportKind::PersistentConnection),
            ("ws://localhost:9944", Scheme::Ws, TransportKind::PersistentConnection),
        ];

        for (address, scheme, transport) in cases {
            let address = EndpointAddress::from(address);
            assert_eq!(address.scheme(), Some(scheme), "{address}");
            assert_eq!(address.transport(), Some(transport), "{address}");
        }
    }

    #[test]
    fn test_rejects_unknown_schemes() {
        for address in ["ftp://x", "rpc.example.org", "", "HTTPS://upper.case", "https:/missing-slash"] {
            assert_eq!(EndpointAddress::from(address).transport(), None, "{address:?}");
        }
    }

    #[test]
    fn test_secure_schemes() {
        assert!(Scheme::Https.is_secure());
        assert!(Scheme::Wss.is_secure());
        assert!(!Scheme::Http.is_secure());
        assert!(!Scheme::Ws.is_secure());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let address = EndpointAddress::from("wss://node.example/ws");
        let json = serde_json::to_string(&address).expect("serialize");
        assert_eq!(json, "\"wss://node.example/ws\"");
    }
}
