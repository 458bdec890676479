use super::RoundTrip;
use super::result::{ProbeOutcome, ResultRecord};
use crate::config::ProbeSettings;
use crate::endpoint::{EndpointAddress, TransportKind};
use crate::error::{ProbeFailure, SetupError};
use crate::http_probe::HttpProbe;
use crate::payload::ProbeRequest;
use crate::ws_probe::WsProbe;

/// Dispatches an address to the adapter for its transport and turns whatever
/// happens into a [`ResultRecord`].
pub struct Prober<H = HttpProbe, W = WsProbe> {
    http: H,
    ws: W,
}

impl Prober {
    pub fn from_settings(settings: &ProbeSettings) -> Result<Self, SetupError> {
        let request = ProbeRequest::default();
        Ok(Self::new(
            HttpProbe::new(settings, request.clone())?,
            WsProbe::new(settings, request)?,
        ))
    }
}

impl<H: RoundTrip, W: RoundTrip> Prober<H, W> {
    pub fn new(http: H, ws: W) -> Self {
        Self { http, ws }
    }

    /// Probes one address. Never fails: an unusable address or a failed round
    /// trip ends up in the record's outcome. Addresses with an unknown scheme
    /// are rejected without touching the network.
    pub async fn probe(&self, address: &EndpointAddress) -> ResultRecord {
        let outcome: ProbeOutcome = match address.transport() {
            None => ProbeOutcome::Failure(ProbeFailure::invalid_address()),
            Some(TransportKind::RequestResponse) => self.http.round_trip(address.as_str()).await.into(),
            Some(TransportKind::PersistentConnection) => self.ws.round_trip(address.as_str()).await.into(),
        };
        ResultRecord::new(address.clone(), outcome)
    }
}
