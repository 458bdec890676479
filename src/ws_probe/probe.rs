use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::{Instant, timeout_at};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{Connector, WebSocketStream, connect_async_tls_with_config};
use url::Url;

use crate::config::{ProbeSettings, setup_tls_connector};
use crate::error::{ProbeErrorKind, ProbeFailure, SetupError};
use crate::http_probe::report;
use crate::payload::ProbeRequest;
use crate::probe::{RoundTrip, elapsed_ms};

/// Upper bound for the close handshake once the probe itself is over.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Measures a JSON-RPC request/response exchange over a fresh WebSocket
/// connection to a `ws(s)://` endpoint.
pub struct WsProbe {
    connector: native_tls::TlsConnector,
    request: ProbeRequest,
    message: String,
    timeout: Duration,
}

impl WsProbe {
    pub fn new(settings: &ProbeSettings, request: ProbeRequest) -> Result<Self, SetupError> {
        let connector = setup_tls_connector(settings.insecure_tls)?;
        let message = request.encode()?;
        Ok(Self {
            connector,
            request,
            message,
            timeout: settings.timeout(),
        })
    }

    /// Elapsed milliseconds from sending the request until the response with
    /// the matching id arrives. The timeout budget starts at the connection
    /// attempt, so a slow handshake eats into it.
    pub async fn measure(&self, url: &str) -> Result<f64, ProbeFailure> {
        let deadline = Instant::now() + self.timeout;

        let url = Url::parse(url).map_err(|e| {
            ProbeFailure::new(ProbeErrorKind::HandshakeError, format!("Invalid WebSocket URL: {e}"))
        })?;

        let connect = connect_async_tls_with_config(
            url.as_str(),
            None,
            true,
            Some(Connector::NativeTls(self.connector.clone())),
        );
        let mut stream = match timeout_at(deadline, connect).await {
            Ok(Ok((stream, _response))) => stream,
            Ok(Err(e)) => {
                return Err(ProbeFailure::new(
                    ProbeErrorKind::HandshakeError,
                    format!("WebSocket handshake failed: {}", report(&e)),
                ));
            }
            Err(_) => return Err(ProbeFailure::timeout("WebSocket connection", self.timeout)),
        };

        let result = match timeout_at(deadline, self.exchange(&mut stream)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeFailure::timeout("WebSocket request", self.timeout)),
        };

        // The stream is dropped right after, which closes the socket even if
        // the close frame cannot be delivered in time.
        match tokio::time::timeout(CLOSE_GRACE, stream.close(None)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::debug!("Closing WebSocket to {url} failed: {e}"),
            Err(_) => log::debug!("Closing WebSocket to {url} timed out"),
        }

        result
    }

    async fn exchange<S>(&self, stream: &mut WebSocketStream<S>) -> Result<f64, ProbeFailure>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let sent_at = std::time::Instant::now();
        stream
            .send(Message::Text(self.message.clone()))
            .await
            .map_err(|e| ProbeFailure::transport(format!("WebSocket send failed: {}", report(&e))))?;

        while let Some(message) = stream.next().await {
            let message = message
                .map_err(|e| ProbeFailure::transport(format!("WebSocket error: {}", report(&e))))?;
            match message {
                Message::Text(text) if self.request.is_response(text.as_bytes()) => {
                    return Ok(elapsed_ms(sent_at));
                }
                Message::Binary(data) if self.request.is_response(&data) => {
                    return Ok(elapsed_ms(sent_at));
                }
                Message::Close(frame) => {
                    let reason = frame
                        .map(|f| format!("{} {}", u16::from(f.code), f.reason))
                        .unwrap_or_else(|| "no reason".to_string());
                    return Err(ProbeFailure::transport(format!(
                        "WebSocket closed before a response arrived ({reason})"
                    )));
                }
                // Subscriptions, other ids and non-JSON frames are not ours.
                _ => {}
            }
        }

        Err(ProbeFailure::transport(
            "WebSocket stream ended before a response arrived",
        ))
    }
}

impl RoundTrip for WsProbe {
    async fn round_trip(&self, url: &str) -> Result<f64, ProbeFailure> {
        let result = self.measure(url).await;
        if let Err(failure) = &result {
            log::debug!("WebSocket probe of {url} failed: {failure}");
        }
        result
    }
}
