use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::Value;

use super::report;
use crate::config::ProbeSettings;
use crate::error::{ProbeErrorKind, ProbeFailure, SetupError};
use crate::payload::{self, ProbeRequest};
use crate::probe::{RoundTrip, elapsed_ms};

const USER_AGENT: &str = concat!("rpcprobe/", env!("CARGO_PKG_VERSION"));

/// Measures one JSON-RPC POST round trip against an `http(s)://` endpoint.
pub struct HttpProbe {
    client: Client,
    request: ProbeRequest,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(settings: &ProbeSettings, request: ProbeRequest) -> Result<Self, SetupError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(settings.insecure_tls)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            request,
            timeout: settings.timeout(),
        })
    }

    /// Elapsed milliseconds from dispatch until the body has been received
    /// and decoded into non-empty JSON.
    pub async fn measure(&self, url: &str) -> Result<f64, ProbeFailure> {
        let start = Instant::now();
        match tokio::time::timeout(self.timeout, self.exchange(url, start)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeFailure::timeout("Request", self.timeout)),
        }
    }

    async fn exchange(&self, url: &str, start: Instant) -> Result<f64, ProbeFailure> {
        let response = self
            .client
            .post(url)
            .json(&self.request)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeFailure::new(
                ProbeErrorKind::HttpStatusError,
                format!("HTTP error! Status: {}", status.as_u16()),
            ));
        }

        let body = response.bytes().await.map_err(classify)?;
        let decoded: Value = serde_json::from_slice(&body).map_err(|e| {
            ProbeFailure::new(
                ProbeErrorKind::EmptyResponseError,
                format!("Unreadable response body ({} bytes): {e}", body.len()),
            )
        })?;
        if !payload::has_data(&decoded) {
            return Err(ProbeFailure::new(
                ProbeErrorKind::EmptyResponseError,
                "No data returned from the node.",
            ));
        }

        Ok(elapsed_ms(start))
    }
}

impl RoundTrip for HttpProbe {
    async fn round_trip(&self, url: &str) -> Result<f64, ProbeFailure> {
        let result = self.measure(url).await;
        if let Err(failure) = &result {
            log::debug!("HTTP probe of {url} failed: {failure}");
        }
        result
    }
}

fn classify(err: reqwest::Error) -> ProbeFailure {
    let kind = if err.is_timeout() {
        ProbeErrorKind::TimeoutError
    } else {
        ProbeErrorKind::TransportError
    };
    ProbeFailure::new(kind, report(&err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::oneshot;

    fn probe_with_timeout(timeout_ms: u64) -> HttpProbe {
        let settings = ProbeSettings {
            timeout_ms,
            ..Default::default()
        };
        HttpProbe::new(&settings, ProbeRequest::default()).expect("client")
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = socket.read(&mut buf).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);
            if let Some(end) = data.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&data[..end]).to_ascii_lowercase();
                let content_length = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if data.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).into_owned()
    }

    /// Serves a single canned response and hands back the request it received.
    async fn serve_once(response: String, delay: Duration) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let request = read_request(&mut socket).await;
            let _ = tx.send(request);
            tokio::time::sleep(delay).await;
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        (format!("http://{addr}"), rx)
    }

    #[tokio::test]
    async fn test_successful_round_trip_posts_json_rpc() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":{"block":{}}}"#;
        let (url, request) = serve_once(http_response("200 OK", body), Duration::ZERO).await;

        let elapsed = probe_with_timeout(5_000).measure(&url).await.expect("probe should succeed");
        assert!(elapsed >= 0.0);

        let request = request.await.expect("request captured");
        assert!(request.starts_with("POST / HTTP/1.1"), "{request}");
        assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(request.contains(r#""method":"chain_getBlock""#));
        assert!(request.contains(r#""jsonrpc":"2.0""#));
    }

    #[tokio::test]
    async fn test_elapsed_time_includes_server_delay() {
        let (url, _) = serve_once(http_response("200 OK", r#"{"result":1}"#), Duration::from_millis(120)).await;
        let elapsed = probe_with_timeout(5_000).measure(&url).await.expect("probe should succeed");
        assert!(elapsed >= 120.0, "elapsed {elapsed}");
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let (url, _) = serve_once(http_response("503 Service Unavailable", r#"{"error":"down"}"#), Duration::ZERO).await;
        let failure = probe_with_timeout(5_000).measure(&url).await.expect_err("must fail");
        assert_eq!(failure.kind, ProbeErrorKind::HttpStatusError);
        assert_eq!(failure.message, "HTTP error! Status: 503");
    }

    #[tokio::test]
    async fn test_empty_body() {
        let (url, _) = serve_once(http_response("200 OK", ""), Duration::ZERO).await;
        let failure = probe_with_timeout(5_000).measure(&url).await.expect_err("must fail");
        assert_eq!(failure.kind, ProbeErrorKind::EmptyResponseError);
    }

    #[tokio::test]
    async fn test_empty_json_object() {
        let (url, _) = serve_once(http_response("200 OK", "{}"), Duration::ZERO).await;
        let failure = probe_with_timeout(5_000).measure(&url).await.expect_err("must fail");
        assert_eq!(failure.kind, ProbeErrorKind::EmptyResponseError);
        assert_eq!(failure.message, "No data returned from the node.");
    }

    #[tokio::test]
    async fn test_bare_scalar_body() {
        for body in ["42", "true"] {
            let (url, _) = serve_once(http_response("200 OK", body), Duration::ZERO).await;
            let failure = probe_with_timeout(5_000).measure(&url).await.expect_err("must fail");
            assert_eq!(failure.kind, ProbeErrorKind::EmptyResponseError, "{body}");
        }
    }

    #[tokio::test]
    async fn test_unparseable_body() {
        let (url, _) = serve_once(http_response("200 OK", "<html>oops</html>"), Duration::ZERO).await;
        let failure = probe_with_timeout(5_000).measure(&url).await.expect_err("must fail");
        assert_eq!(failure.kind, ProbeErrorKind::EmptyResponseError);
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let (url, _) = serve_once(http_response("200 OK", r#"{"result":1}"#), Duration::from_secs(5)).await;
        let started = Instant::now();
        let failure = probe_with_timeout(200).measure(&url).await.expect_err("must time out");
        assert_eq!(failure.kind, ProbeErrorKind::TimeoutError);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let failure = probe_with_timeout(2_000)
            .measure(&format!("http://{addr}"))
            .await
            .expect_err("must fail");
        assert_eq!(failure.kind, ProbeErrorKind::TransportError);
        assert!(!failure.message.is_empty());
    }
}
