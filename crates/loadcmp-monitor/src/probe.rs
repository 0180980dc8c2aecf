//! HTTP readiness probing.
//!
//! Any HTTP status (2xx/4xx/5xx) counts as responsive — the probe asks "is
//! something answering on this port", not "is it healthy". Only connection
//! failure or timeout counts as unresponsive.

use http_body_util::Empty;
use hyper::body::Bytes;
use hyper::{Method, Request, Uri};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Outcome of one responsiveness probe. Construction never fails; errors are
/// carried in the result instead of raised to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    pub responsive: bool,
    pub status_code: Option<u16>,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
}

impl ProbeResult {
    fn unresponsive(latency_ms: Option<u64>, error: impl Into<String>) -> Self {
        Self {
            responsive: false,
            status_code: None,
            latency_ms,
            error: Some(error.into()),
        }
    }
}

/// Issue one bounded-timeout GET against `http://localhost:<port><path>`.
pub async fn probe_endpoint(port: u16, path: &str, probe_timeout: Duration) -> ProbeResult {
    let endpoint = format!("http://localhost:{}{}", port, path);
    let start = std::time::Instant::now();

    let uri: Uri = match endpoint.parse() {
        Ok(uri) => uri,
        Err(e) => return ProbeResult::unresponsive(None, format!("invalid URI: {}", e)),
    };

    let client = Client::builder(TokioExecutor::new()).build_http();
    let request = match Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header("User-Agent", "loadcmp/0.1")
        .body(Empty::<Bytes>::new())
    {
        Ok(req) => req,
        Err(e) => return ProbeResult::unresponsive(None, format!("failed to build request: {}", e)),
    };

    match timeout(probe_timeout, client.request(request)).await {
        Ok(Ok(response)) => {
            let elapsed = start.elapsed().as_millis() as u64;
            let status = response.status().as_u16();
            debug!("Probe {} answered {} in {}ms", endpoint, status, elapsed);
            ProbeResult {
                responsive: true,
                status_code: Some(status),
                latency_ms: Some(elapsed),
                error: None,
            }
        }
        Ok(Err(e)) => {
            let elapsed = start.elapsed().as_millis() as u64;
            debug!("Probe {} connection failed: {}", endpoint, e);
            ProbeResult::unresponsive(Some(elapsed), format!("connection failed: {}", e))
        }
        Err(_) => {
            warn!("Probe {} timed out after {:?}", endpoint, probe_timeout);
            ProbeResult::unresponsive(Some(probe_timeout.as_millis() as u64), "timeout")
        }
    }
}

/// Poll the endpoint until responsive or the attempts are exhausted.
/// Returns the last probe result either way.
pub async fn wait_until_ready(
    port: u16,
    path: &str,
    attempts: u32,
    delay: Duration,
    probe_timeout: Duration,
) -> ProbeResult {
    let mut last = ProbeResult::unresponsive(None, "no probe attempted");
    for attempt in 1..=attempts.max(1) {
        last = probe_endpoint(port, path, probe_timeout).await;
        if last.responsive {
            return last;
        }
        debug!(
            "Port {} not ready (attempt {}/{}): {:?}",
            port, attempt, attempts, last.error
        );
        if attempt < attempts {
            sleep(delay).await;
        }
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal single-shot HTTP server answering every request with `status`.
    async fn stub_server(status: u16) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {} X\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    status
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });
        port
    }

    #[tokio::test]
    async fn test_http_500_is_still_responsive() {
        let port = stub_server(500).await;
        let result = probe_endpoint(port, "/", Duration::from_secs(5)).await;
        assert!(result.responsive);
        assert_eq!(result.status_code, Some(500));
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_http_200_is_responsive_with_latency() {
        let port = stub_server(200).await;
        let result = probe_endpoint(port, "/", Duration::from_secs(5)).await;
        assert!(result.responsive);
        assert_eq!(result.status_code, Some(200));
        assert!(result.latency_ms.is_some());
    }

    #[tokio::test]
    async fn test_connection_refused_is_unresponsive() {
        // Bind and drop so the port is known to be free.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let result = probe_endpoint(port, "/", Duration::from_secs(2)).await;
        assert!(!result.responsive);
        assert!(result.status_code.is_none());
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_wait_until_ready_exhausts_attempts() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let result = wait_until_ready(
            port,
            "/",
            3,
            Duration::from_millis(10),
            Duration::from_millis(200),
        )
        .await;
        assert!(!result.responsive);
    }

    #[tokio::test]
    async fn test_wait_until_ready_succeeds() {
        let port = stub_server(200).await;
        let result = wait_until_ready(
            port,
            "/",
            5,
            Duration::from_millis(10),
            Duration::from_secs(2),
        )
        .await;
        assert!(result.responsive);
    }
}
