// src/checker/probe.rs
// =============================================================================
// This module decides whether a single URL is alive.
//
// Key functionality:
// - Sends an HTTP HEAD request first (no body, cheapest possible check)
// - Falls back to GET when HEAD is rejected or the connection drops, since
//   plenty of servers answer HEAD with 405/404 or not at all
// - Never reads a response body: the status code is all we need
// - Folds every network failure (DNS, TLS, refused, timeout) into status -1
//
// A URL is alive only if the last answer was exactly "200 OK". A 204 or a
// 301 that was not followed does not count.
//
// Rust concepts:
// - Traits: Prober lets the dispatcher run against fake probers in tests
// - impl Future in traits: async methods that can be sent across threads
// =============================================================================

use crate::config::{FallbackPolicy, ProbeConfig};
use reqwest::{Client, StatusCode};
use std::future::Future;
use tracing::debug;

// Status code reported when no request got a response
const UNREACHABLE_STATUS: i32 = -1;

/// What one probe found out about one URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub alive: bool,
    /// Final HTTP status, or -1 when nothing answered
    pub status_code: i32,
}

impl ProbeOutcome {
    pub const UNREACHABLE: ProbeOutcome = ProbeOutcome {
        alive: false,
        status_code: UNREACHABLE_STATUS,
    };

    // The liveness rule lives here and nowhere else
    pub fn from_status(status: StatusCode) -> Self {
        Self {
            alive: status == StatusCode::OK,
            status_code: i32::from(status.as_u16()),
        }
    }
}

// Anything that can check a URL
//
// The dispatcher shares one prober between all of its workers, hence the
// Send + Sync + 'static bounds.
pub trait Prober: Send + Sync + 'static {
    fn probe(&self, url: &str) -> impl Future<Output = ProbeOutcome> + Send;
}

// Builds the HTTP client shared by every probe
//
// Build it once: reqwest::Client keeps a connection pool internally and is
// cheap to clone (it's an Arc inside).
pub fn build_client(config: &ProbeConfig) -> reqwest::Result<Client> {
    let mut builder = Client::builder()
        .user_agent(concat!("link-reaper/", env!("CARGO_PKG_VERSION")))
        .timeout(config.timeout);

    if !config.keep_alive {
        // No idle connections are kept, so a huge scan does not pile up
        // sockets to hosts it will never talk to again
        builder = builder.pool_max_idle_per_host(0);
    }

    builder.build()
}

/// The real prober: HEAD, then GET when needed
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
    fallback: FallbackPolicy,
}

impl HttpProber {
    pub fn new(client: Client, fallback: FallbackPolicy) -> Self {
        Self { client, fallback }
    }
}

impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        // Step 1: HEAD
        let head_status = match self.client.head(url).send().await {
            Ok(response) => {
                let status = response.status();
                // Dropping the response hands the connection back (or closes it)
                drop(response);

                if status == StatusCode::OK || self.fallback == FallbackPolicy::TransportOnly {
                    return ProbeOutcome::from_status(status);
                }
                debug!(url, status = status.as_u16(), "HEAD not OK, retrying with GET");
                Some(status)
            }
            Err(e) => {
                debug!(url, failure = describe_failure(&e), "HEAD failed, retrying with GET");
                None
            }
        };

        // Step 2: GET, only for its status line; the body is never read
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                drop(response);
                ProbeOutcome::from_status(status)
            }
            Err(e) => {
                debug!(url, failure = describe_failure(&e), "GET failed");
                // A HEAD answer is still better than nothing
                head_status.map_or(ProbeOutcome::UNREACHABLE, ProbeOutcome::from_status)
            }
        }
    }
}

// Names the kind of transport failure, for the debug log only.
// Callers never see the difference.
fn describe_failure(error: &reqwest::Error) -> &'static str {
    let error_string = error.to_string().to_lowercase();

    if error.is_timeout() {
        "timeout"
    } else if error.is_redirect() {
        "too many redirects"
    } else if error.is_connect() {
        if error_string.contains("dns") {
            "dns"
        } else {
            "connect"
        }
    } else if error_string.contains("certificate") || error_string.contains("ssl") {
        "tls"
    } else if error.is_builder() {
        "invalid request"
    } else {
        "other"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn prober(timeout: Duration, fallback: FallbackPolicy) -> HttpProber {
        let config = ProbeConfig {
            timeout,
            keep_alive: false,
            fallback,
        };
        HttpProber::new(build_client(&config).unwrap(), fallback)
    }

    fn default_prober() -> HttpProber {
        prober(Duration::from_secs(10), FallbackPolicy::NonOk)
    }

    async fn mount(server: &MockServer, verb: &str, status: u16, times: u64) {
        Mock::given(method(verb))
            .respond_with(ResponseTemplate::new(status))
            .expect(times)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_head_ok_skips_get() {
        let server = MockServer::start().await;
        mount(&server, "HEAD", 200, 1).await;
        mount(&server, "GET", 200, 0).await;

        let outcome = default_prober().probe(&server.uri()).await;
        assert_eq!(outcome, ProbeOutcome { alive: true, status_code: 200 });
    }

    #[tokio::test]
    async fn test_head_rejected_falls_back_to_get() {
        let server = MockServer::start().await;
        mount(&server, "HEAD", 405, 1).await;
        mount(&server, "GET", 200, 1).await;

        // status == 200 is applied to whichever method answered last
        let outcome = default_prober().probe(&server.uri()).await;
        assert_eq!(outcome, ProbeOutcome { alive: true, status_code: 200 });
    }

    #[tokio::test]
    async fn test_get_status_wins_after_fallback() {
        let server = MockServer::start().await;
        mount(&server, "HEAD", 500, 1).await;
        mount(&server, "GET", 404, 1).await;

        let outcome = default_prober().probe(&server.uri()).await;
        assert_eq!(outcome, ProbeOutcome { alive: false, status_code: 404 });
    }

    #[tokio::test]
    async fn test_non_200_success_is_not_alive() {
        let server = MockServer::start().await;
        mount(&server, "HEAD", 204, 1).await;
        mount(&server, "GET", 204, 1).await;

        let outcome = default_prober().probe(&server.uri()).await;
        assert_eq!(outcome, ProbeOutcome { alive: false, status_code: 204 });
    }

    #[tokio::test]
    async fn test_transport_only_policy_trusts_head_answer() {
        let server = MockServer::start().await;
        mount(&server, "HEAD", 404, 1).await;
        mount(&server, "GET", 200, 0).await;

        let outcome = prober(Duration::from_secs(10), FallbackPolicy::TransportOnly)
            .probe(&server.uri())
            .await;
        assert_eq!(outcome, ProbeOutcome { alive: false, status_code: 404 });
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        // Grab a free port, then close it so nothing is listening there
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let outcome = default_prober().probe(&format!("http://{}/", addr)).await;
        assert_eq!(outcome, ProbeOutcome::UNREACHABLE);
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        // Accepts connections and never answers
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let timeout = Duration::from_secs(1);
        let started = Instant::now();
        let outcome = prober(timeout, FallbackPolicy::NonOk)
            .probe(&format!("http://{}/", addr))
            .await;
        let elapsed = started.elapsed();

        assert_eq!(outcome, ProbeOutcome::UNREACHABLE);
        // HEAD and GET each wait for the timeout, nothing more
        assert!(elapsed >= timeout, "returned too early: {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(5), "probe hung: {:?}", elapsed);
    }

    // Bare HTTP/1.1 server: requests whose method is `hang_up_on` get their
    // connection closed without a response, every other method gets `status`
    async fn picky_server(hang_up_on: &'static str, status: u16) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&chunk[..n]),
                        }
                    }

                    if request.starts_with(hang_up_on.as_bytes()) {
                        return;
                    }

                    let response = format!(
                        "HTTP/1.1 {} Whatever\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                        status
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_head_hang_up_then_get_ok_is_alive() {
        let url = picky_server("HEAD", 200).await;

        let outcome = default_prober().probe(&url).await;
        assert_eq!(outcome, ProbeOutcome { alive: true, status_code: 200 });
    }

    #[tokio::test]
    async fn test_head_status_kept_when_get_hangs_up() {
        let url = picky_server("GET", 404).await;

        let outcome = default_prober().probe(&url).await;
        assert_eq!(outcome, ProbeOutcome { alive: false, status_code: 404 });
    }

    #[test]
    fn test_only_exact_200_is_alive() {
        assert!(ProbeOutcome::from_status(StatusCode::OK).alive);
        assert!(!ProbeOutcome::from_status(StatusCode::CREATED).alive);
        assert!(!ProbeOutcome::from_status(StatusCode::MOVED_PERMANENTLY).alive);
        assert_eq!(ProbeOutcome::from_status(StatusCode::NOT_FOUND).status_code, 404);
    }
}
