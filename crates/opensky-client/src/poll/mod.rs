// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Async poll loop for the OpenSky states endpoint.
//!
//! Provides a handle that fetches a snapshot every fetch interval in a
//! background task, retries failed fetches with exponential backoff, supports
//! bounding-box hot reload and shuts down gracefully.

use std::time::Duration;

use log::{info, warn};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::protocol::{BoundingBox, ParseError, Protocol, StatesParser, StatesSnapshot};
use crate::tracker::Fleet;

/// Public OpenSky states endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://opensky-network.org/api/states/all";

/// Errors from a single poll iteration.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status: {0}")]
    Status(reqwest::StatusCode),

    #[error("invalid response: {0}")]
    Parse(#[from] ParseError),
}

/// HTTP basic credentials for an OpenSky account.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Configuration for the poll loop.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// States endpoint URL.
    pub endpoint: String,
    /// Optional query window.
    pub bounding_box: Option<BoundingBox>,
    /// Delay between successful fetches; also the projection horizon.
    pub fetch_interval: Duration,
    /// First retry delay after a failed fetch.
    pub retry_initial_delay: Duration,
    /// Upper bound for the retry delay.
    pub retry_max_delay: Duration,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Optional account credentials.
    pub credentials: Option<Credentials>,
    /// Channel buffer size for events.
    pub buffer_size: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            bounding_box: None,
            fetch_interval: Duration::from_secs(10),
            retry_initial_delay: Duration::from_secs(5),
            retry_max_delay: Duration::from_secs(120),
            request_timeout: Duration::from_secs(15),
            credentials: None,
            buffer_size: 16,
        }
    }
}

/// Poll loop state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    /// A request is in flight.
    Fetching,
    /// Last fetch succeeded; waiting for the next one.
    Idle { aircraft: usize },
    /// Last fetch failed (will retry).
    Error(String),
}

/// Events emitted by the poller.
#[derive(Debug, Clone)]
pub enum PollEvent {
    /// Poll state changed.
    StateChanged(PollState),
    /// A new snapshot replaced the previous one.
    Snapshot(Fleet),
}

/// Exponential retry delay, reset after every success.
#[derive(Debug, Clone)]
pub struct RetryBackoff {
    initial: Duration,
    max: Duration,
    current: Option<Duration>,
}

impl RetryBackoff {
    #[must_use]
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self { initial, max: max.max(initial), current: None }
    }

    /// Delay before the next attempt; doubles on every call up to the maximum.
    pub fn next_delay(&mut self) -> Duration {
        let next = match self.current {
            None => self.initial,
            Some(current) => current.saturating_mul(2).min(self.max),
        };
        self.current = Some(next);
        next
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}

/// Build the HTTP client used by [`Poller::spawn`].
pub fn build_client(config: &PollerConfig) -> Result<reqwest::Client, FetchError> {
    Ok(reqwest::Client::builder()
        .timeout(config.request_timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Fetch and decode one snapshot.
///
/// A `null` states array yields an empty snapshot.
pub async fn fetch_states(
    client: &reqwest::Client,
    endpoint: &str,
    bounding_box: Option<&BoundingBox>,
    credentials: Option<&Credentials>,
) -> Result<StatesSnapshot, FetchError> {
    let mut request = client.get(endpoint);

    if let Some(bbox) = bounding_box {
        request = request.query(&bbox.query_pairs());
    }
    if let Some(creds) = credentials {
        request = request.basic_auth(&creds.username, Some(&creds.password));
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }

    let body = response.bytes().await?;
    let snapshot = StatesParser::new().parse(&body)?.unwrap_or_default();

    Ok(snapshot)
}

/// Handle to a background poll loop.
///
/// The loop runs in a tokio task. Use `recv()`/`try_recv()` to receive events
/// and `set_bounding_box()` to change the query window at runtime.
pub struct Poller {
    event_rx: mpsc::Receiver<PollEvent>,
    bbox_tx: watch::Sender<Option<BoundingBox>>,
    cancel_token: CancellationToken,
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("bounding_box", &*self.bbox_tx.borrow())
            .field("cancel_token", &self.cancel_token)
            .finish_non_exhaustive()
    }
}

impl Poller {
    /// Spawn a poll loop with a default HTTP client.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: PollerConfig) -> Result<Self, FetchError> {
        let client = build_client(&config)?;
        Ok(Self::spawn_with_client(config, client))
    }

    /// Spawn a poll loop using the given HTTP client.
    #[must_use]
    pub fn spawn_with_client(config: PollerConfig, client: reqwest::Client) -> Self {
        let (event_tx, event_rx) = mpsc::channel(config.buffer_size.max(1));
        let (bbox_tx, bbox_rx) = watch::channel(config.bounding_box);
        let cancel_token = CancellationToken::new();

        let task_cancel = cancel_token.clone();

        tokio::spawn(async move {
            poll_loop(client, config, event_tx, bbox_rx, task_cancel).await;
        });

        Self {
            event_rx,
            bbox_tx,
            cancel_token,
        }
    }

    /// Receive the next event.
    ///
    /// Returns `None` if the poller has been shut down.
    pub async fn recv(&mut self) -> Option<PollEvent> {
        self.event_rx.recv().await
    }

    /// Receive an event without waiting.
    pub fn try_recv(&mut self) -> Option<PollEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Change the query window; triggers an immediate fetch.
    pub fn set_bounding_box(&self, bounding_box: Option<BoundingBox>) {
        let _ = self.bbox_tx.send(bounding_box);
    }

    /// Get the current query window.
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        *self.bbox_tx.borrow()
    }

    /// Shut down the poll loop.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn poll_loop(
    client: reqwest::Client,
    config: PollerConfig,
    event_tx: mpsc::Sender<PollEvent>,
    mut bbox_rx: watch::Receiver<Option<BoundingBox>>,
    cancel_token: CancellationToken,
) {
    let mut backoff = RetryBackoff::new(config.retry_initial_delay, config.retry_max_delay);

    loop {
        if cancel_token.is_cancelled() {
            info!("Poller cancelled");
            return;
        }

        let bounding_box = *bbox_rx.borrow_and_update();

        if event_tx
            .send(PollEvent::StateChanged(PollState::Fetching))
            .await
            .is_err()
        {
            return; // Receiver dropped
        }

        let result = tokio::select! {
            result = fetch_states(
                &client,
                &config.endpoint,
                bounding_box.as_ref(),
                config.credentials.as_ref(),
            ) => result,
            () = cancel_token.cancelled() => {
                info!("Poller cancelled during fetch");
                return;
            }
        };

        let delay = match result {
            Ok(snapshot) => {
                backoff.reset();
                if snapshot.rejected > 0 {
                    warn!("Dropped {} malformed state vectors", snapshot.rejected);
                }

                let fleet = Fleet::from_snapshot(snapshot, config.fetch_interval);
                let count = fleet.len();
                info!("Fetched {} aircraft", count);

                if event_tx.send(PollEvent::Snapshot(fleet)).await.is_err()
                    || event_tx
                        .send(PollEvent::StateChanged(PollState::Idle { aircraft: count }))
                        .await
                        .is_err()
                {
                    return;
                }
                config.fetch_interval
            }
            Err(e) => {
                let delay = backoff.next_delay();
                warn!("Fetch failed: {} (retrying in {:.1}s)", e, delay.as_secs_f64());
                if event_tx
                    .send(PollEvent::StateChanged(PollState::Error(e.to_string())))
                    .await
                    .is_err()
                {
                    return;
                }
                delay
            }
        };

        tokio::select! {
            () = sleep(delay) => {}
            changed = bbox_rx.changed() => {
                if changed.is_err() {
                    return;
                }
                info!("Bounding box changed, fetching immediately");
            }
            () = cancel_token.cancelled() => {
                info!("Poller cancelled while waiting");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::time::timeout;

    const BODY: &str = r#"{"time":1700000000,"states":[["abc123","TEST01  ","United Kingdom",1700000000,1700000000,0.0,52.0,9900.0,false,200.0,90.0,0.0,null,10000.0,null,false,0]]}"#;

    /// Serve canned `(status, body)` responses, one per connection, and report
    /// each request head on the returned channel.
    async fn serve(
        responses: Vec<(u16, &'static str)>,
    ) -> (String, mpsc::UnboundedReceiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (request_tx, request_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = vec![0u8; 8192];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let _ = request_tx.send(String::from_utf8_lossy(&buf[..n]).into_owned());

                let reason = if status == 200 { "OK" } else { "Error" };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{addr}/api/states/all"), request_rx)
    }

    fn test_client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let mut backoff = RetryBackoff::new(Duration::from_secs(5), Duration::from_secs(15));
        assert_eq!(backoff.next_delay(), Duration::from_secs(5));
        assert_eq!(backoff.next_delay(), Duration::from_secs(10));
        assert_eq!(backoff.next_delay(), Duration::from_secs(15));
        assert_eq!(backoff.next_delay(), Duration::from_secs(15));
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(5));
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials { username: "pilot".to_string(), password: "secret".to_string() };
        let text = format!("{creds:?}");
        assert!(text.contains("pilot"));
        assert!(!text.contains("secret"));
    }

    #[tokio::test]
    async fn test_fetch_states_with_bounding_box() {
        let (url, mut requests) = serve(vec![(200, BODY)]).await;
        let bbox = BoundingBox::new(43.069, -13.975, 61.164, 30.806).unwrap();

        let snapshot = fetch_states(&test_client(), &url, Some(&bbox), None).await.unwrap();

        assert_eq!(snapshot.states.len(), 1);
        assert_eq!(snapshot.states[0].icao24, "abc123");

        let request = requests.recv().await.unwrap();
        let request_line = request.lines().next().unwrap();
        assert!(request_line.contains("lamin=43.069"), "{request_line}");
        assert!(request_line.contains("lomin=-13.975"), "{request_line}");
        assert!(request_line.contains("lamax=61.164"), "{request_line}");
        assert!(request_line.contains("lomax=30.806"), "{request_line}");
    }

    #[tokio::test]
    async fn test_fetch_states_null_states() {
        let (url, _requests) = serve(vec![(200, r#"{"time":1,"states":null}"#)]).await;
        let snapshot = fetch_states(&test_client(), &url, None, None).await.unwrap();
        assert!(snapshot.states.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_states_http_error() {
        let (url, _requests) = serve(vec![(503, "{}")]).await;
        let err = fetch_states(&test_client(), &url, None, None).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(s) if s.as_u16() == 503));
    }

    #[tokio::test]
    async fn test_fetch_states_malformed_body() {
        let (url, _requests) = serve(vec![(200, "not json")]).await;
        let err = fetch_states(&test_client(), &url, None, None).await.unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[tokio::test]
    async fn test_poller_retries_after_failure() {
        let (url, _requests) = serve(vec![(500, "oops"), (200, BODY)]).await;
        let config = PollerConfig {
            endpoint: url,
            retry_initial_delay: Duration::from_millis(20),
            ..Default::default()
        };
        let mut poller = Poller::spawn_with_client(config, test_client());

        let mut states = Vec::new();
        let fleet = timeout(Duration::from_secs(10), async {
            loop {
                match poller.recv().await.unwrap() {
                    PollEvent::StateChanged(state) => states.push(state),
                    PollEvent::Snapshot(fleet) => break fleet,
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(states.len(), 3);
        assert_eq!(states[0], PollState::Fetching);
        assert!(matches!(states[1], PollState::Error(_)));
        assert_eq!(states[2], PollState::Fetching);

        assert_eq!(fleet.len(), 1);
        let aircraft = fleet.get_by_icao("abc123").unwrap();
        assert_eq!(aircraft.callsign.as_deref(), Some("TEST01"));

        let next = timeout(Duration::from_secs(5), poller.recv()).await.unwrap();
        assert!(matches!(
            next,
            Some(PollEvent::StateChanged(PollState::Idle { aircraft: 1 }))
        ));

        poller.shutdown();
    }

    /// Wait until the poller reports `Idle` after a successful fetch.
    async fn wait_for_idle(poller: &mut Poller) {
        timeout(Duration::from_secs(10), async {
            loop {
                if let Some(PollEvent::StateChanged(PollState::Idle { .. })) = poller.recv().await {
                    break;
                }
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_bounding_box_change_fetches_immediately() {
        let (url, mut requests) = serve(vec![(200, BODY), (200, BODY)]).await;
        let config = PollerConfig {
            endpoint: url,
            fetch_interval: Duration::from_secs(600),
            ..Default::default()
        };
        let mut poller = Poller::spawn_with_client(config, test_client());

        wait_for_idle(&mut poller).await;
        let first = requests.recv().await.unwrap();
        assert!(!first.lines().next().unwrap().contains("lamin"), "{first}");

        let bbox = BoundingBox::new(40.0, 0.0, 50.0, 10.0).unwrap();
        poller.set_bounding_box(Some(bbox));
        assert_eq!(poller.bounding_box(), Some(bbox));

        // Far sooner than the 600 s interval
        let second = timeout(Duration::from_secs(3), requests.recv()).await.unwrap().unwrap();
        let request_line = second.lines().next().unwrap();
        assert!(
            request_line.contains("lamin=40&lomin=0&lamax=50&lomax=10"),
            "{request_line}"
        );

        poller.shutdown();
    }

    #[tokio::test]
    async fn test_shutdown_closes_event_stream() {
        let (url, _requests) = serve(vec![(200, BODY)]).await;
        let config = PollerConfig {
            endpoint: url,
            fetch_interval: Duration::from_secs(600),
            ..Default::default()
        };
        let mut poller = Poller::spawn_with_client(config, test_client());

        wait_for_idle(&mut poller).await;
        poller.shutdown();

        // The task exits and drops its sender, ending the stream
        let closed = timeout(Duration::from_secs(5), async {
            while poller.recv().await.is_some() {}
        })
        .await;
        assert!(closed.is_ok());
        assert!(poller.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_drop_cancels_poll_task() {
        let (url, _requests) = serve(vec![(200, BODY)]).await;
        let config = PollerConfig {
            endpoint: url,
            fetch_interval: Duration::from_secs(600),
            ..Default::default()
        };
        let mut poller = Poller::spawn_with_client(config, test_client());
        wait_for_idle(&mut poller).await;

        let token = poller.cancel_token.clone();
        assert!(!token.is_cancelled());
        drop(poller);
        assert!(token.is_cancelled());
    }
}
