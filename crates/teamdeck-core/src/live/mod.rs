//! Live update client
//!
//! Holds one reconnecting connection to the backend, decodes every pushed
//! update and publishes the resulting [`DashboardState`] through a
//! `tokio::sync::watch` channel. Each update is applied in a single
//! `send_modify`, so subscribers never see a half-applied message.

mod backoff;
mod connection;
mod state;
mod transport;
mod update;

pub use backoff::ReconnectPolicy;
pub use connection::{Connection, ConnectionPhase};
pub use state::{DashboardSnapshot, DashboardState};
pub use transport::{Connector, Session, WsConnector};
pub use update::{decode, SliceUpdate, Update};

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Error, Result};

/// Handle to a running live connection
///
/// Dropping the handle closes the connection and cancels any pending
/// reconnect.
pub struct LiveClient {
    url: Url,
    state_rx: watch::Receiver<DashboardState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl LiveClient {
    /// Connect over WebSocket with the given backoff policy
    pub fn connect(url: &str, policy: ReconnectPolicy) -> Result<Self> {
        Self::open(url, policy, Arc::new(WsConnector))
    }

    /// Start connecting to `url` through `connector`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open(url: &str, policy: ReconnectPolicy, connector: Arc<dyn Connector>) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::config(format!("invalid server url {url}: {e}")))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(Error::config(format!(
                "server url must use ws:// or wss://, got {}",
                url.scheme()
            )));
        }

        let (state_tx, state_rx) = watch::channel(DashboardState::default());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(drive(
            url.to_string(),
            connector,
            Connection::new(policy),
            state_tx,
            cancel.clone(),
        ));

        Ok(Self {
            url,
            state_rx,
            cancel,
            task: Some(task),
        })
    }

    /// Server URL this client talks to
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// New receiver that observes every published state
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state_rx.clone()
    }

    /// Copy of the current state
    pub fn state(&self) -> DashboardState {
        self.state_rx.borrow().clone()
    }

    /// Close the connection and wait for the driver to finish
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Live client task ended abnormally");
            }
        }
    }
}

impl Drop for LiveClient {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn drive(
    url: String,
    connector: Arc<dyn Connector>,
    mut connection: Connection,
    state_tx: watch::Sender<DashboardState>,
    cancel: CancellationToken,
) {
    while connection.begin_connect() {
        publish_phase(&state_tx, &connection);
        debug!(%url, attempt = connection.attempts(), "Connecting");

        let attempt = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            attempt = connector.connect(&url) => attempt,
        };

        match attempt {
            Ok(mut session) => {
                connection.opened();
                info!(%url, "Connected to live updates");
                state_tx.send_modify(|s| {
                    s.is_connected = true;
                    s.last_error = None;
                    s.reconnect_attempts = 0;
                    s.phase = connection.phase();
                });

                let failure = pump(session.as_mut(), &state_tx, &cancel).await;
                if cancel.is_cancelled() {
                    session.close().await;
                    break;
                }
                match failure {
                    Some(e) => {
                        warn!(error = %e, "Live connection failed");
                        state_tx.send_modify(|s| s.last_error = Some(e.to_string()));
                    }
                    None => info!("Live connection closed"),
                }
            }
            Err(e) => {
                warn!(%url, error = %e, "Could not connect");
                state_tx.send_modify(|s| s.last_error = Some(e.to_string()));
            }
        }

        let Some(delay) = connection.closed() else {
            break;
        };
        state_tx.send_modify(|s| {
            s.is_connected = false;
            s.reconnect_attempts = connection.attempts();
            s.phase = connection.phase();
        });
        info!(
            attempt = connection.attempts(),
            delay_ms = delay.as_millis() as u64,
            "Reconnecting"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    connection.stop();
    state_tx.send_modify(|s| {
        s.is_connected = false;
        s.phase = connection.phase();
    });
    debug!(%url, "Live client stopped");
}

/// Apply payloads until the session ends. Returns the transport error, if
/// that is what ended it.
async fn pump(
    session: &mut dyn Session,
    state_tx: &watch::Sender<DashboardState>,
    cancel: &CancellationToken,
) -> Option<Error> {
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            next = session.recv() => next,
        };

        match next? {
            Ok(text) => match decode(&text) {
                Ok(update) => {
                    debug!(
                        kind = update.kind().unwrap_or("-"),
                        slices = update.slices.len(),
                        "Applying update"
                    );
                    state_tx.send_modify(|s| s.apply(update));
                }
                Err(e) => warn!(error = %e, "Dropping malformed update"),
            },
            Err(e) => return Some(e),
        }
    }
}

fn publish_phase(state_tx: &watch::Sender<DashboardState>, connection: &Connection) {
    state_tx.send_modify(|s| s.phase = connection.phase());
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    /// One scripted connect outcome
    enum Step {
        Refuse,
        /// Deliver payloads, then close
        Deliver(Vec<String>),
        /// Deliver payloads, then stay open
        Hold(Vec<String>),
    }

    struct Scripted {
        steps: Mutex<VecDeque<Step>>,
        attempts: Mutex<Vec<Instant>>,
    }

    impl Scripted {
        fn new(steps: Vec<Step>) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into()),
                attempts: Mutex::new(Vec::new()),
            })
        }

        fn attempt_times(&self) -> Vec<Instant> {
            self.attempts.lock().unwrap().clone()
        }

        fn gaps_ms(&self) -> Vec<u128> {
            self.attempt_times()
                .windows(2)
                .map(|w| (w[1] - w[0]).as_millis())
                .collect()
        }
    }

    struct ScriptedSession {
        payloads: VecDeque<String>,
        hold: bool,
    }

    #[async_trait]
    impl Session for ScriptedSession {
        async fn recv(&mut self) -> Option<Result<String>> {
            match self.payloads.pop_front() {
                Some(p) => Some(Ok(p)),
                None if self.hold => std::future::pending().await,
                None => None,
            }
        }

        async fn close(&mut self) {}
    }

    #[async_trait]
    impl Connector for Scripted {
        async fn connect(&self, _url: &str) -> Result<Box<dyn Session>> {
            self.attempts.lock().unwrap().push(Instant::now());
            let step = self.steps.lock().unwrap().pop_front().unwrap_or(Step::Refuse);
            match step {
                Step::Refuse => Err(Error::transport("connection refused")),
                Step::Deliver(payloads) => Ok(Box::new(ScriptedSession {
                    payloads: payloads.into(),
                    hold: false,
                })),
                Step::Hold(payloads) => Ok(Box::new(ScriptedSession {
                    payloads: payloads.into(),
                    hold: true,
                })),
            }
        }
    }

    async fn wait_for_attempts(connector: &Scripted, n: usize) {
        while connector.attempt_times().len() < n {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    const URL: &str = "ws://localhost:3001";

    #[tokio::test]
    async fn test_rejects_non_websocket_urls() {
        let connector = Scripted::new(vec![]);
        assert!(LiveClient::open("http://localhost", ReconnectPolicy::default(), connector.clone()).is_err());
        assert!(LiveClient::open("not a url", ReconnectPolicy::default(), connector.clone()).is_err());
        assert!(connector.attempt_times().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_delays_and_reset() {
        let connector = Scripted::new(vec![
            Step::Deliver(vec![json!({"data": [{"name": "alpha"}]}).to_string()]),
            Step::Refuse,
            Step::Deliver(vec![json!({"stats": {"totalTeams": 1}}).to_string()]),
            Step::Refuse,
        ]);
        let client = LiveClient::open(URL, ReconnectPolicy::default(), connector.clone()).unwrap();

        wait_for_attempts(&connector, 5).await;
        // open->close: 1s, refused: 2s, open resets->close: 1s, refused: 2s
        assert_eq!(connector.gaps_ms()[..4].to_vec(), vec![1000, 2000, 1000, 2000]);

        let state = client.state();
        assert_eq!(state.snapshot.teams[0].name, "alpha");
        assert_eq!(state.snapshot.stats.unwrap().total_teams, 1);
        assert!(!state.is_connected);
        assert_eq!(state.last_error.as_deref(), Some("Transport error: connection refused"));

        client.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stays_disconnected_through_failed_attempts() {
        let connector = Scripted::new(vec![Step::Refuse, Step::Refuse, Step::Hold(vec![])]);
        let client = LiveClient::open(URL, ReconnectPolicy::default(), connector.clone()).unwrap();
        let mut rx = client.subscribe();

        // every state published before the third attempt succeeds
        let mut before_open = Vec::new();
        loop {
            let state = rx.borrow_and_update().clone();
            if state.is_connected {
                break;
            }
            before_open.push(state);
            rx.changed().await.unwrap();
        }

        assert_eq!(connector.attempt_times().len(), 3);
        assert!(before_open.iter().any(|s| s.reconnect_attempts == 1));
        assert!(before_open.iter().any(|s| s.reconnect_attempts == 2));
        assert!(before_open
            .iter()
            .filter(|s| s.reconnect_attempts > 0)
            .all(|s| s.phase != ConnectionPhase::Open && s.last_error.is_some()));
        assert_eq!(client.state().reconnect_attempts, 0);
        client.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_payload_keeps_connection() {
        let connector = Scripted::new(vec![Step::Hold(vec![
            "not json".to_string(),
            json!({"data": [{"name": "alpha"}]}).to_string(),
        ])]);
        let client = LiveClient::open(URL, ReconnectPolicy::default(), connector.clone()).unwrap();
        let mut rx = client.subscribe();

        let state = rx.wait_for(|s| s.revision == 1).await.unwrap().clone();
        assert!(state.is_connected);
        assert_eq!(state.phase, ConnectionPhase::Open);
        assert_eq!(state.snapshot.teams.len(), 1);
        assert_eq!(state.last_raw_message, Some(json!({"data": [{"name": "alpha"}]})));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(connector.attempt_times().len(), 1);
        client.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_pending_reconnect() {
        let connector = Scripted::new(vec![]);
        let client = LiveClient::open(URL, ReconnectPolicy::default(), connector.clone()).unwrap();
        let rx = client.subscribe();

        wait_for_attempts(&connector, 2).await;
        client.close().await;
        let attempts = connector.attempt_times().len();

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(connector.attempt_times().len(), attempts);
        assert_eq!(rx.borrow().phase, ConnectionPhase::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_driver() {
        let connector = Scripted::new(vec![Step::Hold(vec![])]);
        let client = LiveClient::open(URL, ReconnectPolicy::default(), connector.clone()).unwrap();
        let mut rx = client.subscribe();
        rx.wait_for(|s| s.is_connected).await.unwrap();

        drop(client);
        rx.wait_for(|s| s.phase == ConnectionPhase::Stopped).await.unwrap();
        assert!(!rx.borrow().is_connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_counter_published_while_refused() {
        let connector = Scripted::new(vec![]);
        let client = LiveClient::open(URL, ReconnectPolicy::default(), connector.clone()).unwrap();
        let mut rx = client.subscribe();

        let state = rx.wait_for(|s| s.reconnect_attempts >= 3).await.unwrap().clone();
        assert_eq!(state.phase, ConnectionPhase::Closed);
        assert_eq!(connector.gaps_ms()[..2].to_vec(), vec![1000, 2000]);
        client.close().await;
    }
}
