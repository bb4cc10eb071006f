//! Supervised push-stream connections: open/receive/error/retry/close.
//!
//! One supervisor task exclusively owns the transport and the retry timer.
//! Decoded samples are delivered through an unbounded channel in network
//! arrival order; the lifecycle state is published on a watch channel.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{ConnectionError, DecodeError};

/// Delay before each reconnect attempt. Fixed: no backoff growth and no cap
/// on attempts; retries continue until the connection is closed.
pub const RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Connecting,
    Open,
    Retrying,
    Closed,
}

/// Endpoint plus the headers attached to every connection attempt.
#[derive(Debug, Clone)]
pub struct StreamTarget {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// Events delivered to the consumer of a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent<T> {
    Sample(T),
    /// The monitored resource reached a terminal state; the stream ends and
    /// no retry follows.
    Terminal,
}

/// Transport seam: opens one framed connection to a target.
pub trait Connector: Send + Sync + 'static {
    type Frames: Stream<Item = Result<String, ConnectionError>> + Send + Unpin;

    fn connect(
        &self,
        target: &StreamTarget,
    ) -> impl Future<Output = Result<Self::Frames, ConnectionError>> + Send;
}

/// A supervised push connection decoding JSON text frames into `T`.
///
/// At most one transport is ever live per connection: `open` tears down the
/// previous supervisor (and any pending retry) before starting a new one,
/// and dropping the connection closes everything.
pub struct StreamConnection<T, C: Connector> {
    connector: Arc<C>,
    target: StreamTarget,
    terminal_when: Arc<dyn Fn(&T) -> bool + Send + Sync>,
    state: watch::Sender<StreamState>,
    last_error: Arc<Mutex<Option<ConnectionError>>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl<T, C> StreamConnection<T, C>
where
    T: DeserializeOwned + Send + 'static,
    C: Connector,
{
    pub fn new(connector: C, target: StreamTarget) -> Self {
        Self::with_terminal(connector, target, |_| false)
    }

    /// A sample satisfying `terminal_when` ends the stream for good (e.g.
    /// the monitored process itself has stopped).
    pub fn with_terminal(
        connector: C,
        target: StreamTarget,
        terminal_when: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        let (state, _) = watch::channel(StreamState::Idle);
        Self {
            connector: Arc::new(connector),
            target,
            terminal_when: Arc::new(terminal_when),
            state,
            last_error: Arc::new(Mutex::new(None)),
            cancel: CancellationToken::new(),
            task: None,
        }
    }

    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    /// Change notifications for the lifecycle state.
    pub fn watch_state(&self) -> watch::Receiver<StreamState> {
        self.state.subscribe()
    }

    pub fn target(&self) -> &StreamTarget {
        &self.target
    }

    /// Most recent transport error, if any.
    pub fn last_error(&self) -> Option<ConnectionError> {
        self.last_error.lock().unwrap().clone()
    }

    /// Establish the connection and return the event receiver. Any prior
    /// transport and pending retry are torn down first.
    pub fn open(&mut self) -> mpsc::UnboundedReceiver<StreamEvent<T>> {
        self.teardown();
        self.cancel = CancellationToken::new();
        let (events, rx) = mpsc::unbounded_channel();
        let supervisor = Supervisor {
            connector: Arc::clone(&self.connector),
            target: self.target.clone(),
            terminal_when: Arc::clone(&self.terminal_when),
            state: self.state.clone(),
            last_error: Arc::clone(&self.last_error),
            cancel: self.cancel.clone(),
            events,
        };
        self.task = Some(tokio::spawn(supervisor.run()));
        rx
    }

    /// Close the connection and cancel any pending retry. Idempotent: extra
    /// calls, or closing while retrying, are harmless.
    pub fn close(&mut self) {
        self.teardown();
        self.state.send_replace(StreamState::Closed);
    }

    fn teardown(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<T, C: Connector> Drop for StreamConnection<T, C> {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

enum Pump {
    /// Transport lost; reconnect after the retry delay.
    Lost,
    /// Terminal sample seen; do not reconnect.
    Terminal,
    /// Cancelled, or the consumer dropped the receiver.
    Gone,
}

struct Supervisor<T, C: Connector> {
    connector: Arc<C>,
    target: StreamTarget,
    terminal_when: Arc<dyn Fn(&T) -> bool + Send + Sync>,
    state: watch::Sender<StreamState>,
    last_error: Arc<Mutex<Option<ConnectionError>>>,
    cancel: CancellationToken,
    events: mpsc::UnboundedSender<StreamEvent<T>>,
}

impl<T, C> Supervisor<T, C>
where
    T: DeserializeOwned + Send + 'static,
    C: Connector,
{
    async fn run(self) {
        loop {
            self.state.send_replace(StreamState::Connecting);
            let connected = tokio::select! {
                _ = self.cancel.cancelled() => break,
                res = self.connector.connect(&self.target) => res,
            };
            match connected {
                Ok(frames) => match self.pump(frames).await {
                    Pump::Lost => {}
                    Pump::Terminal | Pump::Gone => break,
                },
                Err(err) => {
                    warn!(error = %err, url = %self.target.url, "stream connect failed");
                    *self.last_error.lock().unwrap() = Some(err);
                }
            }
            if self.cancel.is_cancelled() {
                break;
            }
            self.state.send_replace(StreamState::Retrying);
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(RETRY_DELAY) => {}
            }
        }
        self.state.send_replace(StreamState::Closed);
    }

    // Read frames until the transport drops, the resource terminates, or the
    // consumer goes away.
    async fn pump(&self, mut frames: C::Frames) -> Pump {
        self.state.send_replace(StreamState::Open);
        loop {
            let item = tokio::select! {
                _ = self.cancel.cancelled() => return Pump::Gone,
                item = frames.next() => item,
            };
            match item {
                Some(Ok(text)) => match serde_json::from_str::<T>(&text) {
                    Ok(sample) => {
                        let terminal = (self.terminal_when)(&sample);
                        if self.events.send(StreamEvent::Sample(sample)).is_err() {
                            // Receiver dropped: nobody left to serve.
                            return Pump::Gone;
                        }
                        if terminal {
                            let _ = self.events.send(StreamEvent::Terminal);
                            return Pump::Terminal;
                        }
                    }
                    Err(err) => {
                        // Malformed frame: drop it, stay open.
                        debug!(error = %DecodeError::from(err), "dropping frame");
                    }
                },
                Some(Err(err)) => {
                    warn!(error = %err, url = %self.target.url, "stream transport error");
                    *self.last_error.lock().unwrap() = Some(err);
                    return Pump::Lost;
                }
                None => {
                    warn!(url = %self.target.url, "stream ended by peer");
                    *self.last_error.lock().unwrap() =
                        Some(ConnectionError::Transport("connection closed".into()));
                    return Pump::Lost;
                }
            }
        }
    }
}

/// WebSocket transport over tokio-tungstenite. Text frames pass through;
/// pings and binary keepalives are skipped.
pub struct WsConnector;

impl Connector for WsConnector {
    type Frames = futures_util::stream::BoxStream<'static, Result<String, ConnectionError>>;

    async fn connect(&self, target: &StreamTarget) -> Result<Self::Frames, ConnectionError> {
        use tokio_tungstenite::tungstenite::client::IntoClientRequest;
        use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
        use tokio_tungstenite::tungstenite::Message;

        let mut request = target
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| ConnectionError::Endpoint(e.to_string()))?;
        for (name, value) in &target.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ConnectionError::Endpoint(e.to_string()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ConnectionError::Endpoint(e.to_string()))?;
            request.headers_mut().insert(name, value);
        }

        let (ws, _) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| ConnectionError::Connect(e.to_string()))?;

        Ok(ws
            .filter_map(|msg| async move {
                match msg {
                    Ok(Message::Text(text)) => Some(Ok(text)),
                    Ok(Message::Close(_)) => {
                        Some(Err(ConnectionError::Transport("closed by peer".into())))
                    }
                    Ok(_) => None,
                    Err(e) => Some(Err(ConnectionError::Transport(e.to_string()))),
                }
            })
            .boxed())
    }
}
