//! The connection task and the client handle.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval_at};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::ClientError;
use crate::subscription::{ConnectionState, OrderCallbacks, OrderSubscriptions, SubscriptionHandle};

const KEEPALIVE_FRAME: &str = r#"{"type":"ping"}"#;

/// Where and how to connect.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint, e.g. `ws://localhost:3000/ws`.
    pub url: String,
    /// Staff role sent with the upgrade request.
    pub role: Option<String>,
    /// Station sent with the upgrade request.
    pub station: Option<String>,
    /// First reconnect delay.
    pub initial_backoff: Duration,
    /// Upper bound of the doubling reconnect delay.
    pub max_backoff: Duration,
    /// Interval between keepalive frames.
    pub ping_interval: Duration,
}

impl ClientConfig {
    /// Defaults for `url`: 1 s backoff doubling up to 30 s, 30 s keepalive.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            role: None,
            station: None,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            ping_interval: Duration::from_secs(30),
        }
    }

    /// Declares the client's role.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Declares the client's station.
    #[must_use]
    pub fn with_station(mut self, station: impl Into<String>) -> Self {
        self.station = Some(station.into());
        self
    }

    /// The endpoint with role and station in its query string.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidEndpoint` if the URL does not parse or is
    /// not `ws`/`wss`.
    pub fn endpoint(&self) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.url)?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ClientError::InvalidEndpoint(format!(
                "unsupported scheme {}",
                url.scheme()
            )));
        }
        if self.role.is_some() || self.station.is_some() {
            let mut query = url.query_pairs_mut();
            if let Some(role) = &self.role {
                query.append_pair("role", role);
            }
            if let Some(station) = &self.station {
                query.append_pair("station", station);
            }
        }
        Ok(url)
    }
}

/// Why a live session ended.
enum SessionEnd {
    Lost,
    Shutdown,
}

/// Handle to the shared order channel connection. Clones share the same
/// connection and subscriptions.
#[derive(Debug, Clone)]
pub struct OrderSocketClient {
    subscriptions: Arc<OrderSubscriptions>,
    shutdown: watch::Sender<bool>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl OrderSocketClient {
    /// Starts the connection task. Returns immediately; use
    /// [`OrderSocketClient::wait_until_connected`] to wait for the socket.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidEndpoint` for an unusable URL.
    pub fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let endpoint = config.endpoint()?;
        let subscriptions = OrderSubscriptions::new();
        let (shutdown, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(run(
            endpoint,
            config,
            Arc::clone(&subscriptions),
            shutdown_rx,
        ));

        Ok(Self {
            subscriptions,
            shutdown,
            task: Arc::new(Mutex::new(Some(task))),
        })
    }

    /// Registers callbacks on the shared connection.
    pub fn subscribe(&self, callbacks: OrderCallbacks) -> SubscriptionHandle {
        self.subscriptions.subscribe(callbacks)
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.subscriptions.state()
    }

    /// Waits until the connection is up.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Timeout` if it is not up within `timeout`, and
    /// `ClientError::Closed` if the client was closed.
    pub async fn wait_until_connected(&self, timeout: Duration) -> Result<(), ClientError> {
        if *self.shutdown.borrow() {
            return Err(ClientError::Closed);
        }
        let mut state = self.subscriptions.watch_state();
        match tokio::time::timeout(
            timeout,
            state.wait_for(|s| *s == ConnectionState::Connected),
        )
        .await
        {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(ClientError::Closed),
            Err(_) => Err(ClientError::Timeout(timeout)),
        }
    }

    /// Closes the connection and stops reconnecting. Subscriptions stay
    /// registered but receive nothing further.
    pub async fn close(&self) {
        self.shutdown.send_replace(true);
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "connection task ended abnormally");
            }
        }
        self.subscriptions.set_state(ConnectionState::Disconnected);
    }
}

async fn run(
    endpoint: Url,
    config: ClientConfig,
    subscriptions: Arc<OrderSubscriptions>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut backoff = config.initial_backoff;

    loop {
        if *shutdown.borrow() {
            break;
        }
        subscriptions.set_state(ConnectionState::Connecting);
        debug!(%endpoint, "connecting to order channel");

        let attempt = tokio::select! {
            result = connect_async(endpoint.as_str()) => result,
            _ = shutdown.changed() => break,
        };

        match attempt {
            Ok((stream, _response)) => {
                subscriptions.set_state(ConnectionState::Connected);
                info!(%endpoint, "connected to order channel");
                backoff = config.initial_backoff;

                let end = serve(stream, &config, &subscriptions, &mut shutdown).await;
                subscriptions.set_state(ConnectionState::Disconnected);
                if matches!(end, SessionEnd::Shutdown) {
                    break;
                }
                warn!(%endpoint, "order channel connection lost");
            }
            Err(e) => {
                subscriptions.set_state(ConnectionState::Disconnected);
                warn!(
                    %endpoint,
                    error = %ClientError::from(e),
                    retry_in = ?backoff,
                    "connection attempt failed"
                );
            }
        }

        tokio::select! {
            () = tokio::time::sleep(backoff) => {}
            _ = shutdown.changed() => break,
        }
        backoff = (backoff * 2).min(config.max_backoff);
    }

    subscriptions.set_state(ConnectionState::Disconnected);
    debug!("order channel task stopped");
}

async fn serve(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    config: &ClientConfig,
    subscriptions: &OrderSubscriptions,
    shutdown: &mut watch::Receiver<bool>,
) -> SessionEnd {
    let (mut write, mut read) = stream.split();
    let mut keepalive = interval_at(
        tokio::time::Instant::now() + config.ping_interval,
        config.ping_interval,
    );
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    subscriptions.dispatch_frame(text.as_str());
                }
                Some(Ok(Message::Close(_)) | Err(_)) | None => return SessionEnd::Lost,
                Some(Ok(_)) => {}
            },

            _ = keepalive.tick() => {
                if write.send(Message::text(KEEPALIVE_FRAME)).await.is_err() {
                    return SessionEnd::Lost;
                }
            }

            _ = shutdown.changed() => {
                let _ = write.send(Message::Close(None)).await;
                return SessionEnd::Shutdown;
            }
        }
    }
}
