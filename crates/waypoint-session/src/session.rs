//! Session driver: owns one connection lifecycle end to end.
//!
//! [`start`] spawns a background task that connects, authenticates, pumps
//! frames in both directions, and reconnects with jittered exponential
//! backoff until the retry budget runs out or [`SessionHandle::stop`] is
//! called. Callers observe progress through a watch channel of
//! [`ConnectionState`] and never touch the socket directly.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use waypoint_core::backoff::{BackoffConfig, delay_for_attempt_with_random};
use waypoint_core::wire::{InboundMessage, OutboundMessage, parse_inbound};
use waypoint_core::{CredentialProvider, SessionCredential, SessionError};
use waypoint_tracker::Reconciler;

use crate::state::{ConnectionState, SessionEvent};
use crate::transport::{Transport, TransportConn, endpoint_is_valid};

/// Default bound of the outbound message channel.
pub const DEFAULT_SEND_BUFFER_SIZE: usize = 64;

/// Default ceiling on one transport-level connect attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Tunables for one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Websocket URL of the location server.
    pub endpoint: String,
    /// Ceiling on a single transport-level connect attempt.
    pub connect_timeout: Duration,
    /// Capacity of the outbound channel. When full, sends are dropped.
    pub send_buffer_size: usize,
    /// Reconnect budget and delay shape.
    pub retry: BackoffConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:8080/live".to_owned(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            send_buffer_size: DEFAULT_SEND_BUFFER_SIZE,
            retry: BackoffConfig::default(),
        }
    }
}

/// Caller-side handle to a running session.
///
/// Dropping the handle without calling [`stop`](Self::stop) leaves the
/// driver running until its outbound channel closes.
pub struct SessionHandle {
    cancel: CancellationToken,
    out_tx: mpsc::Sender<OutboundMessage>,
    state_rx: watch::Receiver<ConnectionState>,
    dropped_messages: Arc<AtomicU64>,
    task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl SessionHandle {
    /// Queue an outbound message.
    ///
    /// Returns `false` when the message was dropped, either because the
    /// session cannot send in its current state or because the outbound
    /// buffer is full. Dropped messages are counted, not queued; location
    /// updates are ephemeral and a stale fix is worthless.
    pub fn send(&self, message: OutboundMessage) -> bool {
        if !self.state_rx.borrow().can_send() {
            let dropped = self.dropped_messages.fetch_add(1, Ordering::Relaxed) + 1;
            debug!(state = %*self.state_rx.borrow(), dropped, "dropping message, cannot send");
            return false;
        }
        match self.out_tx.try_send(message) {
            Ok(()) => true,
            Err(_) => {
                let dropped = self.dropped_messages.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(dropped, "outbound buffer full, dropping message");
                false
            }
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// A receiver that observes every state transition.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Messages dropped so far (buffer full or session not sendable).
    #[must_use]
    pub fn dropped_messages(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    /// Tear the session down and wait for the driver task to finish.
    ///
    /// Idempotent; the second call is a no-op.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let task = self.task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}

/// Start a session against `transport` and return the caller handle.
///
/// Fail-fast checks (missing credential, non-websocket endpoint) still go
/// through the spawned driver so the `Failed` state is observable on the
/// watch channel like any other terminal state.
pub fn start(
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialProvider>,
    reconciler: Arc<Reconciler>,
    config: SessionConfig,
) -> SessionHandle {
    let cancel = CancellationToken::new();
    let (out_tx, out_rx) = mpsc::channel(config.send_buffer_size.max(1));
    let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);
    let dropped_messages = Arc::new(AtomicU64::new(0));

    let driver = Driver {
        id: Uuid::now_v7(),
        transport,
        credentials,
        reconciler,
        config,
        cancel: cancel.clone(),
        state_tx,
    };
    let task = tokio::spawn(driver.run(out_rx));

    SessionHandle {
        cancel,
        out_tx,
        state_rx,
        dropped_messages,
        task: parking_lot::Mutex::new(Some(task)),
    }
}

struct Driver {
    id: Uuid,
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialProvider>,
    reconciler: Arc<Reconciler>,
    config: SessionConfig,
    cancel: CancellationToken,
    state_tx: watch::Sender<ConnectionState>,
}

/// What one connected stretch ended with.
enum StreamEnd {
    /// Client asked to stop.
    Stopped,
    /// The transport dropped out from under us.
    Lost,
    /// The caller handle went away; nothing left to drive.
    HandleGone,
}

impl Driver {
    /// Apply `event` to the published state.
    ///
    /// After cancellation only `StopRequested` may move the machine, so a
    /// racing transport error cannot overwrite the terminal `Closed`.
    fn transition(&self, event: SessionEvent) -> ConnectionState {
        if self.cancel.is_cancelled() && event != SessionEvent::StopRequested {
            return *self.state_tx.borrow();
        }
        let mut next = *self.state_tx.borrow();
        self.state_tx.send_if_modified(|state| {
            next = state.apply(event);
            if next == *state {
                false
            } else {
                debug!(from = %state, to = %next, ?event, "session transition");
                *state = next;
                true
            }
        });
        next
    }

    fn close(&self) {
        let _ = self.transition(SessionEvent::StopRequested);
        self.reconciler.reset();
        info!("session closed");
    }

    #[instrument(skip_all, fields(session_id = %self.id))]
    async fn run(self, mut out_rx: mpsc::Receiver<OutboundMessage>) {
        let Some(credential) = self.credentials.token() else {
            warn!("no session credential available, refusing to start");
            let _ = self.transition(SessionEvent::CredentialMissing);
            return;
        };
        if !endpoint_is_valid(&self.config.endpoint) {
            warn!(endpoint = %self.config.endpoint, "endpoint is not a websocket URL");
            let _ = self.transition(SessionEvent::EndpointInvalid);
            return;
        }

        let _ = self.transition(SessionEvent::StartRequested);
        let mut rng = SmallRng::from_os_rng();
        // Zero-based index of the next reconnect attempt. Reset once a
        // connection reaches Streaming, so the budget bounds consecutive
        // failures rather than lifetime failures.
        let mut attempt: u32 = 0;

        loop {
            let conn = tokio::select! {
                () = self.cancel.cancelled() => {
                    self.close();
                    return;
                }
                result = time::timeout(
                    self.config.connect_timeout,
                    self.transport.connect(&self.config.endpoint),
                ) => {
                    result
                        .map_err(|_| SessionError::Transport("connect timed out".to_owned()))
                        .and_then(|inner| inner)
                }
            };

            match conn {
                Ok(mut conn) => {
                    let _ = self.transition(SessionEvent::ConnectSucceeded);
                    match self
                        .drive_connection(conn.as_mut(), &credential, &mut out_rx, &mut attempt)
                        .await
                    {
                        StreamEnd::Stopped | StreamEnd::HandleGone => {
                            conn.close().await;
                            self.close();
                            return;
                        }
                        StreamEnd::Lost => {
                            conn.close().await;
                            let _ = self.transition(SessionEvent::TransportLost);
                        }
                    }
                }
                Err(error) => {
                    warn!(%error, attempt, "connect attempt failed");
                    let _ = self.transition(SessionEvent::ConnectFailed);
                }
            }

            if !self.config.retry.allows(attempt) {
                warn!(
                    attempts = self.config.retry.max_attempts,
                    "reconnect budget exhausted"
                );
                let _ = self.transition(SessionEvent::RetriesExhausted);
                return;
            }
            let delay = delay_for_attempt_with_random(
                attempt,
                self.config.retry.base_delay_ms,
                self.config.retry.max_delay_ms,
                self.config.retry.jitter_factor,
                rng.random_range(0.0..1.0),
            );
            info!(attempt, delay_ms = delay, "reconnecting after backoff");
            attempt += 1;

            tokio::select! {
                () = self.cancel.cancelled() => {
                    self.close();
                    return;
                }
                () = time::sleep(Duration::from_millis(delay)) => {
                    let _ = self.transition(SessionEvent::BackoffElapsed);
                }
            }
        }
    }

    /// Pump one established connection until it ends.
    ///
    /// Sends the auth frame first, then forwards outbound messages and
    /// applies inbound frames to the reconciler.
    async fn drive_connection(
        &self,
        conn: &mut dyn TransportConn,
        credential: &SessionCredential,
        out_rx: &mut mpsc::Receiver<OutboundMessage>,
        attempt: &mut u32,
    ) -> StreamEnd {
        let auth = OutboundMessage::auth(credential.expose());
        let frame = match auth.to_frame() {
            Ok(frame) => frame,
            Err(error) => {
                warn!(%error, "failed to encode auth frame");
                return StreamEnd::Lost;
            }
        };
        if let Err(error) = conn.send_text(&frame).await {
            warn!(%error, "failed to send auth frame");
            return StreamEnd::Lost;
        }
        debug!("auth frame sent, awaiting first inbound frame");

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    return StreamEnd::Stopped;
                }
                frame = conn.next_frame() => {
                    match frame {
                        Some(Ok(text)) => {
                            // Only well-formed frames count toward the
                            // implicit auth confirmation.
                            if let Some(message) = self.parse_frame(&text) {
                                if self.transition(SessionEvent::FrameReceived)
                                    == ConnectionState::Streaming
                                {
                                    *attempt = 0;
                                }
                                self.apply_inbound(message);
                            }
                        }
                        Some(Err(error)) => {
                            warn!(%error, "transport error");
                            return StreamEnd::Lost;
                        }
                        None => {
                            info!("server closed the connection");
                            return StreamEnd::Lost;
                        }
                    }
                }
                message = out_rx.recv() => {
                    let Some(message) = message else {
                        info!("caller handle dropped, ending session");
                        return StreamEnd::HandleGone;
                    };
                    let frame = match message.to_frame() {
                        Ok(frame) => frame,
                        Err(error) => {
                            warn!(%error, "failed to encode outbound message, skipping");
                            continue;
                        }
                    };
                    if let Err(error) = conn.send_text(&frame).await {
                        warn!(%error, "send failed");
                        return StreamEnd::Lost;
                    }
                }
            }
        }
    }

    /// Decode one inbound frame. Malformed frames are logged and dropped.
    fn parse_frame(&self, text: &str) -> Option<InboundMessage> {
        match parse_inbound(text) {
            Ok(message) => Some(message),
            Err(error) => {
                warn!(%error, frame = text, "ignoring malformed inbound frame");
                None
            }
        }
    }

    fn apply_inbound(&self, message: InboundMessage) {
        match message {
            InboundMessage::AuthAck => {
                debug!("auth acknowledged by server");
            }
            InboundMessage::Location(coordinate) => {
                self.reconciler.apply_remote(coordinate);
            }
        }
    }
}
