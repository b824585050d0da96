//! Game connection and event loop.
//!
//! This module owns the game socket lifecycle: handshake, inbound dispatch,
//! redeem correlation and resend of failed writes.
//!
//! # Event Loop
//!
//! The connection spawns one tokio task that handles, one at a time:
//!
//! - Commands from the Rust API (bind socket, send, submit redeem)
//! - Events from the bound socket (messages, close, errors)
//! - Resend timer ticks (one queued message per tick)
//!
//! All mutable state lives in that task, so the correlation maps and the
//! resend queue need no locks.
//!
//! # States
//!
//! ```text
//! Disconnected ──bind──► AwaitingHandshake ──Hello──► Handshaked
//!       ▲                        │                        │
//!       └──────────close / bind(None)─────────────────────┘
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at, timeout};
use tracing::{debug, error, info, trace, warn};

use crate::bridge::{BridgeOptions, GameStateSink};
use crate::error::{Error, Result};
use crate::identifiers::Guid;
use crate::protocol::message::duration_millis;
use crate::protocol::{Body, Message, RedeemResult};

use super::correlation::RedeemTracker;
use super::resend::ResendQueue;
use super::socket::{GameSocket, SocketEvent};

// ============================================================================
// ConnectionState
// ============================================================================

/// Handshake state of the game connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket bound.
    #[default]
    Disconnected,
    /// Socket bound, waiting for the game's `Hello`.
    AwaitingHandshake,
    /// `Hello` received and answered.
    Handshaked,
}

// ============================================================================
// ConnectionStats
// ============================================================================

/// Snapshot of the event loop's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Current handshake state.
    pub state: ConnectionState,
    /// Redeems awaiting a result.
    pub pending_redeems: usize,
    /// Messages awaiting resend.
    pub queued_messages: usize,
}

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Replace the bound socket.
    Bind(Option<Box<dyn GameSocket>>),
    /// Send a message and report the outcome.
    Send {
        message: Message,
        reply_tx: oneshot::Sender<Result<()>>,
    },
    /// Register a redeem, then transmit it.
    SubmitRedeem {
        message: Message,
        result_tx: oneshot::Sender<Result<RedeemResult>>,
        reply_tx: oneshot::Sender<Result<()>>,
    },
    /// Remove a timed-out correlation entry.
    RemoveCorrelation(Guid),
    /// Report bookkeeping counters.
    Stats(oneshot::Sender<ConnectionStats>),
    /// Shutdown the event loop.
    Shutdown,
}

// ============================================================================
// Connection
// ============================================================================

/// Handle to the game connection event loop.
///
/// # Thread Safety
///
/// `Connection` is `Send + Sync` and cheap to clone. Every clone talks to
/// the same event loop. The loop exits when [`Connection::shutdown`] is
/// called or every handle is dropped.
#[derive(Clone)]
pub struct Connection {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Handshake state published by the event loop.
    state_rx: watch::Receiver<ConnectionState>,
}

impl Connection {
    /// Spawns the event loop with no socket bound.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn spawn(options: BridgeOptions, state_sink: Arc<dyn GameStateSink>) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        let event_loop = EventLoop {
            options,
            command_rx,
            state_tx,
            state_sink,
            socket: None,
            handshaked: false,
            resend_timer: None,
            resend_queue: ResendQueue::new(),
            tracker: RedeemTracker::new(),
        };

        tokio::spawn(event_loop.run());

        Self {
            command_tx,
            state_rx,
        }
    }

    /// Binds a socket, closing any previously bound one.
    ///
    /// `None` unbinds and stops the resend timer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the event loop has shut down.
    pub fn bind_socket(&self, socket: Option<Box<dyn GameSocket>>) -> Result<()> {
        self.command_tx
            .send(ConnectionCommand::Bind(socket))
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Sends a message to the game.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if no open socket is bound
    /// - [`Error::HandshakeIncomplete`] if the message is not `Pong` and
    ///   the game has not said hello
    /// - [`Error::SendFailure`] if the transport rejected the write (the
    ///   message is queued for resend)
    /// - [`Error::ConnectionClosed`] if the event loop has shut down
    pub async fn send(&self, message: Message) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(ConnectionCommand::Send { message, reply_tx })
            .map_err(|_| Error::ConnectionClosed)?;

        reply_rx.await.map_err(|_| Error::ConnectionClosed)?
    }

    /// Submits a redeem message and waits for the game's result.
    ///
    /// The message guid is the correlation key. Transmission failures do
    /// not cancel the redeem: the message is queued for resend and the
    /// result is still awaited until `result_timeout` elapses.
    ///
    /// Dropping the returned future before it settles releases the
    /// transaction id, as a timeout does.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingTransactionId`] if the guid is blank
    /// - [`Error::DuplicateRedeem`] if the guid is already outstanding
    /// - [`Error::RedeemTimeout`] if no result arrives in time
    /// - [`Error::ConnectionClosed`] if the event loop shuts down
    pub async fn submit_redeem(
        &self,
        message: Message,
        result_timeout: Duration,
    ) -> Result<RedeemResult> {
        if message.guid.is_blank() {
            return Err(Error::MissingTransactionId);
        }

        let (result_tx, result_rx) = oneshot::channel();
        let (reply_tx, reply_rx) = oneshot::channel();
        let mut pending = PendingRedeem::new(&self.command_tx, message.guid.clone(), result_rx);

        self.command_tx
            .send(ConnectionCommand::SubmitRedeem {
                message,
                result_tx,
                reply_tx,
            })
            .map_err(|_| Error::ConnectionClosed)?;

        // Registration outcome
        let registered = reply_rx.await.unwrap_or(Err(Error::ConnectionClosed));
        if let Err(e) = registered {
            pending.settled = true;
            return Err(e);
        }

        pending.wait(result_timeout).await
    }

    /// Returns the current handshake state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Returns `true` once the game's `Hello` has been answered.
    #[inline]
    #[must_use]
    pub fn is_handshaked(&self) -> bool {
        self.state() == ConnectionState::Handshaked
    }

    /// Returns a receiver notified on every state change.
    #[inline]
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Returns a snapshot of pending redeems and queued messages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the event loop has shut down.
    pub async fn stats(&self) -> Result<ConnectionStats> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(ConnectionCommand::Stats(reply_tx))
            .map_err(|_| Error::ConnectionClosed)?;

        reply_rx.await.map_err(|_| Error::ConnectionClosed)
    }

    /// Shuts down the event loop.
    ///
    /// The socket is closed and pending redeems fail with
    /// [`Error::ConnectionClosed`].
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }
}

// ============================================================================
// PendingRedeem
// ============================================================================

/// Caller side of a submitted redeem.
///
/// Unless the redeem settled, dropping it closes the result channel and asks
/// the event loop to forget the correlation. This covers timeouts and
/// callers that stop polling.
struct PendingRedeem<'a> {
    command_tx: &'a mpsc::UnboundedSender<ConnectionCommand>,
    guid: Guid,
    result_rx: Option<oneshot::Receiver<Result<RedeemResult>>>,
    settled: bool,
}

impl<'a> PendingRedeem<'a> {
    fn new(
        command_tx: &'a mpsc::UnboundedSender<ConnectionCommand>,
        guid: Guid,
        result_rx: oneshot::Receiver<Result<RedeemResult>>,
    ) -> Self {
        Self {
            command_tx,
            guid,
            result_rx: Some(result_rx),
            settled: false,
        }
    }

    async fn wait(&mut self, result_timeout: Duration) -> Result<RedeemResult> {
        let Some(result_rx) = self.result_rx.as_mut() else {
            return Err(Error::ConnectionClosed);
        };

        match timeout(result_timeout, result_rx).await {
            Ok(Ok(result)) => {
                self.settled = true;
                result
            }
            Ok(Err(_)) => {
                self.settled = true;
                Err(Error::ConnectionClosed)
            }
            Err(_) => {
                let timeout_ms = duration_millis(result_timeout);
                debug!(guid = %self.guid, timeout_ms, "Redeem result timed out");
                Err(Error::redeem_timeout(self.guid.clone(), timeout_ms))
            }
        }
    }
}

impl Drop for PendingRedeem<'_> {
    fn drop(&mut self) {
        // Closed before the removal is queued, so the loop sees it abandoned.
        drop(self.result_rx.take());

        if !self.settled {
            let _ = self
                .command_tx
                .send(ConnectionCommand::RemoveCorrelation(self.guid.clone()));
        }
    }
}

// ============================================================================
// EventLoop
// ============================================================================

/// State owned by the event loop task.
struct EventLoop {
    /// Version and timers.
    options: BridgeOptions,
    /// Commands from [`Connection`] handles.
    command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
    /// Published handshake state.
    state_tx: watch::Sender<ConnectionState>,
    /// External in-game status receiver.
    state_sink: Arc<dyn GameStateSink>,
    /// Currently bound socket.
    socket: Option<Box<dyn GameSocket>>,
    /// Game said hello on the current socket.
    handshaked: bool,
    /// Runs while a socket is bound.
    resend_timer: Option<Interval>,
    /// Messages the transport rejected.
    resend_queue: ResendQueue,
    /// In-flight redeems.
    tracker: RedeemTracker,
}

impl EventLoop {
    /// Runs until shutdown or until every handle is dropped.
    async fn run(mut self) {
        loop {
            tokio::select! {
                // Commands from Rust API
                command = self.command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Bind(socket)) => {
                            self.bind(socket).await;
                        }

                        Some(ConnectionCommand::Send { message, reply_tx }) => {
                            let result = self.send(message).await;
                            let _ = reply_tx.send(result);
                        }

                        Some(ConnectionCommand::SubmitRedeem { message, result_tx, reply_tx }) => {
                            self.handle_submit(message, result_tx, reply_tx).await;
                        }

                        Some(ConnectionCommand::RemoveCorrelation(guid)) => {
                            if self.tracker.abandon(&guid) {
                                debug!(%guid, "Removed abandoned correlation");
                            }
                        }

                        Some(ConnectionCommand::Stats(reply_tx)) => {
                            let _ = reply_tx.send(self.stats());
                        }

                        Some(ConnectionCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            break;
                        }

                        None => {
                            debug!("Command channel closed");
                            break;
                        }
                    }
                }

                // Events from the game socket
                event = next_event(&mut self.socket), if self.socket.is_some() => {
                    self.handle_event(event).await;
                }

                // Resend timer
                _ = next_tick(&mut self.resend_timer), if self.resend_timer.is_some() => {
                    self.resend_one().await;
                }
            }
        }

        self.release_socket().await;

        // Fail all pending redeems on shutdown
        let failed = self.tracker.fail_all(|| Error::ConnectionClosed);
        if failed > 0 {
            debug!(count = failed, "Failed pending redeems on shutdown");
        }
        if !self.resend_queue.is_empty() {
            warn!(
                count = self.resend_queue.len(),
                "Dropping unsent messages on shutdown"
            );
        }

        debug!("Event loop terminated");
    }

    // ========================================================================
    // Socket Lifecycle
    // ========================================================================

    /// Replaces the bound socket.
    async fn bind(&mut self, socket: Option<Box<dyn GameSocket>>) {
        if self.socket.is_some() {
            debug!("Closing previously bound game socket");
            self.release_socket().await;
            self.state_sink.set_ingame(false);
        }

        self.handshaked = false;

        // Handshake replies and pongs answered the previous socket.
        let stale = self
            .resend_queue
            .retain(|message| !matches!(message.body, Body::HelloBack { .. } | Body::Pong));
        if stale > 0 {
            debug!(count = stale, "Dropped queued replies meant for the previous socket");
        }

        match socket {
            Some(socket) => {
                self.socket = Some(socket);
                self.start_resend_timer();
                self.publish(ConnectionState::AwaitingHandshake);
                info!("Game socket bound, awaiting handshake");
            }
            None => {
                self.resend_timer = None;
                self.publish(ConnectionState::Disconnected);
                debug!("Game socket unbound");
            }
        }
    }

    /// Closes and drops the bound socket, if any.
    async fn release_socket(&mut self) {
        if let Some(mut socket) = self.socket.take()
            && let Err(e) = socket.close().await
        {
            warn!(error = %e, "Failed to close game socket");
        }
    }

    fn start_resend_timer(&mut self) {
        let period = self.options.resend_interval;
        let mut timer = interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.resend_timer = Some(timer);
    }

    /// Handles the socket closing, from either side.
    fn handle_close(&mut self, code: Option<u16>, reason: &str) {
        info!(?code, reason, "Game socket closed");

        self.socket = None;
        self.handshaked = false;
        self.resend_timer = None;
        self.state_sink.set_ingame(false);
        self.publish(ConnectionState::Disconnected);
    }

    fn publish(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
    }

    fn stats(&self) -> ConnectionStats {
        ConnectionStats {
            state: *self.state_tx.borrow(),
            pending_redeems: self.tracker.len(),
            queued_messages: self.resend_queue.len(),
        }
    }

    // ========================================================================
    // Inbound
    // ========================================================================

    async fn handle_event(&mut self, event: SocketEvent) {
        match event {
            SocketEvent::Message(text) => self.handle_incoming_message(&text).await,
            SocketEvent::Close { code, reason } => self.handle_close(code, &reason),
            SocketEvent::Error(e) => error!(error = %e, "Game socket error"),
        }
    }

    /// Handles an incoming text message from the game.
    async fn handle_incoming_message(&mut self, text: &str) {
        let message = match Message::decode(text) {
            Ok(message) => message,
            Err(Error::UnknownMessageType { message_type }) => {
                warn!(%message_type, "Ignoring unknown message type");
                return;
            }
            Err(e) => {
                error!(error = %e, text = %text, "Failed to parse game message");
                return;
            }
        };

        trace!(guid = %message.guid, message_type = %message.message_type(), "Message received");

        match message.body {
            Body::Hello { version } => self.handle_hello(&version).await,

            Body::Ping => {
                if let Err(e) = self.send(Message::pong()).await {
                    warn!(error = %e, "Failed to answer ping");
                }
            }

            Body::Result(body) => {
                let result = RedeemResult::new(message.guid, message.timestamp, body);
                let guid = result.guid.clone();
                let success = result.success;

                if self.tracker.resolve(result) {
                    debug!(%guid, success, "Redeem result delivered");
                } else {
                    warn!(%guid, success, "Result for untracked redeem");
                }
            }

            Body::IngameStateChanged { ingame } => {
                debug!(ingame, "Game reported in-game state");
                self.state_sink.set_ingame(ingame);
            }

            other => {
                warn!(message_type = %other.message_type(), "Ignoring unexpected message type from game");
            }
        }
    }

    async fn handle_hello(&mut self, version: &str) {
        let allowed = version == self.options.protocol_version;

        self.handshaked = true;
        self.publish(ConnectionState::Handshaked);

        if allowed {
            info!(version, "Handshake completed");
        } else {
            warn!(
                version,
                expected = %self.options.protocol_version,
                "Handshake completed with mismatched protocol version"
            );
        }

        if let Err(e) = self.send(Message::hello_back(allowed)).await {
            warn!(error = %e, "Failed to send HelloBack");
        }
    }

    // ========================================================================
    // Outbound
    // ========================================================================

    /// Checks that `message` may be written right now.
    fn check_ready(&self, message: &Message) -> Result<()> {
        if !self.socket.as_ref().is_some_and(|socket| socket.is_open()) {
            return Err(Error::NotConnected);
        }

        if !self.handshaked && !matches!(message.body, Body::Pong) {
            return Err(Error::handshake_incomplete(message.message_type()));
        }

        Ok(())
    }

    /// Writes a message, queueing it for resend if the transport fails.
    async fn send(&mut self, message: Message) -> Result<()> {
        self.check_ready(&message)?;

        let text = message.encode()?;
        let Some(socket) = self.socket.as_mut() else {
            return Err(Error::NotConnected);
        };

        if let Err(e) = socket.send(text).await {
            warn!(guid = %message.guid, error = %e, "Send failed, queued for resend");
            let guid = message.guid.clone();
            self.resend_queue.push(message);
            return Err(Error::send_failure(guid, e.to_string()));
        }

        trace!(guid = %message.guid, message_type = %message.message_type(), "Message sent");
        Ok(())
    }

    async fn handle_submit(
        &mut self,
        message: Message,
        result_tx: oneshot::Sender<Result<RedeemResult>>,
        reply_tx: oneshot::Sender<Result<()>>,
    ) {
        let guid = message.guid.clone();

        if let Err(e) = self.tracker.register(message.clone(), result_tx) {
            warn!(%guid, error = %e, "Redeem rejected");
            let _ = reply_tx.send(Err(e));
            return;
        }
        let _ = reply_tx.send(Ok(()));

        debug!(%guid, "Redeem registered");

        match self.check_ready(&message) {
            Ok(()) => {
                // Transport failures are queued inside send.
                if let Err(e) = self.send(message).await {
                    warn!(%guid, error = %e, "Redeem not delivered yet");
                }
            }
            Err(e) => {
                warn!(%guid, error = %e, "Redeem queued until the game is ready");
                self.resend_queue.push(message);
            }
        }
    }

    /// Retries the oldest queued message.
    ///
    /// The head stays queued while it cannot pass the send gate, so order is
    /// kept across reconnects.
    async fn resend_one(&mut self) {
        let Some(head) = self.resend_queue.peek() else {
            return;
        };

        if let Err(e) = self.check_ready(head) {
            trace!(guid = %head.guid, error = %e, "Resend deferred");
            return;
        }

        if let Some(message) = self.resend_queue.drain_one() {
            debug!(
                guid = %message.guid,
                remaining = self.resend_queue.len(),
                "Resending queued message"
            );
            // Failure re-queues at the tail.
            let _ = self.send(message).await;
        }
    }
}

/// Waits for the next socket event. Pending forever without a socket.
async fn next_event(socket: &mut Option<Box<dyn GameSocket>>) -> SocketEvent {
    match socket {
        Some(socket) => socket.recv().await,
        None => std::future::pending().await,
    }
}

/// Waits for the next resend tick. Pending forever without a timer.
async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}

// ============================================================================
// Tests
// ============================================================================
