// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection session: owns the TCP socket, runs the receive loop and
//! reports everything that happens on the wire through one ordered
//! event channel.
//!
//! A session is single-use: it hosts or joins exactly one peer and any
//! disconnect is terminal. Every transport failure is converted into a
//! [`SessionEvent`]; nothing propagates out of the background tasks.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use tacnet_core::Player;

use crate::protocol::Command;

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No session has been started yet
    Idle,
    /// Waiting for a peer to connect to our listener
    Listening,
    /// An outbound connection attempt is in flight
    Connecting,
    /// The peer link is established
    Connected,
    /// The session ended; a new one may be started
    Closed,
}

/// Events delivered, in order, to the session's single consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The peer link is up and the local identity is fixed
    Connected {
        /// Identity assigned to this side (host X, joiner O)
        identity: Player,
    },
    /// The peer played at (row, col)
    MoveReceived {
        /// Board row
        row: usize,
        /// Board column
        col: usize,
    },
    /// The peer requested a new game
    ResetReceived,
    /// The peer left the game
    OpponentQuit,
    /// A transport or usage error; the session state is unchanged
    /// unless a `Disconnected` event follows
    Error(String),
    /// The session closed, carrying the identity that was active
    /// immediately before closing
    Disconnected {
        /// Identity held while the session was connected, if any
        identity: Option<Player>,
    },
}

/// Errors returned directly to `send` callers
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session is not connected
    #[error("not connected")]
    NotConnected,

    /// The write failed; the connection is left open and the failure
    /// is also surfaced as a `SessionEvent::Error`
    #[error("send failed: {0}")]
    SendFailed(String),
}

struct Inner {
    status: SessionStatus,
    identity: Option<Player>,
    writer: Option<OwnedWriteHalf>,
    handshake_task: Option<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
}

/// Shared handles passed to the background tasks.
#[derive(Clone)]
struct SessionCtx {
    inner: Arc<Mutex<Inner>>,
    events: mpsc::UnboundedSender<SessionEvent>,
    running: Arc<watch::Sender<bool>>,
}

impl SessionCtx {
    fn emit(&self, event: SessionEvent) {
        // The consumer may already be gone during shutdown.
        let _ = self.events.send(event);
    }

    fn is_running(&self) -> bool {
        *self.running.borrow()
    }

    /// Install the established stream, fix the local identity and start
    /// the receive loop.
    async fn attach(&self, stream: TcpStream, identity: Player) {
        let peer = stream.peer_addr().ok();
        let (read_half, write_half) = stream.into_split();
        {
            let mut inner = self.inner.lock().await;
            if !self.is_running() {
                // close() won the race; drop the stream.
                tracing::debug!("session closed before the handshake finished");
                return;
            }
            inner.writer = Some(write_half);
            inner.identity = Some(identity);
            inner.status = SessionStatus::Connected;
        }

        let ctx = self.clone();
        tokio::spawn(async move {
            ctx.receive_loop(read_half).await;
        });

        tracing::info!(?peer, %identity, "peer connected");
        self.emit(SessionEvent::Connected { identity });
    }

    /// Read newline-delimited frames until the peer goes away or the
    /// session is closed from our side.
    async fn receive_loop(&self, read_half: OwnedReadHalf) {
        let mut lines = BufReader::new(read_half).lines();
        let mut running_rx = self.running.subscribe();

        loop {
            let frame = tokio::select! {
                line = lines.next_line() => line,
                _ = running_rx.wait_for(|running| !running) => {
                    tracing::debug!("receive loop stopped");
                    return;
                }
            };

            match frame {
                Ok(Some(line)) => match Command::decode(&line) {
                    Ok(Command::Move { row, col }) => {
                        tracing::debug!(row, col, "received move");
                        self.emit(SessionEvent::MoveReceived { row, col });
                    }
                    Ok(Command::Reset) => {
                        tracing::debug!("received reset");
                        self.emit(SessionEvent::ResetReceived);
                    }
                    Ok(Command::Quit) => {
                        tracing::info!("peer quit");
                        self.emit(SessionEvent::OpponentQuit);
                        self.teardown(false).await;
                        return;
                    }
                    Err(e) => {
                        // Malformed frames are dropped; the connection
                        // stays open.
                        tracing::warn!(frame = %line, error = %e, "discarding frame");
                    }
                },
                Ok(None) => {
                    if self.is_running() {
                        tracing::warn!("peer closed the stream");
                        self.emit(SessionEvent::Error("connection lost: peer closed".to_string()));
                        self.emit(SessionEvent::OpponentQuit);
                        self.teardown(false).await;
                    }
                    return;
                }
                Err(e) => {
                    if self.is_running() {
                        tracing::warn!(error = %e, "network read error");
                        self.emit(SessionEvent::Error(format!("connection lost: {e}")));
                        self.emit(SessionEvent::OpponentQuit);
                        self.teardown(false).await;
                    }
                    return;
                }
            }
        }
    }

    /// Tear the session down. Idempotent; safe to call from the receive
    /// loop or from the caller side. Every release step is best-effort
    /// and failures are logged, never propagated.
    async fn teardown(&self, notify_peer: bool) {
        // Clear the flag first so a blocked read woken by the shutdown
        // treats it as a graceful stop, not a reportable failure.
        self.running.send_replace(false);

        let mut inner = self.inner.lock().await;
        if matches!(inner.status, SessionStatus::Idle | SessionStatus::Closed) {
            return;
        }
        tracing::info!("closing session");

        if notify_peer && inner.status == SessionStatus::Connected {
            if let Some(writer) = inner.writer.as_mut() {
                let line = format!("{}\n", Command::Quit.encode());
                if let Err(e) = writer.write_all(line.as_bytes()).await {
                    tracing::debug!(error = %e, "quit notification failed");
                }
            }
        }

        if let Some(task) = inner.handshake_task.take() {
            task.abort();
        }
        if let Some(mut writer) = inner.writer.take() {
            if let Err(e) = writer.shutdown().await {
                tracing::debug!(error = %e, "socket shutdown failed");
            }
        }

        inner.status = SessionStatus::Closed;
        let identity = inner.identity.take();
        drop(inner);

        self.emit(SessionEvent::Disconnected { identity });
        tracing::info!("session closed");
    }
}

/// A single peer-to-peer game session over TCP.
pub struct Session {
    ctx: SessionCtx,
}

impl Session {
    /// Create an idle session and the receiver for its events.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (running, _) = watch::channel(false);
        let session = Self {
            ctx: SessionCtx {
                inner: Arc::new(Mutex::new(Inner {
                    status: SessionStatus::Idle,
                    identity: None,
                    writer: None,
                    handshake_task: None,
                    local_addr: None,
                })),
                events,
                running: Arc::new(running),
            },
        };
        (session, events_rx)
    }

    /// Start hosting: bind the port and accept exactly one peer in the
    /// background. On accept this side becomes player X.
    ///
    /// Bind failures and a session that is already active are reported
    /// as events, never returned.
    pub async fn listen(&self, port: u16) {
        let mut inner = self.ctx.inner.lock().await;
        if !matches!(inner.status, SessionStatus::Idle | SessionStatus::Closed) {
            tracing::warn!(status = ?inner.status, "listen rejected, session already active");
            self.ctx
                .emit(SessionEvent::Error("a session is already active".to_string()));
            return;
        }

        let listener = match TcpListener::bind(("0.0.0.0", port)).await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!(port, error = %e, "failed to bind");
                inner.status = SessionStatus::Closed;
                self.ctx
                    .emit(SessionEvent::Error(format!("failed to bind port {port}: {e}")));
                self.ctx.emit(SessionEvent::Disconnected { identity: None });
                return;
            }
        };

        inner.local_addr = listener.local_addr().ok();
        inner.status = SessionStatus::Listening;
        self.ctx.running.send_replace(true);
        tracing::info!(addr = ?inner.local_addr, "listening, waiting for a peer");

        let ctx = self.ctx.clone();
        inner.handshake_task = Some(tokio::spawn(async move {
            let mut running_rx = ctx.running.subscribe();
            let accepted = tokio::select! {
                accepted = listener.accept() => Some(accepted),
                _ = running_rx.wait_for(|running| !running) => {
                    tracing::debug!("listener cancelled");
                    None
                }
            };
            match accepted {
                Some(Ok((stream, _))) => ctx.attach(stream, Player::X).await,
                Some(Err(e)) => {
                    if ctx.is_running() {
                        tracing::error!(error = %e, "accept failed");
                        ctx.emit(SessionEvent::Error(format!("accept failed: {e}")));
                        ctx.teardown(false).await;
                    }
                }
                None => {}
            }
        }));
    }

    /// Start joining: connect to the host in the background. On success
    /// this side becomes player O.
    pub async fn connect(&self, host: &str, port: u16) {
        let mut inner = self.ctx.inner.lock().await;
        if !matches!(inner.status, SessionStatus::Idle | SessionStatus::Closed) {
            tracing::warn!(status = ?inner.status, "connect rejected, session already active");
            self.ctx
                .emit(SessionEvent::Error("a session is already active".to_string()));
            return;
        }

        inner.status = SessionStatus::Connecting;
        self.ctx.running.send_replace(true);
        let addr = format!("{host}:{port}");
        tracing::info!(%addr, "connecting to host");

        let ctx = self.ctx.clone();
        inner.handshake_task = Some(tokio::spawn(async move {
            match TcpStream::connect(&addr).await {
                Ok(stream) => ctx.attach(stream, Player::O).await,
                Err(e) => {
                    if ctx.is_running() {
                        tracing::error!(%addr, error = %e, "connect failed");
                        ctx.emit(SessionEvent::Error(format!("could not connect to {addr}: {e}")));
                        ctx.teardown(false).await;
                    }
                }
            }
        }));
    }

    /// Write one command line to the peer.
    ///
    /// A write failure does not close the connection; it is returned to
    /// the caller and also surfaced as an error event. Writes are
    /// serialized, so lines never interleave on the wire.
    pub async fn send(&self, command: &Command) -> Result<(), SessionError> {
        let mut inner = self.ctx.inner.lock().await;
        if inner.status != SessionStatus::Connected {
            tracing::warn!(command = %command, "send while not connected");
            return Err(SessionError::NotConnected);
        }
        let writer = inner.writer.as_mut().ok_or(SessionError::NotConnected)?;

        let line = format!("{}\n", command.encode());
        tracing::debug!(command = %command, "sending");
        if let Err(e) = writer.write_all(line.as_bytes()).await {
            tracing::warn!(command = %command, error = %e, "send failed");
            self.ctx
                .emit(SessionEvent::Error(format!("failed to send {command}: {e}")));
            return Err(SessionError::SendFailed(e.to_string()));
        }
        Ok(())
    }

    /// Close the session. Idempotent: closing an idle or already-closed
    /// session does nothing and emits nothing. With `notify_peer` a
    /// QUIT line is sent best-effort before tearing down.
    pub async fn close(&self, notify_peer: bool) {
        self.ctx.teardown(notify_peer).await;
    }

    /// Current lifecycle state
    pub async fn status(&self) -> SessionStatus {
        self.ctx.inner.lock().await.status
    }

    /// Identity assigned to this side, if connected
    pub async fn identity(&self) -> Option<Player> {
        self.ctx.inner.lock().await.identity
    }

    /// Address the listener is bound to, once `listen` has run
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.ctx.inner.lock().await.local_addr
    }
}
