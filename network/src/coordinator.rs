// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn coordinator: glues the board engine to the connection session.
//!
//! The coordinator keeps the board behind a single mutex so a local
//! move and a concurrently arriving remote move can never interleave,
//! validates remote moves against the board's own bookkeeping before
//! applying them, and pushes everything the collaborator needs to know
//! through one ordered notification channel.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use tacnet_core::{Board, GameError, GameStatus, Player};

use crate::protocol::Command;
use crate::session::{Session, SessionEvent};

/// Phase of the turn state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No peer link; moves are rejected
    NotConnected,
    /// Hosting or joining is in flight
    WaitingForPeer,
    /// The local player moves next
    MyTurn,
    /// The remote player moves next
    PeerTurn,
    /// The game reached a terminal status; only reset is accepted
    GameOver,
}

/// Notifications delivered, in order, to the collaborator (UI or CLI).
///
/// The collaborator pulls these on its own schedule; no delivery
/// thread is assumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A move was applied to the local board
    MoveApplied {
        /// Board row
        row: usize,
        /// Board column
        col: usize,
        /// The player who made the move
        by: Player,
    },
    /// The game status changed (a win, a draw, or back in progress
    /// after a reset)
    StatusChanged(GameStatus),
    /// The turn changed; `to_move` plays next
    TurnChanged(Player),
    /// The peer link came up or went down
    ConnectionChanged {
        /// Whether the link is up
        connected: bool,
        /// Local identity while the link was up
        identity: Option<Player>,
    },
    /// Something went wrong; the session may still be usable
    Error(String),
    /// The peer left the game
    OpponentQuit,
}

struct State {
    board: Board,
    phase: Phase,
    identity: Option<Player>,
}

impl State {
    fn new() -> Self {
        Self {
            board: Board::new(),
            phase: Phase::NotConnected,
            identity: None,
        }
    }

    fn notify(&self, notify: &mpsc::UnboundedSender<Notification>, notification: Notification) {
        let _ = notify.send(notification);
    }

    fn on_connected(&mut self, identity: Player, notify: &mpsc::UnboundedSender<Notification>) {
        tracing::info!(%identity, "peer link established");
        self.identity = Some(identity);
        self.board.reset();
        self.phase = if identity == Player::X {
            Phase::MyTurn
        } else {
            Phase::PeerTurn
        };
        self.notify(
            notify,
            Notification::ConnectionChanged {
                connected: true,
                identity: Some(identity),
            },
        );
        self.notify(notify, Notification::TurnChanged(self.board.to_move()));
    }

    fn on_remote_move(
        &mut self,
        row: usize,
        col: usize,
        notify: &mpsc::UnboundedSender<Notification>,
    ) {
        if self.phase != Phase::PeerTurn {
            tracing::warn!(row, col, phase = ?self.phase, "discarding remote move out of turn");
            self.notify(
                notify,
                Notification::Error("received a move out of turn".to_string()),
            );
            return;
        }
        let Some(identity) = self.identity else {
            tracing::warn!("remote move without an identity");
            return;
        };
        // The board's own bookkeeping is authoritative: the mover must
        // be the peer, the cell empty and the coordinates in range.
        if self.board.to_move() != identity.opponent() {
            tracing::warn!(row, col, "remote move does not match the board's mover");
            self.notify(
                notify,
                Notification::Error("received a move out of turn".to_string()),
            );
            return;
        }

        match self.board.apply_move(row, col) {
            Ok(()) => {
                let by = identity.opponent();
                tracing::debug!(row, col, %by, "applied remote move");
                self.notify(notify, Notification::MoveApplied { row, col, by });
                self.after_applied_move(notify, Phase::MyTurn);
            }
            Err(e) => {
                tracing::warn!(row, col, error = %e, "discarding illegal remote move");
                self.notify(
                    notify,
                    Notification::Error(format!("illegal move from peer: {e}")),
                );
            }
        }
    }

    /// Common tail of a successfully applied move: either the game is
    /// over, or the turn passes to `next_phase`.
    fn after_applied_move(&mut self, notify: &mpsc::UnboundedSender<Notification>, next_phase: Phase) {
        let status = self.board.status();
        if status.is_over() {
            self.phase = Phase::GameOver;
            self.notify(notify, Notification::StatusChanged(status));
        } else {
            self.phase = next_phase;
            self.notify(notify, Notification::TurnChanged(self.board.to_move()));
        }
    }

    fn apply_reset(&mut self, notify: &mpsc::UnboundedSender<Notification>) {
        tracing::info!("resetting game");
        self.board.reset();
        self.notify(notify, Notification::StatusChanged(GameStatus::InProgress));
        if let Some(identity) = self.identity {
            self.phase = if identity == Player::X {
                Phase::MyTurn
            } else {
                Phase::PeerTurn
            };
            self.notify(notify, Notification::TurnChanged(self.board.to_move()));
        }
    }

    fn on_link_down(&mut self) {
        self.phase = Phase::NotConnected;
        self.identity = None;
    }
}

/// Drain session events into the shared state, one at a time.
async fn pump_events(
    mut session_rx: mpsc::UnboundedReceiver<SessionEvent>,
    state: Arc<Mutex<State>>,
    notify: mpsc::UnboundedSender<Notification>,
) {
    while let Some(event) = session_rx.recv().await {
        let mut state = state.lock().await;
        match event {
            SessionEvent::Connected { identity } => state.on_connected(identity, &notify),
            SessionEvent::MoveReceived { row, col } => state.on_remote_move(row, col, &notify),
            SessionEvent::ResetReceived => state.apply_reset(&notify),
            SessionEvent::OpponentQuit => {
                state.notify(&notify, Notification::OpponentQuit);
                state.on_link_down();
            }
            SessionEvent::Error(message) => {
                state.notify(&notify, Notification::Error(message));
            }
            SessionEvent::Disconnected { identity } => {
                state.notify(
                    &notify,
                    Notification::ConnectionChanged {
                        connected: false,
                        identity,
                    },
                );
                state.on_link_down();
            }
        }
    }
    tracing::debug!("session event pump finished");
}

/// The network game: board, session and turn state machine.
///
/// Must be created inside a tokio runtime; the session event pump runs
/// as a background task for the coordinator's lifetime.
pub struct Coordinator {
    state: Arc<Mutex<State>>,
    session: Session,
    notify: mpsc::UnboundedSender<Notification>,
    _pump: JoinHandle<()>,
}

impl Coordinator {
    /// Create a coordinator and the receiver for its notifications.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (session, session_rx) = Session::new();
        let (notify, notify_rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(State::new()));
        let pump = tokio::spawn(pump_events(session_rx, Arc::clone(&state), notify.clone()));
        (
            Self {
                state,
                session,
                notify,
                _pump: pump,
            },
            notify_rx,
        )
    }

    /// Start hosting on the given port (0 picks an ephemeral port).
    pub async fn host(&self, port: u16) {
        {
            let mut state = self.state.lock().await;
            if state.phase != Phase::NotConnected {
                tracing::warn!(phase = ?state.phase, "host rejected, game already active");
                let _ = self
                    .notify
                    .send(Notification::Error("a game is already active".to_string()));
                return;
            }
            state.board.reset();
            state.phase = Phase::WaitingForPeer;
        }
        self.session.listen(port).await;
    }

    /// Join a host at `host:port`.
    pub async fn join(&self, host: &str, port: u16) {
        {
            let mut state = self.state.lock().await;
            if state.phase != Phase::NotConnected {
                tracing::warn!(phase = ?state.phase, "join rejected, game already active");
                let _ = self
                    .notify
                    .send(Notification::Error("a game is already active".to_string()));
                return;
            }
            state.board.reset();
            state.phase = Phase::WaitingForPeer;
        }
        self.session.connect(host, port).await;
    }

    /// Make a local move.
    ///
    /// Rejected synchronously, with no state change, unless it is the
    /// local player's turn and the board accepts the move. On success
    /// the move is sent to the peer; a send failure is surfaced as an
    /// error notification, not a rejection.
    pub async fn play(&self, row: usize, col: usize) -> Result<(), GameError> {
        let mut state = self.state.lock().await;
        match state.phase {
            Phase::MyTurn => {}
            Phase::GameOver => return Err(GameError::GameOver),
            _ => return Err(GameError::NotYourTurn),
        }
        let Some(me) = state.identity else {
            return Err(GameError::NotYourTurn);
        };

        state.board.apply_move(row, col)?;
        tracing::debug!(row, col, %me, "applied local move");

        if let Err(e) = self.session.send(&Command::Move { row, col }).await {
            tracing::warn!(row, col, error = %e, "failed to send move");
            let _ = self
                .notify
                .send(Notification::Error(format!("failed to send move: {e}")));
        }

        state.notify(&self.notify, Notification::MoveApplied { row, col, by: me });
        state.after_applied_move(&self.notify, Phase::PeerTurn);
        Ok(())
    }

    /// Start a new game. During an active connection the RESET command
    /// is sent to the peer first, then the local board resets and turn
    /// ownership is recomputed (X moves first again).
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        if state.identity.is_some() {
            if let Err(e) = self.session.send(&Command::Reset).await {
                tracing::warn!(error = %e, "failed to send reset");
                let _ = self
                    .notify
                    .send(Notification::Error(format!("failed to send reset: {e}")));
            }
        }
        state.apply_reset(&self.notify);
    }

    /// Leave the game, notifying the peer.
    pub async fn quit(&self) {
        self.session.close(true).await;
    }

    /// Current phase of the turn state machine
    pub async fn phase(&self) -> Phase {
        self.state.lock().await.phase
    }

    /// Local identity, if connected
    pub async fn identity(&self) -> Option<Player> {
        self.state.lock().await.identity
    }

    /// Independent copy of the board grid
    pub async fn snapshot(&self) -> tacnet_core::board::Grid {
        self.state.lock().await.board.snapshot()
    }

    /// Current game status
    pub async fn status(&self) -> GameStatus {
        self.state.lock().await.board.status()
    }

    /// Address the session listener is bound to, once hosting
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.session.local_addr().await
    }

    /// Human-facing status line for the collaborator to display
    pub async fn status_text(&self) -> String {
        let state = self.state.lock().await;
        match state.phase {
            Phase::NotConnected => "not connected. host or join a game.".to_string(),
            Phase::WaitingForPeer => "waiting for a peer...".to_string(),
            Phase::MyTurn | Phase::PeerTurn => {
                let me = state
                    .identity
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "?".to_string());
                if state.phase == Phase::MyTurn {
                    format!("you are {me}. your turn.")
                } else {
                    format!("you are {me}. opponent's turn.")
                }
            }
            Phase::GameOver => state.board.status().to_string(),
        }
    }
}
