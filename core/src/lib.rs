// SPDX-License-Identifier: MIT OR Apache-2.0

//! tacnet core - game rules and board logic
//!
//! This crate provides the core game functionality including:
//! - Tic-tac-toe board representation and manipulation
//! - Move validation and win/draw detection
//! - Shared player and status types used by the network layer

#![deny(unsafe_code)]
#![deny(clippy::all)]

pub mod board;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use board::{Board, BOARD_SIZE};

/// Player mark in a tic-tac-toe game (X or O)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    /// X player (the host; moves first)
    X,
    /// O player (the joiner)
    O,
}

impl Player {
    /// Returns the opposing player
    pub fn opponent(&self) -> Self {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Player::X => write!(f, "X"),
            Player::O => write!(f, "O"),
        }
    }
}

/// Outcome of a game, recomputed after every applied move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// The game is still being played
    InProgress,
    /// The given player completed a row, column or diagonal
    Won(Player),
    /// The board is full with no winner
    Draw,
}

impl GameStatus {
    /// Whether the game has reached a terminal state
    pub fn is_over(&self) -> bool {
        *self != GameStatus::InProgress
    }
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameStatus::InProgress => write!(f, "game in progress"),
            GameStatus::Won(player) => write!(f, "player {player} wins!"),
            GameStatus::Draw => write!(f, "it's a draw!"),
        }
    }
}

/// Errors that can occur during game play
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    /// The coordinates fall outside the board
    #[error("coordinates ({row}, {col}) are outside the board")]
    OutOfRange {
        /// Requested row
        row: usize,
        /// Requested column
        col: usize,
    },

    /// The target cell is already occupied
    #[error("cell ({row}, {col}) is already occupied")]
    Occupied {
        /// Requested row
        row: usize,
        /// Requested column
        col: usize,
    },

    /// The game has already ended
    #[error("the game is over")]
    GameOver,

    /// It is not this player's turn to move
    #[error("not your turn")]
    NotYourTurn,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opponent_is_symmetric() {
        assert_eq!(Player::X.opponent(), Player::O);
        assert_eq!(Player::O.opponent(), Player::X);
        assert_eq!(Player::X.opponent().opponent(), Player::X);
    }

    #[test]
    fn status_terminal_check() {
        assert!(!GameStatus::InProgress.is_over());
        assert!(GameStatus::Won(Player::X).is_over());
        assert!(GameStatus::Won(Player::O).is_over());
        assert!(GameStatus::Draw.is_over());
    }

    #[test]
    fn status_messages() {
        assert_eq!(GameStatus::Won(Player::X).to_string(), "player X wins!");
        assert_eq!(GameStatus::Draw.to_string(), "it's a draw!");
    }
}
