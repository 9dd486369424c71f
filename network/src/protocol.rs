// SPDX-License-Identifier: MIT OR Apache-2.0

//! Line-oriented wire protocol shared by both peers.
//!
//! One command per newline-terminated frame, fields separated by `:`.
//! `MOVE:row:col` carries a move, `RESET` announces a new game and
//! `QUIT` announces that the peer is leaving.

use thiserror::Error;

/// Field separator inside a frame
const DELIMITER: char = ':';

/// A command as transmitted on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// The peer played at (row, col)
    Move {
        /// Board row
        row: usize,
        /// Board column
        col: usize,
    },
    /// The peer requests or announces a new game
    Reset,
    /// The peer is leaving; the session should close
    Quit,
}

/// Errors produced while decoding a frame
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The command name is not part of the protocol
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    /// The payload does not match the command's expected shape
    #[error("malformed payload: {0:?}")]
    MalformedPayload(String),
}

impl Command {
    /// Encode the command as a single line, without the terminator.
    ///
    /// Never fails: coordinates are plain integers and command names
    /// contain no delimiter.
    pub fn encode(&self) -> String {
        match self {
            Command::Move { row, col } => format!("MOVE{DELIMITER}{row}{DELIMITER}{col}"),
            Command::Reset => "RESET".to_string(),
            Command::Quit => "QUIT".to_string(),
        }
    }

    /// Decode a raw line into a command.
    ///
    /// The command name is matched case-insensitively. A `MOVE` payload
    /// must split into exactly two integer fields; anything else is a
    /// decode failure that callers log and discard without touching the
    /// connection.
    pub fn decode(line: &str) -> Result<Self, DecodeError> {
        let line = line.trim_end();
        let (name, payload) = match line.split_once(DELIMITER) {
            Some((name, payload)) => (name, Some(payload)),
            None => (line, None),
        };

        match name.to_ascii_uppercase().as_str() {
            "MOVE" => {
                let payload =
                    payload.ok_or_else(|| DecodeError::MalformedPayload(line.to_string()))?;
                let mut fields = payload.split(DELIMITER);
                let row = fields.next().and_then(|f| f.parse::<usize>().ok());
                let col = fields.next().and_then(|f| f.parse::<usize>().ok());
                match (row, col, fields.next()) {
                    (Some(row), Some(col), None) => Ok(Command::Move { row, col }),
                    _ => Err(DecodeError::MalformedPayload(line.to_string())),
                }
            }
            "RESET" => Ok(Command::Reset),
            "QUIT" => Ok(Command::Quit),
            other => Err(DecodeError::UnknownCommand(other.to_string())),
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encode_produces_expected_frames() {
        assert_eq!(Command::Move { row: 2, col: 0 }.encode(), "MOVE:2:0");
        assert_eq!(Command::Reset.encode(), "RESET");
        assert_eq!(Command::Quit.encode(), "QUIT");
    }

    #[test]
    fn decode_is_case_insensitive() {
        assert_eq!(
            Command::decode("move:1:2").unwrap(),
            Command::Move { row: 1, col: 2 }
        );
        assert_eq!(Command::decode("reset").unwrap(), Command::Reset);
        assert_eq!(Command::decode("Quit").unwrap(), Command::Quit);
    }

    #[test]
    fn decode_strips_trailing_carriage_return() {
        assert_eq!(
            Command::decode("MOVE:0:0\r").unwrap(),
            Command::Move { row: 0, col: 0 }
        );
    }

    #[test]
    fn unknown_commands_are_rejected() {
        assert!(matches!(
            Command::decode("PING"),
            Err(DecodeError::UnknownCommand(_))
        ));
        assert!(matches!(
            Command::decode(""),
            Err(DecodeError::UnknownCommand(_))
        ));
        assert!(matches!(
            Command::decode("CONNECT:1"),
            Err(DecodeError::UnknownCommand(_))
        ));
    }

    #[test]
    fn malformed_move_payloads_are_rejected() {
        for frame in ["MOVE", "MOVE:1", "MOVE:1:2:3", "MOVE:a:b", "MOVE:1:-2", "MOVE::"] {
            assert!(
                matches!(
                    Command::decode(frame),
                    Err(DecodeError::MalformedPayload(_))
                ),
                "frame {frame:?} should not decode"
            );
        }
    }

    proptest! {
        #[test]
        fn move_roundtrip(row in 0usize..3, col in 0usize..3) {
            let cmd = Command::Move { row, col };
            prop_assert_eq!(Command::decode(&cmd.encode()).unwrap(), cmd);
        }
    }

    #[test]
    fn payloadless_roundtrip() {
        for cmd in [Command::Reset, Command::Quit] {
            assert_eq!(Command::decode(&cmd.encode()).unwrap(), cmd);
        }
    }
}
