// SPDX-License-Identifier: MIT OR Apache-2.0

//! tacnet network - TCP turn synchronization layer
//!
//! This crate provides the networking functionality including:
//! - Line-oriented wire protocol (MOVE / RESET / QUIT)
//! - Single-use TCP session with host and join roles
//! - Turn coordinator enforcing whose-turn-is-it across both peers
//! - Network configuration loading

#![deny(unsafe_code)]

pub mod config;
pub mod coordinator;
pub mod protocol;
pub mod session;

pub use config::{load_config, NetConfig};
pub use coordinator::{Coordinator, Notification, Phase};
pub use protocol::{Command, DecodeError};
pub use session::{Session, SessionError, SessionEvent, SessionStatus};
