// SPDX-License-Identifier: MIT OR Apache-2.0

//! tacnet CLI - play tic-tac-toe against a peer over TCP.
//!
//! One side hosts, the other joins. Moves are typed as `row col`;
//! `reset` starts a new game and `quit` leaves.

mod render;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use tacnet_network::coordinator::{Coordinator, Notification};
use tacnet_network::config;

/// Command-line arguments
#[derive(Parser, Debug)]
#[clap(name = "tacnet", about = "Peer-to-peer tic-tac-toe over TCP", version)]
struct Args {
    /// The role of this instance
    #[clap(short, long, value_enum)]
    role: Role,

    /// Port to bind (host) or connect to (join); defaults to the
    /// configured port
    #[clap(short, long)]
    port: Option<u16>,

    /// Host address to join; defaults to the configured opponent
    #[clap(short, long)]
    opponent: Option<String>,
}

/// Role of this instance
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Role {
    /// Host a new game and wait for a peer
    Host,
    /// Join a hosted game
    Join,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let cfg = config::load_config();
    let port = args.port.unwrap_or(cfg.port);
    let opponent = args.opponent.unwrap_or(cfg.opponent_ip);

    tracing::info!(role = ?args.role, port, "starting");

    let (coordinator, mut notifications) = Coordinator::new();
    match args.role {
        Role::Host => {
            coordinator.host(port).await;
            if let Some(addr) = coordinator.local_addr().await {
                println!("hosting on {addr}");
            }
        }
        Role::Join => {
            println!("joining {opponent}:{port}");
            coordinator.join(&opponent, port).await;
        }
    }
    println!("{}", coordinator.status_text().await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            notification = notifications.recv() => {
                match notification {
                    Some(notification) => {
                        if !handle_notification(&coordinator, notification).await {
                            break;
                        }
                    }
                    None => break,
                }
            }
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if !handle_input(&coordinator, &line).await {
                            break;
                        }
                    }
                    None => {
                        coordinator.quit().await;
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("leaving game");
                coordinator.quit().await;
                break;
            }
        }
    }

    Ok(())
}

/// React to a coordinator notification. Returns false to exit.
async fn handle_notification(coordinator: &Coordinator, notification: Notification) -> bool {
    match notification {
        Notification::ConnectionChanged {
            connected: true,
            identity,
        } => {
            if let Some(identity) = identity {
                println!("connected. you are player {identity}.");
            }
            println!("{}", render::render_board(&coordinator.snapshot().await));
        }
        Notification::ConnectionChanged {
            connected: false, ..
        } => {
            println!("disconnected.");
            return false;
        }
        Notification::MoveApplied { row, col, by } => {
            println!("{by} played at ({row}, {col})");
            println!("{}", render::render_board(&coordinator.snapshot().await));
        }
        Notification::StatusChanged(status) => {
            println!("{status}");
        }
        Notification::TurnChanged(to_move) => {
            let mine = coordinator.identity().await == Some(to_move);
            if mine {
                println!("your turn. enter a move as `row col`.");
            } else {
                println!("waiting for {to_move}...");
            }
        }
        Notification::Error(message) => {
            eprintln!("error: {message}");
        }
        Notification::OpponentQuit => {
            println!("opponent left the game.");
        }
    }
    true
}

/// React to a line of user input. Returns false to exit.
async fn handle_input(coordinator: &Coordinator, line: &str) -> bool {
    let line = line.trim();
    match line {
        "" => {}
        "quit" | "q" => {
            coordinator.quit().await;
            return false;
        }
        "reset" => coordinator.reset().await,
        _ => {
            let mut fields = line.split_whitespace();
            let row = fields.next().and_then(|f| f.parse::<usize>().ok());
            let col = fields.next().and_then(|f| f.parse::<usize>().ok());
            match (row, col, fields.next()) {
                (Some(row), Some(col), None) => {
                    if let Err(e) = coordinator.play(row, col).await {
                        println!("move rejected: {e}");
                    }
                }
                _ => println!("enter a move as `row col`, or `reset` / `quit`"),
            }
        }
    }
    true
}
