//! # Scrabble Server
//!
//! A multi-client word-board server. Each client proves who it is with an
//! RSA challenge-response handshake, receives a fresh session key and then
//! sends encrypted commands that place words on one shared board.
//!
//! ## Layers
//! - [`core`]: length-prefixed frames and the 2-byte-length string primitive
//! - [`protocol`]: handshake state machines, command parsing and dispatch
//! - [`game`]: the board and its dictionary
//! - [`auth`]: registered users and their public keys
//! - [`service`]: the encrypted session channel
//! - [`transport`]: TCP server and client
//! - [`utils`]: crypto primitives, metrics and logging setup
//!
//! ## Example
//! ```no_run
//! use scrabble_server::auth::UserRegistry;
//! use scrabble_server::config::NetworkConfig;
//! use scrabble_server::game::{Board, Dictionary};
//! use scrabble_server::transport::{start_server, ServerContext};
//! use std::sync::Arc;
//!
//! # async fn run() -> scrabble_server::error::Result<()> {
//! let config = NetworkConfig::default();
//! let registry = UserRegistry::load(&config.server.users_file)?;
//! let board = Board::new(15, 15, Dictionary::load(&config.game.words_file)?);
//! let ctx = Arc::new(ServerContext::new(registry, board, &config.server));
//! start_server(&config.server.address, ctx).await
//! # }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod auth;
pub mod config;
pub mod core;
pub mod error;
pub mod game;
pub mod protocol;
pub mod service;
pub mod transport;
pub mod utils;

pub use error::{ProtocolError, Result};
