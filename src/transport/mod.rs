//! # Transport Layer
//!
//! TCP accept loop, per-connection handler and the matching client.

pub mod client;
pub mod server;

pub use client::{load_private_key, Client};
pub use server::{handle_connection, serve, start_server, ServerContext};
