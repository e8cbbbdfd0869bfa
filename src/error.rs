//! # Error Types
//!
//! Error handling for the word-board server.
//!
//! This module defines every error that can surface while serving a
//! connection or starting the server, from low-level I/O up to
//! authentication failures.
//!
//! ## Error Categories
//! - **I/O Errors**: Network and file system failures, peer disconnects
//! - **Framing Errors**: Oversized frames, malformed length-prefixed strings
//! - **Cryptographic Errors**: RSA and session cipher failures, bad key material
//! - **Handshake Errors**: Unknown user, challenge mismatch
//! - **Configuration Errors**: Invalid or unreadable configuration and data files
//!
//! Command-level problems (bad verb, rejected placement) are not errors: the
//! dispatcher answers them with `"Invalid command\n"` and the session goes on.
//!
//! ## Example Usage
//! ```rust
//! use scrabble_server::error::{ProtocolError, Result};
//! use std::fs::File;
//! use std::io::Read;
//! use tracing::{info, error};
//!
//! fn read_file(path: &str) -> Result<String> {
//!     let mut file = File::open(path).map_err(ProtocolError::Io)?;
//!     let mut contents = String::new();
//!     file.read_to_string(&mut contents).map_err(ProtocolError::Io)?;
//!     Ok(contents)
//! }
//!
//! fn main() {
//!     match read_file("passwd.txt") {
//!         Ok(contents) => info!(contents, "Successfully read file"),
//!         Err(e) => error!(error=%e, "Error reading file"),
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Connection errors
    pub const ERR_TRUNCATED_FRAME: &str = "Peer closed the connection mid-frame";

    /// Cryptographic errors
    pub const ERR_RANDOM_FAILED: &str = "System random number generator unavailable";
    pub const ERR_BAD_SESSION_KEY: &str = "Session key must be exactly 16 bytes";

    /// Handshake-specific errors
    pub const ERR_UNKNOWN_USER: &str = "Unknown username";
    pub const ERR_CHALLENGE_MISMATCH: &str = "Challenge response does not match";
    pub const ERR_OUT_OF_ORDER: &str = "Handshake step out of order";
    pub const ERR_ALREADY_REJECTED: &str = "Handshake already rejected";
}

/// ProtocolError is the primary error type for all server and client operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Frame too large: {0} bytes")]
    OversizedFrame(usize),

    #[error("Invalid UTF string: {0}")]
    InvalidString(String),

    #[error("Decryption failed")]
    DecryptionFailure,

    #[error("Encryption failed")]
    EncryptionFailure,

    #[error("Key material error: {0}")]
    KeyMaterial(String),

    #[error("Handshake failed: {0}")]
    HandshakeError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl From<rsa::Error> for ProtocolError {
    fn from(err: rsa::Error) -> Self {
        ProtocolError::KeyMaterial(err.to_string())
    }
}

impl ProtocolError {
    /// Whether this error is the peer going away rather than misbehaving
    pub fn is_disconnect(&self) -> bool {
        match self {
            ProtocolError::ConnectionClosed => true,
            ProtocolError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
