//! # Protocol Layer
//!
//! Authentication handshake and the command protocol spoken once a session
//! key is in place.
//!
//! ## Components
//! - **Handshake**: server and client halves of the challenge-response exchange
//! - **Command**: parsing of `across`, `down`, `board` and `quit`
//! - **Dispatcher**: applies commands to the board and builds replies

pub mod command;
pub mod dispatcher;
pub mod handshake;


pub use command::{Command, INVALID_COMMAND, NO_OUTPUT};
pub use dispatcher::{Dispatcher, Outcome};
pub use handshake::{ClientHandshake, HandshakeState, ServerHandshake};
