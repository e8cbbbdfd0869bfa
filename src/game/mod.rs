//! # Game State
//!
//! The single shared board and the read-only dictionary it consults.
//!
//! ## Components
//! - **Board**: lock-guarded grid with all-or-nothing word placement
//! - **Dictionary**: word set loaded at startup; absent file disables checking

pub mod board;
pub mod dictionary;

pub use board::{Board, Direction, WORD_LIMIT};
pub use dictionary::Dictionary;
