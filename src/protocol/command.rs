//! Text commands carried inside encrypted frames.
//!
//! ```text
//! across <row> <col> <word>
//! down <row> <col> <word>
//! board
//! quit
//! ```
//! Tokens are separated by whitespace. Anything that does not fit one of the
//! shapes above parses as `Command::Invalid`; parsing never fails.

use std::fmt;

/// Reply to any command that could not be carried out
pub const INVALID_COMMAND: &str = "Invalid command\n";

/// Reply to a successful placement; clients print nothing for it
pub const NO_OUTPUT: &str = "No Output";

/// A parsed request from an authenticated client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Across { row: usize, col: usize, word: String },
    Down { row: usize, col: usize, word: String },
    Board,
    Quit,
    Invalid,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let mut tokens = line.split_whitespace();
        let Some(verb) = tokens.next() else {
            return Command::Invalid;
        };
        let args: Vec<&str> = tokens.collect();

        match (verb, args.as_slice()) {
            ("across", [row, col, word]) => Self::placement(row, col, word)
                .map_or(Command::Invalid, |(row, col, word)| Command::Across { row, col, word }),
            ("down", [row, col, word]) => Self::placement(row, col, word)
                .map_or(Command::Invalid, |(row, col, word)| Command::Down { row, col, word }),
            ("board", []) => Command::Board,
            // trailing tokens after quit are ignored
            ("quit", _) => Command::Quit,
            _ => Command::Invalid,
        }
    }

    fn placement(row: &str, col: &str, word: &str) -> Option<(usize, usize, String)> {
        Some((row.parse().ok()?, col.parse().ok()?, word.to_string()))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Across { row, col, word } => write!(f, "across {row} {col} {word}"),
            Command::Down { row, col, word } => write!(f, "down {row} {col} {word}"),
            Command::Board => f.write_str("board"),
            Command::Quit => f.write_str("quit"),
            Command::Invalid => f.write_str("<invalid>"),
        }
    }
}
