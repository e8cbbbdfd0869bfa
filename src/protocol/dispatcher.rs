use crate::game::Board;
use crate::protocol::command::{Command, INVALID_COMMAND, NO_OUTPUT};
use crate::utils::Metrics;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::debug;

/// What the session loop should do after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Encrypt and send this reply, then read the next command
    Reply(Cow<'static, str>),
    /// End the session without replying
    Quit,
}

/// Routes parsed commands to the shared board.
/// Static replies are borrowed, avoiding allocations for the common cases.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    board: Arc<Board>,
    metrics: Arc<Metrics>,
}

impl Dispatcher {
    pub fn new(board: Arc<Board>, metrics: Arc<Metrics>) -> Self {
        Self { board, metrics }
    }

    pub fn board(&self) -> &Arc<Board> {
        &self.board
    }

    /// Parse and run one request line
    pub fn handle_line(&self, line: &str) -> Outcome {
        self.dispatch(&Command::parse(line))
    }

    pub fn dispatch(&self, command: &Command) -> Outcome {
        self.metrics.command_received();
        debug!(%command, "Dispatching command");

        let placed = match command {
            Command::Across { row, col, word } => self.board.place_across(*row, *col, word),
            Command::Down { row, col, word } => self.board.place_down(*row, *col, word),
            Command::Board => return Outcome::Reply(Cow::Owned(self.board.render())),
            Command::Quit => return Outcome::Quit,
            Command::Invalid => {
                self.metrics.command_invalid();
                return Outcome::Reply(Cow::Borrowed(INVALID_COMMAND));
            }
        };

        self.metrics.placement(placed);
        if placed {
            Outcome::Reply(Cow::Borrowed(NO_OUTPUT))
        } else {
            self.metrics.command_invalid();
            Outcome::Reply(Cow::Borrowed(INVALID_COMMAND))
        }
    }
}
