//! Dictionary of legal words.

use crate::error::{ProtocolError, Result};
use std::collections::HashSet;
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// Read-only word set. A disabled dictionary accepts every word; an empty one is disabled.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    words: HashSet<String>,
    enabled: bool,
}

impl Dictionary {
    /// Dictionary that performs no checking
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Dictionary over `words`, checking only if at least one word is given
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: HashSet<String> = words.into_iter().map(Into::into).collect();
        Self {
            enabled: !words.is_empty(),
            words,
        }
    }

    /// Parse one word per line. Line endings are stripped and blank lines skipped.
    pub fn parse(content: &str) -> Self {
        Self::from_words(
            content
                .lines()
                .map(|line| line.trim_end_matches('\r'))
                .filter(|line| !line.is_empty()),
        )
    }

    /// Load from `path`; a missing file yields a disabled dictionary
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let dictionary = Self::parse(&content);
                info!(path = %path.display(), words = dictionary.len(), "Loaded word list");
                Ok(dictionary)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No word list found, word checking disabled");
                Ok(Self::disabled())
            }
            Err(e) => Err(ProtocolError::ConfigError(format!(
                "Failed to read word list {}: {e}",
                path.display()
            ))),
        }
    }

    /// Whether word checking is on
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Exact, case-sensitive membership
    pub fn is_valid(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
