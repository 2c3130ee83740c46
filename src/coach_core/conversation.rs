//! ConversationLog — append-only chat history for the active session.
//!
//! Responsibilities:
//! - Own every ConversationTurn, in order
//! - Hand the inference client a fixed sliding window of recent turns
//!
//! Older turns are simply not sent. There is no summarization and nothing is
//! persisted beyond the session.

use crate::inference::types::{HistoryEntry, Role};

use super::types::ConversationTurn;

/// Number of most recent turns sent as context when not configured.
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Greeting the log is seeded with.
pub const GREETING: &str = "I'm ready. Let's get to work. Ask me about training programming, \
Hyrox strategy, recovery protocols, or nutrition. No filter, just results.";

/// Appended when the model decides to build a program.
pub const BUILDER_NOTICE: &str = "**Initializing Program Builder...**";

/// Appended when a conversational turn fails.
pub const APOLOGY: &str =
    "Error connecting to the coaching mainframe. Please check your connection.";

/// Ordered, append-only list of turns.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    turns: Vec<ConversationTurn>,
}

impl ConversationLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// A log seeded with the coach's greeting.
    pub fn with_greeting() -> Self {
        let mut log = Self::new();
        log.append(ConversationTurn::new(Role::Model, GREETING));
        log
    }

    /// Append a turn and return a reference to it.
    pub fn append(&mut self, turn: ConversationTurn) -> &ConversationTurn {
        tracing::debug!(
            id = %turn.id,
            role = turn.role.as_str(),
            preview = truncate_utf8(&turn.text, 80),
            "turn appended"
        );
        self.turns.push(turn);
        &self.turns[self.turns.len() - 1]
    }

    pub fn push(&mut self, role: Role, text: impl Into<String>) -> &ConversationTurn {
        self.append(ConversationTurn::new(role, text))
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    /// The most recent `window` turns as context entries, oldest first.
    pub fn history_window(&self, window: usize) -> Vec<HistoryEntry> {
        let start = self.turns.len().saturating_sub(window);
        self.turns[start..]
            .iter()
            .map(|t| HistoryEntry {
                role: t.role,
                text: t.text.clone(),
            })
            .collect()
    }
}

/// Truncate a string to at most `max_bytes` on a char boundary. For log previews.
pub(crate) fn truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
