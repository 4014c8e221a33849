//! Bounded per-conversation message history.

use std::collections::{HashMap, VecDeque};

use log::debug;

use crate::types::{ConversationKey, Turn};

/// Default number of turns kept per conversation (five user/assistant pairs).
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// In-memory rolling history keyed by conversation.
///
/// Each conversation keeps at most `capacity` turns; appending past that evicts
/// the oldest turn first. Entries live for the lifetime of the process.
#[derive(Debug)]
pub struct ConversationStore {
    capacity: usize,
    histories: HashMap<ConversationKey, VecDeque<Turn>>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            histories: HashMap::new(),
        }
    }

    /// Append a turn to the end of the history for `key`.
    pub fn append(&mut self, key: &ConversationKey, turn: Turn) {
        let capacity = self.capacity;
        let history = self
            .histories
            .entry(key.clone())
            .or_insert_with(|| VecDeque::with_capacity(capacity));
        history.push_back(turn);
        while history.len() > capacity {
            history.pop_front();
        }
        debug!("Conversation {} now holds {} turns", key, history.len());
    }

    /// Returns the turns for `key`, oldest first. Unknown keys yield an empty list.
    pub fn get(&self, key: &ConversationKey) -> Vec<Turn> {
        self.histories
            .get(key)
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of conversations seen so far.
    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }
}
