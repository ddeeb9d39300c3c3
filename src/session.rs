// src/session.rs
// Per-connection session state: a fresh opaque identity plus the single
// conversation history for that connection. Created at accept, dropped at
// disconnect; nothing persists across connections.

use uuid::Uuid;

use crate::llm::Message;

pub struct SessionContext {
    session_id: String,
    history: Vec<Message>,
    /// Sliding window over the history, counted in messages. Trimming
    /// removes whole user/assistant pairs so the window never starts
    /// mid-exchange.
    history_max_messages: usize,
}

impl SessionContext {
    pub fn new(history_max_messages: usize) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            history: Vec::new(),
            history_max_messages,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Append one completed exchange: the user transcript, then the
    /// assistant reply, in that order. Called only after a fully completed
    /// turn so aborted turns leave the history untouched.
    pub fn append_exchange(&mut self, transcript: &str, reply: &str) {
        self.history.push(Message::user(transcript));
        self.history.push(Message::assistant(reply));

        if self.history_max_messages >= 2 {
            while self.history.len() > self.history_max_messages {
                self.history.drain(..2);
            }
        }
    }
}
