// Runtime memory
//
// Per-step message buffer: persisted history plus everything added during the
// current step. The model only sees `filtered_messages()`, a bounded suffix of the
// history that always keeps the system message and every message added this step.

use crate::config::DEFAULT_CONTEXT_WINDOW_SIZE;
use crate::message::Message;

#[derive(Debug, Clone)]
pub struct RuntimeMemory {
    messages: Vec<Message>,
    context_window_size: usize,
    /// Messages added since the last history load (system message excluded)
    added_since_load: usize,
}

impl RuntimeMemory {
    pub fn new(context_window_size: usize) -> Self {
        Self {
            messages: Vec::new(),
            context_window_size,
            added_since_load: 0,
        }
    }

    pub fn context_window_size(&self) -> usize {
        self.context_window_size
    }

    /// Append persisted history; messages loaded here are subject to windowing
    pub fn load_history(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
        self.added_since_load = 0;
    }

    /// Add a message for the current step.
    ///
    /// A system message replaces the existing one (or is inserted first) and is
    /// never counted as added.
    pub fn add_message(&mut self, message: Message) {
        if message.is_system() {
            match self.messages.first() {
                Some(first) if first.is_system() => self.messages[0] = message,
                _ => self.messages.insert(0, message),
            }
            return;
        }

        self.messages.push(message);
        self.added_since_load += 1;
    }

    pub fn add_messages(&mut self, messages: impl IntoIterator<Item = Message>) {
        for message in messages {
            self.add_message(message);
        }
    }

    pub fn all_messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Messages within the context window
    pub fn filtered_messages(&self) -> Vec<Message> {
        let pinned = usize::from(self.messages.first().is_some_and(Message::is_system));
        let keep_tail = self
            .context_window_size
            .saturating_sub(pinned)
            .max(self.added_since_load);

        let total = self.messages.len();
        if total - pinned <= keep_tail {
            return self.messages.clone();
        }

        // Loaded results whose assistant message fell out of the window would be
        // orphaned; messages added this step are never dropped
        let tail = &self.messages[total - keep_tail..];
        let loaded = keep_tail - self.added_since_load;
        let orphaned = tail[..loaded]
            .iter()
            .take_while(|message| matches!(message, Message::ToolCallResult(_)))
            .count();

        self.messages[..pinned]
            .iter()
            .chain(&tail[orphaned..])
            .cloned()
            .collect()
    }
}

impl Default for RuntimeMemory {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_WINDOW_SIZE)
    }
}
