//! Ordered chat history for one interactive session.

use askdb_types::llm::{Message, MessageRole};

/// Append-only list of turns, optionally led by a single system turn.
///
/// Turns are never reordered. The only removals are rolling back a failed
/// exchange ([`Conversation::truncate`]) and [`Conversation::reset`], which
/// keeps the system turn.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system(prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![Message::system(prompt)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.turns.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn has_system(&self) -> bool {
        self.turns
            .first()
            .is_some_and(|m| m.role == MessageRole::System)
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.turns
            .first()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
    }

    /// Drop every turn after the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.turns.truncate(len);
    }

    /// Drop all turns except the system turn.
    pub fn reset(&mut self) {
        let keep = usize::from(self.has_system());
        self.turns.truncate(keep);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_preserves_order() {
        let mut c = Conversation::with_system("sys");
        c.push(Message::user("q"));
        c.push(Message::assistant("SELECT 1"));
        let roles: Vec<_> = c.messages().iter().map(|m| m.role.clone()).collect();
        assert_eq!(
            roles,
            vec![MessageRole::System, MessageRole::User, MessageRole::Assistant]
        );
        assert_eq!(c.system_prompt(), Some("sys"));
    }

    #[test]
    fn test_reset_keeps_system_turn() {
        let mut c = Conversation::with_system("sys");
        c.push(Message::user("q"));
        c.push(Message::assistant("a"));
        c.reset();
        assert_eq!(c.len(), 1);
        assert!(c.has_system());
    }

    #[test]
    fn test_reset_without_system_clears_all() {
        let mut c = Conversation::new();
        c.push(Message::user("q"));
        c.reset();
        assert!(c.is_empty());
        assert_eq!(c.system_prompt(), None);
    }

    #[test]
    fn test_truncate_rolls_back() {
        let mut c = Conversation::with_system("sys");
        let mark = c.len();
        c.push(Message::user("q"));
        c.truncate(mark);
        assert_eq!(c.len(), 1);
    }
}
