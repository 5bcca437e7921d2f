//! The ordered, mutable conversation log.

use super::turn::{Turn, TurnId};
use crate::error::{NeurobotError, Result};

/// Ordered sequence of turns.
///
/// Insertion order is the semantic order of the conversation. Ids are unique
/// at all times, and editing or removing a turn never reorders the others.
/// An empty log is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationLog {
    turns: Vec<Turn>,
}

impl ConversationLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a log seeded with a single model greeting.
    ///
    /// A blank greeting yields an empty log.
    pub fn with_greeting(greeting: &str) -> Self {
        let mut log = Self::new();
        if !greeting.trim().is_empty() {
            log.turns.push(Turn::model(greeting));
        }
        log
    }

    /// Appends a turn at the end of the log.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateTurn` if a turn with the same id is already present.
    pub fn append(&mut self, turn: Turn) -> Result<()> {
        if self.position(&turn.id).is_some() {
            return Err(NeurobotError::DuplicateTurn {
                id: turn.id.to_string(),
            });
        }
        self.turns.push(turn);
        Ok(())
    }

    /// Replaces the text of the turn with the given id.
    ///
    /// Returns `false` (and changes nothing) if no such turn exists.
    pub fn replace_text(&mut self, id: &TurnId, text: impl Into<String>) -> bool {
        match self.turns.iter_mut().find(|turn| &turn.id == id) {
            Some(turn) => {
                turn.text = text.into();
                true
            }
            None => false,
        }
    }

    /// Swaps the turn with the given id for another one, keeping its position.
    ///
    /// Returns `false` if `id` is absent or if `turn` carries an id that is
    /// already used by a different turn.
    pub fn replace_turn(&mut self, id: &TurnId, turn: Turn) -> bool {
        if &turn.id != id && self.position(&turn.id).is_some() {
            return false;
        }
        match self.position(id) {
            Some(index) => {
                self.turns[index] = turn;
                true
            }
            None => false,
        }
    }

    /// Removes the turn with the given id, returning it.
    pub fn remove(&mut self, id: &TurnId) -> Option<Turn> {
        let index = self.position(id)?;
        Some(self.turns.remove(index))
    }

    /// Empties the log.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn get(&self, id: &TurnId) -> Option<&Turn> {
        self.turns.iter().find(|turn| &turn.id == id)
    }

    /// Position of the turn with the given id.
    pub fn position(&self, id: &TurnId) -> Option<usize> {
        self.turns.iter().position(|turn| &turn.id == id)
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Owned copy of the current turns.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }
}

impl<'a> IntoIterator for &'a ConversationLog {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Sender;

    fn ids(log: &ConversationLog) -> Vec<TurnId> {
        log.iter().map(|turn| turn.id.clone()).collect()
    }

    #[test]
    fn test_append_preserves_order() {
        let mut log = ConversationLog::new();
        let first = Turn::user("first");
        let second = Turn::model("second");
        log.append(first.clone()).unwrap();
        log.append(second.clone()).unwrap();

        assert_eq!(ids(&log), vec![first.id, second.id]);
    }

    #[test]
    fn test_append_rejects_duplicate_id() {
        let mut log = ConversationLog::new();
        let turn = Turn::user("hello");
        log.append(turn.clone()).unwrap();

        let err = log.append(turn).unwrap_err();
        assert!(matches!(err, NeurobotError::DuplicateTurn { .. }));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_replace_text_keeps_order_and_count() {
        let mut log = ConversationLog::new();
        let a = Turn::user("a");
        let b = Turn::model("b");
        let c = Turn::user("c");
        for turn in [a.clone(), b.clone(), c.clone()] {
            log.append(turn).unwrap();
        }
        let before = ids(&log);

        assert!(log.replace_text(&b.id, "edited"));

        assert_eq!(ids(&log), before);
        assert_eq!(log.get(&b.id).unwrap().text, "edited");
    }

    #[test]
    fn test_replace_text_missing_id_is_noop() {
        let mut log = ConversationLog::new();
        log.append(Turn::user("a")).unwrap();
        let before = log.clone();

        assert!(!log.replace_text(&TurnId::from("missing"), "x"));
        assert_eq!(log, before);
    }

    #[test]
    fn test_remove_keeps_remaining_order() {
        let mut log = ConversationLog::new();
        let a = Turn::user("a");
        let b = Turn::model("b");
        let c = Turn::user("c");
        for turn in [a.clone(), b.clone(), c.clone()] {
            log.append(turn).unwrap();
        }

        let removed = log.remove(&b.id).unwrap();
        assert_eq!(removed.text, "b");
        assert_eq!(ids(&log), vec![a.id, c.id]);

        // Second removal is a no-op
        assert!(log.remove(&b.id).is_none());
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_replace_turn_in_place() {
        let mut log = ConversationLog::new();
        let user = Turn::user("hi");
        let placeholder = Turn::placeholder();
        let tail = Turn::user("later");
        for turn in [user.clone(), placeholder.clone(), tail.clone()] {
            log.append(turn).unwrap();
        }

        let error_turn = Turn::model("error");
        assert!(log.replace_turn(&placeholder.id, error_turn.clone()));

        assert_eq!(ids(&log), vec![user.id, error_turn.id.clone(), tail.id.clone()]);
        assert!(log.get(&placeholder.id).is_none());

        // Refuses to introduce a duplicate id
        let clash = Turn {
            id: tail.id.clone(),
            ..Turn::user("clash")
        };
        assert!(!log.replace_turn(&error_turn.id, clash));
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_clear_and_greeting() {
        let mut log = ConversationLog::with_greeting("Hello! How can I help?");
        assert_eq!(log.len(), 1);
        assert_eq!(log.last().unwrap().sender, Sender::Model);

        log.clear();
        assert!(log.is_empty());

        assert!(ConversationLog::with_greeting("  ").is_empty());
    }
}
