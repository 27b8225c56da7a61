//! Per-cycle tracking of senders that already received a picture.

use std::collections::HashSet;

/// Senders served during the current posting cycle.
///
/// Inserted by the `!pic` handler, cleared exactly once per cycle by the
/// scheduled posting job. This is intentional rate limiting: a duplicate
/// request within a cycle is silently ignored, not an error.
#[derive(Debug, Default)]
pub struct ServedSet {
    senders: HashSet<String>,
}

impl ServedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `sender` was already served this cycle.
    pub fn contains(&self, sender: &str) -> bool {
        self.senders.contains(sender)
    }

    /// Mark `sender` as served. Returns `false` if it was already present.
    pub fn insert(&mut self, sender: &str) -> bool {
        self.senders.insert(sender.to_string())
    }

    /// Start a fresh per-cycle window for all senders.
    pub fn clear(&mut self) {
        self.senders.clear();
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_set_is_empty() {
        let served = ServedSet::new();
        assert!(served.is_empty());
        assert!(!served.contains("@u:example.org"));
    }

    #[test]
    fn insert_marks_sender_served() {
        let mut served = ServedSet::new();
        assert!(served.insert("@u:example.org"));
        assert!(served.contains("@u:example.org"));
        assert_eq!(served.len(), 1);
    }

    #[test]
    fn duplicate_insert_is_reported() {
        let mut served = ServedSet::new();
        assert!(served.insert("@u:example.org"));
        assert!(!served.insert("@u:example.org"));
        assert_eq!(served.len(), 1);
    }

    #[test]
    fn clear_starts_a_fresh_cycle() {
        let mut served = ServedSet::new();
        served.insert("@u:example.org");
        served.insert("@v:example.org");
        served.clear();
        assert!(served.is_empty());
        assert!(served.insert("@u:example.org"));
    }

    #[test]
    fn senders_are_independent() {
        let mut served = ServedSet::new();
        served.insert("@u:example.org");
        assert!(!served.contains("@v:example.org"));
    }
}
