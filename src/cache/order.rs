//! Insertion Order Module
//!
//! Tracks key insertion order for iteration and inspection.

use std::collections::{BTreeMap, HashMap};

// == Insertion Order ==
/// Keys in the order they were installed.
///
/// Each key is stamped with an increasing sequence number; `push` and
/// `remove` are O(log n).
///
/// - First = Oldest insertion
/// - Last = Newest insertion (a replaced key moves here)
#[derive(Debug, Default)]
pub struct InsertionOrder {
    by_seq: BTreeMap<u64, String>,
    seq_of: HashMap<String, u64>,
    next_seq: u64,
}

impl InsertionOrder {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Push ==
    /// Records `key` as the newest insertion, dropping any earlier position.
    pub fn push(&mut self, key: &str) {
        let seq = self.next_seq;
        self.next_seq += 1;
        if let Some(old) = self.seq_of.insert(key.to_string(), seq) {
            self.by_seq.remove(&old);
        }
        self.by_seq.insert(seq, key.to_string());
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) {
        if let Some(seq) = self.seq_of.remove(key) {
            self.by_seq.remove(&seq);
        }
    }

    // == Iterate ==
    /// Keys from oldest to newest insertion.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.by_seq.values()
    }

    pub fn len(&self) -> usize {
        self.by_seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_seq.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_seq.clear();
        self.seq_of.clear();
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn keys(order: &InsertionOrder) -> Vec<&str> {
        order.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_push_preserves_insertion_order() {
        let mut order = InsertionOrder::new();
        order.push("a");
        order.push("b");
        order.push("c");

        assert_eq!(keys(&order), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_repush_moves_to_back() {
        let mut order = InsertionOrder::new();
        order.push("a");
        order.push("b");
        order.push("a");

        assert_eq!(keys(&order), vec!["b", "a"]);
        assert_eq!(order.len(), 2);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut order = InsertionOrder::new();
        order.push("a");
        order.push("b");

        order.remove("a");
        order.remove("missing");
        assert_eq!(keys(&order), vec!["b"]);

        order.clear();
        assert!(order.is_empty());
    }

    #[test]
    fn test_large_churn_stays_consistent() {
        let mut order = InsertionOrder::new();
        for i in 0..20_000 {
            order.push(&format!("key{}", i));
        }
        for i in (0..20_000).step_by(2) {
            order.remove(&format!("key{}", i));
        }
        order.push("key1");

        assert_eq!(order.len(), 10_000);
        assert_eq!(order.iter().next().map(String::as_str), Some("key3"));
        assert_eq!(order.iter().last().map(String::as_str), Some("key1"));
    }
}
