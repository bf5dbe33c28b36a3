//! In-memory history adapter
//!
//! Backs the router in headless hosts and tests. Mirrors the browser
//! history contract: push truncates the forward stack, replace swaps the
//! current entry, back/forward move a cursor without dropping entries.

use std::sync::Mutex;

use crate::ports::HistoryBackend;

pub struct MemoryHistory {
    inner: Mutex<HistoryInner>,
}

struct HistoryInner {
    entries: Vec<String>,
    cursor: usize,
}

impl MemoryHistory {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(HistoryInner {
                entries: vec![initial.into()],
                cursor: 0,
            }),
        }
    }

    /// Number of entries currently held (for diagnostics)
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl HistoryBackend for MemoryHistory {
    fn current(&self) -> String {
        let inner = self.inner.lock().unwrap();
        inner.entries[inner.cursor].clone()
    }

    fn push(&self, location: &str) {
        let mut inner = self.inner.lock().unwrap();
        let cursor = inner.cursor;
        inner.entries.truncate(cursor + 1);
        inner.entries.push(location.to_string());
        inner.cursor += 1;
    }

    fn replace(&self, location: &str) {
        let mut inner = self.inner.lock().unwrap();
        let cursor = inner.cursor;
        inner.entries[cursor] = location.to_string();
    }

    fn back(&self) -> Option<String> {
        let mut inner = self.inner.lock().unwrap();
        if inner.cursor == 0 {
            return None;
        }
        inner.cursor -= 1;
        Some(inner.entries[inner.cursor].clone())
    }

    fn forward(&self) -> Option<String> {
        let mut inner = self.inner.lock().unwrap();
        if inner.cursor + 1 >= inner.entries.len() {
            return None;
        }
        inner.cursor += 1;
        Some(inner.entries[inner.cursor].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_back() {
        let history = MemoryHistory::new("/");
        history.push("/a");
        history.push("/b");
        assert_eq!(history.current(), "/b");

        assert_eq!(history.back().as_deref(), Some("/a"));
        assert_eq!(history.back().as_deref(), Some("/"));
        assert_eq!(history.back(), None);
    }

    #[test]
    fn test_push_truncates_forward_stack() {
        let history = MemoryHistory::new("/");
        history.push("/a");
        history.push("/b");
        history.back();
        history.push("/c");

        assert_eq!(history.forward(), None);
        assert_eq!(history.current(), "/c");
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_replace_keeps_length() {
        let history = MemoryHistory::new("/");
        history.push("/a");
        history.replace("/a2");
        assert_eq!(history.current(), "/a2");
        assert_eq!(history.len(), 2);
        assert_eq!(history.back().as_deref(), Some("/"));
    }
}
