//! History backend port
//!
//! The router's sole persistence mechanism for the current path. In a
//! browser this is the History API; headless hosts use the in-memory
//! adapter.

/// Navigation history (pushState/replaceState/popstate analog)
pub trait HistoryBackend: Send + Sync {
    /// The current location (path + search + hash)
    fn current(&self) -> String;

    /// Push a new entry, truncating any forward entries
    fn push(&self, location: &str);

    /// Replace the current entry in place
    fn replace(&self, location: &str);

    /// Traverse one entry back; returns the new current location,
    /// or `None` when already at the oldest entry
    fn back(&self) -> Option<String>;

    /// Traverse one entry forward; returns the new current location,
    /// or `None` when already at the newest entry
    fn forward(&self) -> Option<String>;
}
