//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod auth_provider;
mod directory;
mod history;

pub use auth_provider::AuthProvider;
pub use directory::WorkspaceDirectory;
pub use history::HistoryBackend;
