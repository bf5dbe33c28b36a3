//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - REST client for the hosted auth/data service
//! - In-memory backend for demo mode and trait-level test mocking
//! - In-memory history for headless hosts

pub mod history;
pub mod memory;
pub mod rest;

pub use history::MemoryHistory;
pub use memory::MemoryBackend;
pub use rest::RestBackend;
