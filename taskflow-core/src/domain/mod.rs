//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
mod session;
mod state;
mod user;
pub mod result;

pub use account::{Account, AccountType};
pub use session::{AuthEvent, Session};
pub use state::{AppState, StatePatch};
pub use user::User;
