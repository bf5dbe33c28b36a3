//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. The session
//! store is the single writer of application state; the monitor and
//! doctor observe it.

mod doctor;
mod monitor;
pub mod onboarding;
mod session;

pub use doctor::{CheckResult, DoctorResult, DoctorService, DoctorSummary};
pub use monitor::{SessionMonitor, DEFAULT_POLL_INTERVAL};
pub use session::SessionStore;
