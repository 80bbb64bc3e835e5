//! Structured log event identifiers.

mod session_events;

pub use session_events::SessionEvent;
