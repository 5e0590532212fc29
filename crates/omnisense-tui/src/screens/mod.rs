//! Screen implementations. Each screen is a top-level Component.

pub mod queue;
