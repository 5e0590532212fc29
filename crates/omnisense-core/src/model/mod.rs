// ── Dispatch domain model ──
//
// Every type in this module is fully populated. Absence in the wire
// payload is resolved once, by `crate::normalize`, so nothing downstream
// branches on missing data.

pub mod call;
pub mod dashboard;

pub use call::{
    AI_AGENT_SENTINEL, Assignment, CallId, CallSnapshot, CallStatus, Caller, LOCATION_UNKNOWN,
    Location, SUMMARY_IN_PROGRESS, SeverityLevel, TranscriptEntry,
};
pub use dashboard::{DashboardState, Stats};
