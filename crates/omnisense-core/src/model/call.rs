// ── Call domain types ──

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Summary value the backend sends before a real summary exists.
pub const SUMMARY_IN_PROGRESS: &str = "Processing...";

/// Address shown when the backend has no location for a call.
pub const LOCATION_UNKNOWN: &str = "Location Unknown";

/// `assigned_to` value meaning "not yet handed to a human operator".
pub const AI_AGENT_SENTINEL: &str = "AI_AGENT";

/// Backend call identifier. Stable across snapshots of the same call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(String);

impl CallId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for CallId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Lifecycle status. Transitions only move forward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum CallStatus {
    Incoming,
    Queued,
    #[strum(to_string = "ACTIVE", serialize = "IN_PROGRESS")]
    Active,
    Completed,
    Dropped,
}

impl CallStatus {
    /// Position in the lifecycle. Completed and Dropped share the last stage.
    pub fn stage(self) -> u8 {
        match self {
            Self::Incoming => 0,
            Self::Queued => 1,
            Self::Active => 2,
            Self::Completed | Self::Dropped => 3,
        }
    }

    /// Completed or dropped: no longer part of the actionable queue.
    pub fn is_terminal(self) -> bool {
        self.stage() == 3
    }
}

/// Backend-assessed severity level, independent of the local color tier.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SeverityLevel {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Who is handling the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Assignment {
    AiAgent,
    Operator(String),
}

impl Assignment {
    /// Label of the assignment badge on a call card.
    pub fn badge_label(&self) -> String {
        match self {
            Self::AiAgent => "AI Agent".into(),
            Self::Operator(id) => format!("Officer {id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub phone_number: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub text: String,
    pub timestamp: Option<String>,
    pub role: Option<String>,
}

/// One in-flight (or finished) emergency call, as of one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSnapshot {
    pub id: CallId,
    /// Backend sequence number, shown as `#N`.
    pub call_number: Option<u64>,
    pub emergency_type: String,
    /// Always within `0..=100`.
    pub severity_score: u8,
    pub severity_level: SeverityLevel,
    pub status: CallStatus,
    pub assigned_to: Assignment,
    /// Operator-acknowledged closure. Implies `status` is terminal.
    pub archived: bool,
    pub caller: Caller,
    pub location: Location,
    pub transcript: Vec<TranscriptEntry>,
    pub summary: String,
}

impl CallSnapshot {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Completed (or dropped) but not yet acknowledged by an operator.
    pub fn is_pending_closure(&self) -> bool {
        self.is_terminal() && !self.archived
    }

    /// The backend summary, unless it is still the in-progress sentinel.
    pub fn ready_summary(&self) -> Option<&str> {
        if self.summary == SUMMARY_IN_PROGRESS || self.summary.trim().is_empty() {
            None
        } else {
            Some(&self.summary)
        }
    }

    pub fn latest_transcript(&self) -> Option<&TranscriptEntry> {
        self.transcript.last()
    }
}
