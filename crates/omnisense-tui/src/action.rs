//! All possible UI actions. Actions are the sole mechanism for state mutation.

use std::sync::Arc;

use omnisense_core::{CallId, ConnectionState, DashboardState, DispatchOutcome};

/// Notification severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A status-bar notice. Replaced by the next one, cleared with Esc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }
}

/// Every state transition in the TUI is expressed as an Action.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    /// Clock tick.
    Tick,
    Render,
    Resize(u16, u16),

    // ── Data Events (from the dashboard) ──────────────────────────
    SnapshotApplied(Arc<DashboardState>),
    ConnectionChanged(ConnectionState),
    DispatchFinished(DispatchOutcome),

    // ── Queue ─────────────────────────────────────────────────────
    ToggleMode,
    SelectNext,
    SelectPrev,
    SelectFirst,
    SelectLast,
    /// Activate the selected card's primary action.
    ActivateSelected,
    EndCall(CallId),

    // ── Overlays ──────────────────────────────────────────────────
    ToggleHelp,
    Notify(Notification),
    DismissNotification,
}
