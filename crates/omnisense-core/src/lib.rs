// omnisense-core: Normalization, ranking and render planning between omnisense-api and the TUI.

pub mod classify;
pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod normalize;
pub mod queue;
pub mod store;
pub mod stream;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use classify::{Classification, ColorTier, Department, IconTag, classify};
pub use config::{DashboardConfig, TlsVerification};
pub use controller::{ConnectionState, Dashboard, DispatchOutcome};
pub use error::CoreError;
pub use normalize::normalize;
pub use queue::{DisplayMode, PendingClosurePolicy, RankedCall, SIDEBAR_LIMIT};
pub use store::SnapshotStore;
pub use stream::SnapshotStream;
pub use view::{
    Badge, CallCard, CardStyle, Counters, PatternPanel, PlanDiff, PrimaryAction, Region,
    RenderOptions, RenderPlan, SidebarPanel, SidebarRow, diff, render,
};

pub use model::{
    Assignment, CallId, CallSnapshot, CallStatus, Caller, DashboardState, Location,
    SeverityLevel, Stats, TranscriptEntry,
};

// Transport types consumers configure through `DashboardConfig`.
pub use omnisense_api::client::CALL_ID_PLACEHOLDER;
pub use omnisense_api::{Endpoints, HealthReport, ReconnectConfig};
