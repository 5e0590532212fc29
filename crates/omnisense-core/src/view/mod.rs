// ── Render planning ──
//
// `render` is a pure function from one normalized snapshot to a
// `RenderPlan`: everything the presentation layer draws, already
// classified, ranked and formatted. The presentation layer never looks
// at `DashboardState` directly.

mod diff;

pub use diff::{CardMove, PlanDiff, diff};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::classify::{ColorTier, Department, IconTag, classify};
use crate::model::{CallId, CallSnapshot, CallStatus, DashboardState, SeverityLevel};
use crate::queue::{self, DisplayMode, PendingClosurePolicy, RankedCall};

/// Summary placeholder in the active view.
pub const SUMMARY_PLACEHOLDER_ACTIVE: &str = "Processing details...";

/// Summary placeholder in the all-calls view.
pub const SUMMARY_PLACEHOLDER_ALL: &str = "No details available.";

pub const SIDEBAR_HEADER: [&str; 3] = ["PRIORITY", "DEPARTMENT", "STATUS"];

pub const PATTERN_PANEL_TITLE: &str = "Pattern Alerts";

pub const NO_PATTERNS_MESSAGE: &str = "No significant patterns detected";

// ── Options ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub mode: DisplayMode,
    pub pending_closure: PendingClosurePolicy,
}

// ── Plan ─────────────────────────────────────────────────────────────

/// Everything one frame of the dashboard shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderPlan {
    pub mode: DisplayMode,
    pub counters: Counters,
    pub cards: Vec<CallCard>,
    pub sidebar: SidebarPanel,
    pub patterns: PatternPanel,
}

impl RenderPlan {
    pub fn card(&self, id: &CallId) -> Option<&CallCard> {
        self.cards.iter().find(|c| &c.id == id)
    }

    pub fn position(&self, id: &CallId) -> Option<usize> {
        self.cards.iter().position(|c| &c.id == id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub active: u64,
    pub pending: u64,
    pub completed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallCard {
    pub id: CallId,
    pub call_number: Option<u64>,
    /// 1-based position in this plan.
    pub rank: usize,
    /// Border / accent color.
    pub tier: ColorTier,
    pub icon: IconTag,
    pub department: Department,
    pub department_label: String,
    /// Upper-cased emergency type with `_` replaced by spaces.
    pub type_label: String,
    pub score: u8,
    /// `"95/100"`.
    pub score_label: String,
    pub summary: String,
    pub caller_phone: String,
    pub caller_name: Option<String>,
    pub address: String,
    pub badge: Option<Badge>,
    pub action: PrimaryAction,
    pub style: CardStyle,
    pub severity_level: SeverityLevel,
    pub status: CallStatus,
}

/// Assignment badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub label: String,
}

/// The one operator action a card offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimaryAction {
    /// Pick up the call. Disabled on archived cards.
    Call { enabled: bool },
    /// Acknowledge a finished call; dispatches `end_call`.
    EndCase,
}

impl PrimaryAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Call { .. } => "Call",
            Self::EndCase => "End Case",
        }
    }

    pub fn is_enabled(self) -> bool {
        match self {
            Self::Call { enabled } => enabled,
            Self::EndCase => true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardStyle {
    #[default]
    Normal,
    Muted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidebarPanel {
    pub header: [String; 3],
    pub rows: Vec<SidebarRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidebarRow {
    pub call_id: CallId,
    pub tier: ColorTier,
    pub priority: String,
    pub department: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternPanel {
    Alerts { title: String, items: Vec<String> },
    Clear { message: String },
}

// ── Regions ──────────────────────────────────────────────────────────

/// Named areas of the dashboard layout. A layout may omit any of them.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Region {
    ActiveCount,
    PendingCount,
    CompletedCount,
    CallList,
    Sidebar,
    PatternAlerts,
}

impl Region {
    /// Every region, in layout order.
    pub fn all() -> Vec<Self> {
        Self::iter().collect()
    }
}

// ── Rendering ────────────────────────────────────────────────────────

pub fn render(state: &DashboardState, options: &RenderOptions) -> RenderPlan {
    let calls = state.calls();
    let ranked = queue::rank(&calls, options.mode, options.pending_closure);
    let side = queue::sidebar(&calls, options.pending_closure);

    RenderPlan {
        mode: options.mode,
        counters: Counters {
            active: state.stats.total_active,
            pending: state.stats.queued,
            completed: state.stats.completed,
        },
        cards: ranked.iter().map(|r| card(r, options.mode)).collect(),
        sidebar: sidebar_panel(&side),
        patterns: pattern_panel(&state.patterns),
    }
}

fn card(ranked: &RankedCall<'_>, mode: DisplayMode) -> CallCard {
    let call = ranked.call;
    let class = classify(&call.emergency_type, call.severity_score);

    let (badge, action, style) = if call.archived {
        (None, PrimaryAction::Call { enabled: false }, CardStyle::Muted)
    } else if call.is_pending_closure() {
        (None, PrimaryAction::EndCase, muted_if(ranked.muted))
    } else {
        (
            Some(Badge {
                label: call.assigned_to.badge_label(),
            }),
            PrimaryAction::Call { enabled: true },
            muted_if(ranked.muted),
        )
    };

    CallCard {
        id: call.id.clone(),
        call_number: call.call_number,
        rank: ranked.rank,
        tier: class.tier,
        icon: class.icon,
        department: class.department,
        department_label: class.department.to_string(),
        type_label: type_label(&call.emergency_type),
        score: call.severity_score,
        score_label: format!("{}/100", call.severity_score),
        summary: summary_line(call, mode),
        caller_phone: call.caller.phone_number.clone(),
        caller_name: call.caller.name.clone(),
        address: call.location.address.clone(),
        badge,
        action,
        style,
        severity_level: call.severity_level,
        status: call.status,
    }
}

fn muted_if(muted: bool) -> CardStyle {
    if muted {
        CardStyle::Muted
    } else {
        CardStyle::Normal
    }
}

/// `"cardiac_arrest"` → `"CARDIAC ARREST"`.
pub fn type_label(emergency_type: &str) -> String {
    emergency_type.replace('_', " ").to_uppercase()
}

/// Backend summary, else the latest transcript line quoted, else a
/// placeholder that depends on the view.
pub fn summary_line(call: &CallSnapshot, mode: DisplayMode) -> String {
    if let Some(summary) = call.ready_summary() {
        return summary.to_owned();
    }
    if let Some(entry) = call.latest_transcript() {
        return format!("\"{}\"", entry.text);
    }
    match mode {
        DisplayMode::Active => SUMMARY_PLACEHOLDER_ACTIVE.into(),
        DisplayMode::All => SUMMARY_PLACEHOLDER_ALL.into(),
    }
}

fn sidebar_panel(ranked: &[RankedCall<'_>]) -> SidebarPanel {
    SidebarPanel {
        header: SIDEBAR_HEADER.map(str::to_owned),
        rows: ranked
            .iter()
            .map(|r| {
                let class = classify(&r.call.emergency_type, r.call.severity_score);
                SidebarRow {
                    call_id: r.call.id.clone(),
                    tier: class.tier,
                    priority: r.call.severity_level.to_string().to_uppercase(),
                    department: class.department.to_string().to_uppercase(),
                    status: r.call.status.to_string().to_uppercase(),
                }
            })
            .collect(),
    }
}

fn pattern_panel(patterns: &[String]) -> PatternPanel {
    if patterns.is_empty() {
        PatternPanel::Clear {
            message: NO_PATTERNS_MESSAGE.into(),
        }
    } else {
        PatternPanel::Alerts {
            title: PATTERN_PANEL_TITLE.into(),
            items: patterns.to_vec(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::{LOCATION_UNKNOWN, TranscriptEntry};
    use crate::normalize::normalize;

    fn two_call_state() -> DashboardState {
        normalize(&json!({
            "active_calls": [
                {
                    "id": "c1", "severity_score": 95, "status": "ACTIVE",
                    "emergency_type": "cardiac_arrest", "assigned_to": null,
                    "caller": { "phone_number": "555-1" }
                },
                {
                    "id": "c2", "severity_score": 40, "status": "ACTIVE",
                    "emergency_type": "fire_small", "assigned_to": "OP7",
                    "caller": { "phone_number": "555-2" }
                }
            ]
        }))
    }

    #[test]
    fn two_active_calls_render_in_score_order() {
        let plan = render(&two_call_state(), &RenderOptions::default());
        assert_eq!(plan.cards.len(), 2);

        let c1 = &plan.cards[0];
        assert_eq!(c1.id.as_str(), "c1");
        assert_eq!(c1.rank, 1);
        assert_eq!(c1.tier, ColorTier::Critical);
        assert_eq!(c1.badge.as_ref().unwrap().label, "AI Agent");
        assert_eq!(c1.department, Department::Health);
        assert_eq!(c1.type_label, "CARDIAC ARREST");
        assert_eq!(c1.score_label, "95/100");
        assert_eq!(c1.caller_phone, "555-1");

        let c2 = &plan.cards[1];
        assert_eq!(c2.id.as_str(), "c2");
        assert_eq!(c2.rank, 2);
        assert_eq!(c2.tier, ColorTier::Normal);
        assert_eq!(c2.badge.as_ref().unwrap().label, "Officer OP7");
        assert_eq!(c2.department, Department::Fire);
        assert_eq!(c2.type_label, "FIRE SMALL");
    }

    #[test]
    fn rendering_twice_is_identical() {
        let state = two_call_state();
        let options = RenderOptions {
            mode: DisplayMode::All,
            pending_closure: PendingClosurePolicy::AllCalls,
        };
        let first = render(&state, &options);
        let second = render(&state, &options);
        assert_eq!(first, second);
        assert!(diff(&first, &second).is_empty());
    }

    #[test]
    fn sparse_snapshot_renders_with_defaults() {
        let state = normalize(&json!({
            "active_calls": [{ "id": "c9", "severity_score": 55, "location": {} }]
        }));
        let plan = render(&state, &RenderOptions::default());

        assert_eq!(plan.counters, Counters::default());
        assert_eq!(plan.cards.len(), 1);
        assert_eq!(plan.cards[0].address, LOCATION_UNKNOWN);
        assert_eq!(plan.sidebar.rows.len(), 1);
        assert_eq!(
            plan.patterns,
            PatternPanel::Clear {
                message: NO_PATTERNS_MESSAGE.into()
            }
        );
    }

    #[test]
    fn empty_payload_renders_empty_plan() {
        let plan = render(&normalize(&json!({})), &RenderOptions::default());
        assert!(plan.cards.is_empty());
        assert!(plan.sidebar.rows.is_empty());
        assert_eq!(plan.counters, Counters::default());
    }

    #[test]
    fn completed_unarchived_shows_end_case_without_badge() {
        let state = normalize(&json!({
            "active_calls": [{ "id": "c1", "severity_score": 30, "status": "ACTIVE" }],
            "completed_calls": [{ "id": "c3", "severity_score": 85, "status": "COMPLETED" }]
        }));
        let plan = render(
            &state,
            &RenderOptions {
                mode: DisplayMode::All,
                pending_closure: PendingClosurePolicy::AllCalls,
            },
        );
        let done = plan.card(&CallId::new("c3")).unwrap();
        assert_eq!(done.badge, None);
        assert_eq!(done.action, PrimaryAction::EndCase);
        assert_eq!(done.action.label(), "End Case");
        assert_eq!(plan.position(&CallId::new("c3")), Some(1));
    }

    #[test]
    fn primary_queue_policy_offers_end_case_in_active_view() {
        let state = normalize(&json!({
            "completed_calls": [{ "id": "c3", "severity_score": 85, "status": "COMPLETED" }]
        }));
        let plan = render(
            &state,
            &RenderOptions {
                mode: DisplayMode::Active,
                pending_closure: PendingClosurePolicy::PrimaryQueue,
            },
        );
        assert_eq!(plan.cards[0].action, PrimaryAction::EndCase);
        assert_eq!(plan.cards[0].style, CardStyle::Normal);
    }

    #[test]
    fn archived_card_is_muted_with_disabled_call() {
        let state = normalize(&json!({
            "completed_calls": [{
                "id": "c4", "severity_score": 85, "status": "COMPLETED",
                "archived": true, "assigned_to": "OP2"
            }]
        }));
        let all = RenderOptions {
            mode: DisplayMode::All,
            pending_closure: PendingClosurePolicy::PrimaryQueue,
        };
        let plan = render(&state, &all);
        let card = &plan.cards[0];
        assert_eq!(card.badge, None);
        assert_eq!(card.style, CardStyle::Muted);
        assert_eq!(card.action, PrimaryAction::Call { enabled: false });
        assert!(!card.action.is_enabled());

        let active = render(&state, &RenderOptions::default());
        assert!(active.cards.is_empty());
        assert!(active.sidebar.rows.is_empty());
    }

    #[test]
    fn summary_priority() {
        let mut call = crate::queue::tests::call("s", 10, CallStatus::Active);
        assert_eq!(summary_line(&call, DisplayMode::Active), SUMMARY_PLACEHOLDER_ACTIVE);
        assert_eq!(summary_line(&call, DisplayMode::All), SUMMARY_PLACEHOLDER_ALL);

        call.transcript.push(TranscriptEntry {
            text: "there is smoke".into(),
            timestamp: None,
            role: Some("caller".into()),
        });
        call.transcript.push(TranscriptEntry {
            text: "second floor".into(),
            timestamp: None,
            role: Some("caller".into()),
        });
        assert_eq!(summary_line(&call, DisplayMode::Active), "\"second floor\"");

        call.summary = "Kitchen fire, one trapped".into();
        assert_eq!(summary_line(&call, DisplayMode::Active), "Kitchen fire, one trapped");
    }

    #[test]
    fn sidebar_rows_are_upper_cased() {
        let state = normalize(&json!({
            "active_calls": [{
                "id": "c1", "severity_score": 90, "status": "IN_PROGRESS",
                "severity_level": "critical", "emergency_type": "house_fire"
            }]
        }));
        let plan = render(&state, &RenderOptions::default());
        assert_eq!(plan.sidebar.header, SIDEBAR_HEADER.map(str::to_owned));
        let row = &plan.sidebar.rows[0];
        assert_eq!(row.priority, "CRITICAL");
        assert_eq!(row.department, "FIRE");
        assert_eq!(row.status, "ACTIVE");
    }

    #[test]
    fn patterns_render_as_titled_list() {
        let state = normalize(&json!({ "patterns": ["3 calls reporting fire in Downtown"] }));
        let plan = render(&state, &RenderOptions::default());
        assert_eq!(
            plan.patterns,
            PatternPanel::Alerts {
                title: PATTERN_PANEL_TITLE.into(),
                items: vec!["3 calls reporting fire in Downtown".into()],
            }
        );
    }

    #[test]
    fn counters_come_from_stats() {
        let state = normalize(&json!({
            "stats": { "total_active": 3, "queued": 1, "completed": 12 }
        }));
        let plan = render(&state, &RenderOptions::default());
        assert_eq!(
            plan.counters,
            Counters {
                active: 3,
                pending: 1,
                completed: 12,
            }
        );
    }

    #[test]
    fn regions_parse_from_kebab_case() {
        use std::str::FromStr;
        assert_eq!(Region::from_str("pattern-alerts").unwrap(), Region::PatternAlerts);
        assert_eq!(Region::CallList.to_string(), "call-list");
    }
}
