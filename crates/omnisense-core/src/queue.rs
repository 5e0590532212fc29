// ── Queue ranking ──
//
// Deterministic ordering of calls for the primary list and the sidebar.
// Ranks are positions in the current output, recomputed on every call;
// they are never stored or used as identifiers.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::model::CallSnapshot;

/// Number of calls shown in the sidebar summary.
pub const SIDEBAR_LIMIT: usize = 5;

/// Which calls the primary list shows.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DisplayMode {
    /// Live calls only.
    #[default]
    Active,
    /// Live calls, then finished ones (muted).
    All,
}

impl DisplayMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Active => Self::All,
            Self::All => Self::Active,
        }
    }
}

/// Where a completed call that the operator has not yet archived goes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum PendingClosurePolicy {
    /// Treated like any finished call: only in the "all" view, appended.
    #[default]
    AllCalls,
    /// Kept in the primary ranked list until archived.
    PrimaryQueue,
}

/// A call with its 1-based position in the current output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedCall<'a> {
    pub call: &'a CallSnapshot,
    pub rank: usize,
    /// Appended after the live section in [`DisplayMode::All`].
    pub muted: bool,
}

/// Whether `call` belongs in the primary (live) section.
pub fn is_primary(call: &CallSnapshot, policy: PendingClosurePolicy) -> bool {
    if call.archived {
        return false;
    }
    !call.is_terminal() || policy == PendingClosurePolicy::PrimaryQueue
}

/// Rank `calls` for display.
///
/// Both sections sort by score, highest first. The sort is stable, so
/// calls with equal scores keep their input order.
pub fn rank<'a>(
    calls: &[&'a CallSnapshot],
    mode: DisplayMode,
    policy: PendingClosurePolicy,
) -> Vec<RankedCall<'a>> {
    let (mut primary, mut rest): (Vec<&CallSnapshot>, Vec<&CallSnapshot>) =
        calls.iter().copied().partition(|c| is_primary(c, policy));

    by_score_desc(&mut primary);
    let mut ranked: Vec<RankedCall<'a>> = primary
        .into_iter()
        .map(|call| RankedCall {
            call,
            rank: 0,
            muted: false,
        })
        .collect();

    if mode == DisplayMode::All {
        by_score_desc(&mut rest);
        ranked.extend(rest.into_iter().map(|call| RankedCall {
            call,
            rank: 0,
            muted: true,
        }));
    }

    for (index, entry) in ranked.iter_mut().enumerate() {
        entry.rank = index + 1;
    }
    ranked
}

/// Top calls for the sidebar: active-only ordering, archived calls
/// excluded, truncated to [`SIDEBAR_LIMIT`].
pub fn sidebar<'a>(
    calls: &[&'a CallSnapshot],
    policy: PendingClosurePolicy,
) -> Vec<RankedCall<'a>> {
    let mut ranked = rank(calls, DisplayMode::Active, policy);
    ranked.truncate(SIDEBAR_LIMIT);
    ranked
}

fn by_score_desc(calls: &mut [&CallSnapshot]) {
    calls.sort_by(|a, b| b.severity_score.cmp(&a.severity_score));
}
