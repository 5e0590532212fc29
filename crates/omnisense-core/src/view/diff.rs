// Keyed comparison of two render plans.
//
// The presentation layer uses this to keep per-card interaction state
// (selection, scroll anchor) attached to the same call across snapshots
// instead of to a list index.

use std::collections::HashMap;

use serde::Serialize;

use super::{CallCard, RenderPlan};
use crate::model::CallId;

/// A card that is present in both plans at different positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardMove {
    pub id: CallId,
    pub from: usize,
    pub to: usize,
}

/// Differences between two plans, keyed by call id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanDiff {
    /// In `next` only, in `next` order.
    pub added: Vec<CallId>,
    /// In `prev` only, in `prev` order.
    pub removed: Vec<CallId>,
    pub moved: Vec<CardMove>,
    /// Same id, different content (rank changes alone do not count).
    pub changed: Vec<CallId>,
    pub counters_changed: bool,
    pub sidebar_changed: bool,
    pub patterns_changed: bool,
}

impl PlanDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.moved.is_empty()
            && self.changed.is_empty()
            && !self.counters_changed
            && !self.sidebar_changed
            && !self.patterns_changed
    }

    /// Whether the card list needs redrawing.
    pub fn cards_changed(&self) -> bool {
        !(self.added.is_empty()
            && self.removed.is_empty()
            && self.moved.is_empty()
            && self.changed.is_empty())
    }
}

pub fn diff(prev: &RenderPlan, next: &RenderPlan) -> PlanDiff {
    let prev_index: HashMap<&CallId, (usize, &CallCard)> = prev
        .cards
        .iter()
        .enumerate()
        .map(|(i, card)| (&card.id, (i, card)))
        .collect();
    let next_ids: HashMap<&CallId, usize> = next
        .cards
        .iter()
        .enumerate()
        .map(|(i, card)| (&card.id, i))
        .collect();

    let mut out = PlanDiff::default();

    for (to, card) in next.cards.iter().enumerate() {
        match prev_index.get(&card.id) {
            None => out.added.push(card.id.clone()),
            Some(&(from, old)) => {
                if from != to {
                    out.moved.push(CardMove {
                        id: card.id.clone(),
                        from,
                        to,
                    });
                }
                if differs_beyond_rank(old, card) {
                    out.changed.push(card.id.clone());
                }
            }
        }
    }

    out.removed = prev
        .cards
        .iter()
        .filter(|card| !next_ids.contains_key(&card.id))
        .map(|card| card.id.clone())
        .collect();

    out.counters_changed = prev.counters != next.counters;
    out.sidebar_changed = prev.sidebar != next.sidebar;
    out.patterns_changed = prev.patterns != next.patterns;
    out
}

fn differs_beyond_rank(old: &CallCard, new: &CallCard) -> bool {
    if old.rank == new.rank {
        return old != new;
    }
    let mut rebased = old.clone();
    rebased.rank = new.rank;
    rebased != *new
}
