//! Reusable widgets for the dispatch board.

pub mod call_card;
pub mod connection_indicator;
