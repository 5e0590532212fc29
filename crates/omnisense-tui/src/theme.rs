//! Dispatch palette and semantic styling for the board.

use ratatui::style::{Color, Modifier, Style};

use omnisense_core::{CardStyle, ColorTier};

// ── Core Palette ──────────────────────────────────────────────────────

pub const ALERT_RED: Color = Color::Rgb(255, 85, 85); // #ff5555
pub const AMBER: Color = Color::Rgb(255, 170, 60); // #ffaa3c
pub const CALM_GREEN: Color = Color::Rgb(80, 250, 123); // #50fa7b
pub const SIGNAL_CYAN: Color = Color::Rgb(128, 255, 234); // #80ffea
pub const BADGE_VIOLET: Color = Color::Rgb(189, 147, 249); // #bd93f9

// ── Extended Palette ──────────────────────────────────────────────────

pub const DIM_WHITE: Color = Color::Rgb(189, 193, 207); // #bdc1cf
pub const MUTED_GRAY: Color = Color::Rgb(98, 114, 164); // #6272a4
pub const BG_HIGHLIGHT: Color = Color::Rgb(40, 42, 54); // #282a36
pub const BG_DARK: Color = Color::Rgb(30, 31, 41); // #1e1f29

// ── Tier colors ───────────────────────────────────────────────────────

/// Accent color for a severity tier.
pub fn tier_color(tier: ColorTier) -> Color {
    match tier {
        ColorTier::Critical => ALERT_RED,
        ColorTier::Warning => AMBER,
        ColorTier::Normal => CALM_GREEN,
    }
}

/// Card border: tier accent, or gray when the card is muted.
pub fn card_border(tier: ColorTier, style: CardStyle, selected: bool) -> Style {
    let base = match style {
        CardStyle::Normal => Style::default().fg(tier_color(tier)),
        CardStyle::Muted => Style::default().fg(MUTED_GRAY),
    };
    if selected {
        base.add_modifier(Modifier::BOLD)
    } else {
        base
    }
}

/// Body text of a card.
pub fn card_text(style: CardStyle) -> Style {
    match style {
        CardStyle::Normal => Style::default().fg(DIM_WHITE),
        CardStyle::Muted => Style::default()
            .fg(MUTED_GRAY)
            .add_modifier(Modifier::DIM),
    }
}

// ── Semantic Styles ───────────────────────────────────────────────────

/// Title text for blocks/panels.
pub fn title_style() -> Style {
    Style::default().fg(SIGNAL_CYAN).add_modifier(Modifier::BOLD)
}

/// Border for an ordinary panel.
pub fn border_default() -> Style {
    Style::default().fg(MUTED_GRAY)
}

/// Table header row.
pub fn table_header() -> Style {
    Style::default()
        .fg(SIGNAL_CYAN)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

/// Normal table row text.
pub fn table_row() -> Style {
    Style::default().fg(DIM_WHITE)
}

/// Background of the selected card.
pub fn selected_bg() -> Style {
    Style::default().bg(BG_HIGHLIGHT)
}

/// Assignment badge.
pub fn badge() -> Style {
    Style::default()
        .fg(BG_DARK)
        .bg(BADGE_VIOLET)
        .add_modifier(Modifier::BOLD)
}

/// Primary action button, enabled or not.
pub fn action_button(enabled: bool) -> Style {
    if enabled {
        Style::default()
            .fg(BG_DARK)
            .bg(SIGNAL_CYAN)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(MUTED_GRAY).add_modifier(Modifier::CROSSED_OUT)
    }
}

/// Big counter figure.
pub fn counter_value() -> Style {
    Style::default().fg(SIGNAL_CYAN).add_modifier(Modifier::BOLD)
}

/// Key hint text (e.g., "q quit  ? help").
pub fn key_hint() -> Style {
    Style::default().fg(MUTED_GRAY)
}

/// Key hint key character.
pub fn key_hint_key() -> Style {
    Style::default().fg(SIGNAL_CYAN).add_modifier(Modifier::BOLD)
}
