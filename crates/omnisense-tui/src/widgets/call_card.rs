//! One call card: tier-colored frame, classification header, summary,
//! caller line, and the primary action button.
//!
//! ```text
//! ╭ #1 ✚ Health ─────────────────────── 95/100 ╮
//! │ CARDIAC ARREST                  AI Agent   │
//! │ Patient unresponsive, CPR in progress      │
//! │ 555-0101 · 12 Main St           [ Call ]   │
//! ╰────────────────────────────────────────────╯
//! ```

use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Paragraph, Widget};

use omnisense_core::{CallCard, CardStyle, IconTag};

use crate::theme;

/// Rows a card occupies, borders included.
pub const CARD_HEIGHT: u16 = 5;

/// Single-width glyph for an icon tag.
pub fn icon_glyph(icon: IconTag) -> &'static str {
    match icon {
        IconTag::Fire => "▲",
        IconTag::Medical => "✚",
        IconTag::Rescue => "⚑",
        IconTag::Police => "◆",
        IconTag::Generic => "●",
    }
}

pub struct CallCardWidget<'a> {
    card: &'a CallCard,
    selected: bool,
}

impl<'a> CallCardWidget<'a> {
    pub fn new(card: &'a CallCard, selected: bool) -> Self {
        Self { card, selected }
    }

    fn caller_line(&self) -> String {
        let card = self.card;
        match &card.caller_name {
            Some(name) => format!("{} ({}) · {}", card.caller_phone, name, card.address),
            None => format!("{} · {}", card.caller_phone, card.address),
        }
    }
}

impl Widget for CallCardWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let card = self.card;
        let text = theme::card_text(card.style);
        let accent = match card.style {
            CardStyle::Normal => Style::default()
                .fg(theme::tier_color(card.tier))
                .add_modifier(Modifier::BOLD),
            CardStyle::Muted => text,
        };

        let number = card
            .call_number
            .map(|n| format!(" · call {n}"))
            .unwrap_or_default();
        let mut block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(theme::card_border(card.tier, card.style, self.selected))
            .title(Line::from(vec![
                Span::styled(format!(" #{} ", card.rank), accent),
                Span::styled(
                    format!("{} {}{} ", icon_glyph(card.icon), card.department_label, number),
                    text,
                ),
            ]))
            .title(
                Line::from(Span::styled(format!(" {} ", card.score_label), accent))
                    .right_aligned(),
            );
        if self.selected {
            block = block.style(theme::selected_bg());
        }

        let inner = block.inner(area);
        block.render(area, buf);

        let [header, summary, footer] = Layout::vertical([Constraint::Length(1); 3]).areas(inner);

        // Type label with the assignment badge on the right.
        let badge_width = card
            .badge
            .as_ref()
            .map_or(0, |b| u16::try_from(b.label.chars().count() + 2).unwrap_or(u16::MAX));
        let [type_area, badge_area] =
            Layout::horizontal([Constraint::Min(1), Constraint::Length(badge_width)]).areas(header);
        Paragraph::new(Span::styled(card.type_label.as_str(), accent)).render(type_area, buf);
        if let Some(badge) = &card.badge {
            Paragraph::new(Span::styled(format!(" {} ", badge.label), theme::badge()))
                .alignment(Alignment::Right)
                .render(badge_area, buf);
        }

        Paragraph::new(Span::styled(card.summary.as_str(), text)).render(summary, buf);

        let label = format!("[ {} ]", card.action.label());
        let label_width = u16::try_from(label.chars().count()).unwrap_or(u16::MAX);
        let [caller_area, action_area] =
            Layout::horizontal([Constraint::Min(1), Constraint::Length(label_width)]).areas(footer);
        Paragraph::new(Span::styled(self.caller_line(), text)).render(caller_area, buf);
        Paragraph::new(Span::styled(label, theme::action_button(card.action.is_enabled())))
            .render(action_area, buf);
    }
}
