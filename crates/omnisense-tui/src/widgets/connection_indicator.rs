//! Feed connection indicator: ●/○/◐/✕ with color mapping.

use ratatui::style::Style;
use ratatui::text::Span;

use omnisense_core::ConnectionState;

use crate::theme;

/// Styled status dot and label for the status bar.
pub fn connection_span(state: &ConnectionState) -> Span<'static> {
    let (text, color) = match state {
        ConnectionState::Connected => ("● live".to_owned(), theme::CALM_GREEN),
        ConnectionState::Connecting => ("◐ connecting".to_owned(), theme::AMBER),
        ConnectionState::Reconnecting { attempt } => {
            (format!("◐ reconnecting ({attempt})"), theme::AMBER)
        }
        ConnectionState::Disconnected => ("○ offline".to_owned(), theme::MUTED_GRAY),
        ConnectionState::Failed => ("✕ feed lost".to_owned(), theme::ALERT_RED),
    };
    Span::styled(text, Style::default().fg(color))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconnecting_shows_attempt() {
        let span = connection_span(&ConnectionState::Reconnecting { attempt: 3 });
        assert_eq!(span.content, "◐ reconnecting (3)");
        assert_eq!(span.style.fg, Some(theme::AMBER));
    }

    #[test]
    fn failed_is_red() {
        let span = connection_span(&ConnectionState::Failed);
        assert_eq!(span.style.fg, Some(theme::ALERT_RED));
    }
}
