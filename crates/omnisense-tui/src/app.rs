//! Application core: event loop, action dispatch, status bar, help overlay.

use std::time::Duration;

use chrono::{DateTime, Local};
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use omnisense_core::{ConnectionState, Dashboard, DispatchOutcome, Region, RenderOptions};

use crate::action::{Action, Notification, NotificationLevel};
use crate::component::Component;
use crate::data_bridge::spawn_data_bridge;
use crate::event::{Event, EventReader};
use crate::screens::queue::QueueScreen;
use crate::theme;
use crate::tui::Tui;
use crate::widgets::connection_indicator::connection_span;

const RENDER_RATE: Duration = Duration::from_millis(33);

/// Clock ticks a notice stays on the status bar.
const NOTICE_TICKS: u8 = 5;

/// Top-level application state and event loop.
pub struct App {
    dashboard: Dashboard,
    queue: QueueScreen,
    running: bool,
    connection: ConnectionState,
    clock: DateTime<Local>,
    clock_interval: Duration,
    help_visible: bool,
    notice: Option<(Notification, u8)>,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    pub fn new(
        dashboard: Dashboard,
        options: RenderOptions,
        regions: Vec<Region>,
        clock_interval: Duration,
    ) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        Self {
            dashboard,
            queue: QueueScreen::new(options, regions),
            running: true,
            connection: ConnectionState::Disconnected,
            clock: Local::now(),
            clock_interval,
            help_visible: false,
            notice: None,
            action_tx,
            action_rx,
        }
    }

    /// Run the main event loop until the operator quits.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::enter()?;
        let mut events = EventReader::new(self.clock_interval, RENDER_RATE);

        let cancel = CancellationToken::new();
        let bridge = tokio::spawn(spawn_data_bridge(
            self.dashboard.clone(),
            self.action_tx.clone(),
            cancel.clone(),
        ));

        info!(size = ?tui.size().unwrap_or((0, 0)), "event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;
                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        events.stop();
        cancel.cancel();
        let _ = bridge.await;
        info!("event loop ended");
        Ok(())
    }

    /// Global keys first, then the queue screen.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c'))
            | (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),
            (KeyModifiers::NONE, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),
            (KeyModifiers::NONE, KeyCode::Esc) => return Ok(Some(Action::DismissNotification)),
            _ => {}
        }

        self.queue.handle_key_event(key)
    }

    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::Tick => {
                self.clock = Local::now();
                self.age_notice();
            }

            Action::Render | Action::Resize(..) => {}

            Action::ConnectionChanged(state) => {
                debug!(?state, "connection state");
                self.connection = state.clone();
            }

            Action::DispatchFinished(outcome) => self.notify(dispatch_notice(outcome)),

            Action::EndCall(id) => {
                info!(call_id = %id, "operator ended call");
                // Fire-and-forget: the outcome arrives as `DispatchFinished`.
                drop(self.dashboard.end_call(id.clone()));
                self.notify(Notification::info(format!("Ending call {id}…")));
            }

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::Notify(notice) => self.notify(notice.clone()),

            Action::DismissNotification => self.notice = None,

            other => {
                if let Some(follow_up) = self.queue.update(other)? {
                    self.action_tx.send(follow_up)?;
                }
            }
        }

        Ok(())
    }

    fn notify(&mut self, notice: Notification) {
        self.notice = Some((notice, NOTICE_TICKS));
    }

    fn age_notice(&mut self) {
        if let Some((_, ticks)) = &mut self.notice {
            *ticks = ticks.saturating_sub(1);
            if *ticks == 0 {
                self.notice = None;
            }
        }
    }

    fn render(&self, frame: &mut Frame) {
        let [content, status] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(frame.area());

        self.queue.render(frame, content);
        self.render_status_bar(frame, status);

        if self.help_visible {
            render_help_overlay(frame, frame.area());
        }
    }

    /// Connection, clock, view mode, data age, and the current notice.
    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let separator = || Span::styled(" │ ", theme::key_hint());

        let mut spans = vec![
            Span::raw(" "),
            connection_span(&self.connection),
            separator(),
            Span::styled(
                self.clock.format("%H:%M:%S").to_string(),
                Style::default().fg(theme::SIGNAL_CYAN),
            ),
            separator(),
            Span::styled(format!("view: {}", self.queue.plan().mode), theme::table_row()),
        ];

        if let Some(age) = self.dashboard.store().data_age() {
            spans.push(separator());
            spans.push(Span::styled(
                format!("updated {}s ago", age.num_seconds().max(0)),
                theme::key_hint(),
            ));
        }

        if let Some((notice, _)) = &self.notice {
            let color = match notice.level {
                NotificationLevel::Info => theme::DIM_WHITE,
                NotificationLevel::Success => theme::CALM_GREEN,
                NotificationLevel::Error => theme::ALERT_RED,
            };
            spans.push(separator());
            spans.push(Span::styled(
                notice.message.clone(),
                Style::default().fg(color),
            ));
        }

        spans.push(separator());
        spans.push(Span::styled("? help  q quit", theme::key_hint()));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

fn dispatch_notice(outcome: &DispatchOutcome) -> Notification {
    match &outcome.result {
        Ok(()) => Notification::success(format!("Call {} ended", outcome.call_id)),
        Err(message) => {
            Notification::error(format!("End call {} failed: {message}", outcome.call_id))
        }
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let width = 48u16.min(area.width.saturating_sub(4));
    let height = 15u16.min(area.height.saturating_sub(2));
    let help_area = Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    );

    frame.render_widget(Clear, help_area);

    let block = Block::default()
        .title(" Keyboard Shortcuts ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_default())
        .style(Style::default().bg(theme::BG_DARK));

    let entry = |key: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {key:<10}"), theme::key_hint_key()),
            Span::styled(what, theme::table_row()),
        ])
    };

    let help_text = vec![
        Line::from(""),
        entry("j/k ↑/↓", "Select next / previous call"),
        entry("g/G", "First / last call"),
        entry("Enter e", "Call, or End Case when finished"),
        entry("m Tab", "Toggle active / all calls"),
        Line::from(""),
        entry("Esc", "Dismiss notice"),
        entry("?", "This help"),
        entry("q", "Quit"),
        Line::from(""),
        Line::from(Span::styled("  Esc or ? to close", theme::key_hint())),
    ];

    frame.render_widget(Paragraph::new(help_text).block(block), help_area);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use omnisense_core::{CallId, DashboardConfig};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use url::Url;

    use super::*;

    fn app() -> App {
        let config = DashboardConfig::new(Url::parse("http://127.0.0.1:9").unwrap());
        App::new(
            Dashboard::new(config).unwrap(),
            RenderOptions::default(),
            Region::all(),
            Duration::from_secs(1),
        )
    }

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        let buffer = terminal.backend().buffer();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn status_bar_shows_clock_connection_and_mode() {
        let mut app = app();
        app.process_action(&Action::ConnectionChanged(ConnectionState::Connected))
            .unwrap();
        app.process_action(&Action::Tick).unwrap();

        let text = screen_text(&app);
        assert!(text.contains(&app.clock.format("%H:%M:%S").to_string()));
        assert!(text.contains("● live"));
        assert!(text.contains("view: active"));
    }

    #[test]
    fn dispatch_failure_becomes_error_notice() {
        let mut app = app();
        app.process_action(&Action::DispatchFinished(DispatchOutcome {
            call_id: CallId::new("c3"),
            result: Err("HTTP 500".into()),
        }))
        .unwrap();

        let (notice, _) = app.notice.as_ref().unwrap();
        assert_eq!(notice.level, NotificationLevel::Error);
        assert!(screen_text(&app).contains("End call c3 failed: HTTP 500"));
    }

    #[test]
    fn notices_expire_after_ticks() {
        let mut app = app();
        app.process_action(&Action::Notify(Notification::info("hello")))
            .unwrap();
        for _ in 0..NOTICE_TICKS {
            assert!(app.notice.is_some());
            app.process_action(&Action::Tick).unwrap();
        }
        assert!(app.notice.is_none());
    }

    #[test]
    fn help_overlay_captures_keys() {
        let mut app = app();
        let press = |code| KeyEvent::from(code);

        let action = app.handle_key_event(press(KeyCode::Char('?'))).unwrap();
        app.process_action(&action.unwrap()).unwrap();
        assert!(screen_text(&app).contains("Keyboard Shortcuts"));

        assert!(app.handle_key_event(press(KeyCode::Char('j'))).unwrap().is_none());
        assert!(matches!(
            app.handle_key_event(press(KeyCode::Esc)).unwrap(),
            Some(Action::ToggleHelp)
        ));
    }

    #[test]
    fn mode_toggle_reaches_the_queue() {
        let mut app = app();
        let action = app.handle_key_event(KeyEvent::from(KeyCode::Char('m'))).unwrap();
        app.process_action(&action.unwrap()).unwrap();
        assert!(screen_text(&app).contains("view: all"));
    }

    #[tokio::test]
    async fn end_call_is_fire_and_forget() {
        let mut app = app();
        app.process_action(&Action::EndCall(CallId::new("c3"))).unwrap();
        let (notice, _) = app.notice.as_ref().unwrap();
        assert!(notice.message.contains("c3"));
        assert!(app.running);
    }

    #[test]
    fn quit_key_stops_the_loop() {
        let mut app = app();
        let action = app.handle_key_event(KeyEvent::from(KeyCode::Char('q'))).unwrap();
        app.process_action(&action.unwrap()).unwrap();
        assert!(!app.running);
    }
}
