//! Queue screen: the dispatch board itself.
//!
//! Layout (regions missing from the configured layout are skipped):
//! ┌ Active ┐┌ Pending ┐┌ Completed ┐
//! ├─ Call list (ranked cards) ─────────┬─ Top priority ─┤
//! │                                    ├─ Pattern Alerts┤
//! └────────────────────────────────────┴────────────────┘
//!
//! Every snapshot produces a fresh [`RenderPlan`]. The selection is keyed
//! by call id and reconciled through [`PlanDiff`], so it follows a call
//! when the ranking reorders.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Row, Table, Wrap};
use tracing::debug;

use omnisense_core::{
    CallCard, CallId, DashboardState, DisplayMode, PatternPanel, PlanDiff, PrimaryAction, Region,
    RenderOptions, RenderPlan, diff, render,
};

use crate::action::{Action, Notification};
use crate::component::Component;
use crate::theme;
use crate::widgets::call_card::{CARD_HEIGHT, CallCardWidget};

const COUNTER_HEIGHT: u16 = 3;
const SIDE_COLUMN_WIDTH: u16 = 40;

pub struct QueueScreen {
    options: RenderOptions,
    regions: Vec<Region>,
    state: Arc<DashboardState>,
    plan: RenderPlan,
    selected: Option<CallId>,
}

impl QueueScreen {
    pub fn new(options: RenderOptions, regions: Vec<Region>) -> Self {
        let state = Arc::new(DashboardState::default());
        let plan = render(&state, &options);
        Self {
            options,
            regions,
            state,
            plan,
            selected: None,
        }
    }

    pub fn plan(&self) -> &RenderPlan {
        &self.plan
    }

    #[cfg(test)]
    pub fn selected(&self) -> Option<&CallId> {
        self.selected.as_ref()
    }

    fn shows(&self, region: Region) -> bool {
        self.regions.contains(&region)
    }

    fn selected_index(&self) -> Option<usize> {
        self.selected.as_ref().and_then(|id| self.plan.position(id))
    }

    fn selected_card(&self) -> Option<&CallCard> {
        self.selected.as_ref().and_then(|id| self.plan.card(id))
    }

    // ── Reconciliation ───────────────────────────────────────────────

    /// Adopt a new snapshot.
    fn apply(&mut self, state: Arc<DashboardState>) {
        self.state = state;
        self.replan();
    }

    /// Re-render from the held snapshot and carry the selection over.
    fn replan(&mut self) {
        let next = render(&self.state, &self.options);
        let changes = diff(&self.plan, &next);
        if !changes.is_empty() {
            debug!(
                added = changes.added.len(),
                removed = changes.removed.len(),
                moved = changes.moved.len(),
                changed = changes.changed.len(),
                "plan updated"
            );
        }
        if changes.cards_changed() || self.selected.is_none() {
            self.selected = self.reconcile_selection(&changes, &next);
        }
        self.plan = next;
    }

    fn reconcile_selection(&self, changes: &PlanDiff, next: &RenderPlan) -> Option<CallId> {
        let Some(current) = &self.selected else {
            return next.cards.first().map(|c| c.id.clone());
        };
        if !changes.removed.contains(current) && next.card(current).is_some() {
            return Some(current.clone());
        }
        // The selected call left this view: stay at the same slot.
        let slot = self.plan.position(current).unwrap_or(0);
        let fallback = slot.min(next.cards.len().saturating_sub(1));
        next.cards.get(fallback).map(|c| c.id.clone())
    }

    // ── Navigation ───────────────────────────────────────────────────

    fn select_index(&mut self, index: usize) {
        if let Some(card) = self.plan.cards.get(index) {
            self.selected = Some(card.id.clone());
        }
    }

    fn select_next(&mut self) {
        let next = self.selected_index().map_or(0, |i| i + 1);
        self.select_index(next.min(self.plan.cards.len().saturating_sub(1)));
    }

    fn select_prev(&mut self) {
        let prev = self.selected_index().map_or(0, |i| i.saturating_sub(1));
        self.select_index(prev);
    }

    fn activate_selected(&self) -> Option<Action> {
        let card = self.selected_card()?;
        match card.action {
            PrimaryAction::EndCase => Some(Action::EndCall(card.id.clone())),
            PrimaryAction::Call { enabled: true } => Some(Action::Notify(Notification::info(
                format!("Calling {} for {}", card.caller_phone, card.type_label),
            ))),
            PrimaryAction::Call { enabled: false } => None,
        }
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render_counters(&self, frame: &mut Frame, area: Rect) {
        let counters = [
            (Region::ActiveCount, "Active", self.plan.counters.active),
            (Region::PendingCount, "Pending", self.plan.counters.pending),
            (Region::CompletedCount, "Completed", self.plan.counters.completed),
        ];
        let shown: Vec<_> = counters
            .iter()
            .filter(|(region, _, _)| self.shows(*region))
            .collect();
        let cells = Layout::horizontal(vec![Constraint::Fill(1); shown.len()]).split(area);

        for ((_, label, value), cell) in shown.into_iter().zip(cells.iter()) {
            let block = Block::default()
                .title(format!(" {label} "))
                .title_style(theme::title_style())
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(theme::border_default());
            let figure = Paragraph::new(Span::styled(value.to_string(), theme::counter_value()))
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(figure, *cell);
        }
    }

    fn render_call_list(&self, frame: &mut Frame, area: Rect) {
        let title = match self.plan.mode {
            DisplayMode::Active => format!(" Active Queue ({}) ", self.plan.cards.len()),
            DisplayMode::All => format!(" All Calls ({}) ", self.plan.cards.len()),
        };
        let block = Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.plan.cards.is_empty() {
            let empty = Paragraph::new(Span::styled("No calls in queue", theme::key_hint()))
                .alignment(Alignment::Center);
            frame.render_widget(empty, inner);
            return;
        }

        let visible = usize::from((inner.height / CARD_HEIGHT).max(1));
        let first = self
            .selected_index()
            .map_or(0, |i| (i + 1).saturating_sub(visible));

        let mut y = inner.y;
        for card in self.plan.cards.iter().skip(first).take(visible) {
            let height = CARD_HEIGHT.min(inner.bottom().saturating_sub(y));
            let slot = Rect::new(inner.x, y, inner.width, height);
            let selected = self.selected.as_ref() == Some(&card.id);
            frame.render_widget(CallCardWidget::new(card, selected), slot);
            y += CARD_HEIGHT;
        }
    }

    fn render_sidebar(&self, frame: &mut Frame, area: Rect) {
        let sidebar = &self.plan.sidebar;
        let header =
            Row::new(sidebar.header.iter().map(String::as_str)).style(theme::table_header());
        let rows = sidebar.rows.iter().map(|row| {
            Row::new([
                row.priority.as_str(),
                row.department.as_str(),
                row.status.as_str(),
            ])
            .style(Style::default().fg(theme::tier_color(row.tier)))
        });

        let table = Table::new(
            rows,
            [
                Constraint::Length(9),
                Constraint::Length(11),
                Constraint::Fill(1),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .title(" Top Priority ")
                .title_style(theme::title_style())
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(theme::border_default()),
        );
        frame.render_widget(table, area);
    }

    fn render_patterns(&self, frame: &mut Frame, area: Rect) {
        let (title, lines, border) = match &self.plan.patterns {
            PatternPanel::Alerts { title, items } => (
                title.as_str(),
                items
                    .iter()
                    .map(|item| {
                        Line::from(Span::styled(
                            format!("⚠ {item}"),
                            Style::default().fg(theme::ALERT_RED),
                        ))
                    })
                    .collect::<Vec<_>>(),
                Style::default().fg(theme::ALERT_RED),
            ),
            PatternPanel::Clear { message } => (
                omnisense_core::view::PATTERN_PANEL_TITLE,
                vec![Line::from(Span::styled(
                    message.as_str(),
                    Style::default().fg(theme::CALM_GREEN),
                ))],
                theme::border_default(),
            ),
        };

        let panel = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title(format!(" {title} "))
                    .title_style(theme::title_style())
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(border),
            );
        frame.render_widget(panel, area);
    }
}

impl Component for QueueScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Char('j') | KeyCode::Down => Action::SelectNext,
            KeyCode::Char('k') | KeyCode::Up => Action::SelectPrev,
            KeyCode::Char('g') | KeyCode::Home => Action::SelectFirst,
            KeyCode::Char('G') | KeyCode::End => Action::SelectLast,
            KeyCode::Char('m') | KeyCode::Tab => Action::ToggleMode,
            KeyCode::Char('e') | KeyCode::Enter => Action::ActivateSelected,
            _ => return Ok(None),
        };
        Ok(Some(action))
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::SnapshotApplied(state) => self.apply(Arc::clone(state)),
            Action::ToggleMode => {
                self.options.mode = self.options.mode.toggled();
                self.replan();
            }
            Action::SelectNext => self.select_next(),
            Action::SelectPrev => self.select_prev(),
            Action::SelectFirst => self.select_index(0),
            Action::SelectLast => self.select_index(self.plan.cards.len().saturating_sub(1)),
            Action::ActivateSelected => return Ok(self.activate_selected()),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let has_counters = [
            Region::ActiveCount,
            Region::PendingCount,
            Region::CompletedCount,
        ]
        .into_iter()
        .any(|r| self.shows(r));
        let counter_height = if has_counters { COUNTER_HEIGHT } else { 0 };
        let [counter_area, body] =
            Layout::vertical([Constraint::Length(counter_height), Constraint::Fill(1)]).areas(area);
        if has_counters {
            self.render_counters(frame, counter_area);
        }

        let side_panels: Vec<Region> = [Region::Sidebar, Region::PatternAlerts]
            .into_iter()
            .filter(|r| self.shows(*r))
            .collect();
        let list_constraint = if self.shows(Region::CallList) {
            Constraint::Fill(1)
        } else {
            Constraint::Length(0)
        };
        let side_constraint = match (side_panels.is_empty(), self.shows(Region::CallList)) {
            (true, _) => Constraint::Length(0),
            (false, true) => Constraint::Length(SIDE_COLUMN_WIDTH),
            (false, false) => Constraint::Fill(1),
        };
        let [list_area, side_area] =
            Layout::horizontal([list_constraint, side_constraint]).areas(body);

        if self.shows(Region::CallList) {
            self.render_call_list(frame, list_area);
        }

        let cells =
            Layout::vertical(vec![Constraint::Fill(1); side_panels.len()]).split(side_area);
        for (region, cell) in side_panels.iter().zip(cells.iter()) {
            match region {
                Region::Sidebar => self.render_sidebar(frame, *cell),
                Region::PatternAlerts => self.render_patterns(frame, *cell),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use omnisense_core::{PendingClosurePolicy, normalize};
    use pretty_assertions::assert_eq;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use serde_json::{Value, json};

    use super::*;

    fn state(raw: &Value) -> Arc<DashboardState> {
        Arc::new(normalize(raw))
    }

    fn two_calls() -> Value {
        json!({
            "stats": { "total_active": 2, "queued": 1, "completed": 0 },
            "active_calls": [
                { "id": "c1", "severity_score": 95, "status": "ACTIVE",
                  "emergency_type": "cardiac_arrest", "assigned_to": "AI_AGENT",
                  "caller": { "phone_number": "555-0101" },
                  "location": { "address": "12 Main St" } },
                { "id": "c2", "severity_score": 40, "status": "ACTIVE",
                  "emergency_type": "fire_small", "assigned_to": "OP7",
                  "caller": { "phone_number": "555-0102" } }
            ]
        })
    }

    fn screen(regions: Vec<Region>) -> QueueScreen {
        QueueScreen::new(RenderOptions::default(), regions)
    }

    fn ids(screen: &QueueScreen) -> Vec<&str> {
        screen.plan().cards.iter().map(|c| c.id.as_str()).collect()
    }

    fn draw(screen: &QueueScreen, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|frame| screen.render(frame, frame.area()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn renders_ranked_cards_and_panels() {
        let mut screen = screen(Region::all());
        screen.update(&Action::SnapshotApplied(state(&two_calls()))).unwrap();
        assert_eq!(ids(&screen), vec!["c1", "c2"]);

        let text = draw(&screen, 120, 30);
        assert!(text.contains("CARDIAC ARREST"));
        assert!(text.contains("95/100"));
        assert!(text.contains("AI Agent"));
        assert!(text.contains("Officer OP7"));
        assert!(text.contains("12 Main St"));
        assert!(text.contains("PRIORITY"));
        assert!(text.contains("No significant patterns detected"));
        assert!(text.contains("Pending"));
    }

    #[test]
    fn absent_regions_are_skipped() {
        let mut screen = screen(vec![Region::CallList]);
        screen.update(&Action::SnapshotApplied(state(&two_calls()))).unwrap();

        let text = draw(&screen, 100, 20);
        assert!(text.contains("CARDIAC ARREST"));
        assert!(!text.contains("PRIORITY"));
        assert!(!text.contains("Pattern Alerts"));
        assert!(!text.contains("Completed"));
    }

    #[test]
    fn side_panels_fill_the_screen_without_a_call_list() {
        let mut screen = screen(vec![Region::Sidebar, Region::PatternAlerts]);
        let mut raw = two_calls();
        raw["patterns"] = json!(["MASS EVENT DETECTED: 3 calls reporting fire"]);
        screen.update(&Action::SnapshotApplied(state(&raw))).unwrap();

        let text = draw(&screen, 80, 20);
        assert!(!text.contains("CARDIAC ARREST"));
        assert!(text.contains("HEALTH"));
        assert!(text.contains("MASS EVENT DETECTED"));
    }

    #[test]
    fn empty_board_renders_placeholders() {
        let screen = screen(Region::all());
        let text = draw(&screen, 100, 20);
        assert!(text.contains("No calls in queue"));
        assert!(text.contains("No significant patterns detected"));
        assert_eq!(screen.selected(), None);
    }

    #[test]
    fn selection_follows_call_across_reorder() {
        let mut screen = screen(Region::all());
        screen.update(&Action::SnapshotApplied(state(&two_calls()))).unwrap();
        assert_eq!(screen.selected(), Some(&CallId::new("c1")));

        screen.update(&Action::SelectNext).unwrap();
        assert_eq!(screen.selected(), Some(&CallId::new("c2")));

        let mut raw = two_calls();
        raw["active_calls"][1]["severity_score"] = json!(99);
        screen.update(&Action::SnapshotApplied(state(&raw))).unwrap();

        assert_eq!(ids(&screen), vec!["c2", "c1"]);
        assert_eq!(screen.selected(), Some(&CallId::new("c2")));
    }

    #[test]
    fn pattern_only_update_keeps_selection() {
        let mut screen = screen(Region::all());
        screen.update(&Action::SnapshotApplied(state(&two_calls()))).unwrap();
        screen.update(&Action::SelectLast).unwrap();

        let mut raw = two_calls();
        raw["patterns"] = json!(["MASS EVENT DETECTED: 3 calls reporting fire in Downtown"]);
        screen.update(&Action::SnapshotApplied(state(&raw))).unwrap();

        assert_eq!(ids(&screen), vec!["c1", "c2"]);
        assert_eq!(screen.selected(), Some(&CallId::new("c2")));
    }

    #[test]
    fn removed_selection_falls_back_to_same_slot() {
        let mut screen = screen(Region::all());
        screen.update(&Action::SnapshotApplied(state(&two_calls()))).unwrap();
        screen.update(&Action::SelectLast).unwrap();
        assert_eq!(screen.selected(), Some(&CallId::new("c2")));

        let mut raw = two_calls();
        raw["active_calls"].as_array_mut().unwrap().pop();
        screen.update(&Action::SnapshotApplied(state(&raw))).unwrap();
        assert_eq!(screen.selected(), Some(&CallId::new("c1")));

        screen.update(&Action::SnapshotApplied(state(&json!({})))).unwrap();
        assert_eq!(screen.selected(), None);
    }

    #[test]
    fn navigation_clamps_at_the_ends() {
        let mut screen = screen(Region::all());
        screen.update(&Action::SnapshotApplied(state(&two_calls()))).unwrap();

        screen.update(&Action::SelectPrev).unwrap();
        assert_eq!(screen.selected(), Some(&CallId::new("c1")));
        screen.update(&Action::SelectNext).unwrap();
        screen.update(&Action::SelectNext).unwrap();
        assert_eq!(screen.selected(), Some(&CallId::new("c2")));
        screen.update(&Action::SelectFirst).unwrap();
        assert_eq!(screen.selected(), Some(&CallId::new("c1")));
    }

    #[test]
    fn end_case_dispatches_end_call() {
        let mut screen = QueueScreen::new(
            RenderOptions {
                mode: DisplayMode::Active,
                pending_closure: PendingClosurePolicy::PrimaryQueue,
            },
            Region::all(),
        );
        let raw = json!({
            "active_calls": [
                { "id": "c3", "severity_score": 85, "status": "COMPLETED" }
            ]
        });
        screen.update(&Action::SnapshotApplied(state(&raw))).unwrap();
        assert!(draw(&screen, 100, 20).contains("[ End Case ]"));

        let follow_up = screen.update(&Action::ActivateSelected).unwrap();
        assert!(matches!(follow_up, Some(Action::EndCall(id)) if id == CallId::new("c3")));
    }

    #[test]
    fn archived_call_has_no_action() {
        let mut screen = screen(Region::all());
        let raw = json!({
            "completed_calls": [
                { "id": "c4", "severity_score": 60, "status": "COMPLETED", "archived": true }
            ]
        });
        screen.update(&Action::SnapshotApplied(state(&raw))).unwrap();
        assert!(screen.plan().cards.is_empty(), "archived calls stay out of the active view");

        screen.update(&Action::ToggleMode).unwrap();
        assert_eq!(screen.plan().mode, DisplayMode::All);
        assert_eq!(screen.selected(), Some(&CallId::new("c4")));
        assert!(screen.update(&Action::ActivateSelected).unwrap().is_none());
    }

    #[test]
    fn call_action_raises_notice() {
        let mut screen = screen(Region::all());
        screen.update(&Action::SnapshotApplied(state(&two_calls()))).unwrap();

        let follow_up = screen.update(&Action::ActivateSelected).unwrap();
        let Some(Action::Notify(notice)) = follow_up else {
            panic!("expected a notice, got {follow_up:?}");
        };
        assert!(notice.message.contains("555-0101"));
    }

    #[test]
    fn keys_map_to_actions() {
        let mut screen = screen(Region::all());
        let key = |code| KeyEvent::from(code);
        assert!(matches!(
            screen.handle_key_event(key(KeyCode::Char('j'))).unwrap(),
            Some(Action::SelectNext)
        ));
        assert!(matches!(
            screen.handle_key_event(key(KeyCode::Enter)).unwrap(),
            Some(Action::ActivateSelected)
        ));
        assert!(matches!(
            screen.handle_key_event(key(KeyCode::Char('m'))).unwrap(),
            Some(Action::ToggleMode)
        ));
        assert!(screen.handle_key_event(key(KeyCode::Char('x'))).unwrap().is_none());
    }
}
