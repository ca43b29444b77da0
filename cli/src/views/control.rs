use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use kef::{ControllerHandle, Panel, Source, VolumeLabel};
use ratatui::layout::{Alignment, Constraint, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Paragraph};
use ratatui::Frame;
use tokio::sync::watch;

use crate::config::AppConfig;
use crate::state::reducers::AppAction;
use crate::state::store::{Focus, Store};
use crate::widgets::button::{button, ButtonKind};
use crate::widgets::util::centered_rect;
use crate::widgets::volume_slider::VolumeSlider;

use super::View;

const PANEL_WIDTH: u16 = 52;
const PANEL_HEIGHT: u16 = 20;

/// Screen regions of the clickable elements, as of the last render
#[derive(Debug, Default)]
struct HitMap {
    sources: Vec<(Rect, Source)>,
    turn_off: Rect,
    slider: Rect,
}

/// Source buttons, power button and volume slider of one speaker
pub struct ControlView {
    store: Arc<Store>,
    controller: ControllerHandle,
    panel: watch::Receiver<Panel>,
    address: String,
    nudge_step: i32,
    nudge_commit: Duration,
    hits: HitMap,
}

impl ControlView {
    pub fn new(store: Arc<Store>, controller: ControllerHandle, address: &str, config: &AppConfig) -> Self {
        let panel = controller.subscribe();
        Self {
            store,
            controller,
            panel,
            address: address.to_string(),
            nudge_step: i32::from(config.nudge_step),
            nudge_commit: config.nudge_commit,
            hits: HitMap::default(),
        }
    }

    /// Whether the controller published something not drawn yet
    pub fn needs_redraw(&self) -> bool {
        self.panel.has_changed().unwrap_or(false)
    }

    pub fn slider_area(&self) -> Rect {
        self.hits.slider
    }

    pub fn button_area(&self, target: Focus) -> Option<Rect> {
        match target {
            Focus::TurnOff => Some(self.hits.turn_off),
            Focus::Source(source) => self
                .hits
                .sources
                .iter()
                .find(|(_, s)| *s == source)
                .map(|(rect, _)| *rect),
        }
    }

    fn send(result: kef::Result<()>) {
        if let Err(e) = result {
            log::warn!("Controller unavailable: {}", e);
        }
    }

    fn activate(&self, focus: Focus, store: &Store) {
        store.dispatch(AppAction::SetFocus(focus));
        match focus {
            Focus::Source(source) => Self::send(self.controller.select_source(source)),
            Focus::TurnOff => Self::send(self.controller.turn_off()),
        }
    }

    fn nudge(&self, delta: i32, store: &Store) {
        let (held, mouse_drag) =
            store.with_state(|state| (state.nudge.map(|nudge| nudge.volume), state.mouse_drag));
        // The mouse owns the slider until it lets go.
        if mouse_drag {
            return;
        }
        let base = match held {
            Some(volume) => volume,
            None => {
                Self::send(self.controller.press());
                self.panel.borrow().slider
            }
        };

        let volume = base.offset(delta);
        Self::send(self.controller.drag(f64::from(volume.percent())));
        store.dispatch(AppAction::Nudge {
            volume,
            at: Instant::now(),
        });
    }

    /// Release a keyboard adjustment, if one is in progress
    fn commit_nudge(&self, store: &Store) -> bool {
        match store.with_state(|state| state.nudge) {
            Some(nudge) => {
                Self::send(self.controller.release(f64::from(nudge.volume.percent())));
                store.dispatch(AppAction::EndNudge);
                true
            }
            None => false,
        }
    }

    fn handle_key(&mut self, key_event: KeyEvent, store: &Store) {
        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.commit_nudge(store);
                store.dispatch(AppAction::Quit);
            }
            KeyCode::Char(c @ '1'..='4') => {
                let index = c as usize - '1' as usize;
                self.activate(Focus::Source(Source::ALL[index]), store);
            }
            KeyCode::Char('o') => self.activate(Focus::TurnOff, store),
            KeyCode::Tab => store.dispatch(AppAction::FocusNext),
            KeyCode::BackTab => store.dispatch(AppAction::FocusPrevious),
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('-') => {
                self.nudge(-self.nudge_step, store)
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('+') => {
                self.nudge(self.nudge_step, store)
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if !self.commit_nudge(store) {
                    let focus = store.with_state(|state| state.focus);
                    self.activate(focus, store);
                }
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse_event: MouseEvent, store: &Store) {
        let position = Position::new(mouse_event.column, mouse_event.row);
        let value = VolumeSlider::value_at(self.hits.slider, mouse_event.column);
        let dragging = store.with_state(|state| state.mouse_drag);

        match mouse_event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.hits.slider.contains(position) {
                    self.commit_nudge(store);
                    Self::send(self.controller.press());
                    Self::send(self.controller.drag(value));
                    store.dispatch(AppAction::BeginMouseDrag);
                } else if self.hits.turn_off.contains(position) {
                    self.activate(Focus::TurnOff, store);
                } else if let Some((_, source)) =
                    self.hits.sources.iter().find(|(rect, _)| rect.contains(position))
                {
                    self.activate(Focus::Source(*source), store);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) if dragging => {
                Self::send(self.controller.drag(value));
            }
            MouseEventKind::Up(MouseButton::Left) if dragging => {
                Self::send(self.controller.release(value));
                store.dispatch(AppAction::EndMouseDrag);
            }
            _ => {}
        }
    }
}

impl View for ControlView {
    fn render(&mut self, frame: &mut Frame) {
        let panel = self.panel.borrow_and_update().clone();
        let (focus, held) = self
            .store
            .with_state(|state| (state.focus, state.mouse_drag || state.nudge.is_some()));

        let area = centered_rect(frame.area(), PANEL_WIDTH, PANEL_HEIGHT);
        let outer = Block::bordered()
            .border_type(BorderType::Rounded)
            .title(format!(" KEF Controller · {} ", self.address))
            .title_alignment(Alignment::Center);
        let inner = outer.inner(area);
        frame.render_widget(outer, area);

        let rows = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(inner);

        self.hits.sources.clear();
        for (index, source) in Source::ALL.into_iter().enumerate() {
            let columns = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(rows[index / 2]);
            let rect = columns[index % 2];
            let focused = focus == Focus::Source(source);
            frame.render_widget(button(source.name(), ButtonKind::Normal, focused), rect);
            self.hits.sources.push((rect, source));
        }

        self.hits.turn_off = rows[2];
        frame.render_widget(
            button("Turn Off", ButtonKind::Danger, focus == Focus::TurnOff),
            rows[2],
        );

        let label_style = match panel.label {
            VolumeLabel::Error(_) => Style::new().fg(Color::Red),
            _ => Style::new(),
        };
        let label = Paragraph::new(panel.label.to_string())
            .style(label_style.add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center);
        frame.render_widget(label, rows[4]);

        self.hits.slider = rows[5];
        frame.render_widget(VolumeSlider::new(panel.slider).held(held), rows[5]);

        let status = Paragraph::new(panel.status.unwrap_or_default())
            .style(Style::new().fg(Color::Gray))
            .alignment(Alignment::Center);
        frame.render_widget(status, rows[6]);

        let help = Paragraph::new(Line::from("←/→ volume  1-4 source  o off  tab/enter select  q quit"))
            .style(Style::new().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(help, rows[7]);
    }

    fn handle_event(&mut self, event: Event, store: &Store) -> io::Result<()> {
        match event {
            Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                self.handle_key(key_event, store)
            }
            Event::Mouse(mouse_event) => self.handle_mouse(mouse_event, store),
            _ => {}
        }
        Ok(())
    }

    fn tick(&mut self, now: Instant, store: &Store) {
        let idle = store.with_state(|state| {
            state
                .nudge
                .map(|nudge| now.saturating_duration_since(nudge.last_input) >= self.nudge_commit)
                .unwrap_or(false)
        });
        if idle {
            self.commit_nudge(store);
        }
    }
}
