pub mod control;

use std::io;
use std::time::Instant;

use crossterm::event::Event;
use ratatui::Frame;

use crate::state::store::Store;

pub trait View {
    fn render(&mut self, frame: &mut Frame);
    fn handle_event(&mut self, event: Event, store: &Store) -> io::Result<()>;
    /// Called on every loop iteration, input or not
    fn tick(&mut self, _now: Instant, _store: &Store) {}
}
