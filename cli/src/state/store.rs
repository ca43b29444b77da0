use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use kef::{Source, Volume};

use super::reducers::{self, AppAction};

/// Panel element that Enter activates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Source(Source),
    TurnOff,
}

impl Default for Focus {
    fn default() -> Self {
        Focus::Source(Source::Aux)
    }
}

impl Focus {
    const ORDER: [Focus; 5] = [
        Focus::Source(Source::Aux),
        Focus::Source(Source::Bluetooth),
        Focus::Source(Source::Optical),
        Focus::Source(Source::Wifi),
        Focus::TurnOff,
    ];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    pub fn previous(self) -> Self {
        let len = Self::ORDER.len();
        Self::ORDER[(self.position() + len - 1) % len]
    }
}

/// A keyboard adjustment of the slider that has not been released yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nudge {
    pub volume: Volume,
    pub last_input: Instant,
}

#[derive(Debug, Default)]
pub struct AppState {
    pub exit: bool,
    pub focus: Focus,
    pub nudge: Option<Nudge>,
    /// The mouse holds the slider
    pub mouse_drag: bool,
}

pub struct Store {
    state: Mutex<AppState>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(AppState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn dispatch(&self, action: AppAction) {
        let mut state = self.lock();
        reducers::app_reducer(&mut state, action);
    }

    pub fn with_state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&AppState) -> T,
    {
        let state = self.lock();
        f(&state)
    }
}
