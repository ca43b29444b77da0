use std::time::Instant;

use kef::Volume;

use super::store::{AppState, Focus, Nudge};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
    FocusNext,
    FocusPrevious,
    SetFocus(Focus),
    Nudge { volume: Volume, at: Instant },
    EndNudge,
    BeginMouseDrag,
    EndMouseDrag,
}

pub fn app_reducer(state: &mut AppState, action: AppAction) {
    match action {
        AppAction::Quit => {
            log::debug!("Quit action received");
            state.exit = true;
        }
        AppAction::FocusNext => {
            state.focus = state.focus.next();
        }
        AppAction::FocusPrevious => {
            state.focus = state.focus.previous();
        }
        AppAction::SetFocus(focus) => {
            state.focus = focus;
        }
        AppAction::Nudge { volume, at } => {
            state.nudge = Some(Nudge {
                volume,
                last_input: at,
            });
        }
        AppAction::EndNudge => {
            log::debug!("EndNudge action received");
            state.nudge = None;
        }
        AppAction::BeginMouseDrag => {
            state.mouse_drag = true;
        }
        AppAction::EndMouseDrag => {
            state.mouse_drag = false;
        }
    }
}
