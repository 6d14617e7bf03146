use crate::orchestrator::{ConsoleEvent, LogView, RunDetail, UiCommand};
use crate::status::RunAction;
use crossterm::event::{KeyCode, KeyModifiers};
use std::time::Instant;

pub const TAB_PLAN: usize = 0;
pub const TAB_APPLY: usize = 1;
pub const TAB_HELP: usize = 2;
const TAB_COUNT: usize = 3;
const PAGE: u16 = 10;

pub struct UiState {
    pub run_id: String,
    pub tab: usize,
    pub detail: Option<RunDetail>,
    pub info: String,
    /// Destructive action waiting for its second key press.
    pub armed: Option<RunAction>,
    /// An action request is in flight.
    pub busy: bool,
    pub scroll: u16,
    pub last_update: Option<Instant>,
}

impl UiState {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            tab: TAB_PLAN,
            detail: None,
            info: "Loading run…".into(),
            armed: None,
            busy: false,
            scroll: 0,
            last_update: None,
        }
    }

    /// Log shown on the current tab, if any.
    pub fn current_log(&self) -> Option<&LogView> {
        let d = self.detail.as_ref()?;
        match self.tab {
            TAB_PLAN => Some(&d.plan_log),
            TAB_APPLY => Some(&d.apply_log),
            _ => None,
        }
    }

    fn max_scroll(&self) -> u16 {
        let lines = self.current_log().map(|l| l.text().lines().count()).unwrap_or(0);
        u16::try_from(lines.saturating_sub(1)).unwrap_or(u16::MAX)
    }

    fn scroll_by(&mut self, delta: i32) {
        let next = (i32::from(self.scroll) + delta).clamp(0, i32::from(self.max_scroll()));
        self.scroll = u16::try_from(next).unwrap_or(0);
    }

    pub fn available_actions(&self) -> Vec<RunAction> {
        self.detail
            .as_ref()
            .map(RunDetail::available_actions)
            .unwrap_or_default()
    }
}

/// What the UI loop should do after a key press.
#[derive(Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    None,
    Send(UiCommand),
    Copy(String),
    Quit,
}

fn command_for(action: RunAction) -> UiCommand {
    match action {
        RunAction::Approve => UiCommand::Approve,
        RunAction::Discard => UiCommand::Discard,
        RunAction::Cancel => UiCommand::Cancel,
    }
}

fn request_action(state: &mut UiState, action: RunAction) -> KeyOutcome {
    let Some(detail) = state.detail.as_ref() else {
        state.info = "Run is still loading".into();
        return KeyOutcome::None;
    };
    let status = detail.status();
    if !action.is_legal_for(status) {
        state.armed = None;
        state.info = format!("Cannot {action} a run that is {}", status.meta().label);
        return KeyOutcome::None;
    }
    if state.busy {
        state.info = "Another action is still in progress".into();
        return KeyOutcome::None;
    }
    if action.needs_confirmation() && state.armed != Some(action) {
        state.armed = Some(action);
        state.info = format!("Press {} again to {action} this run", key_for(action));
        return KeyOutcome::None;
    }
    state.armed = None;
    state.busy = true;
    state.info = format!("Requesting {action}…");
    KeyOutcome::Send(command_for(action))
}

pub fn key_for(action: RunAction) -> char {
    match action {
        RunAction::Approve => 'a',
        RunAction::Discard => 'd',
        RunAction::Cancel => 'c',
    }
}

pub fn apply_key(state: &mut UiState, modifiers: KeyModifiers, code: KeyCode) -> KeyOutcome {
    let action = match (modifiers, code) {
        (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
            return KeyOutcome::Quit
        }
        (_, KeyCode::Char('a')) => Some(RunAction::Approve),
        (_, KeyCode::Char('d')) => Some(RunAction::Discard),
        (_, KeyCode::Char('c')) => Some(RunAction::Cancel),
        _ => None,
    };
    if let Some(action) = action {
        return request_action(state, action);
    }
    // Any other key disarms a pending confirmation.
    if state.armed.take().is_some() {
        state.info = "Cancelled".into();
    }

    match code {
        KeyCode::Char('r') => {
            state.info = "Refreshing…".into();
            KeyOutcome::Send(UiCommand::Refresh)
        }
        KeyCode::Tab => {
            state.tab = (state.tab + 1) % TAB_COUNT;
            state.scroll = 0;
            KeyOutcome::None
        }
        KeyCode::BackTab => {
            state.tab = (state.tab + TAB_COUNT - 1) % TAB_COUNT;
            state.scroll = 0;
            KeyOutcome::None
        }
        KeyCode::Char('?') => {
            state.tab = TAB_HELP;
            KeyOutcome::None
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.scroll_by(-1);
            KeyOutcome::None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.scroll_by(1);
            KeyOutcome::None
        }
        KeyCode::PageUp => {
            state.scroll_by(-i32::from(PAGE));
            KeyOutcome::None
        }
        KeyCode::PageDown => {
            state.scroll_by(i32::from(PAGE));
            KeyOutcome::None
        }
        KeyCode::Home | KeyCode::Char('g') => {
            state.scroll = 0;
            KeyOutcome::None
        }
        KeyCode::End | KeyCode::Char('G') => {
            state.scroll = state.max_scroll();
            KeyOutcome::None
        }
        KeyCode::Char('y') => KeyOutcome::Copy(state.run_id.clone()),
        _ => KeyOutcome::None,
    }
}

/// Returns `false` once the session has expired and the view must close.
pub fn apply_event(state: &mut UiState, ev: ConsoleEvent) -> bool {
    match ev {
        ConsoleEvent::Loaded(d) => {
            let status = d.status();
            let previous = state.detail.as_ref().map(RunDetail::status);
            if let Some(prev) = previous {
                if prev != status && status.is_terminal() {
                    state.info = format!("Run finished: {}", status.meta().label);
                }
            } else {
                state.info = format!("Loaded run {}", d.run.id);
            }
            if state.armed.is_some_and(|a| !a.is_legal_for(status)) {
                state.armed = None;
            }
            state.detail = Some(*d);
            state.last_update = Some(Instant::now());
            state.scroll = state.scroll.min(state.max_scroll());
            true
        }
        ConsoleEvent::Info(msg) => {
            state.busy = false;
            state.info = msg;
            true
        }
        ConsoleEvent::ActionFailed(msg) => {
            state.busy = false;
            state.info = msg;
            true
        }
        ConsoleEvent::LoadFailed(msg) => {
            state.info = format!("Refresh failed: {msg}");
            true
        }
        ConsoleEvent::SessionExpired => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures;
    use crate::status::RunStatus;

    fn loaded(status: RunStatus) -> UiState {
        let mut state = UiState::new("r-1");
        let run = fixtures::run("r-1", status);
        let detail = RunDetail {
            plan_log: LogView::Text((1..=30).map(|i| format!("line {i}\n")).collect()),
            apply_log: LogView::Placeholder("Waiting for approval..."),
            run,
        };
        assert!(apply_event(&mut state, ConsoleEvent::Loaded(Box::new(detail))));
        state
    }

    fn press(state: &mut UiState, c: char) -> KeyOutcome {
        apply_key(state, KeyModifiers::NONE, KeyCode::Char(c))
    }

    #[test]
    fn approve_is_sent_immediately() {
        let mut state = loaded(RunStatus::NeedsConfirmation);
        assert_eq!(press(&mut state, 'a'), KeyOutcome::Send(UiCommand::Approve));
        assert!(state.busy);
        // A second request while busy is refused locally.
        assert_eq!(press(&mut state, 'd'), KeyOutcome::None);
        assert_eq!(state.info, "Another action is still in progress");
    }

    #[test]
    fn discard_needs_a_second_press() {
        let mut state = loaded(RunStatus::NeedsConfirmation);
        assert_eq!(press(&mut state, 'd'), KeyOutcome::None);
        assert_eq!(state.armed, Some(RunAction::Discard));
        assert_eq!(press(&mut state, 'd'), KeyOutcome::Send(UiCommand::Discard));
        assert_eq!(state.armed, None);
    }

    #[test]
    fn other_keys_disarm() {
        let mut state = loaded(RunStatus::Planning);
        assert_eq!(press(&mut state, 'c'), KeyOutcome::None);
        assert_eq!(state.armed, Some(RunAction::Cancel));
        press(&mut state, 'j');
        assert_eq!(state.armed, None);
        assert_eq!(press(&mut state, 'c'), KeyOutcome::None);
    }

    #[test]
    fn illegal_actions_are_not_offered() {
        let mut state = loaded(RunStatus::Applied);
        assert_eq!(press(&mut state, 'a'), KeyOutcome::None);
        assert_eq!(state.info, "Cannot approve a run that is Applied");
        assert!(!state.busy);
    }

    #[test]
    fn ctrl_c_quits_but_plain_c_cancels() {
        let mut state = loaded(RunStatus::Planning);
        assert_eq!(
            apply_key(&mut state, KeyModifiers::CONTROL, KeyCode::Char('c')),
            KeyOutcome::Quit
        );
        assert_eq!(press(&mut state, 'c'), KeyOutcome::None);
        assert_eq!(press(&mut state, 'c'), KeyOutcome::Send(UiCommand::Cancel));
    }

    #[test]
    fn scrolling_is_clamped_to_the_log() {
        let mut state = loaded(RunStatus::Planning);
        apply_key(&mut state, KeyModifiers::NONE, KeyCode::PageDown);
        apply_key(&mut state, KeyModifiers::NONE, KeyCode::PageDown);
        apply_key(&mut state, KeyModifiers::NONE, KeyCode::PageDown);
        apply_key(&mut state, KeyModifiers::NONE, KeyCode::PageDown);
        assert_eq!(state.scroll, 29);
        press(&mut state, 'g');
        assert_eq!(state.scroll, 0);
        apply_key(&mut state, KeyModifiers::NONE, KeyCode::Up);
        assert_eq!(state.scroll, 0);

        apply_key(&mut state, KeyModifiers::NONE, KeyCode::Tab);
        assert_eq!(state.tab, TAB_APPLY);
        press(&mut state, 'G');
        assert_eq!(state.scroll, 0);
    }

    #[test]
    fn action_result_clears_busy() {
        let mut state = loaded(RunStatus::NeedsConfirmation);
        press(&mut state, 'a');
        assert!(apply_event(
            &mut state,
            ConsoleEvent::Info("Run approved! Applying...".into())
        ));
        assert!(!state.busy);
        assert_eq!(state.info, "Run approved! Applying...");
    }

    #[test]
    fn finishing_run_is_announced() {
        let mut state = loaded(RunStatus::Applying);
        let detail = RunDetail {
            run: fixtures::run("r-1", RunStatus::Applied),
            plan_log: LogView::Text("ok".into()),
            apply_log: LogView::Text("done".into()),
        };
        apply_event(&mut state, ConsoleEvent::Loaded(Box::new(detail)));
        assert_eq!(state.info, "Run finished: Applied");
    }

    #[test]
    fn session_expiry_closes_the_view() {
        let mut state = UiState::new("r-1");
        assert!(!apply_event(&mut state, ConsoleEvent::SessionExpired));
    }

    #[test]
    fn y_copies_the_run_id() {
        let mut state = UiState::new("r-42");
        assert_eq!(press(&mut state, 'y'), KeyOutcome::Copy("r-42".into()));
    }
}
