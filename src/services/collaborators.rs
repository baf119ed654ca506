//! Hooks the session calls into; implemented by whatever drives the UI.

use serde::Serialize;

use crate::dto::view::GameView;

/// Weight of a user-visible advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Neutral information.
    Info,
    /// Confirmation of a completed action.
    Success,
    /// Rejected action or threshold reached.
    Warning,
    /// Mandatory action or fault.
    Danger,
}

/// Renders the session after every committed change.
pub trait Presenter {
    /// Called after a change was committed and persisted.
    fn on_state_changed(&mut self, view: &GameView);

    /// Called by the periodic tick while the game runs. Ignored by default.
    fn on_tick(&mut self, view: &GameView) {
        let _ = view;
    }
}

/// Shows advisories (validation failures, thresholds, confirmations).
pub trait Notifier {
    /// Show `message` with the given emphasis.
    fn notify(&mut self, message: &str, severity: Severity);
}

/// Asks the scorekeeper before destructive operations.
pub trait Confirmation {
    /// Ask `message` as a yes/no question; `true` means the scorekeeper agreed.
    fn request_confirmation(&mut self, message: &str) -> bool;
}

/// Answers every confirmation request with a fixed value.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirmation for AutoConfirm {
    fn request_confirmation(&mut self, _message: &str) -> bool {
        self.0
    }
}
