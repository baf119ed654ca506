use serde::Serialize;
use thiserror::Error;

/// Lifecycle of a match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Lineup is being set; timers and scoring are disabled.
    #[default]
    NotStarted,
    /// The game clock runs: timers open, fouls and points are accepted.
    Running,
    /// The final score is frozen.
    Finalized,
}

impl GamePhase {
    /// Whether player timers may start.
    pub fn clock_running(self) -> bool {
        matches!(self, GamePhase::Running)
    }

    /// Stable name used in snapshots.
    pub fn as_str(self) -> &'static str {
        match self {
            GamePhase::NotStarted => "not_started",
            GamePhase::Running => "running",
            GamePhase::Finalized => "finalized",
        }
    }

    /// Inverse of [`GamePhase::as_str`].
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "not_started" => Some(GamePhase::NotStarted),
            "running" => Some(GamePhase::Running),
            "finalized" => Some(GamePhase::Finalized),
            _ => None,
        }
    }
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Scorekeeper starts the match with a full court.
    StartGame,
    /// Scorekeeper saves the final score.
    Finalize,
    /// Confirmed reset back to an empty sheet.
    Reset,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

/// Lifecycle state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameStateMachine {
    phase: GamePhase,
}

impl GameStateMachine {
    /// Create a new state machine in [`GamePhase::NotStarted`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a machine at a persisted phase.
    pub fn with_phase(phase: GamePhase) -> Self {
        Self { phase }
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Phase `event` would lead to, without applying it.
    pub fn next_phase(&self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (GamePhase::NotStarted, GameEvent::StartGame) => GamePhase::Running,
            (GamePhase::Running, GameEvent::Finalize) => GamePhase::Finalized,
            (_, GameEvent::Reset) => GamePhase::NotStarted,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }

    /// Apply `event` and return the new phase. The phase is untouched on error.
    pub fn transition(&mut self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        self.phase = self.next_phase(event)?;
        Ok(self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_not_started() {
        let sm = GameStateMachine::new();
        assert_eq!(sm.phase(), GamePhase::NotStarted);
        assert!(!sm.phase().clock_running());
    }

    #[test]
    fn full_happy_path_through_match() {
        let mut sm = GameStateMachine::new();
        assert_eq!(sm.transition(GameEvent::StartGame), Ok(GamePhase::Running));
        assert_eq!(sm.transition(GameEvent::Finalize), Ok(GamePhase::Finalized));
        assert_eq!(sm.transition(GameEvent::Reset), Ok(GamePhase::NotStarted));
    }

    #[test]
    fn reset_is_allowed_from_every_phase() {
        for phase in [GamePhase::NotStarted, GamePhase::Running, GamePhase::Finalized] {
            let mut sm = GameStateMachine::with_phase(phase);
            assert_eq!(sm.transition(GameEvent::Reset), Ok(GamePhase::NotStarted));
        }
    }

    #[test]
    fn invalid_transition_returns_error_and_keeps_phase() {
        let mut sm = GameStateMachine::new();
        let err = sm.transition(GameEvent::Finalize).unwrap_err();
        assert_eq!(err.from, GamePhase::NotStarted);
        assert_eq!(err.event, GameEvent::Finalize);
        assert_eq!(sm.phase(), GamePhase::NotStarted);

        let mut sm = GameStateMachine::with_phase(GamePhase::Finalized);
        assert!(sm.transition(GameEvent::StartGame).is_err());
        assert_eq!(sm.phase(), GamePhase::Finalized);
    }

    #[test]
    fn next_phase_does_not_move_the_machine() {
        let sm = GameStateMachine::new();
        assert_eq!(sm.next_phase(GameEvent::StartGame), Ok(GamePhase::Running));
        assert_eq!(sm.phase(), GamePhase::NotStarted);
    }

    #[test]
    fn phase_names_round_trip() {
        for phase in [GamePhase::NotStarted, GamePhase::Running, GamePhase::Finalized] {
            assert_eq!(GamePhase::parse(phase.as_str()), Some(phase));
        }
        assert_eq!(GamePhase::parse("paused"), None);
    }
}
