//! Error types for transitions and session operations.

use thiserror::Error;

use crate::{dao::storage::StorageError, state::InvalidTransition};

/// Precondition failures reported to the scorekeeper. The state is left untouched.
///
/// The `Display` text is the advisory shown courtside.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    /// The game cannot start before every slot is filled.
    #[error("Please select 6 players for the court before starting. ({filled}/6 filled)")]
    CourtNotFull {
        /// Number of occupied slots.
        filled: usize,
    },
    /// Rotation needs a full court.
    #[error("All 6 court spots must be filled before rotating. ({filled}/6 filled)")]
    CourtNotFullForRotation {
        /// Number of occupied slots.
        filled: usize,
    },
    /// Scoring actions require a running game.
    #[error("You can only {action} after the game has started.")]
    GameNotRunning {
        /// Human readable action, e.g. `add fouls`.
        action: &'static str,
    },
    /// The score is frozen once the match is finalized.
    #[error("The final score has been saved; reset the game to keep scoring.")]
    GameFinalized,
    /// A player cannot hold two slots at once.
    #[error("{player} is already on court in spot {}.", slot + 1)]
    PlayerAlreadyOnCourt {
        /// Name of the player.
        player: String,
        /// Zero-based slot the player already holds.
        slot: usize,
    },
}

/// Errors returned by [`GameState`](crate::state::GameState) transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Operation preconditions are not met.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),
    /// Caller referenced a player outside the roster.
    #[error("player index {0} is out of range")]
    InvalidPlayerIndex(usize),
    /// Caller referenced a slot outside the court.
    #[error("court slot {0} is out of range")]
    InvalidSlot(usize),
    /// Lifecycle event not allowed from the current phase.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

/// Errors that can occur in session operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The state transition was rejected.
    #[error(transparent)]
    Game(#[from] GameError),
    /// The snapshot could not be written or read.
    #[error("snapshot storage failed")]
    Storage(#[from] StorageError),
    /// The scorekeeper declined a destructive operation.
    #[error("reset declined")]
    ResetDeclined,
}

impl ServiceError {
    /// Whether the failure is a plain precondition miss rather than a fault.
    pub fn is_validation(&self) -> bool {
        matches!(self, ServiceError::Game(GameError::Validation(_)))
    }
}
