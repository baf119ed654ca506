use crate::state::{
    court::SlotIndex,
    roster::PlayerIndex,
    score::{Side, TeamScore},
    state_machine::GamePhase,
    stats::{EpochMillis, FoulAdvisory},
};

/// Domain event emitted by a [`GameState`](crate::state::GameState) transition.
///
/// Transitions never touch storage or the UI; the service layer fans these out
/// to the snapshot writer and the notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    /// A player's playtime clock was opened.
    TimerStarted {
        /// Player whose timer started.
        player: PlayerIndex,
        /// Wall-clock instant the timer opened.
        at: EpochMillis,
    },
    /// A player's playtime clock was closed and folded into their total.
    TimerStopped {
        /// Player whose timer stopped.
        player: PlayerIndex,
        /// Whole seconds added to the accumulated total.
        credited_seconds: u64,
    },
    /// A slot received a new occupant.
    Substituted {
        /// Court slot that changed hands.
        slot: SlotIndex,
        /// Player who left the slot, if any.
        outgoing: Option<PlayerIndex>,
        /// Player now holding the slot.
        incoming: PlayerIndex,
    },
    /// Every occupant moved one position along the serving rotation.
    Rotated,
    /// A foul was recorded.
    FoulAdded {
        /// Player charged with the foul.
        player: PlayerIndex,
        /// Fouls after the increment.
        fouls: u32,
        /// Threshold classification for the caller.
        advisory: FoulAdvisory,
    },
    /// A player scored; the team score consumes this.
    PointScored {
        /// Scoring player.
        player: PlayerIndex,
        /// Side credited with the point.
        side: Side,
    },
    /// The score was corrected by hand.
    ScoreAdjusted {
        /// Side that was corrected.
        side: Side,
        /// Score after the correction.
        score: TeamScore,
    },
    /// The lifecycle moved to another phase.
    PhaseChanged {
        /// Phase before the transition.
        from: GamePhase,
        /// Phase after the transition.
        to: GamePhase,
    },
    /// The final score was frozen.
    ScoreFinalized {
        /// Frozen score.
        score: TeamScore,
    },
    /// The scoresheet header changed.
    MatchDetailsUpdated,
    /// Playtime closed while the page was gone was credited on load.
    Rehydrated {
        /// Players whose totals were compensated.
        players: Vec<PlayerIndex>,
    },
    /// Every stat, slot and score went back to its initial value.
    Reset,
}
