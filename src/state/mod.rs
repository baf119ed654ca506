//! In-memory match state and its pure transitions.
//!
//! Every mutating operation takes the current wall-clock instant explicitly and
//! returns the [`StateChange`]s it produced. Nothing here touches storage or
//! the UI.

/// Domain events emitted by transitions.
pub mod changes;
pub mod court;
/// Scoresheet header.
pub mod match_details;
pub mod roster;
pub mod score;
/// Match lifecycle phases and the events moving between them.
pub mod state_machine;
pub mod stats;

use crate::error::{GameError, ValidationFailure};

pub use self::changes::StateChange;
pub use self::court::{COURT_SLOTS, CourtAssignment, ROTATION, SlotIndex};
pub use self::match_details::MatchDetails;
pub use self::roster::{Player, PlayerIndex, Roster};
pub use self::score::{ScoreAdjustment, Side, TeamScore};
pub use self::state_machine::{GameEvent, GamePhase, GameStateMachine, InvalidTransition};
pub use self::stats::{
    EpochMillis, FoulAdvisory, FoulLevel, FoulThresholds, PlayerStat, PlayerStatTable,
};

/// Result of a state transition: the changes to fan out.
pub type TransitionResult = Result<Vec<StateChange>, GameError>;

/// Aggregate owning everything tracked for the current match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    roster: Roster,
    thresholds: FoulThresholds,
    stats: PlayerStatTable,
    court: CourtAssignment,
    machine: GameStateMachine,
    score: TeamScore,
    final_score: Option<TeamScore>,
    match_details: MatchDetails,
}

/// Persisted pieces used to rebuild a [`GameState`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoredParts {
    /// Phase at the time of the snapshot.
    pub phase: GamePhase,
    /// One stat per roster entry.
    pub stats: Vec<PlayerStat>,
    /// Court slots, already normalized.
    pub court: CourtAssignment,
    /// Live score.
    pub score: TeamScore,
    /// Score frozen at finalize.
    pub final_score: Option<TeamScore>,
    /// Scoresheet header.
    pub match_details: MatchDetails,
}

impl GameState {
    /// Fresh sheet for `roster`.
    pub fn new(roster: Roster, thresholds: FoulThresholds) -> Self {
        let stats = PlayerStatTable::new(roster.len());
        Self {
            roster,
            thresholds,
            stats,
            court: CourtAssignment::new(),
            machine: GameStateMachine::new(),
            score: TeamScore::default(),
            final_score: None,
            match_details: MatchDetails::default(),
        }
    }

    /// Rebuild from persisted parts. Stats are padded or truncated to the roster size.
    pub fn restore(roster: Roster, thresholds: FoulThresholds, parts: RestoredParts) -> Self {
        let mut stats = parts.stats;
        stats.resize(roster.len(), PlayerStat::default());
        Self {
            stats: PlayerStatTable::from_stats(stats),
            roster,
            thresholds,
            court: parts.court,
            machine: GameStateMachine::with_phase(parts.phase),
            score: parts.score,
            final_score: parts.final_score,
            match_details: parts.match_details,
        }
    }

    /// Players available for the match.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Foul thresholds in force.
    pub fn thresholds(&self) -> FoulThresholds {
        self.thresholds
    }

    /// Per-player stats.
    pub fn stats(&self) -> &PlayerStatTable {
        &self.stats
    }

    /// Court slots.
    pub fn court(&self) -> &CourtAssignment {
        &self.court
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> GamePhase {
        self.machine.phase()
    }

    /// Whether player timers may start.
    pub fn clock_running(&self) -> bool {
        self.phase().clock_running()
    }

    /// Live score.
    pub fn score(&self) -> TeamScore {
        self.score
    }

    /// Score saved at finalize.
    pub fn final_score(&self) -> Option<TeamScore> {
        self.final_score
    }

    /// Scoresheet header.
    pub fn match_details(&self) -> &MatchDetails {
        &self.match_details
    }

    /// Roster indices without a court slot.
    pub fn benched_players(&self) -> Vec<PlayerIndex> {
        self.court.benched_players(self.roster.len())
    }

    /// Whether `player` holds a court slot.
    pub fn is_on_court(&self, player: PlayerIndex) -> bool {
        self.court.is_on_court(player)
    }

    /// Live playtime of `player`.
    pub fn current_seconds(&self, player: PlayerIndex, now: EpochMillis) -> Result<u64, GameError> {
        self.stats.current_seconds(player, now)
    }

    fn ensure_player(&self, player: PlayerIndex) -> Result<(), GameError> {
        if self.roster.contains(player) {
            Ok(())
        } else {
            Err(GameError::InvalidPlayerIndex(player))
        }
    }

    fn ensure_running(&self, action: &'static str) -> Result<(), GameError> {
        match self.phase() {
            GamePhase::Running => Ok(()),
            GamePhase::Finalized => Err(ValidationFailure::GameFinalized.into()),
            GamePhase::NotStarted => Err(ValidationFailure::GameNotRunning { action }.into()),
        }
    }

    fn stop_court_timers(&mut self, now: EpochMillis) -> TransitionResult {
        let occupants: Vec<_> = self.court.occupants().collect();
        let mut changes = Vec::new();
        for player in occupants {
            changes.extend(self.stats.stop_timer(player, now)?);
        }
        Ok(changes)
    }

    fn start_court_timers(&mut self, now: EpochMillis) -> TransitionResult {
        let occupants: Vec<_> = self.court.occupants().collect();
        let running = self.clock_running();
        let mut changes = Vec::new();
        for player in occupants {
            changes.extend(self.stats.start_timer(player, running, now)?);
        }
        Ok(changes)
    }

    /// Put `player` into `slot`, substituting out any previous occupant.
    ///
    /// The outgoing player's timer is closed first; the incoming player's timer
    /// opens when the clock is running.
    pub fn assign(&mut self, slot: SlotIndex, player: PlayerIndex, now: EpochMillis) -> TransitionResult {
        self.ensure_player(player)?;
        if slot >= COURT_SLOTS {
            return Err(GameError::InvalidSlot(slot));
        }
        let outgoing = self.court.occupant(slot);
        if outgoing == Some(player) {
            return Ok(Vec::new());
        }
        if let Some(existing) = self.court.slot_of(player) {
            return Err(ValidationFailure::PlayerAlreadyOnCourt {
                player: self.roster.name_of(player).to_owned(),
                slot: existing,
            }
            .into());
        }

        let mut changes = Vec::new();
        if let Some(outgoing) = outgoing {
            changes.extend(self.stats.stop_timer(outgoing, now)?);
        }
        self.court
            .place(slot, player, self.roster.name_of(player))?;
        changes.push(StateChange::Substituted {
            slot,
            outgoing,
            incoming: player,
        });
        changes.extend(self.stats.start_timer(player, self.clock_running(), now)?);
        Ok(changes)
    }

    /// Apply one clockwise rotation: stop every timer, permute, restart every timer.
    pub fn rotate_clockwise(&mut self, now: EpochMillis) -> TransitionResult {
        if !self.court.is_full() {
            return Err(ValidationFailure::CourtNotFullForRotation {
                filled: self.court.filled(),
            }
            .into());
        }

        let mut changes = self.stop_court_timers(now)?;
        self.court.rotate_clockwise()?;
        changes.push(StateChange::Rotated);
        changes.extend(self.start_court_timers(now)?);
        Ok(changes)
    }

    /// Start the match. Requires all six slots to be filled.
    pub fn start(&mut self, now: EpochMillis) -> TransitionResult {
        let from = self.phase();
        self.machine.next_phase(GameEvent::StartGame)?;
        if !self.court.is_full() {
            return Err(ValidationFailure::CourtNotFull {
                filled: self.court.filled(),
            }
            .into());
        }

        let to = self.machine.transition(GameEvent::StartGame)?;
        let mut changes = vec![StateChange::PhaseChanged { from, to }];
        changes.extend(self.start_court_timers(now)?);
        Ok(changes)
    }

    /// Freeze the score and close every open timer.
    pub fn finalize(&mut self, now: EpochMillis) -> TransitionResult {
        let from = self.phase();
        let to = self.machine.transition(GameEvent::Finalize)?;

        let mut changes = self.stop_court_timers(now)?;
        self.final_score = Some(self.score);
        changes.push(StateChange::PhaseChanged { from, to });
        changes.push(StateChange::ScoreFinalized { score: self.score });
        Ok(changes)
    }

    /// Clear stats, court and scores. Callers must have obtained confirmation.
    ///
    /// The scoresheet header is kept.
    pub fn reset(&mut self) -> TransitionResult {
        let from = self.phase();
        let to = self.machine.transition(GameEvent::Reset)?;

        self.stats.reset();
        self.court.clear();
        self.score = TeamScore::default();
        self.final_score = None;

        let mut changes = vec![StateChange::Reset];
        if from != to {
            changes.push(StateChange::PhaseChanged { from, to });
        }
        Ok(changes)
    }

    /// Charge a foul. Only accepted while the game runs.
    pub fn add_foul(&mut self, player: PlayerIndex) -> TransitionResult {
        self.ensure_player(player)?;
        self.ensure_running("add fouls")?;

        let fouls = self.stats.add_foul(player)?;
        Ok(vec![StateChange::FoulAdded {
            player,
            fouls,
            advisory: FoulAdvisory::for_count(fouls, self.thresholds),
        }])
    }

    /// Credit a point to `player` and to the side configured in the match details.
    pub fn add_point(&mut self, player: PlayerIndex) -> TransitionResult {
        self.ensure_player(player)?;
        self.ensure_running("add points")?;

        self.stats.add_point(player)?;
        let change = StateChange::PointScored {
            player,
            side: self.match_details.scoring_side(),
        };
        self.score.apply(&change);
        Ok(vec![change])
    }

    /// Correct the live score by hand. Rejected once the score is final.
    pub fn adjust_score(&mut self, side: Side, adjustment: ScoreAdjustment) -> TransitionResult {
        if self.phase() == GamePhase::Finalized {
            return Err(ValidationFailure::GameFinalized.into());
        }
        if !self.score.adjust(side, adjustment) {
            return Ok(Vec::new());
        }
        Ok(vec![StateChange::ScoreAdjusted {
            side,
            score: self.score,
        }])
    }

    /// Replace the scoresheet header.
    pub fn update_match_details(&mut self, details: MatchDetails) -> TransitionResult {
        if self.match_details == details {
            return Ok(Vec::new());
        }
        self.match_details = details;
        Ok(vec![StateChange::MatchDetailsUpdated])
    }

    /// Credit playtime that elapsed while the state was not loaded.
    ///
    /// Only applies when the restored phase is running.
    pub fn rehydrate(&mut self, now: EpochMillis) -> Vec<StateChange> {
        if !self.clock_running() {
            return Vec::new();
        }
        let players = self.stats.rehydrate(now);
        if players.is_empty() {
            Vec::new()
        } else {
            vec![StateChange::Rehydrated { players }]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Roster {
        Roster::new(
            (1..=10)
                .map(|number| Player::new(format!("Player {number}"), number))
                .collect(),
        )
    }

    fn state() -> GameState {
        GameState::new(roster(), FoulThresholds::default())
    }

    fn lineup(state: &mut GameState, players: &[PlayerIndex]) {
        for (slot, player) in players.iter().enumerate() {
            state.assign(slot, *player, 0).unwrap();
        }
    }

    fn running_state(now: EpochMillis) -> GameState {
        let mut state = state();
        lineup(&mut state, &[0, 1, 2, 3, 4, 5]);
        state.start(now).unwrap();
        state
    }

    #[test]
    fn start_with_five_players_fails_and_stays_not_started() {
        let mut state = state();
        lineup(&mut state, &[0, 1, 2, 3, 4]);
        let before = state.clone();

        let err = state.start(1_000).unwrap_err();

        assert_eq!(
            err,
            GameError::Validation(ValidationFailure::CourtNotFull { filled: 5 })
        );
        assert_eq!(state, before);
        assert_eq!(state.phase(), GamePhase::NotStarted);
    }

    #[test]
    fn lifecycle_events_out_of_order_leave_state_untouched() {
        let mut state = running_state(0);
        let before = state.clone();

        let err = state.start(5_000).unwrap_err();

        assert_eq!(
            err,
            GameError::InvalidTransition(InvalidTransition {
                from: GamePhase::Running,
                event: GameEvent::StartGame,
            })
        );
        assert_eq!(state, before);

        let mut fresh = self::state();
        assert!(matches!(
            fresh.finalize(1_000),
            Err(GameError::InvalidTransition(_))
        ));
        assert_eq!(fresh.phase(), GamePhase::NotStarted);
        assert_eq!(fresh.final_score(), None);
    }

    #[test]
    fn start_reports_phase_change() {
        let mut state = state();
        lineup(&mut state, &[0, 1, 2, 3, 4, 5]);

        let changes = state.start(0).unwrap();

        assert_eq!(
            changes.first(),
            Some(&StateChange::PhaseChanged {
                from: GamePhase::NotStarted,
                to: GamePhase::Running,
            })
        );
    }

    #[test]
    fn start_opens_all_court_timers() {
        let state = running_state(2_000);
        for player in 0..6 {
            let stat = state.stats().get(player).unwrap();
            assert!(stat.on_court);
            assert_eq!(stat.timer_started_at, Some(2_000));
        }
        assert!(!state.stats().get(6).unwrap().on_court);
    }

    #[test]
    fn assign_before_start_does_not_open_timers() {
        let mut state = state();
        let changes = state.assign(0, 3, 500).unwrap();
        assert_eq!(
            changes,
            vec![StateChange::Substituted {
                slot: 0,
                outgoing: None,
                incoming: 3
            }]
        );
        assert!(!state.stats().get(3).unwrap().on_court);
    }

    #[test]
    fn substitution_stops_outgoing_and_starts_incoming() {
        let mut state = running_state(0);

        let changes = state.assign(2, 8, 30_000).unwrap();

        assert_eq!(
            changes,
            vec![
                StateChange::TimerStopped {
                    player: 2,
                    credited_seconds: 30
                },
                StateChange::Substituted {
                    slot: 2,
                    outgoing: Some(2),
                    incoming: 8
                },
                StateChange::TimerStarted {
                    player: 8,
                    at: 30_000
                },
            ]
        );
        let outgoing = state.stats().get(2).unwrap();
        assert_eq!(outgoing.accumulated_seconds, 30);
        assert!(!outgoing.on_court);
        assert!(state.benched_players().contains(&2));
        assert!(state.is_on_court(8));
    }

    #[test]
    fn assigning_player_already_on_court_is_rejected() {
        let mut state = running_state(0);
        let before = state.clone();
        let err = state.assign(0, 4, 1_000).unwrap_err();
        assert!(matches!(
            err,
            GameError::Validation(ValidationFailure::PlayerAlreadyOnCourt { slot: 4, .. })
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn invalid_indices_are_surfaced() {
        let mut state = state();
        assert_eq!(state.assign(0, 99, 0), Err(GameError::InvalidPlayerIndex(99)));
        assert_eq!(state.assign(6, 1, 0), Err(GameError::InvalidSlot(6)));
    }

    #[test]
    fn rotation_keeps_every_second() {
        let mut state = running_state(0);

        state.rotate_clockwise(10_000).unwrap();

        assert_eq!(state.court().occupant(1), Some(0));
        assert_eq!(state.court().occupant(0), Some(3));
        for player in 0..6 {
            let stat = state.stats().get(player).unwrap();
            assert_eq!(stat.accumulated_seconds, 10);
            assert_eq!(stat.timer_started_at, Some(10_000));
            assert_eq!(state.current_seconds(player, 15_000).unwrap(), 15);
        }
    }

    #[test]
    fn rotation_with_empty_slot_changes_nothing() {
        let mut state = state();
        lineup(&mut state, &[0, 1, 2, 3, 4]);
        let before = state.clone();

        let err = state.rotate_clockwise(5_000).unwrap_err();

        assert_eq!(
            err,
            GameError::Validation(ValidationFailure::CourtNotFullForRotation { filled: 5 })
        );
        assert_eq!(state, before);
    }

    #[test]
    fn foul_before_start_is_rejected() {
        let mut state = state();
        lineup(&mut state, &[0, 1, 2, 3, 4, 5]);
        let err = state.add_foul(1).unwrap_err();
        assert_eq!(
            err,
            GameError::Validation(ValidationFailure::GameNotRunning { action: "add fouls" })
        );
        assert_eq!(state.stats().get(1).unwrap().fouls, 0);
    }

    #[test]
    fn foul_advisories_follow_thresholds() {
        let mut state = running_state(0);
        let advisories: Vec<_> = (0..5)
            .map(|_| match state.add_foul(0).unwrap().pop() {
                Some(StateChange::FoulAdded { advisory, .. }) => advisory,
                other => panic!("unexpected change {other:?}"),
            })
            .collect();
        assert_eq!(
            advisories,
            vec![
                FoulAdvisory::Recorded,
                FoulAdvisory::Recorded,
                FoulAdvisory::ConsiderSubstitution,
                FoulAdvisory::Recorded,
                FoulAdvisory::MustSubstitute,
            ]
        );
    }

    #[test]
    fn point_while_away_credits_away_score() {
        let mut state = running_state(0);
        let details = MatchDetails {
            home_away: "Away".into(),
            ..MatchDetails::default()
        };
        state.update_match_details(details).unwrap();

        let changes = state.add_point(4).unwrap();

        assert_eq!(
            changes,
            vec![StateChange::PointScored {
                player: 4,
                side: Side::Away
            }]
        );
        assert_eq!(state.score(), TeamScore::new(0, 1));
        assert_eq!(state.stats().get(4).unwrap().points, 1);
    }

    #[test]
    fn finalize_freezes_score_and_closes_timers() {
        let mut state = running_state(0);
        state.add_point(0).unwrap();

        state.finalize(20_000).unwrap();

        assert_eq!(state.phase(), GamePhase::Finalized);
        assert_eq!(state.final_score(), Some(TeamScore::new(1, 0)));
        assert!(state.stats().iter().all(|(_, stat)| !stat.on_court));
        assert_eq!(state.stats().get(0).unwrap().accumulated_seconds, 20);

        assert_eq!(
            state.add_point(0),
            Err(GameError::Validation(ValidationFailure::GameFinalized))
        );
        assert_eq!(
            state.adjust_score(Side::Home, ScoreAdjustment::Increment),
            Err(GameError::Validation(ValidationFailure::GameFinalized))
        );
        assert_eq!(state.score(), TeamScore::new(1, 0));
    }

    #[test]
    fn reset_clears_everything_but_match_details() {
        let mut state = running_state(0);
        state
            .update_match_details(MatchDetails {
                opponent: "Tigers".into(),
                ..MatchDetails::default()
            })
            .unwrap();
        state.add_point(2).unwrap();
        state.add_foul(3).unwrap();

        state.reset().unwrap();

        assert_eq!(state.phase(), GamePhase::NotStarted);
        assert!(state.stats().iter().all(|(_, stat)| *stat == PlayerStat::default()));
        assert_eq!(state.court().slots(), &[None; COURT_SLOTS]);
        assert_eq!(state.score(), TeamScore::default());
        assert_eq!(state.final_score(), None);
        assert_eq!(state.match_details().opponent, "Tigers");
    }

    #[test]
    fn rehydrate_only_when_running() {
        let mut parts = RestoredParts {
            phase: GamePhase::Running,
            stats: vec![PlayerStat::default(); 10],
            ..RestoredParts::default()
        };
        parts.stats[3] = PlayerStat {
            on_court: true,
            timer_started_at: Some(1_000),
            ..PlayerStat::default()
        };

        let mut running = GameState::restore(roster(), FoulThresholds::default(), parts.clone());
        assert_eq!(
            running.rehydrate(6_000),
            vec![StateChange::Rehydrated { players: vec![3] }]
        );
        let stat = running.stats().get(3).unwrap();
        assert_eq!(stat.accumulated_seconds, 5);
        assert_eq!(stat.timer_started_at, Some(6_000));

        parts.phase = GamePhase::NotStarted;
        let mut idle = GameState::restore(roster(), FoulThresholds::default(), parts);
        assert!(idle.rehydrate(6_000).is_empty());
        assert_eq!(idle.stats().get(3).unwrap().accumulated_seconds, 0);
    }
}
