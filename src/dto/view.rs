//! Read-only projection of the game state handed to presenters.
//!
//! Everything here is derived on demand; building a view never mutates state.

use std::fmt;

use serde::Serialize;

use crate::{
    dto::{format_epoch_millis, format_playtime},
    state::{EpochMillis, FoulLevel, GamePhase, GameState, PlayerIndex, Side, TeamScore},
};

/// One player line in the court, playtime or bench lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerLine {
    /// Roster index.
    pub index: PlayerIndex,
    /// Jersey number.
    pub number: u32,
    /// Display name.
    pub name: String,
    /// Live playtime in seconds.
    pub seconds: u64,
    /// `seconds` formatted as `Xm Ys`.
    pub playtime: String,
    /// Points scored.
    pub points: u32,
    /// Fouls charged.
    pub fouls: u32,
    /// Foul badge shown next to the line.
    pub foul_level: FoulLevel,
    /// RFC 3339 instant the open timer started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_court_since: Option<String>,
}

/// A court position and its occupant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotView {
    /// One-based position label.
    pub spot: usize,
    /// Occupant, if any.
    pub player: Option<PlayerLine>,
}

/// Everything a presenter needs to draw the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameView {
    /// Lifecycle phase.
    pub phase: GamePhase,
    /// Whether player timers advance.
    pub clock_running: bool,
    /// The six court positions in slot order.
    pub court: Vec<SlotView>,
    /// Court players in slot order.
    pub on_court: Vec<PlayerLine>,
    /// Remaining roster in roster order.
    pub bench: Vec<PlayerLine>,
    /// Running score.
    pub score: TeamScore,
    /// Frozen score once finalized.
    pub final_score: Option<TeamScore>,
    /// Side credited by player points.
    pub scoring_side: Side,
    /// Opposing team, empty when unknown.
    pub opponent: String,
}

impl GameView {
    /// Project `state` as of `now`.
    pub fn build(state: &GameState, now: EpochMillis) -> Self {
        let line = |index: PlayerIndex| player_line(state, index, now);

        let court: Vec<SlotView> = state
            .court()
            .slots()
            .iter()
            .enumerate()
            .map(|(slot, occupant)| SlotView {
                spot: slot + 1,
                player: (*occupant).and_then(&line),
            })
            .collect();
        let on_court = court.iter().filter_map(|slot| slot.player.clone()).collect();
        let bench = state
            .benched_players()
            .into_iter()
            .filter_map(&line)
            .collect();

        Self {
            phase: state.phase(),
            clock_running: state.clock_running(),
            court,
            on_court,
            bench,
            score: state.score(),
            final_score: state.final_score(),
            scoring_side: state.match_details().scoring_side(),
            opponent: state.match_details().opponent.clone(),
        }
    }
}

fn player_line(state: &GameState, index: PlayerIndex, now: EpochMillis) -> Option<PlayerLine> {
    let player = state.roster().get(index)?;
    let stat = state.stats().get(index)?;
    let seconds = stat.current_seconds(now);
    Some(PlayerLine {
        index,
        number: player.number,
        name: player.name.clone(),
        seconds,
        playtime: format_playtime(seconds),
        points: stat.points,
        fouls: stat.fouls,
        foul_level: FoulLevel::classify(stat.fouls, state.thresholds()),
        on_court_since: stat
            .timer_started_at
            .filter(|_| stat.on_court)
            .map(format_epoch_millis),
    })
}

impl fmt::Display for PlayerLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} | Time: {} | Pts: {} | Fouls: {}",
            self.number, self.name, self.playtime, self.points, self.fouls
        )?;
        match self.foul_level {
            FoulLevel::Clear => Ok(()),
            FoulLevel::Warning => write!(f, " (!)"),
            FoulLevel::Limit => write!(f, " (MUST SUB)"),
        }
    }
}

impl fmt::Display for GameView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self.phase {
            GamePhase::NotStarted => "not started",
            GamePhase::Running => "running",
            GamePhase::Finalized => "final",
        };
        write!(f, "Home {} - {} Away [{phase}]", self.score.home, self.score.away)?;
        if !self.opponent.is_empty() {
            write!(f, " vs {}", self.opponent)?;
        }
        writeln!(f)?;
        if let Some(final_score) = self.final_score {
            writeln!(f, "Final: {} - {}", final_score.home, final_score.away)?;
        }

        writeln!(f, "Court:")?;
        for slot in &self.court {
            match &slot.player {
                Some(player) => writeln!(f, "  Spot {}: {player}", slot.spot)?,
                None => writeln!(f, "  Spot {}: -", slot.spot)?,
            }
        }
        writeln!(f, "Bench:")?;
        for player in &self.bench {
            writeln!(f, "  {player}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FoulThresholds, MatchDetails, Player, Roster};

    fn running_state() -> GameState {
        let roster = Roster::new(
            (1..=8)
                .map(|number| Player::new(format!("P{number}"), number))
                .collect(),
        );
        let mut state = GameState::new(roster, FoulThresholds::default());
        for slot in 0..6 {
            state.assign(slot, slot, 0).unwrap();
        }
        state.start(0).unwrap();
        state
    }

    #[test]
    fn view_derives_live_seconds_without_mutating() {
        let state = running_state();
        let before = state.clone();

        let view = GameView::build(&state, 65_400);

        assert_eq!(state, before);
        assert_eq!(view.on_court.len(), 6);
        assert_eq!(view.on_court[0].seconds, 65);
        assert_eq!(view.on_court[0].playtime, "1m 5s");
        assert_eq!(
            view.on_court[0].on_court_since.as_deref(),
            Some("1970-01-01T00:00:00Z")
        );
        assert_eq!(
            view.bench.iter().map(|line| line.number).collect::<Vec<_>>(),
            vec![7, 8]
        );
        assert_eq!(view.bench[0].on_court_since, None);
    }

    #[test]
    fn empty_slots_render_as_placeholders() {
        let roster = Roster::new(vec![Player::new("Solo", 4)]);
        let mut state = GameState::new(roster, FoulThresholds::default());
        state.assign(2, 0, 0).unwrap();

        let view = GameView::build(&state, 0);
        assert_eq!(view.court.len(), 6);
        assert!(view.court[0].player.is_none());
        assert_eq!(view.court[2].spot, 3);

        let text = view.to_string();
        assert!(text.contains("Spot 1: -"));
        assert!(text.contains("Spot 3: #4 Solo | Time: 0m 0s | Pts: 0 | Fouls: 0"));
    }

    #[test]
    fn foul_levels_are_highlighted() {
        let mut state = running_state();
        for _ in 0..3 {
            state.add_foul(1).unwrap();
        }
        for _ in 0..5 {
            state.add_foul(2).unwrap();
        }

        let view = GameView::build(&state, 0);
        assert_eq!(view.on_court[1].foul_level, FoulLevel::Warning);
        assert_eq!(view.on_court[2].foul_level, FoulLevel::Limit);
        assert!(view.on_court[2].to_string().ends_with("(MUST SUB)"));
    }

    #[test]
    fn scoring_side_and_opponent_come_from_match_details() {
        let mut state = running_state();
        state
            .update_match_details(MatchDetails {
                home_away: "Away".into(),
                opponent: "Tigers".into(),
                ..MatchDetails::default()
            })
            .unwrap();

        let view = GameView::build(&state, 0);
        assert_eq!(view.scoring_side, Side::Away);
        assert!(view.to_string().starts_with("Home 0 - 0 Away [running] vs Tigers"));
    }
}
