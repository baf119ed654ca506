//! Per-player playtime, foul and point counters.
//!
//! Playtime is stored as whole seconds plus an optional open timer. The live
//! value shown courtside is derived with [`PlayerStat::current_seconds`] and
//! never written back; only [`PlayerStatTable::stop_timer`] and rehydration
//! fold elapsed time into the stored total.

use serde::Serialize;

use crate::{
    error::GameError,
    state::{changes::StateChange, roster::PlayerIndex},
};

/// Milliseconds since the Unix epoch, as stored in snapshots.
pub type EpochMillis = i64;

/// Whole seconds between two instants, floored and never negative.
pub fn elapsed_seconds(from: EpochMillis, to: EpochMillis) -> u64 {
    u64::try_from(to.saturating_sub(from).max(0) / 1000).unwrap_or(0)
}

/// Stats tracked for a single player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlayerStat {
    /// Seconds of closed playtime.
    pub accumulated_seconds: u64,
    /// Whether the playtime timer is open.
    pub on_court: bool,
    /// Instant the open timer started; set iff `on_court`.
    pub timer_started_at: Option<EpochMillis>,
    /// Fouls charged so far.
    pub fouls: u32,
    /// Points scored so far.
    pub points: u32,
}

impl PlayerStat {
    /// Accumulated seconds plus the live delta of an open timer.
    pub fn current_seconds(&self, now: EpochMillis) -> u64 {
        match (self.on_court, self.timer_started_at) {
            (true, Some(started)) => self
                .accumulated_seconds
                .saturating_add(elapsed_seconds(started, now)),
            _ => self.accumulated_seconds,
        }
    }
}

/// Foul thresholds configured for the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoulThresholds {
    /// Count at which a substitution is suggested.
    pub warning: u32,
    /// Count at which the player must leave the court.
    pub max: u32,
}

impl Default for FoulThresholds {
    fn default() -> Self {
        Self { warning: 3, max: 5 }
    }
}

/// Standing of a player's foul count, used for highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FoulLevel {
    /// Below the warning threshold.
    Clear,
    /// At or above the warning threshold.
    Warning,
    /// At or above the maximum.
    Limit,
}

impl FoulLevel {
    /// Classify a foul count against the thresholds.
    pub fn classify(fouls: u32, thresholds: FoulThresholds) -> Self {
        if fouls >= thresholds.max {
            FoulLevel::Limit
        } else if fouls >= thresholds.warning {
            FoulLevel::Warning
        } else {
            FoulLevel::Clear
        }
    }
}

/// What a freshly recorded foul means for the caller. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoulAdvisory {
    /// Nothing to act on.
    Recorded,
    /// The warning count was just reached.
    ConsiderSubstitution,
    /// The maximum was reached or exceeded.
    MustSubstitute,
}

impl FoulAdvisory {
    /// Advisory for the count reached by the latest foul.
    pub fn for_count(fouls: u32, thresholds: FoulThresholds) -> Self {
        if fouls >= thresholds.max {
            FoulAdvisory::MustSubstitute
        } else if fouls == thresholds.warning {
            FoulAdvisory::ConsiderSubstitution
        } else {
            FoulAdvisory::Recorded
        }
    }
}

/// One [`PlayerStat`] per roster entry, indexed identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStatTable {
    stats: Vec<PlayerStat>,
}

impl PlayerStatTable {
    /// Zeroed stats for a roster of `len` players.
    pub fn new(len: usize) -> Self {
        Self {
            stats: vec![PlayerStat::default(); len],
        }
    }

    /// Wrap already-merged stats (one per roster entry).
    pub fn from_stats(stats: Vec<PlayerStat>) -> Self {
        Self { stats }
    }

    /// Number of tracked players.
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    /// Whether no player is tracked.
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Stats of one player.
    pub fn get(&self, player: PlayerIndex) -> Option<&PlayerStat> {
        self.stats.get(player)
    }

    /// Iterate over `(index, stat)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerIndex, &PlayerStat)> {
        self.stats.iter().enumerate()
    }

    fn stat_mut(&mut self, player: PlayerIndex) -> Result<&mut PlayerStat, GameError> {
        self.stats
            .get_mut(player)
            .ok_or(GameError::InvalidPlayerIndex(player))
    }

    /// Open the player's timer. No-op while the clock is stopped or the timer is already open.
    pub fn start_timer(
        &mut self,
        player: PlayerIndex,
        clock_running: bool,
        now: EpochMillis,
    ) -> Result<Option<StateChange>, GameError> {
        let stat = self.stat_mut(player)?;
        if !clock_running || stat.on_court {
            return Ok(None);
        }

        stat.on_court = true;
        stat.timer_started_at = Some(now);
        Ok(Some(StateChange::TimerStarted { player, at: now }))
    }

    /// Close the player's timer, folding elapsed whole seconds into the total.
    ///
    /// Always leaves the player off court; stopping a closed timer adds nothing.
    pub fn stop_timer(
        &mut self,
        player: PlayerIndex,
        now: EpochMillis,
    ) -> Result<Option<StateChange>, GameError> {
        let stat = self.stat_mut(player)?;
        let was_open = stat.on_court || stat.timer_started_at.is_some();

        let mut credited_seconds = 0;
        if let Some(started) = stat.timer_started_at.take() {
            credited_seconds = elapsed_seconds(started, now);
            stat.accumulated_seconds = stat.accumulated_seconds.saturating_add(credited_seconds);
        }
        stat.on_court = false;

        Ok(was_open.then_some(StateChange::TimerStopped {
            player,
            credited_seconds,
        }))
    }

    /// Live playtime of a player without mutating anything.
    pub fn current_seconds(&self, player: PlayerIndex, now: EpochMillis) -> Result<u64, GameError> {
        self.get(player)
            .map(|stat| stat.current_seconds(now))
            .ok_or(GameError::InvalidPlayerIndex(player))
    }

    /// Increment the foul count and return the new total.
    pub fn add_foul(&mut self, player: PlayerIndex) -> Result<u32, GameError> {
        let stat = self.stat_mut(player)?;
        stat.fouls = stat.fouls.saturating_add(1);
        Ok(stat.fouls)
    }

    /// Increment the point count and return the new total.
    pub fn add_point(&mut self, player: PlayerIndex) -> Result<u32, GameError> {
        let stat = self.stat_mut(player)?;
        stat.points = stat.points.saturating_add(1);
        Ok(stat.points)
    }

    /// Credit time elapsed since each open timer started and restart it at `now`.
    ///
    /// Used when a snapshot of a running game is reloaded. Returns the players
    /// that were compensated.
    pub fn rehydrate(&mut self, now: EpochMillis) -> Vec<PlayerIndex> {
        let mut compensated = Vec::new();
        for (index, stat) in self.stats.iter_mut().enumerate() {
            if let (true, Some(started)) = (stat.on_court, stat.timer_started_at) {
                stat.accumulated_seconds = stat
                    .accumulated_seconds
                    .saturating_add(elapsed_seconds(started, now));
                stat.timer_started_at = Some(now);
                compensated.push(index);
            }
        }
        compensated
    }

    /// Zero every stat.
    pub fn reset(&mut self) {
        self.stats.fill(PlayerStat::default());
    }
}
