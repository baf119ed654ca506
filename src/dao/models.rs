//! Record shapes stored under each snapshot key.
//!
//! Field names match the snapshots written by earlier browser revisions so old
//! sheets keep loading. Every field defaults on absence or corruption.

use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnError, DisplayFromStr, PickFirst, serde_as};

use crate::state::{EpochMillis, MatchDetails, PlayerStat, TeamScore};

/// Schema version of the snapshot layout. Absent means version 1.
pub const SCHEMA_VERSION_KEY: &str = "volleyballSchemaVersion";
/// Boolean game-clock flag, kept for older readers.
pub const GAME_RUNNING_KEY: &str = "volleyballGameRunning";
/// Lifecycle phase name (version 2).
pub const GAME_PHASE_KEY: &str = "volleyballGamePhase";
/// Per-player stats keyed by roster index.
pub const PLAYTIME_KEY: &str = "volleyballPlaytimes";
/// Six court slots.
pub const COURT_POSITIONS_KEY: &str = "volleyballCourtPositions";
/// Live team score.
pub const SCORE_KEY: &str = "scoreTracking";
/// Score frozen at finalize.
pub const FINAL_SCORE_KEY: &str = "volleyballFinalScore";
/// Scoresheet header.
pub const MATCH_DETAILS_KEY: &str = "matchDetails";

/// Layout written by this crate.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Stats of one player as stored.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatRecord {
    /// Closed playtime in whole seconds.
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub total_seconds: u64,
    /// Whether the timer was open when written.
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub is_on_court: bool,
    /// Start instant of the open timer.
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub last_start_time: Option<EpochMillis>,
    /// Fouls charged.
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub fouls: u32,
    /// Missing from version 1 snapshots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub points: Option<u32>,
}

impl From<&PlayerStat> for PlayerStatRecord {
    fn from(value: &PlayerStat) -> Self {
        Self {
            total_seconds: value.accumulated_seconds,
            is_on_court: value.on_court,
            last_start_time: value.timer_started_at,
            fouls: value.fouls,
            points: Some(value.points),
        }
    }
}

impl From<PlayerStatRecord> for PlayerStat {
    /// An open timer needs both the flag and a start instant; a half-open one is closed.
    fn from(value: PlayerStatRecord) -> Self {
        let open = value.is_on_court && value.last_start_time.is_some();
        Self {
            accumulated_seconds: value.total_seconds,
            on_court: open,
            timer_started_at: value.last_start_time.filter(|_| open),
            fouls: value.fouls,
            points: value.points.unwrap_or(0),
        }
    }
}

/// Team score as stored. Older revisions wrote the values as strings.
#[serde_as]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Home points.
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError<PickFirst<(_, DisplayFromStr)>>")]
    pub home: u32,
    /// Away points.
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError<PickFirst<(_, DisplayFromStr)>>")]
    pub away: u32,
}

impl From<TeamScore> for ScoreRecord {
    fn from(value: TeamScore) -> Self {
        Self {
            home: value.home,
            away: value.away,
        }
    }
}

impl From<ScoreRecord> for TeamScore {
    fn from(value: ScoreRecord) -> Self {
        TeamScore::new(value.home, value.away)
    }
}

/// Court slots as stored; unreadable entries become empty slots.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtRecord(#[serde_as(deserialize_as = "Vec<DefaultOnError>")] pub Vec<Option<usize>>);

/// Scoresheet header as stored, keyed by the scoresheet form field ids.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchDetailsRecord {
    /// Match identifier.
    #[serde(rename = "matchID", default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub id: String,
    /// Match date.
    #[serde(rename = "matchDate", default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub date: String,
    /// `"Home"` or `"Away"`.
    #[serde(rename = "matchHomeAway", default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub home_away: String,
    /// League, tournament, scrimmage...
    #[serde(rename = "matchType", default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub match_type: String,
    /// Venue.
    #[serde(rename = "matchLocation", default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub location: String,
    /// Opposing team name.
    #[serde(rename = "opposingTeam", default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub opponent: String,
}

impl From<&MatchDetails> for MatchDetailsRecord {
    fn from(value: &MatchDetails) -> Self {
        Self {
            id: value.id.clone(),
            date: value.date.clone(),
            home_away: value.home_away.clone(),
            match_type: value.match_type.clone(),
            location: value.location.clone(),
            opponent: value.opponent.clone(),
        }
    }
}

impl From<MatchDetailsRecord> for MatchDetails {
    fn from(value: MatchDetailsRecord) -> Self {
        Self {
            id: value.id,
            date: value.date,
            home_away: value.home_away,
            match_type: value.match_type,
            location: value.location,
            opponent: value.opponent,
        }
    }
}
