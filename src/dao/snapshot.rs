//! Versioned snapshot loader and writer.
//!
//! All schema knowledge lives here: per-field defaults, the version 1 → 2
//! migration, and normalization of whatever an older or damaged snapshot holds.

use indexmap::IndexMap;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    dao::{
        kv::KeyValueStore,
        models::{
            COURT_POSITIONS_KEY, CURRENT_SCHEMA_VERSION, CourtRecord, FINAL_SCORE_KEY,
            GAME_PHASE_KEY, GAME_RUNNING_KEY, MATCH_DETAILS_KEY, MatchDetailsRecord,
            PLAYTIME_KEY, PlayerStatRecord, SCHEMA_VERSION_KEY, SCORE_KEY, ScoreRecord,
        },
        storage::{StorageError, StorageResult},
    },
    state::{
        COURT_SLOTS, CourtAssignment, GamePhase, GameState, PlayerIndex, PlayerStat,
        RestoredParts,
    },
};

/// Independently persisted portion of the game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SnapshotEntry {
    /// Lifecycle phase and the legacy running flag.
    Phase,
    /// Per-player stats.
    Stats,
    /// Court slots.
    Court,
    /// Live team score.
    Score,
    /// Frozen final score.
    FinalScore,
    /// Scoresheet header.
    MatchDetails,
}

impl SnapshotEntry {
    /// Every entry, in write order.
    pub const ALL: [SnapshotEntry; 6] = [
        SnapshotEntry::Phase,
        SnapshotEntry::Stats,
        SnapshotEntry::Court,
        SnapshotEntry::Score,
        SnapshotEntry::FinalScore,
        SnapshotEntry::MatchDetails,
    ];
}

/// Outcome of [`load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSnapshot {
    /// Schema version found in the store before migration.
    pub version: u32,
    /// State pieces ready for [`GameState::restore`].
    pub parts: RestoredParts,
    /// Keys that held unreadable data and were defaulted.
    pub recovered: Vec<&'static str>,
}

struct Reader<'a> {
    store: &'a dyn KeyValueStore,
    recovered: Vec<&'static str>,
}

impl Reader<'_> {
    fn read<T: DeserializeOwned>(&mut self, key: &'static str) -> StorageResult<Option<T>> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(key, error = %err, "unreadable snapshot entry; using defaults");
                self.recovered.push(key);
                Ok(None)
            }
        }
    }
}

/// Read every snapshot entry for a roster of `roster_len` players.
///
/// Malformed data never fails the load; only a failing store does.
pub fn load(store: &dyn KeyValueStore, roster_len: usize) -> StorageResult<LoadedSnapshot> {
    let mut reader = Reader {
        store,
        recovered: Vec::new(),
    };

    let version = reader.read::<u32>(SCHEMA_VERSION_KEY)?.unwrap_or(1);
    if version > CURRENT_SCHEMA_VERSION {
        warn!(version, "snapshot written by a newer schema; reading known fields only");
    }

    let running = reader.read::<bool>(GAME_RUNNING_KEY)?.unwrap_or(false);
    let stored_phase = if version >= 2 {
        reader
            .read::<String>(GAME_PHASE_KEY)?
            .and_then(|name| GamePhase::parse(&name))
    } else {
        None
    };
    let phase = stored_phase.unwrap_or_else(|| migrate_phase(version, running));

    let raw_stats = reader
        .read::<IndexMap<String, Value>>(PLAYTIME_KEY)?
        .unwrap_or_default();
    let stats = merge_stats(raw_stats, roster_len);

    let court = reader
        .read::<CourtRecord>(COURT_POSITIONS_KEY)?
        .map(|record| normalize_court(record, roster_len))
        .unwrap_or_default();

    let score = reader
        .read::<ScoreRecord>(SCORE_KEY)?
        .unwrap_or_default()
        .into();
    let final_score = reader.read::<ScoreRecord>(FINAL_SCORE_KEY)?.map(Into::into);
    let match_details = reader
        .read::<MatchDetailsRecord>(MATCH_DETAILS_KEY)?
        .unwrap_or_default()
        .into();

    info!(version, phase = phase.as_str(), "loaded game snapshot");
    Ok(LoadedSnapshot {
        version,
        parts: RestoredParts {
            phase,
            stats,
            court,
            score,
            final_score,
            match_details,
        },
        recovered: reader.recovered,
    })
}

/// Phase implied by snapshots that predate the phase key.
fn migrate_phase(version: u32, running: bool) -> GamePhase {
    if version < 2 {
        debug!(running, "migrating version 1 snapshot phase from running flag");
    }
    if running {
        GamePhase::Running
    } else {
        GamePhase::NotStarted
    }
}

fn merge_stats(mut raw: IndexMap<String, Value>, roster_len: usize) -> Vec<PlayerStat> {
    let stats = (0..roster_len)
        .map(|index| {
            let Some(value) = raw.shift_remove(&index.to_string()) else {
                return PlayerStat::default();
            };
            match serde_json::from_value::<PlayerStatRecord>(value) {
                Ok(record) => record.into(),
                Err(err) => {
                    warn!(player = index, error = %err, "unreadable player stats; using defaults");
                    PlayerStat::default()
                }
            }
        })
        .collect();

    if !raw.is_empty() {
        warn!(dropped = raw.len(), "snapshot holds stats for players outside the roster");
    }
    stats
}

fn normalize_court(record: CourtRecord, roster_len: usize) -> CourtAssignment {
    let mut slots: [Option<PlayerIndex>; COURT_SLOTS] = [None; COURT_SLOTS];
    if record.0.len() != COURT_SLOTS {
        warn!(len = record.0.len(), "court snapshot does not hold 6 slots; normalizing");
    }
    for (slot, entry) in slots.iter_mut().zip(record.0) {
        *slot = entry.filter(|player| *player < roster_len);
    }

    let court = CourtAssignment::from_slots(slots);
    if court.slots() != &slots {
        warn!("court snapshot listed a player twice; keeping the first slot");
    }
    court
}

fn write_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> StorageResult<()> {
    let encoded = serde_json::to_string(value)
        .map_err(|err| StorageError::unavailable(format!("failed to encode `{key}`"), err))?;
    store.set(key, encoded)
}

/// Persist one entry of `state`.
pub fn write_entry(
    store: &dyn KeyValueStore,
    state: &GameState,
    entry: SnapshotEntry,
) -> StorageResult<()> {
    match entry {
        SnapshotEntry::Phase => {
            write_json(store, GAME_RUNNING_KEY, &state.clock_running())?;
            write_json(store, GAME_PHASE_KEY, &state.phase().as_str())
        }
        SnapshotEntry::Stats => {
            let records: IndexMap<String, PlayerStatRecord> = state
                .stats()
                .iter()
                .map(|(index, stat)| (index.to_string(), stat.into()))
                .collect();
            write_json(store, PLAYTIME_KEY, &records)
        }
        SnapshotEntry::Court => {
            write_json(store, COURT_POSITIONS_KEY, &CourtRecord(state.court().slots().to_vec()))
        }
        SnapshotEntry::Score => write_json(store, SCORE_KEY, &ScoreRecord::from(state.score())),
        SnapshotEntry::FinalScore => match state.final_score() {
            Some(score) => write_json(store, FINAL_SCORE_KEY, &ScoreRecord::from(score)),
            None => store.remove(FINAL_SCORE_KEY),
        },
        SnapshotEntry::MatchDetails => write_json(
            store,
            MATCH_DETAILS_KEY,
            &MatchDetailsRecord::from(state.match_details()),
        ),
    }
}

/// Persist the full snapshot, stamping the current schema version.
pub fn write_all(store: &dyn KeyValueStore, state: &GameState) -> StorageResult<()> {
    write_json(store, SCHEMA_VERSION_KEY, &CURRENT_SCHEMA_VERSION)?;
    for entry in SnapshotEntry::ALL {
        write_entry(store, state, entry)?;
    }
    Ok(())
}

/// Drop every game entry after a reset; the scoresheet header is kept.
pub fn clear_game(store: &dyn KeyValueStore) -> StorageResult<()> {
    for key in [
        GAME_RUNNING_KEY,
        GAME_PHASE_KEY,
        PLAYTIME_KEY,
        COURT_POSITIONS_KEY,
        SCORE_KEY,
        FINAL_SCORE_KEY,
    ] {
        store.remove(key)?;
    }
    Ok(())
}
