//! Maps committed state changes to the snapshot entries that must be rewritten.

use std::{collections::BTreeSet, sync::Arc};

use tracing::debug;

use crate::{
    dao::{
        kv::KeyValueStore,
        snapshot::{self, SnapshotEntry},
        storage::StorageResult,
    },
    state::{GameState, StateChange},
};

/// Single subscriber turning state changes into snapshot writes.
#[derive(Clone)]
pub struct SnapshotWriter {
    store: Arc<dyn KeyValueStore>,
}

impl SnapshotWriter {
    /// Writer over `store`.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Backing store.
    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// Snapshot entries touched by `changes`.
    pub fn dirty_entries(changes: &[StateChange]) -> BTreeSet<SnapshotEntry> {
        let mut dirty = BTreeSet::new();
        for change in changes {
            match change {
                StateChange::TimerStarted { .. }
                | StateChange::TimerStopped { .. }
                | StateChange::FoulAdded { .. }
                | StateChange::Rehydrated { .. } => {
                    dirty.insert(SnapshotEntry::Stats);
                }
                StateChange::Substituted { .. } | StateChange::Rotated => {
                    dirty.insert(SnapshotEntry::Court);
                }
                StateChange::PointScored { .. } => {
                    dirty.insert(SnapshotEntry::Stats);
                    dirty.insert(SnapshotEntry::Score);
                }
                StateChange::ScoreAdjusted { .. } => {
                    dirty.insert(SnapshotEntry::Score);
                }
                StateChange::PhaseChanged { .. } => {
                    dirty.insert(SnapshotEntry::Phase);
                }
                StateChange::ScoreFinalized { .. } => {
                    dirty.insert(SnapshotEntry::FinalScore);
                }
                StateChange::MatchDetailsUpdated => {
                    dirty.insert(SnapshotEntry::MatchDetails);
                }
                StateChange::Reset => {}
            }
        }
        dirty
    }

    /// Persist what `changes` touched. A reset drops every game entry first.
    pub fn flush(&self, state: &GameState, changes: &[StateChange]) -> StorageResult<()> {
        if changes.contains(&StateChange::Reset) {
            snapshot::clear_game(self.store())?;
        }

        let dirty = Self::dirty_entries(changes);
        debug!(?dirty, "flushing snapshot entries");
        for entry in dirty {
            snapshot::write_entry(self.store(), state, entry)?;
        }
        Ok(())
    }

    /// Persist the whole snapshot.
    pub fn flush_all(&self, state: &GameState) -> StorageResult<()> {
        snapshot::write_all(self.store(), state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::{kv::MemoryStore, models},
        state::{FoulThresholds, GamePhase, Player, Roster, Side},
    };

    #[test]
    fn point_dirties_stats_and_score() {
        let dirty = SnapshotWriter::dirty_entries(&[StateChange::PointScored {
            player: 1,
            side: Side::Home,
        }]);
        assert_eq!(
            dirty.into_iter().collect::<Vec<_>>(),
            vec![SnapshotEntry::Stats, SnapshotEntry::Score]
        );
    }

    #[test]
    fn rotation_dirties_court_and_stats() {
        let dirty = SnapshotWriter::dirty_entries(&[
            StateChange::TimerStopped {
                player: 0,
                credited_seconds: 3,
            },
            StateChange::Rotated,
            StateChange::TimerStarted { player: 0, at: 3_000 },
        ]);
        assert!(dirty.contains(&SnapshotEntry::Court));
        assert!(dirty.contains(&SnapshotEntry::Stats));
        assert!(!dirty.contains(&SnapshotEntry::Score));
    }

    #[test]
    fn reset_clears_then_writes_phase() {
        let store = Arc::new(MemoryStore::new());
        let writer = SnapshotWriter::new(store.clone());
        let roster = Roster::new((1..=6).map(|n| Player::new(format!("P{n}"), n)).collect());
        let mut state = GameState::new(roster, FoulThresholds::default());
        writer.flush_all(&state).unwrap();

        let changes = vec![
            StateChange::Reset,
            StateChange::PhaseChanged {
                from: GamePhase::Running,
                to: GamePhase::NotStarted,
            },
        ];
        state.reset().unwrap();
        writer.flush(&state, &changes).unwrap();

        assert_eq!(store.get(models::PLAYTIME_KEY).unwrap(), None);
        assert_eq!(store.get(models::COURT_POSITIONS_KEY).unwrap(), None);
        assert_eq!(
            store.get(models::GAME_RUNNING_KEY).unwrap().as_deref(),
            Some("false")
        );
    }
}
