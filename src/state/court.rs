//! Six-slot court assignment and clockwise rotation.

use crate::{
    error::{GameError, ValidationFailure},
    state::roster::PlayerIndex,
};

/// Number of positions on one side of the court.
pub const COURT_SLOTS: usize = 6;

/// Zero-based court position.
pub type SlotIndex = usize;

/// Destination slot of each slot's occupant after one clockwise rotation.
///
/// Follows the serving order rather than numeric order:
/// 0→1, 1→2, 2→5, 5→4, 4→3, 3→0.
pub const ROTATION: [SlotIndex; COURT_SLOTS] = [1, 2, 5, 0, 3, 4];

/// The six court slots, each empty or held by a distinct player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourtAssignment {
    slots: [Option<PlayerIndex>; COURT_SLOTS],
}

impl CourtAssignment {
    /// An empty court.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw slots, clearing any repeated occupant after its first slot.
    pub fn from_slots(mut slots: [Option<PlayerIndex>; COURT_SLOTS]) -> Self {
        for slot in 1..COURT_SLOTS {
            if slots[slot].is_some() && slots[..slot].contains(&slots[slot]) {
                slots[slot] = None;
            }
        }
        Self { slots }
    }

    /// All slots in court order.
    pub fn slots(&self) -> &[Option<PlayerIndex>; COURT_SLOTS] {
        &self.slots
    }

    /// Occupant of a slot; `None` for empty or out-of-range slots.
    pub fn occupant(&self, slot: SlotIndex) -> Option<PlayerIndex> {
        self.slots.get(slot).copied().flatten()
    }

    /// Slot currently held by `player`.
    pub fn slot_of(&self, player: PlayerIndex) -> Option<SlotIndex> {
        self.slots.iter().position(|slot| *slot == Some(player))
    }

    /// Whether `player` holds a slot.
    pub fn is_on_court(&self, player: PlayerIndex) -> bool {
        self.slot_of(player).is_some()
    }

    /// Number of occupied slots.
    pub fn filled(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Whether every slot is occupied.
    pub fn is_full(&self) -> bool {
        self.filled() == COURT_SLOTS
    }

    /// Players on court, in slot order.
    pub fn occupants(&self) -> impl Iterator<Item = PlayerIndex> + '_ {
        self.slots.iter().flatten().copied()
    }

    /// Roster indices in `0..roster_len` that hold no slot.
    pub fn benched_players(&self, roster_len: usize) -> Vec<PlayerIndex> {
        (0..roster_len)
            .filter(|player| !self.is_on_court(*player))
            .collect()
    }

    /// Put `player` into `slot`, returning the previous occupant.
    ///
    /// Rejects a player already holding a different slot.
    pub fn place(
        &mut self,
        slot: SlotIndex,
        player: PlayerIndex,
        player_name: &str,
    ) -> Result<Option<PlayerIndex>, GameError> {
        if slot >= COURT_SLOTS {
            return Err(GameError::InvalidSlot(slot));
        }
        if let Some(existing) = self.slot_of(player).filter(|existing| *existing != slot) {
            return Err(ValidationFailure::PlayerAlreadyOnCourt {
                player: player_name.to_owned(),
                slot: existing,
            }
            .into());
        }
        Ok(self.slots[slot].replace(player))
    }

    /// Move every occupant along [`ROTATION`]. Requires a full court.
    pub fn rotate_clockwise(&mut self) -> Result<(), ValidationFailure> {
        if !self.is_full() {
            return Err(ValidationFailure::CourtNotFullForRotation {
                filled: self.filled(),
            });
        }

        let previous = self.slots;
        for (from, to) in ROTATION.iter().enumerate() {
            self.slots[*to] = previous[from];
        }
        Ok(())
    }

    /// Empty every slot.
    pub fn clear(&mut self) {
        self.slots = [None; COURT_SLOTS];
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn full_court() -> CourtAssignment {
        CourtAssignment::from_slots([Some(10), Some(11), Some(12), Some(13), Some(14), Some(15)])
    }

    #[test]
    fn rotation_follows_serving_order() {
        let mut court = full_court();
        court.rotate_clockwise().unwrap();
        // slot 0's occupant (10) lands in slot 1, slot 3's (13) in slot 0, ...
        assert_eq!(
            court.slots(),
            &[Some(13), Some(10), Some(11), Some(14), Some(15), Some(12)]
        );
    }

    #[test]
    fn six_rotations_restore_the_court() {
        let original = full_court();
        let mut court = original.clone();
        for _ in 0..COURT_SLOTS {
            court.rotate_clockwise().unwrap();
        }
        assert_eq!(court, original);
    }

    #[test]
    fn rotation_with_empty_slot_is_rejected_untouched() {
        let mut court =
            CourtAssignment::from_slots([Some(0), Some(1), None, Some(3), Some(4), Some(5)]);
        let before = court.clone();
        assert_eq!(
            court.rotate_clockwise(),
            Err(ValidationFailure::CourtNotFullForRotation { filled: 5 })
        );
        assert_eq!(court, before);
    }

    #[test]
    fn place_rejects_player_already_in_another_slot() {
        let mut court = CourtAssignment::new();
        court.place(0, 4, "Marin").unwrap();
        let err = court.place(3, 4, "Marin").unwrap_err();
        assert_eq!(
            err,
            GameError::Validation(ValidationFailure::PlayerAlreadyOnCourt {
                player: "Marin".into(),
                slot: 0
            })
        );
        assert_eq!(court.occupant(3), None);
    }

    #[test]
    fn place_returns_previous_occupant() {
        let mut court = CourtAssignment::new();
        assert_eq!(court.place(2, 1, "Amylia").unwrap(), None);
        assert_eq!(court.place(2, 7, "Brielle").unwrap(), Some(1));
        assert!(!court.is_on_court(1));
        assert_eq!(court.place(6, 1, "Amylia"), Err(GameError::InvalidSlot(6)));
    }

    #[test]
    fn from_slots_drops_duplicates() {
        let court = CourtAssignment::from_slots([Some(2), Some(2), None, Some(3), None, Some(3)]);
        assert_eq!(court.slots(), &[Some(2), None, None, Some(3), None, None]);
    }

    #[test]
    fn benched_players_are_the_complement() {
        let court = CourtAssignment::from_slots([Some(0), None, Some(4), None, None, None]);
        assert_eq!(court.benched_players(6), vec![1, 2, 3, 5]);
    }

    proptest! {
        /// Any sequence of placements and rotations keeps occupants pairwise distinct.
        #[test]
        fn occupants_stay_distinct(
            ops in proptest::collection::vec((0usize..7, 0usize..10, any::<bool>()), 1..60)
        ) {
            let mut court = CourtAssignment::new();
            for (slot, player, rotate) in ops {
                if rotate {
                    let _ = court.rotate_clockwise();
                } else {
                    let _ = court.place(slot, player, "player");
                }
                let mut seen: Vec<_> = court.occupants().collect();
                let count = seen.len();
                seen.sort_unstable();
                seen.dedup();
                prop_assert_eq!(seen.len(), count);
            }
        }
    }
}
