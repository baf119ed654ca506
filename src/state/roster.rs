//! Team roster: the fixed list of players selectable for a match.

use serde::Serialize;

/// Position of a player inside the [`Roster`], stable for the whole session.
pub type PlayerIndex = usize;

/// A team member as listed on the scoresheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Player {
    /// Display name.
    pub name: String,
    /// Jersey number.
    pub number: u32,
}

impl Player {
    /// Build a player from its display name and jersey number.
    pub fn new(name: impl Into<String>, number: u32) -> Self {
        Self {
            name: name.into(),
            number,
        }
    }
}

/// Ordered, immutable list of the players available for a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    /// Freeze the given players into a roster; indices follow the input order.
    pub fn new(players: Vec<Player>) -> Self {
        Self { players }
    }

    /// Number of players on the roster.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether the roster has no players at all.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Look up a player by roster index.
    pub fn get(&self, index: PlayerIndex) -> Option<&Player> {
        self.players.get(index)
    }

    /// Whether `index` refers to a player on this roster.
    pub fn contains(&self, index: PlayerIndex) -> bool {
        index < self.players.len()
    }

    /// Resolve a jersey number to the roster index of its wearer.
    pub fn index_of_number(&self, number: u32) -> Option<PlayerIndex> {
        self.players.iter().position(|player| player.number == number)
    }

    /// Name of the player at `index`, or a placeholder for unknown indices.
    pub fn name_of(&self, index: PlayerIndex) -> &str {
        self.get(index)
            .map(|player| player.name.as_str())
            .unwrap_or("unknown player")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Roster {
        Roster::new(vec![Player::new("Allison", 1), Player::new("Jissel", 7)])
    }

    #[test]
    fn resolves_jersey_numbers_to_indices() {
        let roster = roster();
        assert_eq!(roster.index_of_number(7), Some(1));
        assert_eq!(roster.index_of_number(3), None);
    }

    #[test]
    fn name_of_unknown_index_is_placeholder() {
        assert_eq!(roster().name_of(42), "unknown player");
    }
}
