//! Match score, sides and manual corrections.

use serde::Serialize;

use crate::state::changes::StateChange;

/// Which bench a score belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// The tracked team when playing at home, or the host otherwise.
    Home,
    /// The visiting side.
    Away,
}

impl Side {
    /// Parse a side name typed by the scorekeeper (`home`, `away`, case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "home" => Some(Side::Home),
            "away" => Some(Side::Away),
            _ => None,
        }
    }

    /// Lowercase name used in logs and stored records.
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
        }
    }
}

/// Manual correction applied from the score tab arrows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreAdjustment {
    /// Add one point.
    Increment,
    /// Remove one point, never going below zero.
    Decrement,
}

/// Running match score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TeamScore {
    /// Points of the home side.
    pub home: u32,
    /// Points of the away side.
    pub away: u32,
}

impl TeamScore {
    /// Build a score from explicit values.
    pub fn new(home: u32, away: u32) -> Self {
        Self { home, away }
    }

    fn side_mut(&mut self, side: Side) -> &mut u32 {
        match side {
            Side::Home => &mut self.home,
            Side::Away => &mut self.away,
        }
    }

    /// Apply a manual correction. Returns `false` when nothing changed.
    pub fn adjust(&mut self, side: Side, adjustment: ScoreAdjustment) -> bool {
        let value = self.side_mut(side);
        match adjustment {
            ScoreAdjustment::Increment => {
                *value = value.saturating_add(1);
                true
            }
            ScoreAdjustment::Decrement if *value > 0 => {
                *value -= 1;
                true
            }
            ScoreAdjustment::Decrement => false,
        }
    }

    /// Consume a state change, crediting the scoring side on [`StateChange::PointScored`].
    ///
    /// Returns whether the score moved.
    pub fn apply(&mut self, change: &StateChange) -> bool {
        match change {
            StateChange::PointScored { side, .. } => {
                let value = self.side_mut(*side);
                *value = value.saturating_add(1);
                true
            }
            _ => false,
        }
    }
}
