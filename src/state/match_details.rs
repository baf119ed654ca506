use serde::Serialize;

use crate::state::score::Side;

/// Free-text scoresheet header. Only `home_away` influences game logic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchDetails {
    /// League or tournament match identifier.
    pub id: String,
    /// Match date as typed by the scorekeeper.
    pub date: String,
    /// `"Home"` or `"Away"`; anything else counts as home.
    pub home_away: String,
    /// League, friendly, tournament...
    pub match_type: String,
    /// Venue.
    pub location: String,
    /// Opposing team name.
    pub opponent: String,
}

impl MatchDetails {
    /// Side credited when one of our players scores.
    pub fn scoring_side(&self) -> Side {
        if self.home_away == "Away" {
            Side::Away
        } else {
            Side::Home
        }
    }

    /// Overwrite a single field by its short name. Returns `false` for unknown fields.
    pub fn set_field(&mut self, field: &str, value: impl Into<String>) -> bool {
        let slot = match field {
            "id" => &mut self.id,
            "date" => &mut self.date,
            "home_away" | "homeaway" => &mut self.home_away,
            "type" => &mut self.match_type,
            "location" => &mut self.location,
            "opponent" => &mut self.opponent,
            _ => return false,
        };
        *slot = value.into();
        true
    }
}
