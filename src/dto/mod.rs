use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::state::EpochMillis;

/// Scoresheet view built from the game state.
pub mod view;

fn format_epoch_millis(millis: EpochMillis) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|time| time.format(&Rfc3339).ok())
        .unwrap_or_else(|| "invalid-timestamp".into())
}

/// Playtime as shown courtside, e.g. `12m 5s`.
pub fn format_playtime(seconds: u64) -> String {
    format!("{}m {}s", seconds / 60, seconds % 60)
}
