/// Wall-clock sources for timers.
pub mod clock;
/// Hooks implemented by the UI driving a session.
pub mod collaborators;
/// Game session orchestration: transitions, persistence and notifications.
pub mod game_service;
/// Snapshot writer fed by committed state changes.
pub mod persistence;
