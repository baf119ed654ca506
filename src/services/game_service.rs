//! Game session: applies transitions to the in-memory state, persists the
//! snapshot entries they touch and reports outcomes to the presenter and notifier.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::{
    config::AppConfig,
    dao::{kv::KeyValueStore, snapshot},
    dto::view::GameView,
    error::{GameError, ServiceError},
    services::{
        clock::Clock,
        collaborators::{Confirmation, Notifier, Presenter, Severity},
        persistence::SnapshotWriter,
    },
    state::{
        FoulAdvisory, GameEvent, GamePhase, GameState, InvalidTransition, MatchDetails,
        PlayerIndex, ScoreAdjustment, Side, SlotIndex, StateChange, TransitionResult,
    },
};

/// Prompt shown before a reset.
pub const RESET_PROMPT: &str = "Are you sure you want to reset everything? This will clear all \
     playtimes, fouls, points and court positions.";

/// Result of a session operation: the committed changes.
pub type SessionResult = Result<Vec<StateChange>, ServiceError>;

/// Owns the game state for one courtside session and fans every committed
/// change out to storage and the UI collaborators.
pub struct GameSession {
    state: GameState,
    writer: SnapshotWriter,
    clock: Arc<dyn Clock>,
    presenter: Box<dyn Presenter>,
    notifier: Box<dyn Notifier>,
}

impl GameSession {
    /// Load the last snapshot, credit playtime missed while closed and render.
    pub fn open(
        config: &AppConfig,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        presenter: Box<dyn Presenter>,
        notifier: Box<dyn Notifier>,
    ) -> Result<Self, ServiceError> {
        let writer = SnapshotWriter::new(store);
        let loaded = snapshot::load(writer.store(), config.roster().len())?;
        let mut state =
            GameState::restore(config.roster().clone(), config.thresholds(), loaded.parts);

        let now = clock.now();
        for change in state.rehydrate(now) {
            if let StateChange::Rehydrated { players } = change {
                info!(players = players.len(), "credited playtime elapsed while closed");
            }
        }
        writer.flush_all(&state)?;

        let mut session = Self {
            state,
            writer,
            clock,
            presenter,
            notifier,
        };
        if !loaded.recovered.is_empty() {
            let message = format!(
                "Some saved data could not be read and was reset: {}",
                loaded.recovered.join(", ")
            );
            session.notifier.notify(&message, Severity::Warning);
        }
        info!(phase = session.state.phase().as_str(), "session opened");
        session.render();
        Ok(session)
    }

    /// Current game state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Projection of the state as of now.
    pub fn view(&self) -> GameView {
        GameView::build(&self.state, self.clock.now())
    }

    /// Push the current view to the presenter.
    pub fn render(&mut self) {
        let view = self.view();
        self.presenter.on_state_changed(&view);
    }

    /// Refresh live playtimes while the game runs. Never mutates stored state.
    pub fn tick(&mut self) {
        if !self.state.clock_running() {
            return;
        }
        let view = self.view();
        debug!(on_court = view.on_court.len(), "tick");
        self.presenter.on_tick(&view);
    }

    /// Start the match once six players are on court.
    pub fn start_game(&mut self) -> SessionResult {
        let now = self.clock.now();
        let result = self.state.start(now);
        let changes = self.commit(result)?;
        info!(at = now, "game started");
        self.notifier.notify("Game Started!", Severity::Success);
        Ok(changes)
    }

    /// Put `player` into `slot`, substituting whoever held it.
    pub fn assign(&mut self, slot: SlotIndex, player: PlayerIndex) -> SessionResult {
        let now = self.clock.now();
        let result = self.state.assign(slot, player, now);
        let changes = self.commit(result)?;
        for change in &changes {
            if let StateChange::Substituted {
                slot,
                outgoing,
                incoming,
            } = change
            {
                info!(slot, ?outgoing, incoming, "court slot assigned");
            }
        }
        Ok(changes)
    }

    /// Rotate the court clockwise.
    pub fn rotate(&mut self) -> SessionResult {
        let now = self.clock.now();
        let result = self.state.rotate_clockwise(now);
        let changes = self.commit(result)?;
        info!("players rotated");
        self.notifier.notify("Players Rotated!", Severity::Success);
        Ok(changes)
    }

    /// Charge a foul and advise on substitution thresholds.
    pub fn add_foul(&mut self, player: PlayerIndex) -> SessionResult {
        let result = self.state.add_foul(player);
        let changes = self.commit(result)?;

        let name = self.state.roster().name_of(player).to_owned();
        let max = self.state.thresholds().max;
        for change in &changes {
            let StateChange::FoulAdded {
                fouls, advisory, ..
            } = change
            else {
                continue;
            };
            info!(player, fouls, ?advisory, "foul recorded");
            match advisory {
                FoulAdvisory::MustSubstitute => self.notifier.notify(
                    &format!("{name} has reached the maximum of {max} fouls and must be substituted!"),
                    Severity::Danger,
                ),
                FoulAdvisory::ConsiderSubstitution => self.notifier.notify(
                    &format!("{name} has {fouls} fouls. Consider a substitution."),
                    Severity::Warning,
                ),
                FoulAdvisory::Recorded => self.notifier.notify(
                    &format!("Foul added to {name}. Total: {fouls}"),
                    Severity::Info,
                ),
            }
        }
        Ok(changes)
    }

    /// Credit a point to `player` and their side.
    pub fn add_point(&mut self, player: PlayerIndex) -> SessionResult {
        let result = self.state.add_point(player);
        let changes = self.commit(result)?;

        let name = self.state.roster().name_of(player).to_owned();
        let score = self.state.score();
        info!(player, home = score.home, away = score.away, "point scored");
        self.notifier
            .notify(&format!("Point for {name}!"), Severity::Success);
        Ok(changes)
    }

    /// Correct the live score by one.
    pub fn adjust_score(&mut self, side: Side, adjustment: ScoreAdjustment) -> SessionResult {
        let result = self.state.adjust_score(side, adjustment);
        let changes = self.commit(result)?;
        if !changes.is_empty() {
            info!(side = side.as_str(), ?adjustment, "score adjusted");
        }
        Ok(changes)
    }

    /// Freeze the score and stop every timer.
    pub fn finalize(&mut self) -> SessionResult {
        let now = self.clock.now();
        let result = self.state.finalize(now);
        let changes = self.commit(result)?;
        let score = self.state.score();
        info!(home = score.home, away = score.away, "final score saved");
        self.notifier.notify("Final Score Saved!", Severity::Success);
        Ok(changes)
    }

    /// Clear the game after the scorekeeper confirms.
    pub fn reset(&mut self, confirmation: &mut dyn Confirmation) -> SessionResult {
        if !confirmation.request_confirmation(RESET_PROMPT) {
            info!("reset declined");
            return Err(ServiceError::ResetDeclined);
        }
        let result = self.state.reset();
        let changes = self.commit(result)?;
        info!("game reset");
        self.notifier.notify("Game has been reset!", Severity::Success);
        Ok(changes)
    }

    /// Replace the scoresheet header.
    pub fn update_match_details(&mut self, details: MatchDetails) -> SessionResult {
        let result = self.state.update_match_details(details);
        self.commit(result)
    }

    /// Overwrite one header field by its short name.
    ///
    /// Returns `Ok(false)` for an unknown field after warning the scorekeeper.
    pub fn set_match_field(&mut self, field: &str, value: &str) -> Result<bool, ServiceError> {
        let mut details = self.state.match_details().clone();
        if !details.set_field(field, value.trim()) {
            self.notifier.notify(
                &format!(
                    "Unknown match field `{field}`. Use id, date, home_away, type, location or opponent."
                ),
                Severity::Warning,
            );
            return Ok(false);
        }
        self.update_match_details(details)?;
        Ok(true)
    }

    /// Persist and render a successful transition, or report a rejected one.
    fn commit(&mut self, result: TransitionResult) -> SessionResult {
        let changes = match result {
            Ok(changes) => changes,
            Err(err) => {
                self.report(&err);
                return Err(err.into());
            }
        };
        if changes.is_empty() {
            return Ok(changes);
        }

        let persisted = self.writer.flush(&self.state, &changes);
        self.render();
        if let Err(err) = persisted {
            error!(error = %err, "failed to persist game snapshot");
            self.notifier.notify(
                "Could not save the game state. Changes may be lost on reload.",
                Severity::Danger,
            );
            return Err(err.into());
        }
        Ok(changes)
    }

    fn report(&mut self, err: &GameError) {
        match err {
            GameError::Validation(failure) => {
                debug!(%failure, "operation rejected");
                self.notifier.notify(&failure.to_string(), Severity::Warning);
            }
            GameError::InvalidTransition(transition) => {
                debug!(%transition, "lifecycle event rejected");
                self.notifier
                    .notify(transition_message(transition), Severity::Warning);
            }
            GameError::InvalidPlayerIndex(_) | GameError::InvalidSlot(_) => {
                warn!(error = %err, "operation referenced an unknown player or slot");
                self.notifier.notify(&err.to_string(), Severity::Danger);
            }
        }
    }
}

fn transition_message(transition: &InvalidTransition) -> &'static str {
    match (transition.event, transition.from) {
        (GameEvent::StartGame, GamePhase::Running) => "The game is already running.",
        (GameEvent::StartGame, _) => "The final score has been saved; reset the game to start again.",
        (GameEvent::Finalize, GamePhase::NotStarted) => {
            "You can only save the final score after the game has started."
        }
        (GameEvent::Finalize, _) => "The final score has already been saved.",
        (GameEvent::Reset, _) => "The game cannot be reset right now.",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{
        dao::{
            kv::MemoryStore,
            models,
            storage::{StorageError, StorageResult},
        },
        services::{clock::ManualClock, collaborators::AutoConfirm},
    };

    type Notes = Arc<Mutex<Vec<(String, Severity)>>>;

    struct NullPresenter;

    impl Presenter for NullPresenter {
        fn on_state_changed(&mut self, _view: &GameView) {}
    }

    struct Recorder(Notes);

    impl Notifier for Recorder {
        fn notify(&mut self, message: &str, severity: Severity) {
            self.0.lock().unwrap().push((message.to_owned(), severity));
        }
    }

    /// Accepts reads but fails every write.
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            Ok(None)
        }

        fn set(&self, key: &str, _value: String) -> StorageResult<()> {
            Err(StorageError::unavailable(
                format!("cannot write `{key}`"),
                std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            ))
        }

        fn remove(&self, _key: &str) -> StorageResult<()> {
            Ok(())
        }
    }

    fn open(store: Arc<dyn KeyValueStore>) -> (GameSession, Notes) {
        let notes = Notes::default();
        let session = GameSession::open(
            &AppConfig::default(),
            store,
            Arc::new(ManualClock::new(0)),
            Box::new(NullPresenter),
            Box::new(Recorder(notes.clone())),
        )
        .unwrap();
        (session, notes)
    }

    fn started(store: Arc<dyn KeyValueStore>) -> (GameSession, Notes) {
        let (mut session, notes) = open(store);
        for slot in 0..6 {
            session.assign(slot, slot).unwrap();
        }
        session.start_game().unwrap();
        notes.lock().unwrap().clear();
        (session, notes)
    }

    fn last_note(notes: &Notes) -> (String, Severity) {
        notes.lock().unwrap().last().cloned().unwrap()
    }

    #[test]
    fn foul_messages_follow_thresholds() {
        let (mut session, notes) = started(Arc::new(MemoryStore::new()));

        session.add_foul(4).unwrap();
        assert_eq!(
            last_note(&notes),
            ("Foul added to Marin. Total: 1".to_owned(), Severity::Info)
        );
        session.add_foul(4).unwrap();
        session.add_foul(4).unwrap();
        assert_eq!(
            last_note(&notes),
            (
                "Marin has 3 fouls. Consider a substitution.".to_owned(),
                Severity::Warning
            )
        );
        session.add_foul(4).unwrap();
        session.add_foul(4).unwrap();
        assert_eq!(
            last_note(&notes),
            (
                "Marin has reached the maximum of 5 fouls and must be substituted!".to_owned(),
                Severity::Danger
            )
        );
    }

    #[test]
    fn rejected_operations_warn_and_leave_state() {
        let (mut session, notes) = open(Arc::new(MemoryStore::new()));

        let err = session.add_point(0).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(
            last_note(&notes),
            (
                "You can only add points after the game has started.".to_owned(),
                Severity::Warning
            )
        );
        assert_eq!(session.state().score().home, 0);

        let err = session.finalize().unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Game(GameError::InvalidTransition(_))
        ));
        assert_eq!(last_note(&notes).1, Severity::Warning);
    }

    #[test]
    fn declined_reset_keeps_everything() {
        let store = Arc::new(MemoryStore::new());
        let (mut session, _notes) = started(store.clone());
        session.add_point(1).unwrap();

        let err = session.reset(&mut AutoConfirm(false)).unwrap_err();

        assert!(matches!(err, ServiceError::ResetDeclined));
        assert_eq!(session.state().phase(), GamePhase::Running);
        assert_eq!(session.state().score().home, 1);
        assert!(store.get(models::PLAYTIME_KEY).unwrap().is_some());
    }

    #[test]
    fn unknown_match_field_is_reported() {
        let (mut session, notes) = open(Arc::new(MemoryStore::new()));

        assert!(!session.set_match_field("venue", "Gym").unwrap());
        assert_eq!(last_note(&notes).1, Severity::Warning);

        assert!(session.set_match_field("opponent", " Tigers ").unwrap());
        assert_eq!(session.state().match_details().opponent, "Tigers");
    }

    #[test]
    fn open_fails_when_snapshot_cannot_be_written() {
        let err = GameSession::open(
            &AppConfig::default(),
            Arc::new(ReadOnlyStore),
            Arc::new(ManualClock::new(0)),
            Box::new(NullPresenter),
            Box::new(Recorder(Notes::default())),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ServiceError::Storage(_)));
    }

    #[test]
    fn transition_messages_are_friendly() {
        let err = InvalidTransition {
            from: GamePhase::Running,
            event: GameEvent::StartGame,
        };
        assert_eq!(transition_message(&err), "The game is already running.");
    }
}
