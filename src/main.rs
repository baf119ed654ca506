//! Courtside binary entrypoint: a terminal scoresheet over a persisted game session.

use std::{
    io::{self, BufRead, Write},
    sync::Arc,
    thread,
    time::Duration,
};

use anyhow::Context;
use tokio::{runtime::Handle, sync::mpsc, time::MissedTickBehavior};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use courtside::{
    config::AppConfig,
    dao::kv::FileStore,
    dto::view::GameView,
    error::ServiceError,
    services::{
        clock::SystemClock,
        collaborators::{Confirmation, Notifier, Presenter, Severity},
        game_service::GameSession,
    },
    state::{ScoreAdjustment, Side},
};

const HELP: &str = "\
Commands:
  show                       print the scoresheet
  start                      start the game (6 players on court)
  assign <spot> <number>     put jersey <number> in court spot 1-6
  rotate                     rotate the court clockwise
  foul <number>              add a foul
  point <number>             add a point
  score <home|away> <+|->    correct the score
  finalize                   save the final score
  reset                      clear the game (asks first)
  match <field> <value>      set id, date, home_away, type, location or opponent
  help                       show this list
  quit                       exit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let store = FileStore::open(config.snapshot_path()).with_context(|| {
        format!(
            "opening snapshot file {}",
            config.snapshot_path().display()
        )
    })?;
    info!(path = %store.path().display(), "snapshot store ready");

    let mut session = GameSession::open(
        &config,
        Arc::new(store),
        Arc::new(SystemClock),
        Box::new(TerminalPresenter::default()),
        Box::new(TerminalNotifier),
    )
    .context("loading game session")?;

    let mut lines = spawn_stdin_reader();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    println!("{HELP}");
    prompt();
    loop {
        let event = tokio::select! {
            line = lines.recv() => Event::Line(line),
            _ = ticker.tick() => Event::Tick,
            _ = &mut shutdown => Event::Shutdown,
        };

        match event {
            Event::Line(None) => {
                info!("input closed; exiting");
                break;
            }
            Event::Line(Some(line)) => {
                if run_command(&mut session, &mut lines, &line) == Flow::Quit {
                    break;
                }
                prompt();
            }
            Event::Tick => session.tick(),
            Event::Shutdown => {
                info!("shutdown requested");
                break;
            }
        }
    }

    Ok(())
}

enum Event {
    Line(Option<String>),
    Tick,
    Shutdown,
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Parse and execute one command line.
fn run_command(
    session: &mut GameSession,
    lines: &mut mpsc::UnboundedReceiver<String>,
    line: &str,
) -> Flow {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Flow::Continue;
    };
    let args: Vec<&str> = words.collect();

    let result = match (command.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("quit" | "exit" | "q", _) => return Flow::Quit,
        ("help" | "?", _) => {
            println!("{HELP}");
            return Flow::Continue;
        }
        ("show", _) => {
            session.render();
            return Flow::Continue;
        }
        ("start", _) => session.start_game(),
        ("rotate", _) => session.rotate(),
        ("finalize", _) => session.finalize(),
        ("reset", _) => session.reset(&mut StdinConfirmation { lines }),
        ("assign", [spot, number]) => {
            let Some(slot) = spot
                .parse::<usize>()
                .ok()
                .and_then(|spot| spot.checked_sub(1))
            else {
                println!("Court spots are numbered 1 to 6.");
                return Flow::Continue;
            };
            let Some(player) = resolve_player(session, number) else {
                return Flow::Continue;
            };
            session.assign(slot, player)
        }
        ("foul", [number]) => match resolve_player(session, number) {
            Some(player) => session.add_foul(player),
            None => return Flow::Continue,
        },
        ("point", [number]) => match resolve_player(session, number) {
            Some(player) => session.add_point(player),
            None => return Flow::Continue,
        },
        ("score", [side, direction]) => {
            let adjustment = match *direction {
                "+" | "up" => ScoreAdjustment::Increment,
                "-" | "down" => ScoreAdjustment::Decrement,
                _ => {
                    println!("Use + or - to adjust the score.");
                    return Flow::Continue;
                }
            };
            let Some(side) = Side::parse(side) else {
                println!("Side must be home or away.");
                return Flow::Continue;
            };
            session.adjust_score(side, adjustment)
        }
        ("match", [field, value @ ..]) if !value.is_empty() => {
            if let Err(err) = session.set_match_field(field, &value.join(" ")) {
                debug!(error = %err, "match details not saved");
            }
            return Flow::Continue;
        }
        _ => {
            println!("Unrecognized command `{}`. Type `help` for the list.", line.trim());
            return Flow::Continue;
        }
    };

    match result {
        Ok(changes) => debug!(changes = changes.len(), command, "command applied"),
        Err(ServiceError::ResetDeclined) => println!("Reset cancelled."),
        Err(err) => debug!(error = %err, command, "command rejected"),
    }
    Flow::Continue
}

/// Map a jersey number typed courtside to a roster index.
fn resolve_player(session: &GameSession, number: &str) -> Option<usize> {
    let index = number
        .trim_start_matches('#')
        .parse::<u32>()
        .ok()
        .and_then(|number| session.state().roster().index_of_number(number));
    if index.is_none() {
        println!("No player wears #{number}.");
    }
    index
}

fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

/// Read stdin on a plain thread; the async loop receives whole lines.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                warn!("failed to read from stdin");
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Prints the sheet on every change and a live playtime line once per minute of play.
#[derive(Default)]
struct TerminalPresenter {
    last_live_minutes: Vec<u64>,
}

impl TerminalPresenter {
    /// Compact court playtime, or `None` when no on-court minute count moved since the last line.
    fn live_line(&mut self, view: &GameView) -> Option<String> {
        let minutes: Vec<u64> = view.on_court.iter().map(|line| line.seconds / 60).collect();
        if minutes == self.last_live_minutes {
            return None;
        }
        self.last_live_minutes = minutes;

        let players: Vec<String> = view
            .on_court
            .iter()
            .map(|line| format!("#{} {} {}", line.number, line.name, line.playtime))
            .collect();
        Some(format!("Live: {}", players.join(" | ")))
    }
}

impl Presenter for TerminalPresenter {
    fn on_state_changed(&mut self, view: &GameView) {
        self.last_live_minutes = view.on_court.iter().map(|line| line.seconds / 60).collect();
        println!("\n{view}");
    }

    fn on_tick(&mut self, view: &GameView) {
        if let Some(line) = self.live_line(view) {
            println!("\n{line}");
            prompt();
        }
    }
}

struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&mut self, message: &str, severity: Severity) {
        let tag = match severity {
            Severity::Info => "info",
            Severity::Success => "ok",
            Severity::Warning => "warning",
            Severity::Danger => "DANGER",
        };
        println!("[{tag}] {message}");
    }
}

/// Asks on the terminal and waits for the next input line.
struct StdinConfirmation<'a> {
    lines: &'a mut mpsc::UnboundedReceiver<String>,
}

impl Confirmation for StdinConfirmation<'_> {
    fn request_confirmation(&mut self, message: &str) -> bool {
        print!("{message} [y/N] ");
        let _ = io::stdout().flush();
        let answer = tokio::task::block_in_place(|| Handle::current().block_on(self.lines.recv()));
        matches!(
            answer.as_deref().map(str::trim),
            Some("y" | "Y" | "yes" | "Yes" | "YES")
        )
    }
}

/// Configure tracing subscribers; logs go to stderr so the scoresheet stays readable.
fn init_tracing() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
