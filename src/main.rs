//! meshcheckers -- a scripted console over a simulated checkers scene.
//!
//! This binary reads commands from stdin and writes responses to stdout.
//! Logs go to stderr, filtered by `RUST_LOG` (default `warn`).

use std::io::{self, BufRead, Write};

use tracing::warn;
use tracing_subscriber::EnvFilter;

use meshcheckers::engine::{Engine, EngineError};
use meshcheckers::protocol::parser::{parse_command, Command};

/// Dispatches one command. Returns `false` when the loop should stop.
fn dispatch<W: Write>(engine: &mut Engine, cmd: Command, out: &mut W) -> Result<bool, EngineError> {
    match cmd {
        Command::IsReady => engine.handle_isready(out)?,
        Command::SetOption { name, value } => engine.set_option(&name, value.as_deref())?,
        Command::Peer { id, name } => engine.add_peer(id, name.as_deref())?,
        Command::Advance { ms } => engine.advance(ms),
        Command::Create { peer } => engine.handle_create(&peer, out)?,
        Command::Remove { peer, board } => engine.remove(&peer, board)?,
        Command::Register {
            peer,
            board,
            team,
            name,
        } => engine.register(&peer, board, team, name.as_deref())?,
        Command::Unregister { peer, board, team } => engine.unregister(&peer, board, team)?,
        Command::Start { peer, board } => engine.start(&peer, board)?,
        Command::Restart { peer, board } => engine.restart(&peer, board)?,
        Command::Click { peer, board, x, y } => engine.click(&peer, board, x, y)?,
        Command::Select { peer, board, tile } => engine.select(&peer, board, tile)?,
        Command::Move { peer, board, tile } => engine.move_to(&peer, board, tile)?,
        Command::Show { peer, board } => engine.handle_show(&peer, board, out)?,
        Command::Snapshot { peer, board } => engine.handle_snapshot(&peer, board, out)?,
        Command::Source { peer } => engine.handle_source(&peer, out)?,
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

/// Runs the console loop, reading commands from stdin and writing
/// responses to stdout.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut engine = Engine::new();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        let cmd = match parse_command(&line) {
            Some(c) => c,
            None => continue,
        };

        match dispatch(&mut engine, cmd, &mut out) {
            Ok(true) => {}
            Ok(false) => break,
            Err(EngineError::Io(e)) => {
                warn!(error = %e, "stdout closed");
                break;
            }
            Err(e) => warn!(error = %e, line = %line.trim(), "command failed"),
        }
    }
}
