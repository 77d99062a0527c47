//! Integration tests for the meshcheckers console binary.
//!
//! Spawns the binary, feeds a script on stdin and checks stdout lines.

use std::io::{BufRead, Write};
use std::process::{Command, Stdio};

/// Sends a sequence of commands to the console and collects stdout lines.
fn run_engine(commands: &[&str]) -> Vec<String> {
    let exe = env!("CARGO_BIN_EXE_meshcheckers");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to start meshcheckers");

    let mut stdin = child.stdin.take().unwrap();
    let stdout = child.stdout.take().unwrap();
    let reader = std::io::BufReader::new(stdout);

    for cmd in commands {
        writeln!(stdin, "{}", cmd).unwrap();
    }
    stdin.flush().unwrap();
    drop(stdin);

    let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
    let status = child.wait().expect("failed to wait on child");
    assert!(status.success());
    lines
}

/// Two peers, alice elected, both seated and the game on board 0 started.
const STARTED: &[&str] = &[
    "setoption name Seed value 9",
    "peer alice Alice",
    "advance 21000",
    "peer bob Bob",
    "advance 10000",
    "register alice 0 red",
    "register bob 0 blue",
    "start alice 0",
];

fn script(prefix: &[&'static str], rest: &[&'static str]) -> Vec<&'static str> {
    prefix.iter().chain(rest).copied().collect()
}

#[test]
fn isready_response() {
    let lines = run_engine(&["isready", "quit"]);
    assert_eq!(lines, vec!["readyok"]);
}

#[test]
fn unknown_commands_are_ignored() {
    let lines = run_engine(&["foobar", "nonsense", "quit"]);
    assert!(lines.is_empty());
}

#[test]
fn empty_lines_are_ignored() {
    let lines = run_engine(&["", "  ", "isready", "quit"]);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0], "readyok");
}

#[test]
fn failed_commands_do_not_stop_the_loop() {
    let lines = run_engine(&[
        "setoption name Threads value 8",
        "show ghost 0",
        "start ghost 0",
        "register alice 0 green",
        "isready",
        "quit",
    ]);
    assert_eq!(lines, vec!["readyok"]);
}

#[test]
fn eof_exits_cleanly() {
    let lines = run_engine(&["peer alice", "isready"]);
    assert_eq!(lines, vec!["readyok"]);
}

#[test]
fn lone_peer_elects_itself() {
    let lines = run_engine(&[
        "setoption name Seed value 1",
        "peer alice",
        "source alice",
        "advance 19000",
        "source alice",
        "advance 2000",
        "source alice",
        "quit",
    ]);
    assert_eq!(lines, vec!["source none", "source none", "source alice"]);
}

#[test]
fn create_is_reserved_for_the_source() {
    let lines = run_engine(&[
        "setoption name Seed value 2",
        "peer alice",
        "create alice",
        "advance 21000",
        "peer bob",
        "advance 10000",
        "create bob",
        "create alice",
        "source bob",
        "quit",
    ]);
    assert_eq!(lines, vec!["board 1", "source alice"]);
}

#[test]
fn show_reflects_a_started_game() {
    let lines = run_engine(&script(STARTED, &["show bob 0", "quit"]));
    assert_eq!(lines[0], "board 0 Red's Turn [End]");
    assert_eq!(lines[1], "Red: Alice, Markers: 12");
    assert_eq!(lines[2], "Blue: Bob, Markers: 12");
    assert_eq!(lines.len(), 11);
}

#[test]
fn moves_replay_on_every_peer() {
    let lines = run_engine(&script(
        STARTED,
        &[
            "select alice 0 0 2",
            "move alice 0 1 3",
            "snapshot alice 0",
            "snapshot bob 0",
            "quit",
        ],
    ));
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("snapshot {"));
    assert!(lines[0].contains("\"state\":\"1_1_alice_Alice_bob_Bob_"));
    assert_eq!(lines[0], lines[1]);
}

#[test]
fn clicks_select_then_move() {
    let lines = run_engine(&script(
        STARTED,
        &["click alice 0 0 2", "show alice 0", "click alice 0 1 3", "show bob 0", "quit"],
    ));
    // grid rows run 7 down to 0, after three label lines
    let row = |base: usize, y: usize| lines[base + 3 + (7 - y)].clone();
    assert_eq!(&row(0, 2)[..3], "2 R");
    assert_eq!(&row(0, 3)[..3], "3 .");
    assert_eq!(lines[11], "board 0 Blue's Turn [End]");
    assert_eq!(&row(11, 3)[..4], "3 .r");
}

#[test]
fn opponent_clicks_are_ignored_in_strict_mode() {
    let lines = run_engine(&script(STARTED, &["click bob 0 0 2", "show alice 0", "quit"]));
    assert_eq!(&lines[3 + 5][..3], "2 r");
}

#[test]
fn end_then_restart() {
    let lines = run_engine(&script(
        STARTED,
        &["start bob 0", "show alice 0", "restart alice 0", "show bob 0", "quit"],
    ));
    assert_eq!(lines[0], "board 0 Game Over [Start]");
    assert_eq!(lines[11], "board 0 Red's Turn [End]");
}
