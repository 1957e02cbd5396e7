//! Reads JSON from a file or stdin and prints what Lattice makes of it.
//!
//! ```text
//! event-inspect event  [FILE]          one event
//! event-inspect events [FILE]          an array of events
//! event-inspect sync   [FILE]          a /sync response body
//! event-inspect error  STATUS [FILE]   an error response body
//! ```
//!
//! `RUST_LOG=debug` shows content that fell back to opaque.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use lattice::prelude::*;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "event-inspect",
    version,
    about = "Decode Matrix client-server JSON and describe what it contains",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Mode {
    /// One event.
    Event {
        /// Input file (default: stdin).
        file: Option<PathBuf>,
    },
    /// A JSON array of events, such as a state dump.
    Events { file: Option<PathBuf> },
    /// A `/sync` response body.
    Sync { file: Option<PathBuf> },
    /// An error response body received with STATUS.
    Error {
        /// HTTP status the body came with.
        status: u16,
        file: Option<PathBuf>,
    },
}

impl Mode {
    fn file(&self) -> Option<&Path> {
        match self {
            Self::Event { file }
            | Self::Events { file }
            | Self::Sync { file }
            | Self::Error { file, .. } => file.as_deref(),
        }
    }
}

fn read_input(path: Option<&Path>) -> std::io::Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path),
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn describe_event(event: &Event) -> String {
    let kind = match event.state_key() {
        Some(state_key) => format!("state[{state_key:?}]"),
        None => "timeline".to_owned(),
    };
    let content = if event.content().is_opaque() {
        "opaque"
    } else {
        "typed"
    };
    let sender = event.meta().sender.as_deref().unwrap_or("-");
    format!("{kind} {} ({content}) from {sender}", event.event_type())
}

fn describe_sync(response: &SyncResponse) -> Vec<String> {
    let mut lines = vec![format!(
        "next_batch {} ({} events)",
        response.next_batch,
        response.event_count()
    )];
    for (room_id, room) in &response.rooms.join {
        lines.push(format!(
            "join {room_id}: {} state, {} timeline{}, {} ephemeral",
            room.state.len(),
            room.timeline.events.len(),
            if room.timeline.limited { " (limited)" } else { "" },
            room.ephemeral.len()
        ));
        lines.extend(room.timeline.events.iter().map(|e| format!("  {}", describe_event(e))));
    }
    for (room_id, room) in &response.rooms.invite {
        lines.push(format!("invite {room_id}: {} stripped state", room.invite_state.len()));
    }
    for room_id in response.rooms.leave.keys() {
        lines.push(format!("leave {room_id}"));
    }
    lines
}

fn run(mode: Mode) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let input = read_input(mode.file())?;
    let config = BatchConfig::default();

    match mode {
        Mode::Event { .. } => {
            let event = lattice::decode_event_response(200, &input)?;
            Ok(vec![describe_event(&event)])
        }
        Mode::Events { .. } => {
            let value = lattice::decode_response(200, &input)?;
            let events = lattice::sync::decode_events(value, &config)?;
            Ok(events.iter().map(describe_event).collect())
        }
        Mode::Sync { .. } => {
            let response = lattice::decode_sync_response(200, &input, &config)?;
            Ok(describe_sync(&response))
        }
        Mode::Error { status, .. } => match lattice::decode_response(status, &input) {
            Ok(_) => Ok(vec![format!("status {status} is not an error")]),
            Err(LatticeError::Matrix(err)) => {
                let mut lines = vec![format!("{:?}", err.kind), err.to_string()];
                if let Some(wait) = err.retry_after() {
                    lines.push(format!("retry after {wait:?}"));
                }
                Ok(lines)
            }
            Err(LatticeError::Classify(ClassifyError::InteractiveAuth(challenge))) => Ok(challenge
                .flows
                .iter()
                .map(|flow| format!("auth flow: {}", flow.stages.join(" -> ")))
                .collect()),
            Err(other) => Err(other.into()),
        },
    }
}

fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    match run(cli.mode) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "decode failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn parse(args: &[&str]) -> Result<Mode, clap::Error> {
        Cli::try_parse_from(std::iter::once("event-inspect").chain(args.iter().copied()))
            .map(|cli| cli.mode)
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_modes() {
        assert_eq!(
            parse(&["event", "e.json"]).unwrap(),
            Mode::Event {
                file: Some(PathBuf::from("e.json"))
            }
        );
        assert_eq!(
            parse(&["error", "429"]).unwrap(),
            Mode::Error {
                status: 429,
                file: None
            }
        );
        assert_eq!(parse(&["sync"]).unwrap().file(), None);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["error"]).is_err());
        assert!(parse(&["error", "abc"]).is_err());
        assert!(parse(&["dance"]).is_err());
        assert!(parse(&["event", "a", "b"]).is_err());
    }

    #[test]
    fn test_help_is_not_an_unknown_mode() {
        let err = parse(&["--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_describe_event() {
        let event = lattice::events::decode_event(serde_json::json!({
            "type": "m.room.topic",
            "state_key": "",
            "sender": "@alice:example.org",
            "content": {"topic": "Rust"}
        }))
        .unwrap();
        assert_eq!(
            describe_event(&event),
            "state[\"\"] m.room.topic (typed) from @alice:example.org"
        );
    }
}
