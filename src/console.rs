//! Command language of the interactive `session` console.
//!
//! ```text
//! generate [count]        edit <operation>     undo
//! list                    activate <id>        select <id>
//! select-all              deselect-all         export png|svg|pdf
//! zip selected|all        help                 quit
//! ```

use crate::export::ExportFormat;
use crate::gallery::ZipScope;
use crate::imaging::RasterSurface;
use crate::output;
use crate::prompt::EditOperation;
use crate::service::ImageService;
use crate::session::Session;
use crate::types::ArtifactId;
use std::io::BufRead;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Generate { count: Option<u32> },
    Edit(String),
    Undo,
    List,
    Activate(ArtifactId),
    Select(ArtifactId),
    SelectAll,
    DeselectAll,
    Export(ExportFormat),
    Zip(ZipScope),
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command '{0}'; type `help`")]
    Unknown(String),
    #[error("`{command}` needs {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },
    #[error("Invalid argument '{0}'")]
    InvalidArgument(String),
}

pub const HELP: &[(&str, &str)] = &[
    ("generate [count]", "generate 1-3 designs from the current form"),
    ("edit <operation>", "edit the active design"),
    ("undo", "revert the last edit"),
    ("list", "show the gallery"),
    ("activate <id>", "make a design the active one"),
    ("select <id>", "toggle a design's selection"),
    ("select-all", "select every design"),
    ("deselect-all", "clear the selection"),
    ("export png|svg|pdf", "export the active design"),
    ("zip selected|all", "download designs as a ZIP archive"),
    ("help", "show this list"),
    ("quit", "leave the session"),
];

fn parse_id(raw: &str) -> Result<ArtifactId, CommandError> {
    raw.trim_start_matches('#')
        .parse::<u64>()
        .map(ArtifactId)
        .map_err(|_| CommandError::InvalidArgument(raw.to_string()))
}

/// Parse one console line. Blank lines are `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();
    let name = name.to_ascii_lowercase();

    let command = match (name.as_str(), arg) {
        ("generate" | "gen", None) => Command::Generate { count: None },
        ("generate" | "gen", Some(n)) => Command::Generate {
            count: Some(
                n.parse()
                    .map_err(|_| CommandError::InvalidArgument(n.to_string()))?,
            ),
        },
        ("edit", Some(op)) => Command::Edit(op.to_string()),
        ("edit", None) => {
            return Err(CommandError::MissingArgument {
                command: "edit",
                expected: "an operation",
            });
        }
        ("undo", _) => Command::Undo,
        ("list" | "ls", _) => Command::List,
        ("activate" | "select", None) => {
            return Err(CommandError::MissingArgument {
                command: if name == "activate" { "activate" } else { "select" },
                expected: "a design id",
            });
        }
        ("activate", Some(id)) => Command::Activate(parse_id(id)?),
        ("select", Some(id)) => Command::Select(parse_id(id)?),
        ("select-all", _) => Command::SelectAll,
        ("deselect-all", _) => Command::DeselectAll,
        ("export", Some(format)) => Command::Export(
            format
                .parse()
                .map_err(|_| CommandError::InvalidArgument(format.to_string()))?,
        ),
        ("export", None) => {
            return Err(CommandError::MissingArgument {
                command: "export",
                expected: "png, svg or pdf",
            });
        }
        ("zip", Some("selected")) => Command::Zip(ZipScope::Selected),
        ("zip", Some("all") | None) => Command::Zip(ZipScope::All),
        ("zip", Some(other)) => return Err(CommandError::InvalidArgument(other.to_string())),
        ("help" | "?", _) => Command::Help,
        ("quit" | "exit" | "q", _) => Command::Quit,
        _ => return Err(CommandError::Unknown(name)),
    };
    Ok(Some(command))
}

/// Whether the console keeps reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Run `command` against the session and return the lines to print.
///
/// Session failures have already been toasted, so they produce no lines.
pub fn execute<S: ImageService, R: RasterSurface>(
    session: &mut Session<S, R>,
    command: Command,
    default_count: u32,
) -> (Flow, Vec<String>) {
    let lines = match command {
        Command::Quit => return (Flow::Quit, Vec::new()),
        Command::Help => output::format_help(HELP),
        Command::List => output::format_gallery(session.gallery(), session.active()),
        Command::Generate { count } => {
            let _ = session.generate(count.unwrap_or(default_count));
            Vec::new()
        }
        Command::Edit(op) => {
            if op.parse::<EditOperation>().is_err() {
                tracing::debug!(operation = %op, "unknown edit operation, using fallback");
            }
            let _ = session.edit(&op);
            Vec::new()
        }
        Command::Undo => {
            let _ = session.undo();
            Vec::new()
        }
        Command::Activate(id) => match session.activate(id) {
            Ok(()) => vec![format!("Active: {id}")],
            Err(_) => Vec::new(),
        },
        Command::Select(id) => match session.toggle_selection(id) {
            Ok(true) => vec![format!("Selected {id}")],
            Ok(false) => vec![format!("Deselected {id}")],
            Err(_) => Vec::new(),
        },
        Command::SelectAll => match session.select_all() {
            Ok(()) => vec![format!("{} selected", session.gallery().selected_count())],
            Err(_) => Vec::new(),
        },
        Command::DeselectAll => match session.deselect_all() {
            Ok(()) => vec!["Selection cleared".to_string()],
            Err(_) => Vec::new(),
        },
        Command::Export(format) => match session.export(format) {
            Ok(path) => vec![format!("Wrote {}", path.display())],
            Err(_) => Vec::new(),
        },
        Command::Zip(scope) => match session.export_zip(scope) {
            Ok(path) => vec![format!("Wrote {}", path.display())],
            Err(_) => Vec::new(),
        },
    };
    (Flow::Continue, lines)
}

/// Read commands from `input` until `quit` or end of input.
pub fn run<S: ImageService, R: RasterSurface>(
    session: &mut Session<S, R>,
    input: impl BufRead,
    default_count: u32,
) -> std::io::Result<()> {
    for line in input.lines() {
        let line = line?;
        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(command)) => {
                let (flow, lines) = execute(session, command, default_count);
                for line in lines {
                    println!("{line}");
                }
                if flow == Flow::Quit {
                    break;
                }
            }
            Err(e) => eprintln!("{e}"),
        }
    }
    Ok(())
}
