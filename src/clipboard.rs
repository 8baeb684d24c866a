//! Best-effort clipboard access through the platform's clipboard utility.
//!
//! The token is written to the utility's stdin, never interpolated into a
//! shell command line.

use std::io::{self, Write};
use std::process::{Command, ExitStatus, Stdio};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Copying to the clipboard is not supported on this platform")]
    Unsupported,
    #[error("No clipboard utility found (tried {tried})")]
    NoUtility { tried: String },
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: &'static str,
        source: io::Error,
    },
    #[error("Failed to pass the token to {program}: {source}")]
    Write {
        program: &'static str,
        source: io::Error,
    },
    #[error("{program} exited with {status}")]
    Exited {
        program: &'static str,
        status: ExitStatus,
    },
}

pub trait Clipboard {
    fn copy_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// A clipboard utility that reads the text to copy from stdin.
#[derive(Debug, Clone, Copy)]
pub struct PipeCommand {
    pub program: &'static str,
    pub args: &'static [&'static str],
}

impl PipeCommand {
    pub const fn new(program: &'static str, args: &'static [&'static str]) -> Self {
        PipeCommand { program, args }
    }

    fn copy(&self, text: &str) -> Result<(), ClipboardError> {
        let mut child = Command::new(self.program)
            .args(self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ClipboardError::Spawn {
                program: self.program,
                source,
            })?;

        // Dropping stdin closes the pipe so the utility sees EOF.
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(source) = stdin.write_all(text.as_bytes()) {
                drop(stdin);
                // Reap the utility; the write failure is what gets reported.
                let status = child.wait();
                debug!(program = self.program, ?status, "clipboard utility stopped reading");
                return Err(ClipboardError::Write {
                    program: self.program,
                    source,
                });
            }
        }

        let status = child.wait().map_err(|source| ClipboardError::Spawn {
            program: self.program,
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(ClipboardError::Exited {
                program: self.program,
                status,
            })
        }
    }
}

#[cfg(target_os = "macos")]
const PLATFORM_COMMANDS: &[PipeCommand] = &[PipeCommand::new("pbcopy", &[])];

#[cfg(windows)]
const PLATFORM_COMMANDS: &[PipeCommand] = &[PipeCommand::new("clip", &[])];

#[cfg(all(unix, not(target_os = "macos")))]
const PLATFORM_COMMANDS: &[PipeCommand] = &[
    PipeCommand::new("wl-copy", &[]),
    PipeCommand::new("xclip", &["-selection", "clipboard"]),
    PipeCommand::new("xsel", &["--clipboard", "--input"]),
];

#[cfg(not(any(unix, windows)))]
const PLATFORM_COMMANDS: &[PipeCommand] = &[];

/// Copies through the first of its utilities that is installed.
pub struct PipeClipboard {
    commands: Vec<PipeCommand>,
}

impl PipeClipboard {
    pub fn for_platform() -> Self {
        PipeClipboard::with_commands(PLATFORM_COMMANDS.to_vec())
    }

    pub fn with_commands(commands: Vec<PipeCommand>) -> Self {
        PipeClipboard { commands }
    }
}

impl Clipboard for PipeClipboard {
    fn copy_text(&self, text: &str) -> Result<(), ClipboardError> {
        if self.commands.is_empty() {
            return Err(ClipboardError::Unsupported);
        }

        for command in &self.commands {
            match command.copy(text) {
                Err(ClipboardError::Spawn { source, .. })
                    if source.kind() == io::ErrorKind::NotFound =>
                {
                    debug!(program = command.program, "clipboard utility not installed");
                }
                result => {
                    debug!(program = command.program, ok = result.is_ok(), "clipboard utility ran");
                    return result;
                }
            }
        }

        let tried = self
            .commands
            .iter()
            .map(|command| command.program)
            .collect::<Vec<_>>()
            .join(", ");
        Err(ClipboardError::NoUtility { tried })
    }
}
