use std::fmt;
use std::io::{self, Write};

use colored::Colorize;
use tracing::debug;

use crate::clipboard::Clipboard;

/// Conditions worth telling the user about that do not stop the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    EmptyClaim,
    Unsigned,
    DefaultAlgorithm,
    Clipboard(String),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::EmptyClaim => {
                f.write_str("One or more claims were left empty (--claim= ) and were skipped.")
            }
            Warning::Unsigned => f.write_str(
                "No signing key specified; encoding jwt without signing it. \
                 Are you sure that this is what you want?",
            ),
            Warning::DefaultAlgorithm => f.write_str(
                "You specified a signing key but no algorithm; using HS256. \
                 If you passed an RSA key file path, also pass --alg \
                 (otherwise the path string itself is used as the HS256 secret).",
            ),
            Warning::Clipboard(reason) => write!(
                f,
                "Token couldn't be copied to the clipboard ({reason}). Please copy it manually."
            ),
        }
    }
}

/// Where the token ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Printed,
    CopiedToClipboard,
}

pub fn warn(warning: &Warning) {
    eprintln!("{} {}", "WARNING:".bold().yellow(), warning.to_string().yellow());
}

pub fn error(err: &dyn fmt::Display) {
    eprintln!("{} {}", "ERROR:".bold().red(), err.to_string().red());
}

/// Prints the token and copies it to the clipboard when asked to.
///
/// Clipboard failures are reported as a warning and never fail the run.
pub fn finalize(
    token: &str,
    copy: bool,
    out: &mut impl Write,
    clipboard: &dyn Clipboard,
) -> io::Result<Delivery> {
    writeln!(out, "{}", token)?;
    out.flush()?;

    if !copy {
        return Ok(Delivery::Printed);
    }

    match clipboard.copy_text(token) {
        Ok(()) => {
            debug!("copied token to clipboard");
            Ok(Delivery::CopiedToClipboard)
        }
        Err(err) => {
            warn(&Warning::Clipboard(err.to_string()));
            Ok(Delivery::Printed)
        }
    }
}
