//! Top-level error type and its mapping onto process exit codes.

use thiserror::Error;

use crate::claim::ClaimError;
use crate::key::KeyError;

/// Exit code for command lines that could not be parsed.
pub const EXIT_USAGE: u8 = 1;
/// Exit code for well-formed command lines carrying invalid values.
pub const EXIT_INVALID: u8 = 2;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    ArgumentParse(#[from] clap::Error),
    #[error("You passed more than one --{option}. Only one --{option} per jwt is allowed!")]
    DuplicateOption { option: &'static str },
    #[error("Invalid --{option} value \"{value}\": expected seconds since 1970-01-01T00:00:00Z")]
    InvalidTimestamp { option: &'static str, value: String },
    #[error(transparent)]
    Claim(#[from] ClaimError),
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error("Failed to encode the token: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("Failed to sign the token: {0}")]
    Signing(#[from] rsa::signature::Error),
    #[error("Failed to write the token: {0}")]
    Output(#[from] std::io::Error),
}

impl Error {
    /// The process exit code this error terminates the run with.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::ArgumentParse(err) if !err.use_stderr() => 0,
            Error::ArgumentParse(_) | Error::Output(_) => EXIT_USAGE,
            Error::DuplicateOption { .. }
            | Error::InvalidTimestamp { .. }
            | Error::Claim(_)
            | Error::Key(_)
            | Error::Encoding(_)
            | Error::Signing(_) => EXIT_INVALID,
        }
    }
}
