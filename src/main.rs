mod claim;
mod cli;
mod clipboard;
mod clock;
mod error;
mod jwt;
mod key;
mod output;

use std::io;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use cli::JwtGenArgs;
use clipboard::PipeClipboard;
use clock::SystemClock;
use error::Error;
use jwt::TokenBuilder;
use key::LocalFiles;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "JWTGEN_LOG";

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_env_var(LOG_ENV)
                .with_default_directive(tracing::Level::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<(), Error> {
    // Like the help flag, a bare invocation only prints usage.
    if std::env::args_os().len() <= 1 {
        JwtGenArgs::command().print_help()?;
        return Ok(());
    }

    let args = JwtGenArgs::try_parse()?;

    if args.no_color {
        colored::control::set_override(false);
    }

    let mut builder = TokenBuilder::new(SystemClock);
    builder
        .set_issuer(&args.iss)?
        .set_subject(&args.sub)?
        .set_audience(&args.aud)?
        .set_expires_at(&args.exp)?
        .set_not_before(&args.nbf)?
        .set_issued_at(&args.iat)?
        .add_claims(&args.claims)?;

    let token = builder.resolve_algorithm(&args.key, &args.alg, &args.pw, &LocalFiles)?;
    debug!(draft = ?token.draft(), "claim set complete");
    if let Some(pair) = token.algorithm().key_pair() {
        debug!(
            public_key = pair.public_key_pem(),
            private_key_bytes = pair.private_key_pem().len(),
            password = pair.password().is_some(),
            "signing with RSA key pair"
        );
    }

    for warning in token.warnings() {
        output::warn(warning);
    }

    let encoded = token.sign()?;
    let delivery = output::finalize(
        &encoded,
        args.copy,
        &mut io::stdout().lock(),
        &PipeClipboard::for_platform(),
    )?;
    debug!(?delivery, "done");

    Ok(())
}

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match &err {
                // clap renders its own usage, help and version output.
                Error::ArgumentParse(parse_err) => {
                    let _ = parse_err.print();
                }
                _ => output::error(&err),
            }
            ExitCode::from(err.exit_code())
        }
    }
}
