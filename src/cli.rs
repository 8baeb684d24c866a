use clap::{ArgAction, Parser};

const EXAMPLES: &str = "\
Examples:
  jwtgen -iglitchedtime -c --exp=1587399600
  jwtgen --iss=glitchedpolygons --copy -kSecretSigningKey
  jwtgen --iss=glitchedpolygons --copy --key=SecretSigningKey --alg=hs512
  jwtgen --iss=otherIssuerName --nbf=1587399600 --claim=role:admin --claim=projectId:7 \\
         --alg=rs256 --key=/home/username/private-key.pem --pw=KeyDecryptionPassphrase123

Numeric dates are read as absolute values: --exp=-1587399600 is treated as 1587399600.
Registered claim names (iss, sub, aud, exp, nbf, iat) are rejected by --claim;
set them with their own options.";

/// A simple JWT generator
/// Builds a token from the given claims and signs it with HS256/384/512 or RS256/384/512.
/// Without a key the token is left unsigned.
///
/// Single-valued options are collected with all of their occurrences so that
/// passing one twice can be reported as a validation error rather than a
/// parse error.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, after_help = EXAMPLES)]
pub struct JwtGenArgs {
    /// Copy the generated token to the clipboard
    #[clap(long = "copy", short = 'c')]
    pub copy: bool,

    /// No color output
    #[clap(long = "no-color", short = 'n')]
    pub no_color: bool,

    /// The token's issuer (who created and signed it)
    #[clap(long = "iss", short = 'i', value_name = "ISSUER", action = ArgAction::Append)]
    pub iss: Vec<String>,

    /// The token's subject (usually whom the token refers to)
    #[clap(long = "sub", short = 's', value_name = "SUBJECT", action = ArgAction::Append)]
    pub sub: Vec<String>,

    /// The token's intended audience (recipients)
    #[clap(long = "aud", short = 'a', value_name = "AUDIENCE", action = ArgAction::Append)]
    pub aud: Vec<String>,

    /// Expiration date in seconds since 1970-01-01T00:00:00Z
    #[clap(
        long = "exp",
        value_name = "SECONDS",
        allow_negative_numbers = true,
        action = ArgAction::Append
    )]
    pub exp: Vec<String>,

    /// Issued-at date in seconds since 1970-01-01T00:00:00Z; defaults to now
    #[clap(
        long = "iat",
        value_name = "SECONDS",
        allow_negative_numbers = true,
        action = ArgAction::Append
    )]
    pub iat: Vec<String>,

    /// Date from which the token is valid, in seconds since 1970-01-01T00:00:00Z
    #[clap(
        long = "nbf",
        value_name = "SECONDS",
        allow_negative_numbers = true,
        action = ArgAction::Append
    )]
    pub nbf: Vec<String>,

    /// Additional claim, repeatable; values are always encoded as strings
    #[clap(
        long = "claim",
        value_name = "NAME:VALUE",
        allow_hyphen_values = true,
        action = ArgAction::Append
    )]
    pub claims: Vec<String>,

    /// Signing algorithm: HS256, HS384, HS512, RS256, RS384 or RS512 (case-insensitive).
    /// Ignored when no key is given.
    #[clap(long = "alg", value_name = "ALG", action = ArgAction::Append)]
    pub alg: Vec<String>,

    /// HMAC secret, or the path to a PEM private key file for the RS* algorithms.
    /// If omitted, the token is not signed.
    #[clap(
        long = "key",
        short = 'k',
        value_name = "SECRET|PATH",
        env = "JWTGEN_KEY",
        hide_env_values = true,
        allow_hyphen_values = true,
        action = ArgAction::Append
    )]
    pub key: Vec<String>,

    /// Password for decrypting an encrypted RSA private key
    #[clap(
        long = "pw",
        short = 'p',
        value_name = "PASSWORD",
        env = "JWTGEN_PW",
        hide_env_values = true,
        allow_hyphen_values = true,
        action = ArgAction::Append
    )]
    pub pw: Vec<String>,
}
