use thiserror::Error;

const DELIMITER: char = ':';

#[derive(Debug, PartialEq, Error)]
pub enum ClaimError {
    #[error("One or more claims were left empty (--claim= )")]
    Empty,
    #[error(
        "Invalid claim argument \"{claim}\" ({reason}). \
         Please use the syntax --claim=CLAIM_NAME:CLAIM_VALUE"
    )]
    Malformed { claim: String, reason: &'static str },
}

/// A custom payload claim given as `NAME:VALUE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub name: String,
    pub value: String,
}

/// Parses a raw `--claim` argument.
///
/// The argument must contain exactly one `:`, with a non-blank name before it
/// and a non-blank value after it. Both halves are returned untouched.
pub fn parse_claim(raw: &str) -> Result<Claim, ClaimError> {
    if raw.is_empty() {
        return Err(ClaimError::Empty);
    }

    let malformed = |reason| ClaimError::Malformed {
        claim: raw.to_string(),
        reason,
    };

    let (name, value) = raw
        .split_once(DELIMITER)
        .ok_or_else(|| malformed("missing ':' delimiter"))?;

    if value.contains(DELIMITER) {
        return Err(malformed("more than one ':' delimiter"));
    }

    if name.trim().is_empty() || value.trim().is_empty() {
        return Err(malformed("claim name or claim value is empty"));
    }

    Ok(Claim {
        name: name.to_string(),
        value: value.to_string(),
    })
}
