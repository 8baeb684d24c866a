use base64::prelude::*;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use crate::claim::{parse_claim, Claim, ClaimError};
use crate::clock::{Clock, NumericDate};
use crate::error::Error;
use crate::key::{resolve_key, Algorithm, FileSource, SigningAlgorithm};
use crate::output::Warning;

const TOKEN_TYPE: &str = "JWT";

/// Payload members owned by their own options; `--claim` may not set them.
const REGISTERED_CLAIMS: [&str; 6] = ["iss", "sub", "aud", "exp", "nbf", "iat"];

#[derive(serde::Serialize)]
pub struct Header {
    alg: Algorithm,
    typ: &'static str,
}

impl Header {
    pub fn new(alg: Algorithm) -> Self {
        Header {
            alg,
            typ: TOKEN_TYPE,
        }
    }
}

/// The claim set of the token being built.
///
/// Registered claims are written first, custom claims follow in the order
/// they were added. A custom claim name given twice is written twice.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TokenDraft {
    pub issuer: Option<String>,
    pub subject: Option<String>,
    pub audience: Option<String>,
    pub expires_at: Option<NumericDate>,
    pub not_before: Option<NumericDate>,
    pub issued_at: Option<NumericDate>,
    pub claims: Vec<Claim>,
}

impl Serialize for TokenDraft {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(iss) = &self.issuer {
            map.serialize_entry("iss", iss)?;
        }
        if let Some(sub) = &self.subject {
            map.serialize_entry("sub", sub)?;
        }
        if let Some(aud) = &self.audience {
            map.serialize_entry("aud", aud)?;
        }
        if let Some(exp) = &self.expires_at {
            map.serialize_entry("exp", exp)?;
        }
        if let Some(nbf) = &self.not_before {
            map.serialize_entry("nbf", nbf)?;
        }
        if let Some(iat) = &self.issued_at {
            map.serialize_entry("iat", iat)?;
        }
        for claim in &self.claims {
            map.serialize_entry(&claim.name, &claim.value)?;
        }
        map.end()
    }
}

/// Returns the only occurrence of `option`, failing when it was passed more than once.
pub fn single_value<'a>(
    option: &'static str,
    occurrences: &'a [String],
) -> Result<Option<&'a str>, Error> {
    match occurrences {
        [] => Ok(None),
        [value] => Ok(Some(value.as_str())),
        _ => Err(Error::DuplicateOption { option }),
    }
}

fn numeric_date(
    option: &'static str,
    occurrences: &[String],
) -> Result<Option<NumericDate>, Error> {
    single_value(option, occurrences)?
        .map(|raw| {
            raw.parse().map_err(|_| Error::InvalidTimestamp {
                option,
                value: raw.to_string(),
            })
        })
        .transpose()
}

/// Accumulates claims from the command line options.
///
/// Every setter takes all occurrences of its option, so duplicates are
/// rejected no matter in which order the setters are called.
pub struct TokenBuilder<C: Clock> {
    clock: C,
    draft: TokenDraft,
    warnings: Vec<Warning>,
}

impl<C: Clock> TokenBuilder<C> {
    pub fn new(clock: C) -> Self {
        TokenBuilder {
            clock,
            draft: TokenDraft::default(),
            warnings: Vec::new(),
        }
    }

    pub fn set_issuer(&mut self, occurrences: &[String]) -> Result<&mut Self, Error> {
        self.draft.issuer = single_value("iss", occurrences)?.map(str::to_string);
        Ok(self)
    }

    pub fn set_subject(&mut self, occurrences: &[String]) -> Result<&mut Self, Error> {
        self.draft.subject = single_value("sub", occurrences)?.map(str::to_string);
        Ok(self)
    }

    pub fn set_audience(&mut self, occurrences: &[String]) -> Result<&mut Self, Error> {
        self.draft.audience = single_value("aud", occurrences)?.map(str::to_string);
        Ok(self)
    }

    pub fn set_expires_at(&mut self, occurrences: &[String]) -> Result<&mut Self, Error> {
        self.draft.expires_at = numeric_date("exp", occurrences)?;
        Ok(self)
    }

    pub fn set_not_before(&mut self, occurrences: &[String]) -> Result<&mut Self, Error> {
        self.draft.not_before = numeric_date("nbf", occurrences)?;
        Ok(self)
    }

    /// Sets `iat`; when absent it falls back to the clock once the algorithm is resolved.
    pub fn set_issued_at(&mut self, occurrences: &[String]) -> Result<&mut Self, Error> {
        self.draft.issued_at = numeric_date("iat", occurrences)?;
        Ok(self)
    }

    /// Adds one `--claim` argument. Empty arguments are skipped with a warning.
    ///
    /// Registered claim names are rejected so every payload member stays unique.
    pub fn add_claim(&mut self, raw: &str) -> Result<&mut Self, Error> {
        match parse_claim(raw) {
            Ok(claim) if REGISTERED_CLAIMS.contains(&claim.name.as_str()) => {
                return Err(ClaimError::Malformed {
                    claim: raw.to_string(),
                    reason: "registered claim names are set with their own option",
                }
                .into());
            }
            Ok(claim) => self.draft.claims.push(claim),
            Err(ClaimError::Empty) => {
                if !self.warnings.contains(&Warning::EmptyClaim) {
                    self.warnings.push(Warning::EmptyClaim);
                }
            }
            Err(err) => return Err(err.into()),
        }
        Ok(self)
    }

    pub fn add_claims(&mut self, raws: &[String]) -> Result<&mut Self, Error> {
        for raw in raws {
            self.add_claim(raw)?;
        }
        Ok(self)
    }

    /// Resolves the signing algorithm, completing the claim set.
    ///
    /// `--key`, `--alg` and `--pw` may each be given at most once. An empty
    /// `--key=` counts as no key.
    pub fn resolve_algorithm(
        mut self,
        key: &[String],
        alg: &[String],
        password: &[String],
        files: &dyn FileSource,
    ) -> Result<ResolvedToken, Error> {
        let key = single_value("key", key)?.filter(|key| !key.is_empty());
        let alg = single_value("alg", alg)?;
        let password = single_value("pw", password)?;

        let algorithm = resolve_key(key, alg, password, files)?;
        match (key, alg) {
            (None, _) => self.warnings.push(Warning::Unsigned),
            (Some(_), None) => self.warnings.push(Warning::DefaultAlgorithm),
            (Some(_), Some(_)) => {}
        }

        if self.draft.issued_at.is_none() {
            self.draft.issued_at = Some(self.clock.now());
        }

        Ok(ResolvedToken {
            draft: self.draft,
            algorithm,
            warnings: self.warnings,
        })
    }
}

/// A complete claim set with the algorithm that will sign it.
#[derive(Debug)]
pub struct ResolvedToken {
    draft: TokenDraft,
    algorithm: SigningAlgorithm,
    warnings: Vec<Warning>,
}

impl ResolvedToken {
    pub fn draft(&self) -> &TokenDraft {
        &self.draft
    }

    pub fn algorithm(&self) -> &SigningAlgorithm {
        &self.algorithm
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Encodes the token in compact form: `header.payload.signature`.
    ///
    /// The signature segment is empty for unsigned tokens.
    pub fn sign(&self) -> Result<String, Error> {
        let header = serde_json::to_vec(&Header::new(self.algorithm.algorithm()))?;
        let payload = serde_json::to_vec(&self.draft)?;

        let signing_input = format!(
            "{}.{}",
            BASE64_URL_SAFE_NO_PAD.encode(header),
            BASE64_URL_SAFE_NO_PAD.encode(payload)
        );
        let signature = self.algorithm.sign(signing_input.as_bytes())?;

        debug!(
            alg = %self.algorithm.algorithm(),
            claims = self.draft.claims.len(),
            iat = self.draft.issued_at.map(NumericDate::as_secs),
            "signed token"
        );

        Ok(format!(
            "{}.{}",
            signing_input,
            BASE64_URL_SAFE_NO_PAD.encode(signature)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::key::{KeyError, LocalFiles};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    const NOW: i64 = 1_700_000_123;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn builder() -> TokenBuilder<FixedClock> {
        TokenBuilder::new(FixedClock(NumericDate::from_secs(NOW)))
    }

    fn decode_segment(segment: &str) -> Value {
        let bytes = BASE64_URL_SAFE_NO_PAD.decode(segment).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn split(token: &str) -> (Value, Value, String) {
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3, "{token}");
        (
            decode_segment(parts[0]),
            decode_segment(parts[1]),
            parts[2].to_string(),
        )
    }

    fn unsigned(builder: TokenBuilder<FixedClock>) -> ResolvedToken {
        builder.resolve_algorithm(&[], &[], &[], &LocalFiles).unwrap()
    }

    #[test]
    fn builds_hs256_scenario() {
        let mut builder = builder();
        builder
            .set_issuer(&args(&["acme"]))
            .unwrap()
            .set_expires_at(&args(&["1700000000"]))
            .unwrap()
            .add_claim("role:admin")
            .unwrap();

        let token = builder
            .resolve_algorithm(&args(&["supersecret"]), &args(&["hs256"]), &[], &LocalFiles)
            .unwrap();
        assert!(token.warnings().is_empty());

        let (header, payload, signature) = split(&token.sign().unwrap());
        assert_eq!(header, json!({"alg": "HS256", "typ": "JWT"}));
        assert_eq!(
            payload,
            json!({"iss": "acme", "exp": 1700000000, "iat": NOW, "role": "admin"})
        );
        assert_eq!(BASE64_URL_SAFE_NO_PAD.decode(signature).unwrap().len(), 32);
    }

    #[test]
    fn header_is_compact_json_in_alg_typ_order() {
        let token = unsigned(builder()).sign().unwrap();
        let header = token.split('.').next().unwrap();
        assert_eq!(
            BASE64_URL_SAFE_NO_PAD.decode(header).unwrap(),
            br#"{"alg":"none","typ":"JWT"}"#
        );
    }

    #[test]
    fn unsigned_tokens_have_an_empty_signature() {
        let token = unsigned(builder());
        assert_eq!(token.warnings(), [Warning::Unsigned]);

        let encoded = token.sign().unwrap();
        assert!(encoded.ends_with('.'));
        let (header, payload, signature) = split(&encoded);
        assert_eq!(header["alg"], "none");
        assert_eq!(payload, json!({"iat": NOW}));
        assert!(signature.is_empty());
    }

    #[test]
    fn algorithm_is_ignored_without_a_key() {
        let token = builder()
            .resolve_algorithm(&[], &args(&["rs256"]), &[], &LocalFiles)
            .unwrap();
        assert!(matches!(token.algorithm(), SigningAlgorithm::None));
    }

    #[test]
    fn empty_key_counts_as_no_key() {
        let token = builder()
            .resolve_algorithm(&args(&[""]), &args(&["hs256"]), &[], &LocalFiles)
            .unwrap();
        assert!(matches!(token.algorithm(), SigningAlgorithm::None));
    }

    #[test]
    fn key_without_algorithm_warns_and_uses_hs256() {
        let token = builder()
            .resolve_algorithm(&args(&["supersecret"]), &[], &[], &LocalFiles)
            .unwrap();
        assert_eq!(token.warnings(), [Warning::DefaultAlgorithm]);
        assert_eq!(token.algorithm().algorithm(), Algorithm::HS256);
    }

    #[test]
    fn same_inputs_give_identical_tokens() {
        let make = || {
            let mut builder = builder();
            builder
                .set_subject(&args(&["user-1"]))
                .unwrap()
                .add_claims(&args(&["role:admin", "projectId:7"]))
                .unwrap();
            builder
                .resolve_algorithm(&args(&["supersecret"]), &[], &[], &LocalFiles)
                .unwrap()
                .sign()
                .unwrap()
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn explicit_iat_overrides_the_clock() {
        let mut builder = builder();
        builder.set_issued_at(&args(&["1587399600"])).unwrap();
        assert_eq!(
            unsigned(builder).draft().issued_at,
            Some(NumericDate::from_secs(1_587_399_600))
        );
    }

    #[test]
    fn negative_dates_are_folded() {
        let mut builder = builder();
        builder
            .set_expires_at(&args(&["-1700000000"]))
            .unwrap()
            .set_not_before(&args(&["-5"]))
            .unwrap();
        let token = unsigned(builder);
        assert_eq!(token.draft().expires_at, Some(NumericDate::from_secs(1_700_000_000)));
        assert_eq!(token.draft().not_before, Some(NumericDate::from_secs(5)));
    }

    #[test]
    fn rejects_non_numeric_dates() {
        let err = builder().set_expires_at(&args(&["tomorrow"])).err().unwrap();
        assert!(matches!(
            err,
            Error::InvalidTimestamp { option: "exp", ref value } if value == "tomorrow"
        ));
    }

    #[test]
    fn rejects_duplicates_of_every_single_valued_option() {
        let twice = args(&["1", "2"]);
        type Setter = fn(&mut TokenBuilder<FixedClock>, &[String]) -> Result<(), Error>;
        let setters: [(&str, Setter); 6] = [
            ("iss", |b, v| b.set_issuer(v).map(|_| ())),
            ("sub", |b, v| b.set_subject(v).map(|_| ())),
            ("aud", |b, v| b.set_audience(v).map(|_| ())),
            ("exp", |b, v| b.set_expires_at(v).map(|_| ())),
            ("nbf", |b, v| b.set_not_before(v).map(|_| ())),
            ("iat", |b, v| b.set_issued_at(v).map(|_| ())),
        ];

        for (name, setter) in setters {
            let mut builder = builder();
            builder.add_claim("role:admin").unwrap();
            match setter(&mut builder, &twice) {
                Err(Error::DuplicateOption { option }) => assert_eq!(option, name),
                other => panic!("{name}: expected DuplicateOption, got {other:?}"),
            }
        }

        for (name, key, alg, pw) in [
            ("key", twice.clone(), Vec::new(), Vec::new()),
            ("alg", args(&["secret"]), args(&["hs256", "hs512"]), Vec::new()),
            ("pw", args(&["secret"]), args(&["hs256"]), args(&["a", "b"])),
        ] {
            match builder().resolve_algorithm(&key, &alg, &pw, &LocalFiles) {
                Err(Error::DuplicateOption { option }) => assert_eq!(option, name),
                other => panic!("{name}: expected DuplicateOption, got {other:?}"),
            }
        }
    }

    #[test]
    fn custom_claims_are_strings_in_insertion_order() {
        let mut builder = builder();
        builder
            .add_claims(&args(&["role:admin", "projectId:7", "role:auditor"]))
            .unwrap();
        let token = unsigned(builder);

        let payload = serde_json::to_string(token.draft()).unwrap();
        assert_eq!(
            payload,
            format!(r#"{{"iat":{NOW},"role":"admin","projectId":"7","role":"auditor"}}"#)
        );
    }

    #[test]
    fn empty_claims_are_skipped_with_one_warning() {
        let mut builder = builder();
        builder.add_claims(&args(&["", "role:admin", ""])).unwrap();
        let token = unsigned(builder);

        assert_eq!(token.draft().claims.len(), 1);
        assert_eq!(token.warnings(), [Warning::EmptyClaim, Warning::Unsigned]);
    }

    #[test]
    fn malformed_claims_abort() {
        let mut builder = builder();
        let err = builder.add_claims(&args(&["role:admin", "bad"])).err().unwrap();
        assert!(matches!(err, Error::Claim(ClaimError::Malformed { .. })));
    }

    #[test]
    fn registered_claim_names_cannot_be_added_as_custom_claims() {
        for raw in ["iss:evil", "sub:x", "aud:x", "exp:x", "nbf:x", "iat:x"] {
            let mut builder = builder();
            builder.set_issuer(&args(&["acme"])).unwrap();
            match builder.add_claim(raw) {
                Err(Error::Claim(ClaimError::Malformed { claim, .. })) => assert_eq!(claim, raw),
                other => panic!("{raw}: expected Malformed, got {:?}", other.map(|_| ())),
            }
        }

        let mut builder = builder();
        builder.add_claims(&args(&["ISS:upper", "issuer:long"])).unwrap();
        let payload = serde_json::to_string(unsigned(builder).draft()).unwrap();
        assert_eq!(
            payload,
            format!(r#"{{"iat":{NOW},"ISS":"upper","issuer":"long"}}"#)
        );
    }

    #[test]
    fn unsupported_algorithms_abort() {
        let err = builder()
            .resolve_algorithm(&args(&["secret"]), &args(&["es256"]), &[], &LocalFiles)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            Error::Key(KeyError::UnsupportedAlgorithm { ref name }) if name == "es256"
        ));
    }

    #[test]
    fn rsa_keys_are_read_from_the_given_path() {
        let err = builder()
            .resolve_algorithm(
                &args(&["/nonexistent/path"]),
                &args(&["rs256"]),
                &[],
                &LocalFiles,
            )
            .err()
            .unwrap();
        assert!(matches!(err, Error::Key(KeyError::KeyFileUnreadable { .. })));

        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/rsa_private.pem");
        let token = builder()
            .resolve_algorithm(&args(&[path]), &args(&["RS512"]), &[], &LocalFiles)
            .unwrap();
        let (header, _, signature) = split(&token.sign().unwrap());
        assert_eq!(header["alg"], "RS512");
        assert_eq!(BASE64_URL_SAFE_NO_PAD.decode(signature).unwrap().len(), 256);
    }
}
