//! The validated fingerprint type

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::{FingerprintError, Result};

/// Pattern every fingerprint must match
pub const FINGERPRINT_PATTERN: &str = fingerprint_registry::SHA256_HEX_PATTERN;

fn fingerprint_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(FINGERPRINT_PATTERN).expect("fingerprint pattern is valid"))
}

/// Check that `value` is a 64-character lowercase hex SHA-256 digest.
pub fn validate_fingerprint(value: &str) -> Result<()> {
    if fingerprint_regex().is_match(value) {
        Ok(())
    } else {
        Err(FingerprintError::InvalidFingerprint {
            value: value.to_string(),
        })
    }
}

/// A SHA-256 digest rendered as 64 lowercase hex characters.
///
/// Can only be built from raw digest bytes or by parsing a string that
/// passes [`validate_fingerprint`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Parse and validate a hex fingerprint
    pub fn parse(value: &str) -> Result<Self> {
        validate_fingerprint(value)?;
        Ok(Self(value.to_string()))
    }

    /// Build from raw 32-byte digest output
    pub(crate) fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = FingerprintError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = FingerprintError;

    fn try_from(value: String) -> Result<Self> {
        validate_fingerprint(&value)?;
        Ok(Self(value))
    }
}

impl From<Fingerprint> for String {
    fn from(fp: Fingerprint) -> Self {
        fp.0
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
