//! Content identifier types and parsing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An identifier for a resource in the decentralized content store:
/// a content hash plus an optional subpath below it.
///
/// Accepted input forms, all normalized to `<cid>[/subpath]`:
/// - `ipfs://<cid>[/subpath]`
/// - `/ipfs/<cid>[/subpath]` or `ipfs/<cid>[/subpath]`
/// - `<cid>[/subpath]`
///
/// The identifier is immutable and used only as a lookup key; no attempt is
/// made to interpret the hash beyond syntactic validation.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentIdentifier {
    cid: String,
    subpath: Option<String>,
}

impl ContentIdentifier {
    /// Parse an identifier from any of the accepted forms.
    pub fn parse(input: &str) -> crate::Result<Self> {
        let rest = input
            .strip_prefix("ipfs://")
            .or_else(|| input.strip_prefix("/ipfs/"))
            .or_else(|| input.strip_prefix("ipfs/"))
            .unwrap_or(input);
        let rest = rest.trim_matches('/');

        if rest.is_empty() {
            return Err(crate::Error::InvalidContentId("empty identifier".into()));
        }

        let (cid, subpath) = match rest.split_once('/') {
            Some((cid, sub)) => (cid, Some(sub)),
            None => (rest, None),
        };

        if cid.len() < 32 {
            return Err(crate::Error::InvalidContentId(format!(
                "content hash too short: {} chars",
                cid.len()
            )));
        }
        for c in cid.chars() {
            if !c.is_ascii_alphanumeric() {
                return Err(crate::Error::InvalidContentId(format!(
                    "invalid character in content hash: {c}"
                )));
            }
        }

        if let Some(sub) = subpath {
            if sub.is_empty() {
                return Err(crate::Error::InvalidContentId("empty subpath".into()));
            }
            for c in sub.chars() {
                if !matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '/' | '-' | '_' | '.' | '+' | '%')
                {
                    return Err(crate::Error::InvalidContentId(format!(
                        "invalid character in subpath: {c}"
                    )));
                }
            }
        }

        Ok(Self {
            cid: cid.to_string(),
            subpath: subpath.map(str::to_string),
        })
    }

    /// Get the content hash portion.
    pub fn cid(&self) -> &str {
        &self.cid
    }

    /// Get the subpath below the hash, if any.
    pub fn subpath(&self) -> Option<&str> {
        self.subpath.as_deref()
    }

    /// Append a relative path segment, e.g. a per-token metadata file
    /// under a collection base URI.
    pub fn join(&self, segment: &str) -> crate::Result<Self> {
        let segment = segment.trim_matches('/');
        if segment.is_empty() {
            return Err(crate::Error::InvalidContentId(
                "empty path segment".into(),
            ));
        }
        let joined = match &self.subpath {
            Some(sub) => format!("{}/{}/{}", self.cid, sub, segment),
            None => format!("{}/{}", self.cid, segment),
        };
        Self::parse(&joined)
    }

    /// The normalized path form appended to a gateway base URL.
    pub fn gateway_path(&self) -> String {
        match &self.subpath {
            Some(sub) => format!("{}/{}", self.cid, sub),
            None => self.cid.clone(),
        }
    }
}

impl TryFrom<String> for ContentIdentifier {
    type Error = crate::Error;

    fn try_from(value: String) -> crate::Result<Self> {
        Self::parse(&value)
    }
}

impl From<ContentIdentifier> for String {
    fn from(id: ContentIdentifier) -> Self {
        id.gateway_path()
    }
}

impl fmt::Debug for ContentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentIdentifier({self})")
    }
}

impl fmt::Display for ContentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.gateway_path())
    }
}
