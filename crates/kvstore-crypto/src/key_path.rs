//! Structured store keys and the one-segment wildcard patterns matched against them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::WILDCARD;

/// An ordered sequence of string segments identifying one record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KvKey(Vec<String>);

impl KvKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if `prefix` is a leading run of this key's segments.
    pub fn starts_with(&self, prefix: &KvKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for KvKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for KvKey {
    fn from(segments: [S; N]) -> Self {
        Self::new(segments)
    }
}

impl From<Vec<String>> for KvKey {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl From<&[&str]> for KvKey {
    fn from(segments: &[&str]) -> Self {
        Self::new(segments.iter().copied())
    }
}

/// One position in a [`KeyPattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    Exact(String),
    Any,
}

/// A key pattern of fixed length. `"*"` matches any single segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPattern(Vec<PatternSegment>);

impl KeyPattern {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            segments
                .into_iter()
                .map(|s| {
                    let s = s.into();
                    if s == WILDCARD {
                        PatternSegment::Any
                    } else {
                        PatternSegment::Exact(s)
                    }
                })
                .collect(),
        )
    }

    pub fn segments(&self) -> &[PatternSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, key: &KvKey) -> bool {
        matches(self, key)
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for KeyPattern {
    fn from(segments: [S; N]) -> Self {
        Self::new(segments)
    }
}

impl From<&[&str]> for KeyPattern {
    fn from(segments: &[&str]) -> Self {
        Self::new(segments.iter().copied())
    }
}

/// Positional match. Lengths must be equal; there is no multi-segment glob.
pub fn matches(pattern: &KeyPattern, key: &KvKey) -> bool {
    if pattern.len() != key.len() {
        return false;
    }
    pattern
        .segments()
        .iter()
        .zip(key.segments())
        .all(|(p, k)| match p {
            PatternSegment::Any => true,
            PatternSegment::Exact(s) => s == k,
        })
}
