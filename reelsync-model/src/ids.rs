//! Identifiers handed out by the catalog.
//!
//! Catalog ids are opaque strings (slugs such as `one-piece-100?ep=2142`), so
//! these wrap `String` rather than `Uuid`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Strongly typed ID for a single episode
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EpisodeId(pub String);

impl EpisodeId {
    pub fn new(raw: impl Into<String>) -> Self {
        EpisodeId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EpisodeId {
    fn from(value: &str) -> Self {
        EpisodeId::new(value)
    }
}

/// Strongly typed ID for a streaming server (mirror) of an episode
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ServerId(pub String);

impl ServerId {
    pub fn new(raw: impl Into<String>) -> Self {
        ServerId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ServerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ServerId {
    fn from(value: &str) -> Self {
        ServerId::new(value)
    }
}
