use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Snapshot of the primary surface's timeline.
///
/// Only the primary media surface mutates the underlying values; everything
/// else reads copies of this struct and issues seek/play/pause commands.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlaybackPosition {
    pub seconds: f64,
    pub is_playing: bool,
    pub rate: f64,
}

impl Default for PlaybackPosition {
    fn default() -> Self {
        Self {
            seconds: 0.0,
            is_playing: false,
            rate: 1.0,
        }
    }
}

impl PlaybackPosition {
    pub fn paused_at(seconds: f64) -> Self {
        Self {
            seconds,
            ..Self::default()
        }
    }

    pub fn playing_at(seconds: f64) -> Self {
        Self {
            seconds,
            is_playing: true,
            ..Self::default()
        }
    }
}

/// Audio category of a stream selection: original audio with subtitles, or
/// a dubbed track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Category {
    #[default]
    Sub,
    Dub,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Sub => "sub",
            Category::Dub => "dub",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sub" | "subbed" => Ok(Category::Sub),
            "dub" | "dubbed" => Ok(Category::Dub),
            other => Err(ModelError::UnknownCategory(other.to_string())),
        }
    }
}
