#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Time range (seconds) of an intro or outro segment.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SkipMarker {
    pub start: f64,
    pub end: f64,
}

impl SkipMarker {
    pub fn new(start: f64, end: f64) -> Result<Self> {
        let marker = Self { start, end };
        if marker.is_valid() {
            Ok(marker)
        } else {
            Err(ModelError::InvalidMarker { start, end })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.start.is_finite()
            && self.end.is_finite()
            && self.start >= 0.0
            && self.end > self.start
    }

    /// Half-open window test: `start <= seconds < end`.
    pub fn contains(&self, seconds: f64) -> bool {
        seconds >= self.start && seconds < self.end
    }
}

/// Which skip affordance applies at a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SkipWindow {
    Intro,
    Outro,
}

/// Intro/outro markers for one episode. Both are optional.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SkipMarkers {
    pub intro: Option<SkipMarker>,
    pub outro: Option<SkipMarker>,
}

impl SkipMarkers {
    /// Build from raw catalog values, discarding empty or inverted ranges
    /// (catalogs report a missing intro as `{start: 0, end: 0}`).
    pub fn from_raw(
        intro: Option<SkipMarker>,
        outro: Option<SkipMarker>,
    ) -> Self {
        Self {
            intro: intro.filter(SkipMarker::is_valid),
            outro: outro.filter(SkipMarker::is_valid),
        }
    }

    pub fn get(&self, window: SkipWindow) -> Option<SkipMarker> {
        match window {
            SkipWindow::Intro => self.intro,
            SkipWindow::Outro => self.outro,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.intro.is_none() && self.outro.is_none()
    }
}
