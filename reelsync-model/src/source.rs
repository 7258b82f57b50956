use url::Url;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, parse_url};

/// One playable stream option for an episode.
///
/// Candidates are immutable once built; a [`SourceList`] orders them by the
/// caller's server/quality preference.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SourceCandidate {
    pub url: Url,
    #[cfg_attr(feature = "serde", serde(default))]
    pub quality: Option<String>,
    /// Container hint as reported by the catalog (`mp4`, `hls`, ...)
    pub container_type: String,
}

impl SourceCandidate {
    pub fn new(
        url: Url,
        quality: Option<String>,
        container_type: impl Into<String>,
    ) -> Self {
        Self {
            url,
            quality,
            container_type: container_type.into(),
        }
    }

    /// Build a candidate from an unvalidated url string.
    pub fn parse(
        raw: &str,
        quality: Option<&str>,
        container_type: &str,
    ) -> Result<Self> {
        Ok(Self::new(
            parse_url(raw)?,
            quality.map(str::to_string),
            container_type,
        ))
    }

    /// Short human label used in notices ("720p", or the host when the
    /// catalog did not report a quality).
    pub fn label(&self) -> String {
        match &self.quality {
            Some(quality) => quality.clone(),
            None => self
                .url
                .host_str()
                .map(str::to_string)
                .unwrap_or_else(|| self.container_type.clone()),
        }
    }

    pub fn is_hls(&self) -> bool {
        let container = self.container_type.to_ascii_lowercase();
        container == "hls"
            || container.contains("mpegurl")
            || self.url.path().ends_with(".m3u8")
    }
}

/// Ordered fallback candidates for one episode/server/category selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SourceList {
    candidates: Vec<SourceCandidate>,
}

impl SourceList {
    pub fn new(candidates: Vec<SourceCandidate>) -> Self {
        Self { candidates }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SourceCandidate> {
        self.candidates.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceCandidate> {
        self.candidates.iter()
    }

    /// Index of the first candidate advertising `quality` (case-insensitive).
    pub fn position_of_quality(&self, quality: &str) -> Option<usize> {
        self.candidates.iter().position(|candidate| {
            candidate
                .quality
                .as_deref()
                .is_some_and(|q| q.eq_ignore_ascii_case(quality))
        })
    }

    /// Distinct quality labels in preference order.
    pub fn qualities(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for quality in self
            .candidates
            .iter()
            .filter_map(|candidate| candidate.quality.as_deref())
        {
            if !seen.contains(&quality) {
                seen.push(quality);
            }
        }
        seen
    }
}

impl From<Vec<SourceCandidate>> for SourceList {
    fn from(candidates: Vec<SourceCandidate>) -> Self {
        Self::new(candidates)
    }
}

impl FromIterator<SourceCandidate> for SourceList {
    fn from_iter<T: IntoIterator<Item = SourceCandidate>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(url: &str, quality: Option<&str>) -> SourceCandidate {
        SourceCandidate::parse(url, quality, "mp4").expect("valid url")
    }

    #[test]
    fn quality_lookup_is_case_insensitive_and_first_wins() {
        let list = SourceList::new(vec![
            candidate("https://a.example/1.mp4", Some("1080p")),
            candidate("https://b.example/2.mp4", Some("720P")),
            candidate("https://c.example/3.mp4", Some("720p")),
        ]);

        assert_eq!(list.position_of_quality("720p"), Some(1));
        assert_eq!(list.position_of_quality("480p"), None);
        assert_eq!(list.qualities(), vec!["1080p", "720P", "720p"]);
    }

    #[test]
    fn label_falls_back_to_host() {
        let c = candidate("https://cdn.example/ep.m3u8", None);
        assert_eq!(c.label(), "cdn.example");
        assert!(c.is_hls());
    }

    #[test]
    fn rejects_relative_urls() {
        let err = SourceCandidate::parse("/relative/ep.mp4", None, "mp4")
            .expect_err("relative url should fail");
        assert!(err.to_string().contains("/relative/ep.mp4"));
    }
}
