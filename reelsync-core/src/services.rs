//! Collaborators the engine consumes but does not own: the stream catalog,
//! the overlay (dub/subtitle) service and the subscription store.

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;
use reelsync_model::{AccessPolicy, Category, EpisodeId, EpisodeStreams, OverlayTracks, ServerId};

use crate::error::CatalogError;

/// Resolves an (episode, server, category) selection to its streams.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StreamCatalog: Send + Sync + Debug {
    async fn episode_streams(
        &self,
        episode: &EpisodeId,
        server: &ServerId,
        category: Category,
    ) -> Result<EpisodeStreams, CatalogError>;
}

/// Independently hosted audio/subtitle overlays for an episode.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OverlayService: Send + Sync + Debug {
    async fn overlay_tracks(
        &self,
        episode: &EpisodeId,
        language: &str,
    ) -> Result<OverlayTracks, CatalogError>;
}

/// Subscription facts, read once per session.
#[cfg_attr(test, mockall::automock)]
pub trait AccessStore: Send + Sync + Debug {
    fn access_policy(&self) -> AccessPolicy;
}

type CatalogKey = (EpisodeId, ServerId, Category);

/// In-memory catalog
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    entries: HashMap<CatalogKey, EpisodeStreams>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_streams(
        mut self,
        episode: impl Into<EpisodeId>,
        server: impl Into<ServerId>,
        category: Category,
        streams: EpisodeStreams,
    ) -> Self {
        self.insert(episode, server, category, streams);
        self
    }

    pub fn insert(
        &mut self,
        episode: impl Into<EpisodeId>,
        server: impl Into<ServerId>,
        category: Category,
        streams: EpisodeStreams,
    ) {
        self.entries
            .insert((episode.into(), server.into(), category), streams);
    }
}

#[async_trait]
impl StreamCatalog for StaticCatalog {
    async fn episode_streams(
        &self,
        episode: &EpisodeId,
        server: &ServerId,
        category: Category,
    ) -> Result<EpisodeStreams, CatalogError> {
        self.entries
            .get(&(episode.clone(), server.clone(), category))
            .cloned()
            .ok_or_else(|| CatalogError::NotFound {
                episode: episode.clone(),
                server: server.clone(),
                category,
            })
    }
}

/// In-memory overlay service. Unknown (episode, language) pairs have no
/// overlays.
#[derive(Debug, Clone, Default)]
pub struct StaticOverlays {
    entries: HashMap<(EpisodeId, String), OverlayTracks>,
}

impl StaticOverlays {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tracks(
        mut self,
        episode: impl Into<EpisodeId>,
        language: impl Into<String>,
        tracks: OverlayTracks,
    ) -> Self {
        self.entries
            .insert((episode.into(), language.into()), tracks);
        self
    }
}

#[async_trait]
impl OverlayService for StaticOverlays {
    async fn overlay_tracks(
        &self,
        episode: &EpisodeId,
        language: &str,
    ) -> Result<OverlayTracks, CatalogError> {
        Ok(self
            .entries
            .get(&(episode.clone(), language.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

/// Access store returning a fixed policy
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedAccess(pub AccessPolicy);

impl AccessStore for FixedAccess {
    fn access_policy(&self) -> AccessPolicy {
        self.0
    }
}
