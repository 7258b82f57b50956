//! Episode/server/category selection and its asynchronous resolution.
//!
//! Selecting is split in three steps so the host can drive the catalog
//! round-trip on its own runtime: [`PlaybackSession::begin_selection`]
//! hands out a [`SelectionTicket`], [`SelectionResolver::resolve`] performs
//! the lookups, and [`PlaybackSession::complete_selection`] applies the
//! result unless a newer selection was started in the meantime.
//!
//! [`PlaybackSession::begin_selection`]: super::PlaybackSession::begin_selection
//! [`PlaybackSession::complete_selection`]: super::PlaybackSession::complete_selection

use std::sync::Arc;

use reelsync_model::{Category, EpisodeId, EpisodeStreams, OverlayTracks, ServerId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CatalogError;
use crate::player::ResumePoint;
use crate::services::{OverlayService, StreamCatalog};

/// What the viewer asked to watch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub episode: EpisodeId,
    pub server: ServerId,
    pub category: Category,
    /// Overlay language (dub audio / external subtitles), if any
    #[serde(default)]
    pub language: Option<String>,
}

impl Selection {
    pub fn new(
        episode: impl Into<EpisodeId>,
        server: impl Into<ServerId>,
        category: Category,
    ) -> Self {
        Self {
            episode: episode.into(),
            server: server.into(),
            category,
            language: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Whether a rebuilt session starts from the beginning or keeps the
/// previous timeline position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionCarry {
    #[default]
    Reset,
    Keep,
}

/// A started selection. Only the ticket of the latest generation is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionTicket {
    pub(crate) generation: u64,
    pub(crate) selection: Selection,
    pub(crate) resume: Option<ResumePoint>,
}

impl SelectionTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn resume(&self) -> Option<ResumePoint> {
        self.resume
    }
}

/// Streams and overlays for a selection
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStreams {
    pub streams: EpisodeStreams,
    pub overlays: OverlayTracks,
}

/// Outcome of resolving one ticket
#[derive(Debug, Clone)]
pub struct ResolvedSelection {
    pub(crate) ticket: SelectionTicket,
    pub(crate) outcome: Result<ResolvedStreams, CatalogError>,
}

impl ResolvedSelection {
    pub fn ticket(&self) -> &SelectionTicket {
        &self.ticket
    }

    pub fn outcome(&self) -> &Result<ResolvedStreams, CatalogError> {
        &self.outcome
    }
}

/// Performs the catalog and overlay lookups for a ticket. Cheap to clone;
/// holds only the shared collaborators.
#[derive(Debug, Clone)]
pub struct SelectionResolver {
    catalog: Arc<dyn StreamCatalog>,
    overlays: Arc<dyn OverlayService>,
}

impl SelectionResolver {
    pub fn new(catalog: Arc<dyn StreamCatalog>, overlays: Arc<dyn OverlayService>) -> Self {
        Self { catalog, overlays }
    }

    pub async fn resolve(&self, ticket: SelectionTicket) -> ResolvedSelection {
        let selection = &ticket.selection;
        debug!(
            generation = ticket.generation,
            episode = %selection.episode,
            server = %selection.server,
            category = %selection.category,
            "resolving selection"
        );

        // Independent lookups
        let (streams, overlays) = futures::join!(
            self.catalog
                .episode_streams(&selection.episode, &selection.server, selection.category),
            self.overlays_for(selection),
        );

        let outcome = match streams {
            Ok(streams) => Ok(ResolvedStreams { streams, overlays }),
            Err(err) => {
                warn!(error = %err, generation = ticket.generation, "catalog lookup failed");
                Err(err)
            }
        };

        ResolvedSelection { ticket, outcome }
    }

    async fn overlays_for(&self, selection: &Selection) -> OverlayTracks {
        let Some(language) = selection.language.as_deref() else {
            return OverlayTracks::default();
        };

        match self.overlays.overlay_tracks(&selection.episode, language).await {
            Ok(tracks) => tracks,
            Err(err) => {
                warn!(error = %err, %language, "overlay service failed; continuing without overlays");
                OverlayTracks::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{MockOverlayService, MockStreamCatalog};

    fn ticket(selection: Selection) -> SelectionTicket {
        SelectionTicket {
            generation: 1,
            selection,
            resume: None,
        }
    }

    #[tokio::test]
    async fn overlay_failure_is_treated_as_no_overlays() {
        let mut catalog = MockStreamCatalog::new();
        catalog
            .expect_episode_streams()
            .times(1)
            .returning(|_, _, _| Ok(EpisodeStreams::default()));
        let mut overlays = MockOverlayService::new();
        overlays
            .expect_overlay_tracks()
            .times(1)
            .returning(|_, _| Err(CatalogError::Unavailable("timeout".into())));

        let resolver = SelectionResolver::new(Arc::new(catalog), Arc::new(overlays));
        let resolved = resolver
            .resolve(ticket(Selection::new("ep-1", "hd-1", Category::Dub).with_language("en")))
            .await;

        let streams = resolved.outcome().as_ref().unwrap();
        assert!(streams.overlays.is_empty());
    }

    #[tokio::test]
    async fn overlays_are_not_queried_without_language() {
        let mut catalog = MockStreamCatalog::new();
        catalog
            .expect_episode_streams()
            .returning(|_, _, _| Ok(EpisodeStreams::default()));
        let mut overlays = MockOverlayService::new();
        overlays.expect_overlay_tracks().never();

        let resolver = SelectionResolver::new(Arc::new(catalog), Arc::new(overlays));
        let resolved = resolver
            .resolve(ticket(Selection::new("ep-1", "hd-1", Category::Sub)))
            .await;
        assert!(resolved.outcome().is_ok());
    }

    #[tokio::test]
    async fn catalog_error_is_reported() {
        let mut catalog = MockStreamCatalog::new();
        catalog
            .expect_episode_streams()
            .returning(|_, _, _| Err(CatalogError::Unavailable("502".into())));
        let overlays = MockOverlayService::new();

        let resolver = SelectionResolver::new(Arc::new(catalog), Arc::new(overlays));
        let resolved = resolver
            .resolve(ticket(Selection::new("ep-1", "hd-1", Category::Sub)))
            .await;
        assert_eq!(
            resolved.outcome().as_ref().err(),
            Some(&CatalogError::Unavailable("502".into()))
        );
    }
}
