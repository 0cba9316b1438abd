//! Cross-catalog lookups and cascades keyed by [`MediaRef`].

use std::sync::Arc;

use domains::{
    CommentRepo, DomainError, HistoryRepo, ListRepo, MediaKind, MediaRef, MovieRepo, MusicRepo,
    RatingRepo, Result, ShelfRepo, ShortRepo,
};
use tracing::debug;
use uuid::Uuid;

/// Resolves a [`MediaRef`] against the right catalog.
#[derive(Clone)]
pub struct MediaDirectory {
    pub(crate) movies: Arc<dyn MovieRepo>,
    pub(crate) music: Arc<dyn MusicRepo>,
    pub(crate) shorts: Arc<dyn ShortRepo>,
}

impl MediaDirectory {
    pub fn new(movies: Arc<dyn MovieRepo>, music: Arc<dyn MusicRepo>, shorts: Arc<dyn ShortRepo>) -> Self {
        Self { movies, music, shorts }
    }

    /// Returns the uploader of `target`, or `NotFound`.
    pub async fn owner_of(&self, target: MediaRef) -> Result<Uuid> {
        let owner = match target.kind {
            MediaKind::Movie => self.movies.get(target.id).await?.map(|m| m.uploader_id),
            MediaKind::Music => self.music.get(target.id).await?.map(|m| m.uploader_id),
            MediaKind::Short => self.shorts.get(target.id).await?.map(|s| s.uploader_id),
        };
        owner.ok_or_else(|| DomainError::not_found(target.kind.as_str(), target.id))
    }

    /// Deletes the media row itself. `false` when it did not exist.
    pub async fn delete(&self, target: MediaRef) -> Result<bool> {
        match target.kind {
            MediaKind::Movie => self.movies.delete(target.id).await,
            MediaKind::Music => self.music.delete(target.id).await,
            MediaKind::Short => self.shorts.delete(target.id).await,
        }
    }
}

/// Removes everything that points at a deleted piece of media.
#[derive(Clone)]
pub struct MediaCascade {
    pub(crate) comments: Arc<dyn CommentRepo>,
    pub(crate) ratings: Arc<dyn RatingRepo>,
    pub(crate) shelves: Arc<dyn ShelfRepo>,
    pub(crate) history: Arc<dyn HistoryRepo>,
    pub(crate) lists: Arc<dyn ListRepo>,
}

impl MediaCascade {
    pub async fn purge(&self, target: MediaRef) -> Result<()> {
        let comments = self.comments.purge_target(target).await?;
        let ratings = self.ratings.purge_target(target).await?;
        let shelved = self.shelves.purge_target(target).await?;
        let history = self.history.purge_target(target).await?;
        let listed = self.lists.purge_target(target).await?;
        debug!(%target, comments, ratings, shelved, history, listed, "purged media references");
        Ok(())
    }
}
