//! Comments, ratings, favorites/watchlist shelves and watch history.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    Actor, Comment, CommentRepo, DomainError, HistoryEntry, HistoryRepo, MediaKind, MediaRef,
    MovieRepo, NotificationKind, PageRequest, Paged, Rating, RatingRepo, RatingSummary, Result,
    Shelf, ShelfEntry, ShelfRepo, MAX_SCORE, MIN_SCORE,
};
use tracing::info;
use uuid::Uuid;

use crate::media::MediaDirectory;
use crate::notifications::NotificationService;
use crate::validate;
use crate::Repositories;

const MAX_COMMENT_LEN: usize = 2000;
const MAX_REVIEW_LEN: usize = 5000;

pub struct EngagementService {
    media: MediaDirectory,
    movies: Arc<dyn MovieRepo>,
    comments: Arc<dyn CommentRepo>,
    ratings: Arc<dyn RatingRepo>,
    shelves: Arc<dyn ShelfRepo>,
    history: Arc<dyn HistoryRepo>,
    notifications: NotificationService,
}

impl EngagementService {
    pub fn new(repos: &Repositories, notifications: NotificationService) -> Self {
        Self {
            media: repos.directory(),
            movies: repos.movies.clone(),
            comments: repos.comments.clone(),
            ratings: repos.ratings.clone(),
            shelves: repos.shelves.clone(),
            history: repos.history.clone(),
            notifications,
        }
    }

    // ── Comments ────────────────────────────────────────────────────────────

    pub async fn add_comment(&self, actor: Actor, target: MediaRef, body: &str) -> Result<Comment> {
        let body = validate::required("body", body, MAX_COMMENT_LEN)?;
        let owner = self.media.owner_of(target).await?;
        let comment = self.comments.insert(Comment::new(actor.id, target, body)).await?;

        if owner != actor.id {
            self.notifications
                .notify(
                    owner,
                    NotificationKind::Comment,
                    format!("New comment on your {}", target.kind),
                    Some(actor.id),
                )
                .await;
        }
        Ok(comment)
    }

    pub async fn list_comments(&self, target: MediaRef, page: PageRequest) -> Result<Paged<Comment>> {
        self.media.owner_of(target).await?;
        self.comments.list_for(target, page).await
    }

    pub async fn edit_comment(&self, actor: Actor, id: Uuid, body: &str) -> Result<Comment> {
        let mut comment = self.find_comment(id).await?;
        if comment.user_id != actor.id {
            return Err(DomainError::forbidden("only the author may edit this comment"));
        }
        comment.body = validate::required("body", body, MAX_COMMENT_LEN)?;
        comment.updated_at = Utc::now();
        self.comments.update(comment).await
    }

    pub async fn delete_comment(&self, actor: Actor, id: Uuid) -> Result<()> {
        let comment = self.find_comment(id).await?;
        if !actor.can_manage(comment.user_id) {
            return Err(DomainError::forbidden("only the author or an admin may delete this comment"));
        }
        self.comments.delete(id).await?;
        Ok(())
    }

    async fn find_comment(&self, id: Uuid) -> Result<Comment> {
        self.comments
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("comment", id))
    }

    // ── Ratings ─────────────────────────────────────────────────────────────

    pub async fn rate(&self, actor: Actor, target: MediaRef, score: i16, review: Option<String>) -> Result<Rating> {
        check_score(score)?;
        let review = validate::optional("review", review, MAX_REVIEW_LEN)?;
        self.media.owner_of(target).await?;
        let rating = self
            .ratings
            .insert(Rating::new(actor.id, target, score, review))
            .await?;
        self.refresh_summary(target).await?;
        info!(%target, user_id = %actor.id, score, "media rated");
        Ok(rating)
    }

    pub async fn update_rating(
        &self,
        actor: Actor,
        target: MediaRef,
        score: i16,
        review: Option<String>,
    ) -> Result<Rating> {
        check_score(score)?;
        let mut rating = self.my_rating(actor, target).await?;
        rating.score = score;
        rating.review = validate::optional("review", review, MAX_REVIEW_LEN)?;
        rating.updated_at = Utc::now();
        let rating = self.ratings.update(rating).await?;
        self.refresh_summary(target).await?;
        Ok(rating)
    }

    pub async fn my_rating(&self, actor: Actor, target: MediaRef) -> Result<Rating> {
        self.ratings
            .find(actor.id, target)
            .await?
            .ok_or_else(|| DomainError::not_found("rating", target))
    }

    pub async fn rating_summary(&self, target: MediaRef) -> Result<RatingSummary> {
        self.media.owner_of(target).await?;
        self.ratings.summary(target).await
    }

    /// Movies carry a denormalized average used by search and ranking.
    async fn refresh_summary(&self, target: MediaRef) -> Result<()> {
        if target.kind == MediaKind::Movie {
            let summary = self.ratings.summary(target).await?;
            self.movies.set_rating_summary(target.id, summary).await?;
        }
        Ok(())
    }

    // ── Shelves ─────────────────────────────────────────────────────────────

    pub async fn shelve(&self, actor: Actor, shelf: Shelf, target: MediaRef) -> Result<ShelfEntry> {
        self.media.owner_of(target).await?;
        self.shelves.add(ShelfEntry::new(actor.id, shelf, target)).await
    }

    pub async fn unshelve(&self, actor: Actor, shelf: Shelf, target: MediaRef) -> Result<()> {
        if self.shelves.remove(actor.id, shelf, target).await? {
            Ok(())
        } else {
            Err(DomainError::not_found(shelf.as_str(), target))
        }
    }

    pub async fn shelf(&self, actor: Actor, shelf: Shelf, page: PageRequest) -> Result<Paged<ShelfEntry>> {
        self.shelves.list(actor.id, shelf, page).await
    }

    // ── History ─────────────────────────────────────────────────────────────

    pub async fn record_history(
        &self,
        actor: Actor,
        target: MediaRef,
        progress_seconds: i32,
        completed: bool,
    ) -> Result<HistoryEntry> {
        if progress_seconds < 0 {
            return Err(DomainError::validation("progress_seconds must not be negative"));
        }
        self.media.owner_of(target).await?;
        self.history
            .upsert(HistoryEntry::new(actor.id, target, progress_seconds, completed))
            .await
    }

    pub async fn history(&self, actor: Actor, page: PageRequest) -> Result<Paged<HistoryEntry>> {
        self.history.list(actor.id, page).await
    }

    pub async fn clear_history(&self, actor: Actor) -> Result<u64> {
        self.history.clear(actor.id).await
    }
}

fn check_score(score: i16) -> Result<()> {
    if (MIN_SCORE..=MAX_SCORE).contains(&score) {
        Ok(())
    } else {
        Err(DomainError::validation(format!(
            "score must be between {MIN_SCORE} and {MAX_SCORE}"
        )))
    }
}
