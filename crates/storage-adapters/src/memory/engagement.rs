use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use domains::{
    Comment, CommentRepo, DomainError, HistoryEntry, HistoryRepo, MediaRef, PageRequest, Paged,
    Rating, RatingRepo, RatingSummary, Result, Shelf, ShelfEntry, ShelfRepo,
};
use uuid::Uuid;

use super::{page_of, purge, MemoryStore};

#[async_trait]
impl CommentRepo for MemoryStore {
    async fn insert(&self, comment: Comment) -> Result<Comment> {
        self.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Comment>> {
        Ok(self.comments.get(&id).map(|c| c.value().clone()))
    }

    async fn update(&self, comment: Comment) -> Result<Comment> {
        match self.comments.get_mut(&comment.id) {
            Some(mut slot) => {
                *slot = comment.clone();
                Ok(comment)
            }
            None => Err(DomainError::not_found("comment", comment.id)),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.comments.remove(&id).is_some())
    }

    async fn list_for(&self, target: MediaRef, page: PageRequest) -> Result<Paged<Comment>> {
        Ok(page_of(&self.comments, page, |c| c.target == target, |a, b| {
            b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id))
        }))
    }

    async fn purge_target(&self, target: MediaRef) -> Result<u64> {
        Ok(purge(&self.comments, |c| c.target == target))
    }
}

#[async_trait]
impl RatingRepo for MemoryStore {
    async fn insert(&self, rating: Rating) -> Result<Rating> {
        match self.ratings.entry((rating.user_id, rating.target)) {
            Entry::Occupied(_) => Err(DomainError::conflict("you have already rated this")),
            Entry::Vacant(slot) => {
                slot.insert(rating.clone());
                Ok(rating)
            }
        }
    }

    async fn update(&self, rating: Rating) -> Result<Rating> {
        match self.ratings.get_mut(&(rating.user_id, rating.target)) {
            Some(mut slot) => {
                *slot = rating.clone();
                Ok(rating)
            }
            None => Err(DomainError::not_found("rating", rating.target)),
        }
    }

    async fn find(&self, user_id: Uuid, target: MediaRef) -> Result<Option<Rating>> {
        Ok(self.ratings.get(&(user_id, target)).map(|r| r.value().clone()))
    }

    async fn summary(&self, target: MediaRef) -> Result<RatingSummary> {
        let scores: Vec<i16> = self
            .ratings
            .iter()
            .filter(|r| r.target == target)
            .map(|r| r.score)
            .collect();
        Ok(RatingSummary::from_scores(&scores))
    }

    async fn purge_target(&self, target: MediaRef) -> Result<u64> {
        Ok(purge(&self.ratings, |r| r.target == target))
    }
}

#[async_trait]
impl ShelfRepo for MemoryStore {
    async fn add(&self, entry: ShelfEntry) -> Result<ShelfEntry> {
        match self.shelves.entry((entry.user_id, entry.shelf, entry.target)) {
            Entry::Occupied(_) => Err(DomainError::conflict(format!(
                "already in your {}",
                entry.shelf.as_str()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(entry.clone());
                Ok(entry)
            }
        }
    }

    async fn remove(&self, user_id: Uuid, shelf: Shelf, target: MediaRef) -> Result<bool> {
        Ok(self.shelves.remove(&(user_id, shelf, target)).is_some())
    }

    async fn list(&self, user_id: Uuid, shelf: Shelf, page: PageRequest) -> Result<Paged<ShelfEntry>> {
        Ok(page_of(
            &self.shelves,
            page,
            |e| e.user_id == user_id && e.shelf == shelf,
            |a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)),
        ))
    }

    async fn targets(&self, user_id: Uuid, shelf: Shelf) -> Result<Vec<MediaRef>> {
        Ok(self
            .shelves
            .iter()
            .filter(|e| e.user_id == user_id && e.shelf == shelf)
            .map(|e| e.target)
            .collect())
    }

    async fn purge_target(&self, target: MediaRef) -> Result<u64> {
        Ok(purge(&self.shelves, |e| e.target == target))
    }
}

#[async_trait]
impl HistoryRepo for MemoryStore {
    async fn upsert(&self, entry: HistoryEntry) -> Result<HistoryEntry> {
        match self.history.entry((entry.user_id, entry.target)) {
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                existing.progress_seconds = entry.progress_seconds;
                existing.completed = entry.completed;
                existing.watched_at = entry.watched_at;
                Ok(existing.clone())
            }
            Entry::Vacant(slot) => {
                slot.insert(entry.clone());
                Ok(entry)
            }
        }
    }

    async fn list(&self, user_id: Uuid, page: PageRequest) -> Result<Paged<HistoryEntry>> {
        Ok(page_of(&self.history, page, |e| e.user_id == user_id, |a, b| {
            b.watched_at.cmp(&a.watched_at).then_with(|| a.id.cmp(&b.id))
        }))
    }

    async fn targets(&self, user_id: Uuid) -> Result<Vec<MediaRef>> {
        Ok(self
            .history
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.target)
            .collect())
    }

    async fn clear(&self, user_id: Uuid) -> Result<u64> {
        Ok(purge(&self.history, |e| e.user_id == user_id))
    }

    async fn purge_target(&self, target: MediaRef) -> Result<u64> {
        Ok(purge(&self.history, |e| e.target == target))
    }
}
