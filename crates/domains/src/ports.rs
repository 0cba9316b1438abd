//! # Ports
//!
//! Every storage and auth adapter implements these traits. Services only
//! ever see `Arc<dyn Port>`.
//!
//! Uniqueness violations surface as [`DomainError::Conflict`]; all other
//! adapter failures as [`DomainError::Internal`].
//!
//! [`DomainError::Conflict`]: crate::errors::DomainError::Conflict
//! [`DomainError::Internal`]: crate::errors::DomainError::Internal

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{
    Actor, Comment, FacetCount, Follow, HistoryEntry, ListItem, MediaRef, Movie, MovieRequest,
    Music, Notification, Rating, RatingSummary, RequestStatus, Shelf, ShelfEntry, Short, User,
    UserList,
};
use crate::pagination::{PageRequest, Paged};
use crate::search::{MusicPlan, SearchPlan, TrendingWindow};

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with `Conflict` when the username or email is taken.
    async fn insert(&self, user: User) -> Result<User>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    /// Looks up by username or email, case-insensitively.
    async fn find_by_login(&self, identifier: &str) -> Result<Option<User>>;
    async fn update(&self, user: User) -> Result<User>;
    async fn list(&self, page: PageRequest) -> Result<Paged<User>>;
    async fn count(&self) -> Result<u64>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MovieRepo: Send + Sync {
    async fn insert(&self, movie: Movie) -> Result<Movie>;
    async fn get(&self, id: Uuid) -> Result<Option<Movie>>;
    async fn update(&self, movie: Movie) -> Result<Movie>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn search(&self, plan: &SearchPlan) -> Result<Paged<Movie>>;
    /// Genre counts over every movie the plan's predicates match.
    async fn genre_facets(&self, plan: &SearchPlan) -> Result<Vec<FacetCount>>;
    async fn trending(&self, window: TrendingWindow) -> Result<Vec<Movie>>;
    /// Published movies sharing any of `genres`, excluding `exclude`,
    /// best rated first.
    async fn in_genres(&self, genres: Vec<String>, exclude: Vec<Uuid>, limit: u32) -> Result<Vec<Movie>>;
    async fn increment_views(&self, id: Uuid) -> Result<()>;
    async fn set_rating_summary(&self, id: Uuid, summary: RatingSummary) -> Result<()>;
    async fn count(&self) -> Result<u64>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MusicRepo: Send + Sync {
    async fn insert(&self, music: Music) -> Result<Music>;
    async fn get(&self, id: Uuid) -> Result<Option<Music>>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn search(&self, plan: &MusicPlan) -> Result<Paged<Music>>;
    async fn increment_plays(&self, id: Uuid) -> Result<()>;
    async fn count(&self) -> Result<u64>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ShortRepo: Send + Sync {
    async fn insert(&self, short: Short) -> Result<Short>;
    async fn get(&self, id: Uuid) -> Result<Option<Short>>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    /// Newest first.
    async fn feed(&self, page: PageRequest) -> Result<Paged<Short>>;
    async fn increment_views(&self, id: Uuid) -> Result<()>;
    async fn count(&self) -> Result<u64>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepo: Send + Sync {
    async fn insert(&self, comment: Comment) -> Result<Comment>;
    async fn get(&self, id: Uuid) -> Result<Option<Comment>>;
    async fn update(&self, comment: Comment) -> Result<Comment>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    /// Newest first.
    async fn list_for(&self, target: MediaRef, page: PageRequest) -> Result<Paged<Comment>>;
    async fn purge_target(&self, target: MediaRef) -> Result<u64>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RatingRepo: Send + Sync {
    /// Fails with `Conflict` when the user already rated the target.
    async fn insert(&self, rating: Rating) -> Result<Rating>;
    async fn update(&self, rating: Rating) -> Result<Rating>;
    async fn find(&self, user_id: Uuid, target: MediaRef) -> Result<Option<Rating>>;
    async fn summary(&self, target: MediaRef) -> Result<RatingSummary>;
    async fn purge_target(&self, target: MediaRef) -> Result<u64>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ShelfRepo: Send + Sync {
    /// Fails with `Conflict` when the target is already on the shelf.
    async fn add(&self, entry: ShelfEntry) -> Result<ShelfEntry>;
    async fn remove(&self, user_id: Uuid, shelf: Shelf, target: MediaRef) -> Result<bool>;
    /// Newest first.
    async fn list(&self, user_id: Uuid, shelf: Shelf, page: PageRequest) -> Result<Paged<ShelfEntry>>;
    async fn targets(&self, user_id: Uuid, shelf: Shelf) -> Result<Vec<MediaRef>>;
    async fn purge_target(&self, target: MediaRef) -> Result<u64>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait HistoryRepo: Send + Sync {
    /// Inserts, or refreshes progress and `watched_at` of the existing
    /// entry for the same (user, target).
    async fn upsert(&self, entry: HistoryEntry) -> Result<HistoryEntry>;
    /// Most recently watched first.
    async fn list(&self, user_id: Uuid, page: PageRequest) -> Result<Paged<HistoryEntry>>;
    async fn targets(&self, user_id: Uuid) -> Result<Vec<MediaRef>>;
    async fn clear(&self, user_id: Uuid) -> Result<u64>;
    async fn purge_target(&self, target: MediaRef) -> Result<u64>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait FollowRepo: Send + Sync {
    /// Fails with `Conflict` on a duplicate pair.
    async fn insert(&self, follow: Follow) -> Result<Follow>;
    async fn delete(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool>;
    async fn followers(&self, user_id: Uuid, page: PageRequest) -> Result<Paged<Follow>>;
    async fn following(&self, user_id: Uuid, page: PageRequest) -> Result<Paged<Follow>>;
    /// `(followers, following)`
    async fn counts(&self, user_id: Uuid) -> Result<(u64, u64)>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ListRepo: Send + Sync {
    async fn insert(&self, list: UserList) -> Result<UserList>;
    async fn get(&self, id: Uuid) -> Result<Option<UserList>>;
    /// Updates name, description and visibility. Items are untouched.
    async fn update(&self, list: UserList) -> Result<UserList>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    /// Fails with `Conflict` when the target is already in the list.
    async fn add_item(&self, list_id: Uuid, item: ListItem) -> Result<()>;
    async fn remove_item(&self, list_id: Uuid, target: MediaRef) -> Result<bool>;
    async fn by_owner(&self, owner_id: Uuid, page: PageRequest) -> Result<Paged<UserList>>;
    async fn public(&self, page: PageRequest) -> Result<Paged<UserList>>;
    async fn purge_target(&self, target: MediaRef) -> Result<u64>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait NotificationRepo: Send + Sync {
    async fn insert(&self, notification: Notification) -> Result<Notification>;
    /// Newest first.
    async fn list(&self, user_id: Uuid, unread_only: bool, page: PageRequest) -> Result<Paged<Notification>>;
    /// False when the notification does not exist or belongs to someone else.
    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<bool>;
    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64>;
    async fn unread_count(&self, user_id: Uuid) -> Result<u64>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MovieRequestRepo: Send + Sync {
    async fn insert(&self, request: MovieRequest) -> Result<MovieRequest>;
    async fn get(&self, id: Uuid) -> Result<Option<MovieRequest>>;
    async fn update(&self, request: MovieRequest) -> Result<MovieRequest>;
    /// Newest first, optionally filtered by status and requester.
    async fn list(
        &self,
        status: Option<RequestStatus>,
        user_id: Option<Uuid>,
        page: PageRequest,
    ) -> Result<Paged<MovieRequest>>;
    async fn count(&self, status: Option<RequestStatus>) -> Result<u64>;
}

/// One-way password hashing.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String>;
    /// `Ok(false)` on mismatch; `Err` only when `hash` is malformed.
    fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Bearer token issuing and verification.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenService: Send + Sync {
    fn issue(&self, user: &User) -> Result<IssuedToken>;
    /// Fails with `Unauthorized` for malformed, forged or expired tokens.
    fn verify(&self, token: &str) -> Result<Actor>;
}
