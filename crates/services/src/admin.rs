//! Admin moderation and the movie-request workflow.
//!
//! Every `admin` operation starts with [`require_admin`]. Request
//! submission and "my requests" are open to any signed-in user.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    Actor, CommentRepo, DomainError, MediaRef, MovieRepo, MovieRequest, MovieRequestRepo,
    MusicRepo, NotificationKind, PageRequest, Paged, PlatformStats, RequestStatus, Result,
    ReviewDecision, Role, ShortRepo, User, UserRepo,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::media::{MediaCascade, MediaDirectory};
use crate::notifications::NotificationService;
use crate::validate;
use crate::Repositories;

pub fn require_admin(actor: Actor) -> Result<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(DomainError::forbidden("admin role required"))
    }
}

pub struct AdminService {
    users: Arc<dyn UserRepo>,
    movies: Arc<dyn MovieRepo>,
    music: Arc<dyn MusicRepo>,
    shorts: Arc<dyn ShortRepo>,
    comments: Arc<dyn CommentRepo>,
    requests: Arc<dyn MovieRequestRepo>,
    media: MediaDirectory,
    cascade: MediaCascade,
    notifications: NotificationService,
}

impl AdminService {
    pub fn new(repos: &Repositories, notifications: NotificationService) -> Self {
        Self {
            users: repos.users.clone(),
            movies: repos.movies.clone(),
            music: repos.music.clone(),
            shorts: repos.shorts.clone(),
            comments: repos.comments.clone(),
            requests: repos.requests.clone(),
            media: repos.directory(),
            cascade: repos.cascade(),
            notifications,
        }
    }

    // ── Users ───────────────────────────────────────────────────────────────

    pub async fn list_users(&self, actor: Actor, page: PageRequest) -> Result<Paged<User>> {
        require_admin(actor)?;
        self.users.list(page).await
    }

    pub async fn set_banned(&self, actor: Actor, user_id: Uuid, banned: bool) -> Result<User> {
        require_admin(actor)?;
        if actor.id == user_id {
            return Err(DomainError::validation("admins cannot ban themselves"));
        }
        let mut user = self.find_user(user_id).await?;
        user.is_banned = banned;
        user.updated_at = Utc::now();
        let user = self.users.update(user).await?;
        warn!(admin = %actor.id, %user_id, banned, "user ban status changed");
        Ok(user)
    }

    pub async fn set_role(&self, actor: Actor, user_id: Uuid, role: Role) -> Result<User> {
        require_admin(actor)?;
        if actor.id == user_id && role != Role::Admin {
            return Err(DomainError::validation("admins cannot demote themselves"));
        }
        let mut user = self.find_user(user_id).await?;
        user.role = role;
        user.updated_at = Utc::now();
        let user = self.users.update(user).await?;
        info!(admin = %actor.id, %user_id, role = role.as_str(), "user role changed");
        Ok(user)
    }

    async fn find_user(&self, user_id: Uuid) -> Result<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", user_id))
    }

    // ── Content ─────────────────────────────────────────────────────────────

    pub async fn remove_media(&self, actor: Actor, target: MediaRef) -> Result<()> {
        require_admin(actor)?;
        if !self.media.delete(target).await? {
            return Err(DomainError::not_found(target.kind.as_str(), target.id));
        }
        self.cascade.purge(target).await?;
        warn!(admin = %actor.id, %target, "media removed by admin");
        Ok(())
    }

    pub async fn remove_comment(&self, actor: Actor, id: Uuid) -> Result<()> {
        require_admin(actor)?;
        if !self.comments.delete(id).await? {
            return Err(DomainError::not_found("comment", id));
        }
        warn!(admin = %actor.id, comment_id = %id, "comment removed by admin");
        Ok(())
    }

    pub async fn stats(&self, actor: Actor) -> Result<PlatformStats> {
        require_admin(actor)?;
        Ok(PlatformStats {
            users: self.users.count().await?,
            movies: self.movies.count().await?,
            music: self.music.count().await?,
            shorts: self.shorts.count().await?,
            pending_requests: self.requests.count(Some(RequestStatus::Pending)).await?,
        })
    }

    // ── Movie requests ──────────────────────────────────────────────────────

    pub async fn submit_request(&self, actor: Actor, title: &str, note: Option<String>) -> Result<MovieRequest> {
        let title = validate::required("title", title, 200)?;
        let note = validate::optional("note", note, 1000)?;
        self.requests
            .insert(MovieRequest::new(actor.id, title, note))
            .await
    }

    pub async fn my_requests(&self, actor: Actor, page: PageRequest) -> Result<Paged<MovieRequest>> {
        self.requests.list(None, Some(actor.id), page).await
    }

    pub async fn list_requests(
        &self,
        actor: Actor,
        status: Option<RequestStatus>,
        page: PageRequest,
    ) -> Result<Paged<MovieRequest>> {
        require_admin(actor)?;
        self.requests.list(status, None, page).await
    }

    /// Only pending requests can be reviewed; the requester is notified of
    /// the outcome.
    pub async fn review_request(
        &self,
        actor: Actor,
        id: Uuid,
        decision: ReviewDecision,
        admin_note: Option<String>,
    ) -> Result<MovieRequest> {
        require_admin(actor)?;
        let mut request = self
            .requests
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("movie request", id))?;
        if request.status != RequestStatus::Pending {
            return Err(DomainError::conflict(format!(
                "request was already {}",
                request.status.as_str()
            )));
        }

        request.status = decision.outcome();
        request.reviewed_by = Some(actor.id);
        request.admin_note = validate::optional("admin_note", admin_note, 1000)?;
        request.updated_at = Utc::now();
        let request = self.requests.update(request).await?;

        self.notifications
            .notify(
                request.user_id,
                NotificationKind::RequestReviewed,
                format!("Your request for \"{}\" was {}", request.title, request.status.as_str()),
                Some(actor.id),
            )
            .await;
        info!(admin = %actor.id, request_id = %id, status = request.status.as_str(), "movie request reviewed");
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{
        MockCommentRepo, MockFollowRepo, MockHistoryRepo, MockListRepo, MockMovieRepo,
        MockMovieRequestRepo, MockMusicRepo, MockNotificationRepo, MockRatingRepo, MockShelfRepo,
        MockShortRepo, MockUserRepo,
    };

    #[derive(Default)]
    struct Mocks {
        users: MockUserRepo,
        movies: MockMovieRepo,
        requests: MockMovieRequestRepo,
        notifications: MockNotificationRepo,
    }

    impl Mocks {
        fn build(self) -> AdminService {
            let notifications: Arc<MockNotificationRepo> = Arc::new(self.notifications);
            AdminService::new(
                &Repositories {
                    users: Arc::new(self.users),
                    movies: Arc::new(self.movies),
                    music: Arc::new(MockMusicRepo::new()),
                    shorts: Arc::new(MockShortRepo::new()),
                    comments: Arc::new(MockCommentRepo::new()),
                    ratings: Arc::new(MockRatingRepo::new()),
                    shelves: Arc::new(MockShelfRepo::new()),
                    history: Arc::new(MockHistoryRepo::new()),
                    follows: Arc::new(MockFollowRepo::new()),
                    lists: Arc::new(MockListRepo::new()),
                    notifications: notifications.clone(),
                    requests: Arc::new(self.requests),
                },
                NotificationService::new(notifications),
            )
        }
    }

    fn admin() -> Actor {
        Actor::new(Uuid::new_v4(), Role::Admin)
    }

    #[tokio::test]
    async fn non_admins_are_forbidden() {
        let svc = Mocks::default().build();
        let user = Actor::new(Uuid::new_v4(), Role::User);
        assert!(matches!(
            svc.list_users(user, PageRequest::default()).await,
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(svc.stats(user).await, Err(DomainError::Forbidden(_))));
    }

    #[tokio::test]
    async fn admins_cannot_ban_themselves() {
        let me = admin();
        let err = Mocks::default().build().set_banned(me, me.id, true).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn removing_missing_media_is_not_found() {
        let mut mocks = Mocks::default();
        mocks.movies.expect_delete().returning(|_| Ok(false));
        let err = mocks
            .build()
            .remove_media(admin(), MediaRef::movie(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn approving_a_pending_request_notifies_the_requester() {
        let requester = Uuid::new_v4();
        let request = MovieRequest::new(requester, "Stalker".into(), None);
        let id = request.id;
        let mut mocks = Mocks::default();
        mocks
            .requests
            .expect_get()
            .returning(move |_| Ok(Some(request.clone())));
        mocks.requests.expect_update().returning(|r| Ok(r));
        mocks
            .notifications
            .expect_insert()
            .withf(move |n| n.user_id == requester && n.kind == NotificationKind::RequestReviewed)
            .times(1)
            .returning(|n| Ok(n));

        let reviewed = mocks
            .build()
            .review_request(admin(), id, ReviewDecision::Approve, Some("added".into()))
            .await
            .unwrap();
        assert_eq!(reviewed.status, RequestStatus::Approved);
        assert_eq!(reviewed.admin_note.as_deref(), Some("added"));
    }

    #[tokio::test]
    async fn reviewed_requests_cannot_be_reviewed_again() {
        let mut request = MovieRequest::new(Uuid::new_v4(), "Stalker".into(), None);
        request.status = RequestStatus::Rejected;
        let id = request.id;
        let mut mocks = Mocks::default();
        mocks
            .requests
            .expect_get()
            .returning(move |_| Ok(Some(request.clone())));

        let err = mocks
            .build()
            .review_request(admin(), id, ReviewDecision::Approve, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }
}
