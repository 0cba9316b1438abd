//! Use-cases for MovieSpace.
//!
//! Each service owns the ports it needs. [`AppServices::new`] wires them
//! all from one [`Repositories`] bundle plus the auth ports.

use std::sync::Arc;

use domains::{
    CommentRepo, FollowRepo, HistoryRepo, ListRepo, MovieRepo, MovieRequestRepo, MusicRepo,
    NotificationRepo, PasswordHasher, RatingRepo, ShelfRepo, ShortRepo, TokenService, UserRepo,
};

pub mod accounts;
pub mod admin;
pub mod catalog;
pub mod engagement;
pub mod media;
pub mod notifications;
pub mod social;
pub mod validate;

pub use accounts::{AccountService, AuthSession, Registration};
pub use admin::AdminService;
pub use catalog::CatalogService;
pub use engagement::EngagementService;
pub use media::{MediaCascade, MediaDirectory};
pub use notifications::NotificationService;
pub use social::SocialService;

/// Every storage port the services depend on.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepo>,
    pub movies: Arc<dyn MovieRepo>,
    pub music: Arc<dyn MusicRepo>,
    pub shorts: Arc<dyn ShortRepo>,
    pub comments: Arc<dyn CommentRepo>,
    pub ratings: Arc<dyn RatingRepo>,
    pub shelves: Arc<dyn ShelfRepo>,
    pub history: Arc<dyn HistoryRepo>,
    pub follows: Arc<dyn FollowRepo>,
    pub lists: Arc<dyn ListRepo>,
    pub notifications: Arc<dyn NotificationRepo>,
    pub requests: Arc<dyn MovieRequestRepo>,
}

impl Repositories {
    /// Wires every port to one backend that implements all of them.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepo
            + MovieRepo
            + MusicRepo
            + ShortRepo
            + CommentRepo
            + RatingRepo
            + ShelfRepo
            + HistoryRepo
            + FollowRepo
            + ListRepo
            + NotificationRepo
            + MovieRequestRepo
            + 'static,
    {
        Self {
            users: store.clone(),
            movies: store.clone(),
            music: store.clone(),
            shorts: store.clone(),
            comments: store.clone(),
            ratings: store.clone(),
            shelves: store.clone(),
            history: store.clone(),
            follows: store.clone(),
            lists: store.clone(),
            notifications: store.clone(),
            requests: store,
        }
    }

    pub fn directory(&self) -> MediaDirectory {
        MediaDirectory::new(self.movies.clone(), self.music.clone(), self.shorts.clone())
    }

    pub fn cascade(&self) -> MediaCascade {
        MediaCascade {
            comments: self.comments.clone(),
            ratings: self.ratings.clone(),
            shelves: self.shelves.clone(),
            history: self.history.clone(),
            lists: self.lists.clone(),
        }
    }
}

/// The full set of use-cases handed to the API layer.
#[derive(Clone)]
pub struct AppServices {
    pub accounts: Arc<AccountService>,
    pub catalog: Arc<CatalogService>,
    pub engagement: Arc<EngagementService>,
    pub social: Arc<SocialService>,
    pub notifications: Arc<NotificationService>,
    pub admin: Arc<AdminService>,
}

impl AppServices {
    pub fn new(
        repos: Repositories,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        let notifications = NotificationService::new(repos.notifications.clone());
        Self {
            accounts: Arc::new(AccountService::new(
                repos.users.clone(),
                repos.follows.clone(),
                hasher,
                tokens,
            )),
            catalog: Arc::new(CatalogService::new(&repos)),
            engagement: Arc::new(EngagementService::new(&repos, notifications.clone())),
            social: Arc::new(SocialService::new(&repos, notifications.clone())),
            admin: Arc::new(AdminService::new(&repos, notifications.clone())),
            notifications: Arc::new(notifications),
        }
    }
}
