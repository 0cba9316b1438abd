//! Follow graph and user-curated lists.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    Actor, DomainError, Follow, FollowRepo, ListItem, ListPatch, ListRepo, MediaRef,
    NotificationKind, PageRequest, Paged, Result, UserList, UserRepo,
};
use tracing::info;
use uuid::Uuid;

use crate::media::MediaDirectory;
use crate::notifications::NotificationService;
use crate::validate;
use crate::Repositories;

pub struct SocialService {
    users: Arc<dyn UserRepo>,
    follows: Arc<dyn FollowRepo>,
    lists: Arc<dyn ListRepo>,
    media: MediaDirectory,
    notifications: NotificationService,
}

impl SocialService {
    pub fn new(repos: &Repositories, notifications: NotificationService) -> Self {
        Self {
            users: repos.users.clone(),
            follows: repos.follows.clone(),
            lists: repos.lists.clone(),
            media: repos.directory(),
            notifications,
        }
    }

    // ── Follows ─────────────────────────────────────────────────────────────

    pub async fn follow(&self, actor: Actor, user_id: Uuid) -> Result<Follow> {
        if actor.id == user_id {
            return Err(DomainError::validation("you cannot follow yourself"));
        }
        self.ensure_user(user_id).await?;
        let follow = self
            .follows
            .insert(Follow {
                follower_id: actor.id,
                followee_id: user_id,
                created_at: Utc::now(),
            })
            .await?;

        let follower = self.users.find_by_id(actor.id).await?;
        let name = follower.map(|u| u.display_name).unwrap_or_else(|| "Someone".into());
        self.notifications
            .notify(
                user_id,
                NotificationKind::Follow,
                format!("{name} started following you"),
                Some(actor.id),
            )
            .await;
        info!(follower = %actor.id, followee = %user_id, "user followed");
        Ok(follow)
    }

    pub async fn unfollow(&self, actor: Actor, user_id: Uuid) -> Result<()> {
        if self.follows.delete(actor.id, user_id).await? {
            Ok(())
        } else {
            Err(DomainError::not_found("follow", user_id))
        }
    }

    pub async fn followers(&self, user_id: Uuid, page: PageRequest) -> Result<Paged<Follow>> {
        self.ensure_user(user_id).await?;
        self.follows.followers(user_id, page).await
    }

    pub async fn following(&self, user_id: Uuid, page: PageRequest) -> Result<Paged<Follow>> {
        self.ensure_user(user_id).await?;
        self.follows.following(user_id, page).await
    }

    async fn ensure_user(&self, user_id: Uuid) -> Result<()> {
        match self.users.find_by_id(user_id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::not_found("user", user_id)),
        }
    }

    // ── Lists ───────────────────────────────────────────────────────────────

    pub async fn create_list(
        &self,
        actor: Actor,
        name: &str,
        description: Option<String>,
        is_public: bool,
    ) -> Result<UserList> {
        let name = validate::required("name", name, 100)?;
        let description = validate::optional("description", description, 1000)?;
        self.lists
            .insert(UserList::new(actor.id, name, description, is_public))
            .await
    }

    /// Private lists are reported as missing to everyone but the owner and
    /// admins.
    pub async fn get_list(&self, viewer: Option<Actor>, id: Uuid) -> Result<UserList> {
        let list = self.find_list(id).await?;
        let visible = list.is_public || viewer.is_some_and(|v| v.can_manage(list.owner_id));
        if visible {
            Ok(list)
        } else {
            Err(DomainError::not_found("list", id))
        }
    }

    pub async fn update_list(&self, actor: Actor, id: Uuid, patch: ListPatch) -> Result<UserList> {
        let mut list = self.owned_list(actor, id).await?;
        if let Some(name) = patch.name {
            list.name = validate::required("name", &name, 100)?;
        }
        if let Some(description) = patch.description {
            list.description = validate::optional("description", Some(description), 1000)?;
        }
        if let Some(is_public) = patch.is_public {
            list.is_public = is_public;
        }
        list.updated_at = Utc::now();
        self.lists.update(list).await
    }

    pub async fn delete_list(&self, actor: Actor, id: Uuid) -> Result<()> {
        self.owned_list(actor, id).await?;
        self.lists.delete(id).await?;
        Ok(())
    }

    pub async fn add_to_list(&self, actor: Actor, id: Uuid, target: MediaRef) -> Result<UserList> {
        let list = self.owned_list(actor, id).await?;
        if list.contains(&target) {
            return Err(DomainError::conflict(format!("{target} is already in this list")));
        }
        self.media.owner_of(target).await?;
        self.lists
            .add_item(
                id,
                ListItem {
                    target,
                    added_at: Utc::now(),
                },
            )
            .await?;
        self.find_list(id).await
    }

    pub async fn remove_from_list(&self, actor: Actor, id: Uuid, target: MediaRef) -> Result<UserList> {
        self.owned_list(actor, id).await?;
        if !self.lists.remove_item(id, target).await? {
            return Err(DomainError::not_found("list item", target));
        }
        self.find_list(id).await
    }

    pub async fn my_lists(&self, actor: Actor, page: PageRequest) -> Result<Paged<UserList>> {
        self.lists.by_owner(actor.id, page).await
    }

    pub async fn public_lists(&self, page: PageRequest) -> Result<Paged<UserList>> {
        self.lists.public(page).await
    }

    async fn find_list(&self, id: Uuid) -> Result<UserList> {
        self.lists
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("list", id))
    }

    async fn owned_list(&self, actor: Actor, id: Uuid) -> Result<UserList> {
        let list = self.get_list(Some(actor), id).await?;
        if !actor.can_manage(list.owner_id) {
            return Err(DomainError::forbidden("only the owner may change this list"));
        }
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{
        MockCommentRepo, MockFollowRepo, MockHistoryRepo, MockListRepo, MockMovieRepo,
        MockMovieRequestRepo, MockMusicRepo, MockNotificationRepo, MockRatingRepo, MockShelfRepo,
        MockShortRepo, MockUserRepo, Role, User,
    };

    #[derive(Default)]
    struct Mocks {
        users: MockUserRepo,
        follows: MockFollowRepo,
        lists: MockListRepo,
        notifications: MockNotificationRepo,
    }

    impl Mocks {
        fn build(self) -> SocialService {
            let notifications: Arc<MockNotificationRepo> = Arc::new(self.notifications);
            SocialService::new(
                &Repositories {
                    users: Arc::new(self.users),
                    movies: Arc::new(MockMovieRepo::new()),
                    music: Arc::new(MockMusicRepo::new()),
                    shorts: Arc::new(MockShortRepo::new()),
                    comments: Arc::new(MockCommentRepo::new()),
                    ratings: Arc::new(MockRatingRepo::new()),
                    shelves: Arc::new(MockShelfRepo::new()),
                    history: Arc::new(MockHistoryRepo::new()),
                    follows: Arc::new(self.follows),
                    lists: Arc::new(self.lists),
                    notifications: notifications.clone(),
                    requests: Arc::new(MockMovieRequestRepo::new()),
                },
                NotificationService::new(notifications),
            )
        }
    }

    fn user() -> User {
        User::new("bo".into(), "bo@example.com".into(), "h".into(), "Bo".into())
    }

    #[tokio::test]
    async fn self_follow_is_a_validation_error() {
        let actor = Actor::new(Uuid::new_v4(), Role::User);
        let err = Mocks::default().build().follow(actor, actor.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn following_notifies_the_followee() {
        let mut mocks = Mocks::default();
        mocks.users.expect_find_by_id().returning(|_| Ok(Some(user())));
        mocks.follows.expect_insert().returning(|f| Ok(f));
        mocks
            .notifications
            .expect_insert()
            .withf(|n| n.kind == NotificationKind::Follow && n.message == "Bo started following you")
            .times(1)
            .returning(|n| Ok(n));

        let actor = Actor::new(Uuid::new_v4(), Role::User);
        let target = Uuid::new_v4();
        let follow = mocks.build().follow(actor, target).await.unwrap();
        assert_eq!(follow.followee_id, target);
    }

    #[tokio::test]
    async fn following_a_missing_user_is_not_found() {
        let mut mocks = Mocks::default();
        mocks.users.expect_find_by_id().returning(|_| Ok(None));

        let actor = Actor::new(Uuid::new_v4(), Role::User);
        let err = mocks.build().follow(actor, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn private_lists_are_hidden_from_strangers() {
        let owner = Uuid::new_v4();
        let list = UserList::new(owner, "Noir".into(), None, false);
        let id = list.id;
        let mut mocks = Mocks::default();
        mocks.lists.expect_get().returning(move |_| Ok(Some(list.clone())));
        let svc = mocks.build();

        let stranger = Actor::new(Uuid::new_v4(), Role::User);
        assert!(matches!(
            svc.get_list(Some(stranger), id).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(svc.get_list(None, id).await.is_err());
        assert!(svc.get_list(Some(Actor::new(owner, Role::User)), id).await.is_ok());
        assert!(svc
            .get_list(Some(Actor::new(Uuid::new_v4(), Role::Admin)), id)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn adding_a_duplicate_list_item_conflicts() {
        let owner = Uuid::new_v4();
        let target = MediaRef::movie(Uuid::new_v4());
        let mut list = UserList::new(owner, "Noir".into(), None, true);
        list.items.push(ListItem {
            target,
            added_at: Utc::now(),
        });
        let id = list.id;
        let mut mocks = Mocks::default();
        mocks.lists.expect_get().returning(move |_| Ok(Some(list.clone())));

        let err = mocks
            .build()
            .add_to_list(Actor::new(owner, Role::User), id, target)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }
}
