use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use domains::{
    DomainError, Follow, FollowRepo, ListItem, ListRepo, MediaRef, MovieRequest, MovieRequestRepo,
    Notification, NotificationRepo, PageRequest, Paged, RequestStatus, Result, UserList,
};
use uuid::Uuid;

use super::{page_of, MemoryStore};

#[async_trait]
impl FollowRepo for MemoryStore {
    async fn insert(&self, follow: Follow) -> Result<Follow> {
        match self.follows.entry((follow.follower_id, follow.followee_id)) {
            Entry::Occupied(_) => Err(DomainError::conflict("already following this user")),
            Entry::Vacant(slot) => {
                slot.insert(follow.clone());
                Ok(follow)
            }
        }
    }

    async fn delete(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        Ok(self.follows.remove(&(follower_id, followee_id)).is_some())
    }

    async fn followers(&self, user_id: Uuid, page: PageRequest) -> Result<Paged<Follow>> {
        Ok(page_of(&self.follows, page, |f| f.followee_id == user_id, |a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.follower_id.cmp(&b.follower_id))
        }))
    }

    async fn following(&self, user_id: Uuid, page: PageRequest) -> Result<Paged<Follow>> {
        Ok(page_of(&self.follows, page, |f| f.follower_id == user_id, |a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.followee_id.cmp(&b.followee_id))
        }))
    }

    async fn counts(&self, user_id: Uuid) -> Result<(u64, u64)> {
        let (mut followers, mut following) = (0, 0);
        for f in self.follows.iter() {
            if f.followee_id == user_id {
                followers += 1;
            }
            if f.follower_id == user_id {
                following += 1;
            }
        }
        Ok((followers, following))
    }
}

#[async_trait]
impl ListRepo for MemoryStore {
    async fn insert(&self, list: UserList) -> Result<UserList> {
        self.lists.insert(list.id, list.clone());
        Ok(list)
    }

    async fn get(&self, id: Uuid) -> Result<Option<UserList>> {
        Ok(self.lists.get(&id).map(|l| l.value().clone()))
    }

    async fn update(&self, list: UserList) -> Result<UserList> {
        match self.lists.get_mut(&list.id) {
            Some(mut slot) => {
                slot.name = list.name;
                slot.description = list.description;
                slot.is_public = list.is_public;
                slot.updated_at = list.updated_at;
                Ok(slot.clone())
            }
            None => Err(DomainError::not_found("list", list.id)),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.lists.remove(&id).is_some())
    }

    async fn add_item(&self, list_id: Uuid, item: ListItem) -> Result<()> {
        let mut list = self
            .lists
            .get_mut(&list_id)
            .ok_or_else(|| DomainError::not_found("list", list_id))?;
        if list.contains(&item.target) {
            return Err(DomainError::conflict("already in this list"));
        }
        list.items.push(item);
        list.updated_at = Utc::now();
        Ok(())
    }

    async fn remove_item(&self, list_id: Uuid, target: MediaRef) -> Result<bool> {
        let mut list = self
            .lists
            .get_mut(&list_id)
            .ok_or_else(|| DomainError::not_found("list", list_id))?;
        let before = list.items.len();
        list.items.retain(|i| i.target != target);
        let removed = list.items.len() != before;
        if removed {
            list.updated_at = Utc::now();
        }
        Ok(removed)
    }

    async fn by_owner(&self, owner_id: Uuid, page: PageRequest) -> Result<Paged<UserList>> {
        Ok(page_of(&self.lists, page, |l| l.owner_id == owner_id, |a, b| {
            b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id))
        }))
    }

    async fn public(&self, page: PageRequest) -> Result<Paged<UserList>> {
        Ok(page_of(&self.lists, page, |l| l.is_public, |a, b| {
            b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id))
        }))
    }

    async fn purge_target(&self, target: MediaRef) -> Result<u64> {
        let mut removed = 0;
        for mut list in self.lists.iter_mut() {
            let before = list.items.len();
            list.items.retain(|i| i.target != target);
            removed += (before - list.items.len()) as u64;
        }
        Ok(removed)
    }
}

#[async_trait]
impl NotificationRepo for MemoryStore {
    async fn insert(&self, notification: Notification) -> Result<Notification> {
        self.notifications.insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn list(&self, user_id: Uuid, unread_only: bool, page: PageRequest) -> Result<Paged<Notification>> {
        Ok(page_of(
            &self.notifications,
            page,
            |n| n.user_id == user_id && (!unread_only || !n.is_read),
            |a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)),
        ))
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        match self.notifications.get_mut(&id) {
            Some(mut n) if n.user_id == user_id => {
                n.is_read = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let mut marked = 0;
        for mut n in self.notifications.iter_mut() {
            if n.user_id == user_id && !n.is_read {
                n.is_read = true;
                marked += 1;
            }
        }
        Ok(marked)
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<u64> {
        Ok(self
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as u64)
    }
}

#[async_trait]
impl MovieRequestRepo for MemoryStore {
    async fn insert(&self, request: MovieRequest) -> Result<MovieRequest> {
        self.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn get(&self, id: Uuid) -> Result<Option<MovieRequest>> {
        Ok(self.requests.get(&id).map(|r| r.value().clone()))
    }

    async fn update(&self, request: MovieRequest) -> Result<MovieRequest> {
        match self.requests.get_mut(&request.id) {
            Some(mut slot) => {
                *slot = request.clone();
                Ok(request)
            }
            None => Err(DomainError::not_found("movie request", request.id)),
        }
    }

    async fn list(
        &self,
        status: Option<RequestStatus>,
        user_id: Option<Uuid>,
        page: PageRequest,
    ) -> Result<Paged<MovieRequest>> {
        Ok(page_of(
            &self.requests,
            page,
            |r| status.is_none_or(|s| r.status == s) && user_id.is_none_or(|u| r.user_id == u),
            |a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)),
        ))
    }

    async fn count(&self, status: Option<RequestStatus>) -> Result<u64> {
        Ok(self
            .requests
            .iter()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::NotificationKind;

    fn follow(a: Uuid, b: Uuid) -> Follow {
        Follow {
            follower_id: a,
            followee_id: b,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn follows_are_unique_and_counted_both_ways() {
        let store = MemoryStore::new();
        let (ada, grace, alan) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        FollowRepo::insert(&store, follow(ada, grace)).await.unwrap();
        FollowRepo::insert(&store, follow(alan, grace)).await.unwrap();
        let dup = FollowRepo::insert(&store, follow(ada, grace)).await;
        assert!(matches!(dup, Err(DomainError::Conflict(_))));

        assert_eq!(store.counts(grace).await.unwrap(), (2, 0));
        assert_eq!(store.counts(ada).await.unwrap(), (0, 1));
        assert!(FollowRepo::delete(&store, ada, grace).await.unwrap());
        assert_eq!(store.followers(grace, PageRequest::default()).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn list_items_are_unique_and_purged_with_media() {
        let store = MemoryStore::new();
        let list = UserList::new(Uuid::new_v4(), "Sunday".into(), None, true);
        let id = list.id;
        ListRepo::insert(&store, list).await.unwrap();

        let target = MediaRef::movie(Uuid::new_v4());
        let item = || ListItem {
            target,
            added_at: Utc::now(),
        };
        store.add_item(id, item()).await.unwrap();
        let dup = store.add_item(id, item()).await;
        assert!(matches!(dup, Err(DomainError::Conflict(_))));

        assert_eq!(ListRepo::purge_target(&store, target).await.unwrap(), 1);
        let list = ListRepo::get(&store, id).await.unwrap().unwrap();
        assert!(list.items.is_empty());
    }

    #[tokio::test]
    async fn update_leaves_items_alone() {
        let store = MemoryStore::new();
        let mut list = UserList::new(Uuid::new_v4(), "Noir".into(), None, false);
        ListRepo::insert(&store, list.clone()).await.unwrap();
        store
            .add_item(
                list.id,
                ListItem {
                    target: MediaRef::movie(Uuid::new_v4()),
                    added_at: Utc::now(),
                },
            )
            .await
            .unwrap();

        list.name = "Neo-noir".into();
        list.is_public = true;
        let updated = ListRepo::update(&store, list).await.unwrap();
        assert_eq!(updated.name, "Neo-noir");
        assert_eq!(updated.items.len(), 1);
        assert_eq!(store.public(PageRequest::default()).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn notifications_are_scoped_to_their_owner() {
        let store = MemoryStore::new();
        let (ada, grace) = (Uuid::new_v4(), Uuid::new_v4());
        let n = Notification::new(ada, NotificationKind::System, "hi".into(), None);
        let id = n.id;
        NotificationRepo::insert(&store, n).await.unwrap();
        NotificationRepo::insert(&store, Notification::new(ada, NotificationKind::System, "again".into(), None))
            .await
            .unwrap();

        assert!(!store.mark_read(grace, id).await.unwrap());
        assert!(store.mark_read(ada, id).await.unwrap());
        assert_eq!(store.unread_count(ada).await.unwrap(), 1);
        assert_eq!(store.mark_all_read(ada).await.unwrap(), 1);
        let unread = NotificationRepo::list(&store, ada, true, PageRequest::default()).await.unwrap();
        assert_eq!(unread.total, 0);
    }

    #[tokio::test]
    async fn requests_filter_by_status_and_requester() {
        let store = MemoryStore::new();
        let ada = Uuid::new_v4();
        let mut approved = MovieRequest::new(ada, "Solaris".into(), None);
        approved.status = RequestStatus::Approved;
        MovieRequestRepo::insert(&store, approved).await.unwrap();
        MovieRequestRepo::insert(&store, MovieRequest::new(ada, "Stalker".into(), None)).await.unwrap();
        MovieRequestRepo::insert(&store, MovieRequest::new(Uuid::new_v4(), "Mirror".into(), None))
            .await
            .unwrap();

        assert_eq!(MovieRequestRepo::count(&store, Some(RequestStatus::Pending)).await.unwrap(), 2);
        let mine = MovieRequestRepo::list(&store, None, Some(ada), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(mine.total, 2);
        let pending_mine = MovieRequestRepo::list(&store, Some(RequestStatus::Pending), Some(ada), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(pending_mine.items[0].title, "Stalker");
    }
}
