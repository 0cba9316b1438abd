use std::sync::Arc;

use domains::{
    Actor, DomainError, Notification, NotificationKind, NotificationRepo, PageRequest, Paged,
    Result,
};
use tracing::warn;
use uuid::Uuid;

#[derive(Clone)]
pub struct NotificationService {
    repo: Arc<dyn NotificationRepo>,
}

impl NotificationService {
    pub fn new(repo: Arc<dyn NotificationRepo>) -> Self {
        Self { repo }
    }

    pub async fn push(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        message: impl Into<String>,
        actor_id: Option<Uuid>,
    ) -> Result<Notification> {
        self.repo
            .insert(Notification::new(user_id, kind, message.into(), actor_id))
            .await
    }

    /// Fire-and-forget variant: a failed notification never fails the
    /// action that triggered it.
    pub(crate) async fn notify(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        message: String,
        actor_id: Option<Uuid>,
    ) {
        if let Err(e) = self.push(user_id, kind, message, actor_id).await {
            warn!(%user_id, kind = kind.as_str(), error = %e, "failed to deliver notification");
        }
    }

    pub async fn list(&self, actor: Actor, unread_only: bool, page: PageRequest) -> Result<Paged<Notification>> {
        self.repo.list(actor.id, unread_only, page).await
    }

    pub async fn mark_read(&self, actor: Actor, id: Uuid) -> Result<()> {
        if self.repo.mark_read(actor.id, id).await? {
            Ok(())
        } else {
            Err(DomainError::not_found("notification", id))
        }
    }

    pub async fn mark_all_read(&self, actor: Actor) -> Result<u64> {
        self.repo.mark_all_read(actor.id).await
    }

    pub async fn unread_count(&self, actor: Actor) -> Result<u64> {
        self.repo.unread_count(actor.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockNotificationRepo, Role};

    #[test]
    fn marking_a_foreign_notification_is_not_found() {
        let mut repo = MockNotificationRepo::new();
        repo.expect_mark_read().returning(|_, _| Ok(false));
        let svc = NotificationService::new(Arc::new(repo));

        let actor = Actor::new(Uuid::new_v4(), Role::User);
        let err = tokio_test::block_on(svc.mark_read(actor, Uuid::new_v4())).unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[test]
    fn notify_swallows_storage_errors() {
        let mut repo = MockNotificationRepo::new();
        repo.expect_insert()
            .times(1)
            .returning(|_| Err(DomainError::internal("db down")));
        let svc = NotificationService::new(Arc::new(repo));

        tokio_test::block_on(svc.notify(
            Uuid::new_v4(),
            NotificationKind::System,
            "hello".into(),
            None,
        ));
    }
}
