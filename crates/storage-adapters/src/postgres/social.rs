use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use domains::{
    DomainError, Follow, FollowRepo, ListItem, ListRepo, MediaRef, MovieRequest, MovieRequestRepo,
    Notification, NotificationKind, NotificationRepo, PageRequest, Paged, RequestStatus, Result,
    UserList,
};
use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};
use uuid::Uuid;

use super::{db_err, decode, media_ref, to_u64, window, PgStore};

type RowResult<T> = std::result::Result<T, sqlx::Error>;

fn collect<T>(rows: &[PgRow], map: fn(&PgRow) -> RowResult<T>) -> Result<Vec<T>> {
    rows.iter().map(map).collect::<RowResult<_>>().map_err(db_err)
}

fn follow_from_row(row: &PgRow) -> RowResult<Follow> {
    Ok(Follow {
        follower_id: row.try_get("follower_id")?,
        followee_id: row.try_get("followee_id")?,
        created_at: row.try_get("created_at")?,
    })
}

/// A list row without its items; [`PgStore::attach_items`] fills them in.
fn list_from_row(row: &PgRow) -> RowResult<UserList> {
    Ok(UserList {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        is_public: row.try_get("is_public")?,
        items: Vec::new(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn notification_from_row(row: &PgRow) -> RowResult<Notification> {
    Ok(Notification {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        kind: decode(row, "kind", NotificationKind::parse)?,
        message: row.try_get("message")?,
        actor_id: row.try_get("actor_id")?,
        is_read: row.try_get("is_read")?,
        created_at: row.try_get("created_at")?,
    })
}

fn request_from_row(row: &PgRow) -> RowResult<MovieRequest> {
    Ok(MovieRequest {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        note: row.try_get("note")?,
        status: decode(row, "status", RequestStatus::parse)?,
        reviewed_by: row.try_get("reviewed_by")?,
        admin_note: row.try_get("admin_note")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl FollowRepo for PgStore {
    async fn insert(&self, follow: Follow) -> Result<Follow> {
        sqlx::query("INSERT INTO follows (follower_id, followee_id, created_at) VALUES ($1, $2, $3)")
            .bind(follow.follower_id)
            .bind(follow.followee_id)
            .bind(follow.created_at)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(follow)
    }

    async fn delete(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
            .bind(follower_id)
            .bind(followee_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn followers(&self, user_id: Uuid, page: PageRequest) -> Result<Paged<Follow>> {
        self.follow_page("followee_id", "follower_id", user_id, page).await
    }

    async fn following(&self, user_id: Uuid, page: PageRequest) -> Result<Paged<Follow>> {
        self.follow_page("follower_id", "followee_id", user_id, page).await
    }

    async fn counts(&self, user_id: Uuid) -> Result<(u64, u64)> {
        let row = sqlx::query(
            "SELECT COUNT(*) FILTER (WHERE followee_id = $1) AS followers, \
                    COUNT(*) FILTER (WHERE follower_id = $1) AS following \
             FROM follows WHERE followee_id = $1 OR follower_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        let followers: i64 = row.try_get("followers").map_err(db_err)?;
        let following: i64 = row.try_get("following").map_err(db_err)?;
        Ok((to_u64(followers), to_u64(following)))
    }
}

impl PgStore {
    /// Follows where `key` equals `user_id`, newest first.
    async fn follow_page(
        &self,
        key: &'static str,
        other: &'static str,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Paged<Follow>> {
        let (limit, offset) = window(page);
        let rows = sqlx::query(&format!(
            "SELECT * FROM follows WHERE {key} = $1 ORDER BY created_at DESC, {other} ASC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM follows WHERE {key} = $1"))
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(Paged::new(collect(&rows, follow_from_row)?, to_u64(total), page))
    }

    /// Loads the items of every list in one query, oldest addition first.
    async fn attach_items(&self, lists: &mut [UserList]) -> Result<()> {
        if lists.is_empty() {
            return Ok(());
        }
        let ids: Vec<Uuid> = lists.iter().map(|l| l.id).collect();
        let rows = sqlx::query(
            "SELECT list_id, target_kind, target_id, added_at FROM list_items \
             WHERE list_id = ANY($1) ORDER BY added_at ASC",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut by_list: HashMap<Uuid, Vec<ListItem>> = HashMap::new();
        for row in &rows {
            let list_id: Uuid = row.try_get("list_id").map_err(db_err)?;
            let item = ListItem {
                target: media_ref(row).map_err(db_err)?,
                added_at: row.try_get("added_at").map_err(db_err)?,
            };
            by_list.entry(list_id).or_default().push(item);
        }
        for list in lists.iter_mut() {
            list.items = by_list.remove(&list.id).unwrap_or_default();
        }
        Ok(())
    }

    /// One page of lists matching `filter`, most recently updated first.
    async fn list_page(
        &self,
        filter: impl Fn(&mut QueryBuilder<'_, Postgres>) + Send,
        page: PageRequest,
    ) -> Result<Paged<UserList>> {
        let (limit, offset) = window(page);
        let mut qb = QueryBuilder::new("SELECT * FROM lists WHERE ");
        filter(&mut qb);
        qb.push(" ORDER BY updated_at DESC, id ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = qb.build().fetch_all(&self.pool).await.map_err(db_err)?;
        let mut lists = collect(&rows, list_from_row)?;
        self.attach_items(&mut lists).await?;

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM lists WHERE ");
        filter(&mut count);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(Paged::new(lists, to_u64(total), page))
    }

    async fn touch_list(&self, list_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE lists SET updated_at = $2 WHERE id = $1")
            .bind(list_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl ListRepo for PgStore {
    async fn insert(&self, list: UserList) -> Result<UserList> {
        sqlx::query(
            "INSERT INTO lists (id, owner_id, name, description, is_public, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(list.id)
        .bind(list.owner_id)
        .bind(&list.name)
        .bind(&list.description)
        .bind(list.is_public)
        .bind(list.created_at)
        .bind(list.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(list)
    }

    async fn get(&self, id: Uuid) -> Result<Option<UserList>> {
        let row = sqlx::query("SELECT * FROM lists WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut lists = vec![list_from_row(&row).map_err(db_err)?];
        self.attach_items(&mut lists).await?;
        Ok(lists.pop())
    }

    async fn update(&self, list: UserList) -> Result<UserList> {
        let result = sqlx::query(
            "UPDATE lists SET name = $2, description = $3, is_public = $4, updated_at = $5 WHERE id = $1",
        )
        .bind(list.id)
        .bind(&list.name)
        .bind(&list.description)
        .bind(list.is_public)
        .bind(list.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("list", list.id));
        }
        ListRepo::get(self, list.id)
            .await?
            .ok_or_else(|| DomainError::not_found("list", list.id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM lists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_item(&self, list_id: Uuid, item: ListItem) -> Result<()> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM lists WHERE id = $1)")
            .bind(list_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        if !exists {
            return Err(DomainError::not_found("list", list_id));
        }
        sqlx::query(
            "INSERT INTO list_items (list_id, target_kind, target_id, added_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(list_id)
        .bind(item.target.kind.as_str())
        .bind(item.target.id)
        .bind(item.added_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        self.touch_list(list_id).await
    }

    async fn remove_item(&self, list_id: Uuid, target: MediaRef) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM list_items WHERE list_id = $1 AND target_kind = $2 AND target_id = $3",
        )
        .bind(list_id)
        .bind(target.kind.as_str())
        .bind(target.id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        let removed = result.rows_affected() > 0;
        if removed {
            self.touch_list(list_id).await?;
        }
        Ok(removed)
    }

    async fn by_owner(&self, owner_id: Uuid, page: PageRequest) -> Result<Paged<UserList>> {
        self.list_page(
            move |qb| {
                qb.push("owner_id = ").push_bind(owner_id);
            },
            page,
        )
        .await
    }

    async fn public(&self, page: PageRequest) -> Result<Paged<UserList>> {
        self.list_page(
            |qb| {
                qb.push("is_public");
            },
            page,
        )
        .await
    }

    async fn purge_target(&self, target: MediaRef) -> Result<u64> {
        let result = sqlx::query("DELETE FROM list_items WHERE target_kind = $1 AND target_id = $2")
            .bind(target.kind.as_str())
            .bind(target.id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl NotificationRepo for PgStore {
    async fn insert(&self, notification: Notification) -> Result<Notification> {
        sqlx::query(
            "INSERT INTO notifications (id, user_id, kind, message, actor_id, is_read, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(notification.kind.as_str())
        .bind(&notification.message)
        .bind(notification.actor_id)
        .bind(notification.is_read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(notification)
    }

    async fn list(&self, user_id: Uuid, unread_only: bool, page: PageRequest) -> Result<Paged<Notification>> {
        let (limit, offset) = window(page);
        let rows = sqlx::query(
            "SELECT * FROM notifications WHERE user_id = $1 AND (NOT $2 OR NOT is_read) \
             ORDER BY created_at DESC, id ASC LIMIT $3 OFFSET $4",
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND (NOT $2 OR NOT is_read)",
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(Paged::new(collect(&rows, notification_from_row)?, to_u64(total), page))
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read")
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(result.rows_affected())
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<u64> {
        let n: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(to_u64(n))
    }
}

#[async_trait]
impl MovieRequestRepo for PgStore {
    async fn insert(&self, request: MovieRequest) -> Result<MovieRequest> {
        sqlx::query(
            "INSERT INTO movie_requests (id, user_id, title, note, status, reviewed_by, admin_note, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(request.id)
        .bind(request.user_id)
        .bind(&request.title)
        .bind(&request.note)
        .bind(request.status.as_str())
        .bind(request.reviewed_by)
        .bind(&request.admin_note)
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(request)
    }

    async fn get(&self, id: Uuid) -> Result<Option<MovieRequest>> {
        let row = sqlx::query("SELECT * FROM movie_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(request_from_row).transpose().map_err(db_err)
    }

    async fn update(&self, request: MovieRequest) -> Result<MovieRequest> {
        let result = sqlx::query(
            "UPDATE movie_requests SET status = $2, reviewed_by = $3, admin_note = $4, updated_at = $5 \
             WHERE id = $1",
        )
        .bind(request.id)
        .bind(request.status.as_str())
        .bind(request.reviewed_by)
        .bind(&request.admin_note)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("movie request", request.id));
        }
        Ok(request)
    }

    async fn list(
        &self,
        status: Option<RequestStatus>,
        user_id: Option<Uuid>,
        page: PageRequest,
    ) -> Result<Paged<MovieRequest>> {
        let (limit, offset) = window(page);
        let status = status.map(|s| s.as_str());
        let rows = sqlx::query(
            "SELECT * FROM movie_requests \
             WHERE ($1::text IS NULL OR status = $1) AND ($2::uuid IS NULL OR user_id = $2) \
             ORDER BY created_at DESC, id ASC LIMIT $3 OFFSET $4",
        )
        .bind(status)
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM movie_requests \
             WHERE ($1::text IS NULL OR status = $1) AND ($2::uuid IS NULL OR user_id = $2)",
        )
        .bind(status)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(Paged::new(collect(&rows, request_from_row)?, to_u64(total), page))
    }

    async fn count(&self, status: Option<RequestStatus>) -> Result<u64> {
        let n: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM movie_requests WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(to_u64(n))
    }
}
