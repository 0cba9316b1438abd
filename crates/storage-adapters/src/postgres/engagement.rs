use async_trait::async_trait;
use domains::{
    round2, Comment, CommentRepo, DomainError, HistoryEntry, HistoryRepo, MediaRef, PageRequest,
    Paged, Rating, RatingRepo, RatingSummary, Result, Shelf, ShelfEntry, ShelfRepo,
};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use super::{db_err, decode, media_ref, to_u64, window, PgStore};

type RowResult<T> = std::result::Result<T, sqlx::Error>;

fn comment_from_row(row: &PgRow) -> RowResult<Comment> {
    Ok(Comment {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        target: media_ref(row)?,
        body: row.try_get("body")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn rating_from_row(row: &PgRow) -> RowResult<Rating> {
    Ok(Rating {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        target: media_ref(row)?,
        score: row.try_get("score")?,
        review: row.try_get("review")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn shelf_entry_from_row(row: &PgRow) -> RowResult<ShelfEntry> {
    Ok(ShelfEntry {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        shelf: decode(row, "shelf", Shelf::parse)?,
        target: media_ref(row)?,
        created_at: row.try_get("created_at")?,
    })
}

fn history_from_row(row: &PgRow) -> RowResult<HistoryEntry> {
    Ok(HistoryEntry {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        target: media_ref(row)?,
        progress_seconds: row.try_get("progress_seconds")?,
        completed: row.try_get("completed")?,
        watched_at: row.try_get("watched_at")?,
    })
}

fn collect<T>(rows: &[PgRow], map: fn(&PgRow) -> RowResult<T>) -> Result<Vec<T>> {
    rows.iter().map(map).collect::<RowResult<_>>().map_err(db_err)
}

fn refs(rows: &[PgRow]) -> Result<Vec<MediaRef>> {
    collect(rows, media_ref)
}

#[async_trait]
impl CommentRepo for PgStore {
    async fn insert(&self, comment: Comment) -> Result<Comment> {
        sqlx::query(
            "INSERT INTO comments (id, user_id, target_kind, target_id, body, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(comment.id)
        .bind(comment.user_id)
        .bind(comment.target.kind.as_str())
        .bind(comment.target.id)
        .bind(&comment.body)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(comment)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Comment>> {
        let row = sqlx::query("SELECT * FROM comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(comment_from_row).transpose().map_err(db_err)
    }

    async fn update(&self, comment: Comment) -> Result<Comment> {
        let result = sqlx::query("UPDATE comments SET body = $2, updated_at = $3 WHERE id = $1")
            .bind(comment.id)
            .bind(&comment.body)
            .bind(comment.updated_at)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("comment", comment.id));
        }
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_for(&self, target: MediaRef, page: PageRequest) -> Result<Paged<Comment>> {
        let (limit, offset) = window(page);
        let rows = sqlx::query(
            "SELECT * FROM comments WHERE target_kind = $1 AND target_id = $2 \
             ORDER BY created_at DESC, id ASC LIMIT $3 OFFSET $4",
        )
        .bind(target.kind.as_str())
        .bind(target.id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE target_kind = $1 AND target_id = $2")
                .bind(target.kind.as_str())
                .bind(target.id)
                .fetch_one(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(Paged::new(collect(&rows, comment_from_row)?, to_u64(total), page))
    }

    async fn purge_target(&self, target: MediaRef) -> Result<u64> {
        let result = sqlx::query("DELETE FROM comments WHERE target_kind = $1 AND target_id = $2")
            .bind(target.kind.as_str())
            .bind(target.id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl RatingRepo for PgStore {
    async fn insert(&self, rating: Rating) -> Result<Rating> {
        sqlx::query(
            "INSERT INTO ratings (id, user_id, target_kind, target_id, score, review, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(rating.id)
        .bind(rating.user_id)
        .bind(rating.target.kind.as_str())
        .bind(rating.target.id)
        .bind(rating.score)
        .bind(&rating.review)
        .bind(rating.created_at)
        .bind(rating.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rating)
    }

    async fn update(&self, rating: Rating) -> Result<Rating> {
        let result = sqlx::query(
            "UPDATE ratings SET score = $4, review = $5, updated_at = $6 \
             WHERE user_id = $1 AND target_kind = $2 AND target_id = $3",
        )
        .bind(rating.user_id)
        .bind(rating.target.kind.as_str())
        .bind(rating.target.id)
        .bind(rating.score)
        .bind(&rating.review)
        .bind(rating.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("rating", rating.target));
        }
        Ok(rating)
    }

    async fn find(&self, user_id: Uuid, target: MediaRef) -> Result<Option<Rating>> {
        let row = sqlx::query(
            "SELECT * FROM ratings WHERE user_id = $1 AND target_kind = $2 AND target_id = $3",
        )
        .bind(user_id)
        .bind(target.kind.as_str())
        .bind(target.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(rating_from_row).transpose().map_err(db_err)
    }

    async fn summary(&self, target: MediaRef) -> Result<RatingSummary> {
        let row = sqlx::query(
            "SELECT COALESCE(AVG(score), 0)::float8 AS average, COUNT(*) AS count \
             FROM ratings WHERE target_kind = $1 AND target_id = $2",
        )
        .bind(target.kind.as_str())
        .bind(target.id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        let average: f64 = row.try_get("average").map_err(db_err)?;
        Ok(RatingSummary {
            average: round2(average),
            count: row.try_get("count").map_err(db_err)?,
        })
    }

    async fn purge_target(&self, target: MediaRef) -> Result<u64> {
        let result = sqlx::query("DELETE FROM ratings WHERE target_kind = $1 AND target_id = $2")
            .bind(target.kind.as_str())
            .bind(target.id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ShelfRepo for PgStore {
    async fn add(&self, entry: ShelfEntry) -> Result<ShelfEntry> {
        sqlx::query(
            "INSERT INTO shelf_entries (id, user_id, shelf, target_kind, target_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(entry.shelf.as_str())
        .bind(entry.target.kind.as_str())
        .bind(entry.target.id)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(entry)
    }

    async fn remove(&self, user_id: Uuid, shelf: Shelf, target: MediaRef) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM shelf_entries WHERE user_id = $1 AND shelf = $2 \
             AND target_kind = $3 AND target_id = $4",
        )
        .bind(user_id)
        .bind(shelf.as_str())
        .bind(target.kind.as_str())
        .bind(target.id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, user_id: Uuid, shelf: Shelf, page: PageRequest) -> Result<Paged<ShelfEntry>> {
        let (limit, offset) = window(page);
        let rows = sqlx::query(
            "SELECT * FROM shelf_entries WHERE user_id = $1 AND shelf = $2 \
             ORDER BY created_at DESC, id ASC LIMIT $3 OFFSET $4",
        )
        .bind(user_id)
        .bind(shelf.as_str())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM shelf_entries WHERE user_id = $1 AND shelf = $2")
                .bind(user_id)
                .bind(shelf.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(Paged::new(collect(&rows, shelf_entry_from_row)?, to_u64(total), page))
    }

    async fn targets(&self, user_id: Uuid, shelf: Shelf) -> Result<Vec<MediaRef>> {
        let rows = sqlx::query(
            "SELECT target_kind, target_id FROM shelf_entries WHERE user_id = $1 AND shelf = $2",
        )
        .bind(user_id)
        .bind(shelf.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        refs(&rows)
    }

    async fn purge_target(&self, target: MediaRef) -> Result<u64> {
        let result = sqlx::query("DELETE FROM shelf_entries WHERE target_kind = $1 AND target_id = $2")
            .bind(target.kind.as_str())
            .bind(target.id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl HistoryRepo for PgStore {
    async fn upsert(&self, entry: HistoryEntry) -> Result<HistoryEntry> {
        let row = sqlx::query(
            "INSERT INTO history (id, user_id, target_kind, target_id, progress_seconds, completed, watched_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (user_id, target_kind, target_id) DO UPDATE SET \
             progress_seconds = EXCLUDED.progress_seconds, \
             completed = EXCLUDED.completed, \
             watched_at = EXCLUDED.watched_at \
             RETURNING *",
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(entry.target.kind.as_str())
        .bind(entry.target.id)
        .bind(entry.progress_seconds)
        .bind(entry.completed)
        .bind(entry.watched_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        history_from_row(&row).map_err(db_err)
    }

    async fn list(&self, user_id: Uuid, page: PageRequest) -> Result<Paged<HistoryEntry>> {
        let (limit, offset) = window(page);
        let rows = sqlx::query(
            "SELECT * FROM history WHERE user_id = $1 \
             ORDER BY watched_at DESC, id ASC LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM history WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(Paged::new(collect(&rows, history_from_row)?, to_u64(total), page))
    }

    async fn targets(&self, user_id: Uuid) -> Result<Vec<MediaRef>> {
        let rows = sqlx::query("SELECT target_kind, target_id FROM history WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        refs(&rows)
    }

    async fn clear(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM history WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected())
    }

    async fn purge_target(&self, target: MediaRef) -> Result<u64> {
        let result = sqlx::query("DELETE FROM history WHERE target_kind = $1 AND target_id = $2")
            .bind(target.kind.as_str())
            .bind(target.id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected())
    }
}
