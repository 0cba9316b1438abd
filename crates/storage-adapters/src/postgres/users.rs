use async_trait::async_trait;
use domains::{DomainError, PageRequest, Paged, Result, Role, User, UserRepo};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use super::{db_err, decode, to_u64, window, PgStore};

const USER_COLUMNS: &str = "id, username, email, password_hash, display_name, avatar_url, bio, \
                            role, is_banned, created_at, updated_at";

fn user_from_row(row: &PgRow) -> std::result::Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        display_name: row.try_get("display_name")?,
        avatar_url: row.try_get("avatar_url")?,
        bio: row.try_get("bio")?,
        role: decode(row, "role", Role::parse)?,
        is_banned: row.try_get("is_banned")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl UserRepo for PgStore {
    async fn insert(&self, user: User) -> Result<User> {
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, display_name, avatar_url, bio, \
             role, is_banned, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.display_name)
        .bind(&user.avatar_url)
        .bind(&user.bio)
        .bind(user.role.as_str())
        .bind(user.is_banned)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(user_from_row).transpose().map_err(db_err)
    }

    async fn find_by_login(&self, identifier: &str) -> Result<Option<User>> {
        let column = if identifier.contains('@') { "email" } else { "username" };
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower({column}) = lower($1)"
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(user_from_row).transpose().map_err(db_err)
    }

    async fn update(&self, user: User) -> Result<User> {
        let result = sqlx::query(
            "UPDATE users SET display_name = $2, avatar_url = $3, bio = $4, role = $5, \
             is_banned = $6, updated_at = $7 WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.display_name)
        .bind(&user.avatar_url)
        .bind(&user.bio)
        .bind(user.role.as_str())
        .bind(user.is_banned)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("user", user.id));
        }
        Ok(user)
    }

    async fn list(&self, page: PageRequest) -> Result<Paged<User>> {
        let (limit, offset) = window(page);
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        let items = rows.iter().map(user_from_row).collect::<std::result::Result<_, _>>().map_err(db_err)?;
        let total = self.count().await?;
        Ok(Paged::new(items, total, page))
    }

    async fn count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(to_u64(n))
    }
}
