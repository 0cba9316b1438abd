//! # PostgreSQL store
//!
//! Maps the relational schema in `migrations/` onto the domain models with
//! raw `sqlx` queries. Enums are stored as their `as_str()` text, media
//! references as a `(target_kind, target_id)` column pair.

use domains::{DomainError, MediaKind, MediaRef, PageRequest};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{error, info};

mod catalog;
mod engagement;
mod search;
mod social;
mod users;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        info!(max_connections, "connected to postgres");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// Unique violations become `Conflict` with a message keyed on the
/// constraint name; everything else is logged and surfaced as `Internal`.
pub(crate) fn db_err(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            let message = match db.constraint() {
                Some("users_username_key") => "username is already taken",
                Some("users_email_key") => "email is already registered",
                Some("ratings_user_target_key") => "you have already rated this",
                Some("shelf_entries_user_shelf_target_key") => "already on this shelf",
                Some("follows_pkey") => "already following this user",
                Some("list_items_pkey") => "already in this list",
                _ => "record already exists",
            };
            return DomainError::conflict(message);
        }
    }
    error!(error = %err, "database error");
    DomainError::internal(err)
}

/// Reads a text column through one of the domain `parse` functions.
pub(crate) fn decode<T>(row: &PgRow, column: &str, parse: fn(&str) -> Option<T>) -> Result<T, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    parse(&raw).ok_or_else(|| sqlx::Error::Decode(format!("unexpected {column} value '{raw}'").into()))
}

pub(crate) fn media_ref(row: &PgRow) -> Result<MediaRef, sqlx::Error> {
    Ok(MediaRef::new(
        decode(row, "target_kind", MediaKind::parse)?,
        row.try_get("target_id")?,
    ))
}

/// `(LIMIT, OFFSET)` as the `BIGINT`s postgres expects.
pub(crate) fn window(page: PageRequest) -> (i64, i64) {
    (
        i64::from(page.limit()),
        i64::try_from(page.offset()).unwrap_or(i64::MAX),
    )
}

pub(crate) fn to_u64(n: i64) -> u64 {
    u64::try_from(n).unwrap_or_default()
}
