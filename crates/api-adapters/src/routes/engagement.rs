//! Comments, ratings, shelves (favorites / watchlist) and watch history.
//!
//! Comment and rating routes hang off each media collection
//! (`/movies/{id}/comments`, `/music/{id}/rating`, ...). The kind is
//! carried into the handlers as an `Extension` set on that sub-router.

use axum::extract::State;
use axum::routing::{get, patch, post};
use axum::{Extension, Router};
use domains::{
    Comment, HistoryEntry, MediaKind, MediaRef, PageParams, Paged, Rating, RatingSummary,
    ShelfEntry,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{media_segment, parse_kind, parse_shelf};
use crate::error::ApiResult;
use crate::extract::{AuthUser, PathParams, QueryParams, ValidJson};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CommentBody {
    #[validate(length(min = 1, max = 2000, message = "comment must be 1 to 2000 characters"))]
    pub body: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RatingBody {
    #[validate(range(min = 1, max = 10, message = "score must be between 1 and 10"))]
    pub score: i16,
    #[validate(length(max = 2000))]
    pub review: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct HistoryBody {
    pub kind: MediaKind,
    pub id: Uuid,
    #[serde(default)]
    #[validate(range(min = 0, message = "progressSeconds must not be negative"))]
    pub progress_seconds: i32,
    #[serde(default)]
    pub completed: bool,
}

// ── Media-scoped ────────────────────────────────────────────────────────────

async fn list_comments(
    State(state): State<AppState>,
    Extension(kind): Extension<MediaKind>,
    PathParams(id): PathParams<Uuid>,
    QueryParams(page): QueryParams<PageParams>,
) -> ApiResult<ApiResponse<Paged<Comment>>> {
    let comments = state
        .services
        .engagement
        .list_comments(MediaRef::new(kind, id), page.into())
        .await?;
    Ok(ApiResponse::ok(comments))
}

async fn add_comment(
    State(state): State<AppState>,
    Extension(kind): Extension<MediaKind>,
    AuthUser(actor): AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidJson(b): ValidJson<CommentBody>,
) -> ApiResult<ApiResponse<Comment>> {
    let comment = state
        .services
        .engagement
        .add_comment(actor, MediaRef::new(kind, id), &b.body)
        .await?;
    Ok(ApiResponse::created(comment))
}

async fn my_rating(
    State(state): State<AppState>,
    Extension(kind): Extension<MediaKind>,
    AuthUser(actor): AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<ApiResponse<Rating>> {
    let rating = state.services.engagement.my_rating(actor, MediaRef::new(kind, id)).await?;
    Ok(ApiResponse::ok(rating))
}

async fn rate(
    State(state): State<AppState>,
    Extension(kind): Extension<MediaKind>,
    AuthUser(actor): AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidJson(b): ValidJson<RatingBody>,
) -> ApiResult<ApiResponse<Rating>> {
    let rating = state
        .services
        .engagement
        .rate(actor, MediaRef::new(kind, id), b.score, b.review)
        .await?;
    Ok(ApiResponse::created(rating).message("rated"))
}

async fn update_rating(
    State(state): State<AppState>,
    Extension(kind): Extension<MediaKind>,
    AuthUser(actor): AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidJson(b): ValidJson<RatingBody>,
) -> ApiResult<ApiResponse<Rating>> {
    let rating = state
        .services
        .engagement
        .update_rating(actor, MediaRef::new(kind, id), b.score, b.review)
        .await?;
    Ok(ApiResponse::ok(rating).message("rating updated"))
}

async fn rating_summary(
    State(state): State<AppState>,
    Extension(kind): Extension<MediaKind>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<ApiResponse<RatingSummary>> {
    let summary = state.services.engagement.rating_summary(MediaRef::new(kind, id)).await?;
    Ok(ApiResponse::ok(summary))
}

fn media_scoped(kind: MediaKind) -> Router<AppState> {
    let base = format!("/{}/{{id}}", media_segment(kind));
    Router::new()
        .route(&format!("{base}/comments"), get(list_comments).post(add_comment))
        .route(&format!("{base}/rating"), get(my_rating).post(rate).put(update_rating))
        .route(&format!("{base}/rating/summary"), get(rating_summary))
        .layer(Extension(kind))
}

// ── Comments by id ──────────────────────────────────────────────────────────

async fn edit_comment(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidJson(b): ValidJson<CommentBody>,
) -> ApiResult<ApiResponse<Comment>> {
    let comment = state.services.engagement.edit_comment(actor, id, &b.body).await?;
    Ok(ApiResponse::ok(comment).message("comment updated"))
}

async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    state.services.engagement.delete_comment(actor, id).await?;
    Ok(ApiResponse::done("deleted"))
}

// ── Shelves ─────────────────────────────────────────────────────────────────

async fn shelf(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams(shelf): PathParams<String>,
    QueryParams(page): QueryParams<PageParams>,
) -> ApiResult<ApiResponse<Paged<ShelfEntry>>> {
    let shelf = parse_shelf(&shelf)?;
    Ok(ApiResponse::ok(state.services.engagement.shelf(actor, shelf, page.into()).await?))
}

async fn shelve(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams((shelf, kind, id)): PathParams<(String, String, Uuid)>,
) -> ApiResult<ApiResponse<ShelfEntry>> {
    let shelf = parse_shelf(&shelf)?;
    let target = MediaRef::new(parse_kind(&kind)?, id);
    let entry = state.services.engagement.shelve(actor, shelf, target).await?;
    Ok(ApiResponse::created(entry).message(format!("added to {}", shelf.as_str())))
}

async fn unshelve(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams((shelf, kind, id)): PathParams<(String, String, Uuid)>,
) -> ApiResult<ApiResponse<()>> {
    let shelf = parse_shelf(&shelf)?;
    let target = MediaRef::new(parse_kind(&kind)?, id);
    state.services.engagement.unshelve(actor, shelf, target).await?;
    Ok(ApiResponse::done(format!("removed from {}", shelf.as_str())))
}

// ── History ─────────────────────────────────────────────────────────────────

async fn history(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    QueryParams(page): QueryParams<PageParams>,
) -> ApiResult<ApiResponse<Paged<HistoryEntry>>> {
    Ok(ApiResponse::ok(state.services.engagement.history(actor, page.into()).await?))
}

async fn record_history(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ValidJson(b): ValidJson<HistoryBody>,
) -> ApiResult<ApiResponse<HistoryEntry>> {
    let entry = state
        .services
        .engagement
        .record_history(actor, MediaRef::new(b.kind, b.id), b.progress_seconds, b.completed)
        .await?;
    Ok(ApiResponse::ok(entry).message("history recorded"))
}

async fn clear_history(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<ApiResponse<u64>> {
    let removed = state.services.engagement.clear_history(actor).await?;
    Ok(ApiResponse::ok(removed).message("history cleared"))
}

pub fn routes() -> Router<AppState> {
    let mut router = Router::new()
        .route("/comments/{id}", patch(edit_comment).delete(delete_comment))
        .route("/me/history", get(history).post(record_history).delete(clear_history))
        .route("/me/{shelf}", get(shelf))
        .route("/me/{shelf}/{kind}/{id}", post(shelve).delete(unshelve));
    for kind in [MediaKind::Movie, MediaKind::Music, MediaKind::Short] {
        router = router.merge(media_scoped(kind));
    }
    router
}
